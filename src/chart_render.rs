//! Optional PNG rendering of the scatter and bar chart data (plotters bitmap).

use color_eyre::eyre::eyre;
use color_eyre::Result;
use plotters::prelude::*;
use std::path::Path;

use crate::chart_data::{RateColumn, ScatterSeries};
use crate::COL_EMBRYO_COUNT;

const PALETTE: [RGBColor; 7] = [
    CYAN,
    MAGENTA,
    GREEN,
    YELLOW,
    BLUE,
    RED,
    RGBColor(128, 255, 255),
];

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() {
        // Pad a degenerate range so the axis still has extent.
        if min == max {
            Some((min - 1.0, max + 1.0))
        } else {
            Some((min, max))
        }
    } else {
        None
    }
}

/// Write the embryo-count vs rate scatter to a PNG, one color per hospital.
pub fn write_scatter_png(path: &Path, series: &[ScatterSeries], rate: RateColumn) -> Result<()> {
    if series.iter().all(|s| s.points.is_empty()) {
        return Err(eyre!("No chart data to render"));
    }

    let (x_min, x_max) = bounds(
        series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.embryo_count)),
    )
    .ok_or_else(|| eyre!("No chart data to render"))?;
    let (y_min, y_max) = bounds(series.iter().flat_map(|s| s.points.iter().map(|p| p.rate)))
        .ok_or_else(|| eyre!("No chart data to render"))?;

    let root = BitMapBackend::new(path, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(COL_EMBRYO_COUNT)
        .y_desc(rate.as_str())
        .draw()?;

    for (idx, s) in series.iter().enumerate() {
        if s.points.is_empty() {
            continue;
        }
        let color = PALETTE[idx % PALETTE.len()];
        chart
            .draw_series(PointSeries::of_element(
                s.points.iter().map(|p| (p.embryo_count, p.rate)),
                3,
                color,
                &|c, size, _| EmptyElement::at(c) + Circle::new((0, 0), size, color.filled()),
            ))?
            .label(s.hospital.as_str())
            .legend(move |(x, y)| Circle::new((x + 10, y), 3, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Write the mean-rate-per-hospital bar chart to a PNG. Hospitals index the
/// x axis; labels come from the bar names.
pub fn write_bar_png(path: &Path, bars: &[(String, f64)], rate: RateColumn) -> Result<()> {
    let finite: Vec<&(String, f64)> = bars.iter().filter(|(_, v)| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(eyre!("No chart data to render"));
    }

    let y_max = finite.iter().map(|(_, v)| *v).fold(0.0f64, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };
    let names: Vec<String> = finite.iter().map(|(name, _)| name.clone()).collect();

    let root = BitMapBackend::new(path, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(finite.len() as f64 - 0.5), 0.0f64..y_max)?;

    chart
        .configure_mesh()
        .x_labels(finite.len())
        .x_label_formatter(&|x| {
            let idx = x.round() as isize;
            if idx >= 0 && (idx as usize) < names.len() {
                names[idx as usize].clone()
            } else {
                String::new()
            }
        })
        .x_desc("Hospital")
        .y_desc(rate.as_str())
        .draw()?;

    chart.draw_series(finite.iter().enumerate().map(|(i, (_, v))| {
        let x = i as f64;
        Rectangle::new([(x - 0.3, 0.0), (x + 0.3, *v)], PALETTE[0].filled())
    }))?;

    root.present()?;
    Ok(())
}
