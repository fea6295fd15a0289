use clap::Parser;
use color_eyre::Result;
use pgtadash::{
    chart_render, error_display, export, report, ConfigManager, Dashboard, DashboardConfig,
    RateColumn, APP_NAME,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "PGT-A screening data dashboard")]
struct Args {
    /// Path to the workbook (defaults to the configured path)
    path: Option<PathBuf>,

    /// Worksheet name or 0-based index (default: first worksheet)
    #[arg(long = "sheet")]
    sheet: Option<String>,

    /// Restrict to these hospital locations (comma separated)
    #[arg(long = "locations", value_delimiter = ',')]
    locations: Option<Vec<String>>,

    /// Restrict to these hospitals (comma separated)
    #[arg(long = "hospitals", value_delimiter = ',')]
    hospitals: Option<Vec<String>>,

    /// Keep only rows whose cells contain this text (case-insensitive)
    #[arg(long = "search")]
    search: Option<String>,

    /// Rate column for the scatter and bar charts
    #[arg(long = "metric", default_value = "CH-RATE", value_parser = parse_rate_column)]
    metric: RateColumn,

    /// Write filtered_pgt_data.csv and statistics.csv
    #[arg(long = "export", action)]
    export: bool,

    /// Directory for exports and charts (default: configured directory)
    #[arg(long = "export-dir")]
    export_dir: Option<PathBuf>,

    /// Render scatter and bar charts to PNG files
    #[arg(long = "charts", action)]
    charts: bool,

    /// Print the metrics as JSON instead of the text report
    #[arg(long = "json", action)]
    json: bool,

    /// Maximum table rows to print
    #[arg(long = "rows", default_value_t = 20)]
    rows: usize,

    /// Write a default config file and exit
    #[arg(long = "write-config", action)]
    write_config: bool,

    /// Overwrite an existing config file (with --write-config)
    #[arg(long = "force", action)]
    force: bool,
}

fn parse_rate_column(s: &str) -> Result<RateColumn, String> {
    RateColumn::from_name(s).ok_or_else(|| {
        format!(
            "unknown metric '{}', expected one of: {}",
            s,
            RateColumn::ALL.map(|r| r.as_str()).join(", ")
        )
    })
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.write_config {
        let manager = ConfigManager::new(APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Wrote default config to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
    Ok(None)
}

fn run(args: &Args) -> Result<()> {
    let config = match ConfigManager::new(APP_NAME) {
        Ok(manager) => DashboardConfig::load(&manager)?,
        Err(_) => DashboardConfig::default(),
    };

    let path = args.path.clone().unwrap_or_else(|| config.data.path.clone());
    let sheet = args.sheet.clone().or_else(|| config.data.sheet.clone());

    let mut dashboard = Dashboard::open(&path, sheet.as_deref()).map_err(|e| {
        let msg = error_display::user_message_from_report(&e, Some(&path));
        color_eyre::eyre::eyre!(msg)
    })?;
    dashboard.set_locations(args.locations.clone())?;
    dashboard.set_hospitals(args.hospitals.clone())?;
    dashboard.search = args.search.clone().unwrap_or_default();
    dashboard.rate = args.metric;

    let snapshot = dashboard.snapshot()?;

    if snapshot.filtered.height() == 0 {
        log::warn!("selection matches no rows; outputs will be empty");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot.metrics)?);
    } else {
        println!("PGT-A Analysis Dashboard");
        println!("========================\n");
        print!("{}", report::metrics_block(&snapshot.metrics));

        println!("\nData Table");
        println!("----------");
        print!("{}", report::render_frame(&snapshot.display, args.rows)?);
        println!(
            "Showing {} of {} records",
            snapshot.display.height(),
            snapshot.filtered.height()
        );

        println!("\nRate Distributions");
        println!("------------------");
        print!("{}", report::render_spreads(&snapshot.spreads));

        println!("\nDescriptive Statistics");
        println!("----------------------");
        print!("{}", report::render_frame(&snapshot.statistics, 8)?);

        println!("\nCorrelation Matrix");
        println!("------------------");
        print!("{}", report::render_correlation(&snapshot.correlation));

        println!("\nStatistics by Hospital Location");
        println!("-------------------------------");
        print!("{}", report::render_frame(&snapshot.location_summary, args.rows)?);
    }

    let export_dir = args
        .export_dir
        .clone()
        .unwrap_or_else(|| config.export.directory.clone());

    if args.export || args.export_dir.is_some() {
        let written = export::write_exports(&snapshot.filtered, &snapshot.statistics, &export_dir)?;
        for path in written {
            println!("Exported {}", path.display());
        }
    }

    if args.charts {
        if snapshot.scatter.iter().all(|s| s.points.is_empty()) {
            log::warn!("no chart data; skipping PNG rendering");
        } else {
            std::fs::create_dir_all(&export_dir)?;
            let scatter_path = export_dir.join("embryo_scatter.png");
            chart_render::write_scatter_png(&scatter_path, &snapshot.scatter, dashboard.rate)?;
            println!("Exported {}", scatter_path.display());
            let bar_path = export_dir.join("hospital_rates.png");
            chart_render::write_bar_png(&bar_path, &snapshot.bars, dashboard.rate)?;
            println!("Exported {}", bar_path.display());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", error_display::user_message_from_report(&e, None));
        std::process::exit(1);
    }
    Ok(())
}
