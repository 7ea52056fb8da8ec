use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use infograph::compose::DashboardComposer;
use infograph::csv_reader::{dataset_id, read_csv_path};
use infograph::data::Dataset;
use infograph::graph::render_plan;
use infograph::logging::init_tracing;
use infograph::{ComposeOptions, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "infograph")]
#[command(about = "Turn financial tables into charts and a dashboard", long_about = None)]
struct Args {
    /// CSV or JSON (array of objects) files, one dataset each
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for rendered images
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// Dashboard title
    #[arg(long)]
    title: Option<String>,

    /// Maximum number of charts on the dashboard
    #[arg(long)]
    max_charts: Option<usize>,

    /// Column to treat as the category axis wherever it appears
    #[arg(long)]
    label_column: Option<String>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// JSON options file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the dashboard plan as JSON instead of rendering
    #[arg(long)]
    plan: bool,

    /// Only render the dashboard
    #[arg(long)]
    no_standalone: bool,
}

fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();

    let options = load_options(&args)?;
    let datasets = args
        .inputs
        .iter()
        .map(|path| load_dataset(path, args.label_column.as_deref()))
        .collect::<Result<Vec<_>>>()?;

    let composer = DashboardComposer::new(options);
    let selection = composer.select(&datasets);
    let dashboard = composer.dashboard(&selection);
    for note in &dashboard.notes {
        warn!("{}", note);
    }

    if args.plan {
        let json = serde_json::to_string_pretty(&dashboard).context("Failed to serialize plan")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", json).context("Failed to write plan to stdout")?;
        handle.flush().context("Failed to flush stdout")?;
        return Ok(());
    }

    let format = composer.options().format;
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    if !args.no_standalone {
        for (i, plan) in composer.standalone_plans(&selection).iter().enumerate() {
            let Some(placed) = plan.charts.first() else {
                continue;
            };
            let spec = &placed.chart.spec;
            let name = format!("{}_{}_{}.{}", spec.dataset, spec.archetype, i + 1, format.extension());
            write_image(&args.out_dir.join(name), &render_plan(plan, format)?)?;
        }
    }

    if dashboard.charts.is_empty() {
        warn!("No charts to place; dashboard not written");
        return Ok(());
    }
    let path = args.out_dir.join(format!("dashboard.{}", format.extension()));
    write_image(&path, &render_plan(&dashboard, format)?)?;
    Ok(())
}

fn load_options(args: &Args) -> Result<ComposeOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            ComposeOptions::from_json_str(&json)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => ComposeOptions::default(),
    };

    if let Some(title) = &args.title {
        options.title = title.clone();
    }
    if let Some(max_charts) = args.max_charts {
        options.max_charts = max_charts;
    }
    if let Some(format) = args.format {
        options.format = format;
    }
    Ok(options)
}

fn load_dataset(path: &Path, label_column: Option<&str>) -> Result<Dataset> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let dataset = if is_json {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        Dataset::from_json(dataset_id(path), &value)
            .with_context(|| format!("Failed to load {}", path.display()))?
    } else {
        read_csv_path(path)?
    };

    info!(dataset = dataset.id(), rows = dataset.row_count(), "Loaded dataset");
    Ok(match label_column {
        Some(column) if dataset.column(column).is_some() => dataset.with_label_column(column),
        _ => dataset,
    })
}

fn write_image(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "Wrote image");
    Ok(())
}
