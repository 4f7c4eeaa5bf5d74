use eicpeaks::errors::{
    PeakPickingError,
    Result,
};
use eicpeaks::models::batch::{
    group_windows,
    process_series_batch,
    WindowGroups,
};
use eicpeaks::models::peak::Peak;
use eicpeaks::models::provider::{
    CachedSeriesProvider,
    InMemoryProvider,
    SampleScans,
    ScanPoint,
};
use eicpeaks::{
    EicSettings,
    ExtractionWindow,
    GroupingSettings,
    Series,
};

use clap::{
    Parser,
    Subcommand,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::path::Path;
use tabled::{
    Table,
    Tabled,
};
use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{
    BunyanFormattingLayer,
    JsonStorageLayer,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct PipelineSettings {
    eic: EicSettings,
    grouping: GroupingSettings,
}

fn template_samples(num: usize) -> Vec<SampleScans> {
    (0..num)
        .map(|sample_id| {
            let shift = sample_id as f32 * 0.02;
            let points = (0..120u32)
                .flat_map(|scan| {
                    let rt = scan as f32 * 0.05;
                    [(2.0, 450.2), (4.0, 612.3)].into_iter().map(move |(center, mz)| {
                        let x = (rt - center - shift) / 0.1;
                        ScanPoint {
                            scan,
                            rt,
                            mz,
                            intensity: 1e4 * (-0.5 * x * x).exp() + 5.0,
                        }
                    })
                })
                .collect();
            SampleScans {
                sample_id,
                sample_name: Some(format!("sample_{}", sample_id)),
                points,
            }
        })
        .collect()
}

fn template_windows() -> Vec<ExtractionWindow> {
    vec![
        ExtractionWindow::from_ppm(0, 450.2, 20.0, (1.0, 3.0)),
        ExtractionWindow::from_ppm(1, 612.3, 20.0, (3.0, 5.0)),
    ]
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Write a chrome trace of the run to this file.
    #[arg(long, global = true)]
    chrome_trace: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Json,
    Msgpack,
}

#[derive(Parser, Debug)]
struct DetectArgs {
    /// The path to the json file with the series.
    #[arg(short, long)]
    series_path: String,

    /// The path to the json file with the settings.
    #[arg(short = 'c', long)]
    settings_path: Option<String>,

    /// The path to the output files.
    #[arg(short, long)]
    output_path: String,

    /// Whether the output json should be pretty printed.
    #[arg(short, long)]
    pretty: bool,

    #[arg(short, long, default_value_t, value_enum)]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct GroupArgs {
    /// The path to the json file with the sample scans.
    #[arg(short, long)]
    samples_path: String,

    /// The path to the json file with the extraction windows.
    #[arg(short, long)]
    windows_path: String,

    /// The path to the json file with the settings.
    #[arg(short = 'c', long)]
    settings_path: Option<String>,

    /// The path to the output files.
    #[arg(short, long)]
    output_path: String,

    /// Whether the output json should be pretty printed.
    #[arg(short, long)]
    pretty: bool,

    #[arg(short, long, default_value_t, value_enum)]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct WriteTemplateArgs {
    /// The path to the output files.
    #[arg(short, long)]
    output_path: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect peaks on every series of a file.
    Detect(DetectArgs),
    /// Extract, detect and group peaks across samples.
    Group(GroupArgs),
    WriteTemplate(WriteTemplateArgs),
}

#[derive(Debug, Serialize)]
struct SeriesPeaks {
    sample_id: usize,
    sample_name: Option<String>,
    peaks: Vec<Peak>,
}

#[derive(Tabled)]
struct GroupRow {
    window: u64,
    group: usize,
    rank: usize,
    samples: usize,
    mean_rt: String,
    mean_mz: String,
    max_intensity: String,
}

fn main() {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let formatting_layer = BunyanFormattingLayer::new("eicpeaks".into(), std::io::stdout);
    let (chrome_layer, _guard) = match &args.chrome_trace {
        Some(path) => {
            let (layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
                .file(path)
                .include_args(true)
                .build();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
        .with(chrome_layer);
    set_global_default(subscriber).expect("Setting default subscriber failed");

    let out = match args.command {
        Some(Commands::Detect(args)) => main_detect(args),
        Some(Commands::Group(args)) => main_group(args),
        Some(Commands::WriteTemplate(args)) => main_write_template(args),
        None => {
            println!("No command provided");
            Ok(())
        }
    };
    if let Err(e) = out {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn read_settings(path: &Option<String>) -> Result<PipelineSettings> {
    match path {
        Some(path) => read_json(path),
        None => Ok(PipelineSettings::default()),
    }
}

fn write_output<T: Serialize>(
    output_path: &str,
    stem: &str,
    value: &T,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    let put_path = Path::new(output_path);
    std::fs::create_dir_all(put_path)?;
    match format {
        OutputFormat::Json => {
            let path = put_path.join(format!("{}.json", stem));
            println!("Writing to {}", path.display());
            let serialized = if pretty {
                serde_json::to_string_pretty(value)?
            } else {
                serde_json::to_string(value)?
            };
            std::fs::write(path, serialized)?;
        }
        OutputFormat::Msgpack => {
            let path = put_path.join(format!("{}.msgpack", stem));
            println!("Writing to {}", path.display());
            std::fs::write(path, rmp_serde::to_vec_named(value)?)?;
        }
    }
    Ok(())
}

fn main_write_template(args: WriteTemplateArgs) -> Result<()> {
    let put_path = Path::new(&args.output_path);
    std::fs::create_dir_all(put_path)?;
    println!("Writing to {}", put_path.display());

    let samples_path = put_path.join("samples.json");
    let windows_path = put_path.join("windows.json");
    let settings_path = put_path.join("settings.json");
    std::fs::write(&samples_path, serde_json::to_string_pretty(&template_samples(3))?)?;
    std::fs::write(&windows_path, serde_json::to_string_pretty(&template_windows())?)?;
    std::fs::write(
        &settings_path,
        serde_json::to_string_pretty(&PipelineSettings::default())?,
    )?;
    println!(
        "use as `eicpeaks group --pretty --output-path '.' --samples-path {:#?} --windows-path {:#?} --settings-path {:#?}`",
        samples_path, windows_path, settings_path,
    );
    Ok(())
}

fn main_detect(args: DetectArgs) -> Result<()> {
    let settings = read_settings(&args.settings_path)?;
    let series: Vec<Series> = read_json(&args.series_path)?;
    if series.is_empty() {
        return Err(PeakPickingError::custom("No series in input file"));
    }

    let eics = process_series_batch(series, &settings.eic)?;
    let out: Vec<SeriesPeaks> = eics
        .into_iter()
        .map(|eic| {
            eic.summary();
            SeriesPeaks {
                sample_id: eic.sample_id(),
                sample_name: eic.series().sample_name().map(|x| x.to_string()),
                peaks: eic.into_peaks(),
            }
        })
        .collect();
    write_output(&args.output_path, "peaks", &out, args.format, args.pretty)
}

fn main_group(args: GroupArgs) -> Result<()> {
    let settings = read_settings(&args.settings_path)?;
    let samples: Vec<SampleScans> = read_json(&args.samples_path)?;
    let windows: Vec<ExtractionWindow> = read_json(&args.windows_path)?;

    let provider = CachedSeriesProvider::new(InMemoryProvider::new(samples));
    let out = group_windows(&provider, &windows, &settings.eic, &settings.grouping)?;
    println!("{}", Table::new(summary_rows(&out)));
    write_output(&args.output_path, "groups", &out, args.format, args.pretty)
}

fn summary_rows(results: &[WindowGroups]) -> Vec<GroupRow> {
    results
        .iter()
        .flat_map(|res| {
            res.groups.iter().map(|g| GroupRow {
                window: res.window.id,
                group: g.group_id,
                rank: g.rank,
                samples: g.sample_count,
                mean_rt: format!("{:.3}", g.mean_rt),
                mean_mz: format!("{:.4}", g.mean_mz),
                max_intensity: format!("{:.1}", g.max_intensity),
            })
        })
        .collect()
}
