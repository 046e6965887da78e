use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use course_stats_analysis::CourseStudy;
use course_stats_cli::{load_dataset, render_json, render_text, FullReport};
use course_stats_core::ConfigLoader;
use course_stats_robustness::RobustnessSuite;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "course-stats")]
#[command(
    about = "Hypothesis tests, data-quality triage and robustness checks for course completion data",
    long_about = None
)]
struct Cli {
    /// Course completion CSV file
    data: PathBuf,
    /// Optional TOML config file; COURSE_STATS_* environment variables override it
    #[arg(short, long, env = "COURSE_STATS_CONFIG")]
    config: Option<PathBuf>,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Skip the robustness checks
    #[arg(long)]
    skip_robustness: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::load(cli.config.as_deref())?;
    let dataset = load_dataset(&cli.data)?;

    let study = CourseStudy::run(&dataset, &config).context("Course study failed")?;
    let robustness = if cli.skip_robustness {
        None
    } else {
        Some(RobustnessSuite::run(&dataset, &config).context("Robustness checks failed")?)
    };
    let report = FullReport { study, robustness };
    match cli.format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }

    Ok(())
}
