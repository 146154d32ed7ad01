//! zirnevis - Persian subtitle translation
//!
//! Entry point for the command line tool that translates SRT and VTT
//! subtitle files into Persian with Gemini, one cue at a time.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use zirnevis::cli::{Args, Commands};
use zirnevis::config::Config;
use zirnevis::progress::ProgressReporter;
use zirnevis::translate::{SubjectProfile, AVAILABLE_MODELS, DEFAULT_MODEL};
use zirnevis::workflow::{FileReport, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Translate { input, output, options } => {
            options.apply(&mut config)?;
            info!("Translating subtitles: {}", input.display());

            let mut workflow = Workflow::new(config)?;
            let mut reporter = ProgressReporter::new();
            let report = workflow
                .translate_file(&input, output.as_deref(), &mut reporter)
                .await?;
            print_report(&report);
        }
        Commands::Batch { input_dir, output_dir, options } => {
            options.apply(&mut config)?;

            let mut workflow = Workflow::new(config)?;
            let mut reporter = ProgressReporter::new();
            let reports = workflow
                .process_directory(&input_dir, output_dir.as_deref(), &mut reporter)
                .await?;

            for report in &reports {
                print_report(report);
            }
            println!("\nTranslated {} file(s)", reports.len());
        }
        Commands::Review { input } => {
            let mut workflow = Workflow::new(config)?;
            workflow.load_file(&input).await?;

            println!("{:<6} {:<15} {:<15} {}", "ID", "Start", "End", "Text");
            println!("{}", "-".repeat(80));
            for (cue, _) in workflow.orchestrator().entries() {
                println!(
                    "{:<6} {:<15} {:<15} {}",
                    cue.id,
                    cue.start_time,
                    cue.end_time,
                    cue.text.replace('\n', " / ")
                );
            }
            println!("\n{} cue(s)", workflow.orchestrator().cues().len());
        }
        Commands::Subjects => {
            println!("\nSubject Profiles:");
            println!("{:<36} {:<36}", "Label", "Slug");
            println!("{}", "-".repeat(72));
            for profile in SubjectProfile::ALL {
                println!("{:<36} {:<36}", profile.label(), profile.slug());
            }

            println!("\nAvailable Models:");
            for model in AVAILABLE_MODELS {
                let marker = if *model == DEFAULT_MODEL { " (default)" } else { "" };
                println!("  {}{}", model, marker);
            }
        }
        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists, use --force to overwrite", path.display());
            }
            config.save_to_file(&path)?;
            println!("Wrote configuration to {}", path.display());
        }
    }

    Ok(())
}

fn print_report(report: &FileReport) {
    match &report.output {
        Some(output) => println!(
            "{} -> {} ({}/{} translated, {} failed)",
            report.input.display(),
            output.display(),
            report.translated,
            report.cues,
            report.failed
        ),
        None => println!("{}: no subtitles to translate", report.input.display()),
    }

    if let Some(notice) = &report.notice {
        println!("{}", notice);
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".zirnevis").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "zirnevis.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("zirnevis.log").display()
    );

    Ok(())
}
