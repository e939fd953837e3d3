use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, error, info};
use oxiunused_exports::{Config, RunReport, Session};
use std::io::{BufWriter, Write};
use std::process;
use std::sync::atomic::AtomicBool;

#[derive(Parser)]
#[command(name = "oxiunused")]
#[command(
    about = "Static export usage analysis for JavaScript/TypeScript web apps",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Find unused exports, missing imports and framework entry points
    UnusedExports(Config),
}

fn print_report<W: Write>(out: &mut W, report: &RunReport) -> Result<()> {
    oxiunused_exports::print_unused_tree(out, &report.result)?;
    oxiunused_exports::print_summary(out, &report.result, &report.documents)?;
    writeln!(
        out,
        "\n{} Finished in {}ms on {} files (using {} threads).",
        "●".bright_blue(),
        report.elapsed.as_millis().to_string().cyan(),
        report.files_analyzed.to_string().cyan(),
        rayon::current_num_threads().to_string().cyan()
    )?;
    out.flush()?;
    Ok(())
}

fn report_failure(err: &anyhow::Error) {
    error!("Analysis failed: {:#}", err);
    eprintln!("{} {:#}", "✗ Analysis failed:".red().bold(), err);
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is line buffered, a BufWriter keeps the tree output to a few syscalls.
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    match cli.command {
        Commands::UnusedExports(mut cfg) => {
            if let Err(e) = cfg.initialize() {
                report_failure(&e);
                process::exit(2);
            }
            let session = Session::new();

            if cfg.watch {
                info!("Starting watch mode");
                // Runs until the process is interrupted.
                let stop = AtomicBool::new(false);
                oxiunused_exports::watch(&session, &cfg, &stop, |outcome| match outcome {
                    Ok(report) => {
                        if let Err(e) = print_report(&mut stdout, &report) {
                            error!("Failed to print report: {:#}", e);
                        }
                    }
                    Err(e) => report_failure(&e),
                })?;
                return Ok(());
            }

            let report = match session.run_full_analysis(&cfg) {
                Ok(Some(report)) => report,
                Ok(None) => return Ok(()),
                Err(e) => {
                    report_failure(&e);
                    process::exit(2);
                }
            };
            debug!("Found {} unused exports", report.result.unused_exports.len());

            print_report(&mut stdout, &report)?;

            if cfg.fail_on_unused && !report.result.unused_exports.is_empty() {
                // Non-zero exit to fail CI
                process::exit(1);
            }
            Ok(())
        }
    }
}
