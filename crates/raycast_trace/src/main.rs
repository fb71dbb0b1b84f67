//! Ray Cast Trace CLI
//!
//! Replays a recorded JSON event trace and prints what settled and when.

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "raycast_trace")]
#[command(about = "Replay ray cast hit/miss traces through the correlation engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Replay a trace file
    Replay {
        /// Input trace JSON file path
        #[arg(long)]
        trace: PathBuf,

        /// Output report JSON file path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Only print the summary
        #[arg(long, default_value = "false")]
        quiet: bool,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { trace, report, quiet } => {
            println!("Replaying trace...");
            println!("   Input: {}", trace.display());

            let result = raycast_trace::replay_file(&trace)?;

            if !quiet {
                print_settlements(&result);
            }
            print_summary(&result);

            if let Some(report_path) = report {
                raycast_trace::save_report(&report_path, &result)?;
                println!("\nReport saved to: {}", report_path.display());
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_settlements(report: &raycast_trace::TraceReport) {
    println!();
    for s in &report.settlements {
        match s.point {
            Some(p) => println!(
                "   [{:>4}] {} {} {:?} at ({:.3}, {:.3}, {:.3})",
                s.event, s.player, s.id, s.settlement, p.x, p.y, p.z
            ),
            None => println!("   [{:>4}] {} {} {:?}", s.event, s.player, s.id, s.settlement),
        }
    }
    for r in &report.rejected {
        println!("   [{:>4}] rejected: {}", r.event, r.reason);
    }
}

#[cfg(feature = "cli")]
fn print_summary(report: &raycast_trace::TraceReport) {
    let stats = &report.stats;
    println!("\nReplay finished");
    println!("   Issued:          {}", stats.issued);
    println!("   Hits:            {}", stats.hits);
    println!("   Misses:          {}", stats.misses);
    println!("   Pruned:          {}", stats.pruned);
    println!("   Orphaned hits:   {}", stats.orphaned_hits);
    println!("   Orphaned misses: {}", stats.orphaned_misses);
    println!("   Still active:    {}", report.still_active);
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("raycast_trace CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
