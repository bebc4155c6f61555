//! ActionTree CLI Entry Point
//!
//! Runs the built-in sample release pipeline.
//!
//! # Usage
//!
//! ```bash
//! # Run the whole tree
//! actiontree
//!
//! # Preview the actions that would run
//! actiontree --dry-run
//!
//! # Disable a subtree and make another step cancel
//! actiontree --disable build --cancel package
//!
//! # Save a JSON report
//! actiontree --report run.json
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use colored::Colorize;
use log::{error, info};

use actiontree::execution::{Engine, RunReport};
use actiontree::monitoring::EventType;
use actiontree::sample::{build_sample_tree, find_action, SampleOptions};
use actiontree::{APP_NAME, VERSION};

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    standalone: bool,
    dry_run: bool,
    disable: Vec<String>,
    sample: SampleOptions,
    report_path: Option<PathBuf>,
    verbose: bool,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME.bold(), VERSION);
    println!("Hierarchical Action Execution Engine");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: actiontree [OPTIONS]");
    println!();
    println!("Runs the sample release pipeline:");
    println!("  release > build > compile, test");
    println!("          > package > checksum");
    println!("          > publish (accessory: publish-preview)");
    println!();
    println!("Options:");
    println!("  --standalone        Run only the root action");
    println!("  --dry-run           List the actions that would run");
    println!("  --disable NAME      Disable an action before running (repeatable)");
    println!("  --skip NAME         Make an action return skip (repeatable)");
    println!("  --cancel NAME       Make an action return cancel (repeatable)");
    println!("  --fail NAME         Make an action fail (repeatable)");
    println!("  --report PATH       Write a JSON run report");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  actiontree --disable build");
    println!("  actiontree --cancel package --report run.json");
}

/// Returns the value following an option.
fn option_value<'a>(
    args: &'a [String],
    i: &mut usize,
    option: &str,
) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires an argument", option))
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--standalone" => config.standalone = true,
            "--dry-run" => config.dry_run = true,
            "--verbose" | "-v" => config.verbose = true,
            "--disable" => {
                let name = option_value(args, &mut i, arg)?;
                config.disable.push(name.to_string());
            }
            "--skip" => {
                let name = option_value(args, &mut i, arg)?;
                config.sample.skip.insert(name.to_string());
            }
            "--cancel" => {
                let name = option_value(args, &mut i, arg)?;
                config.sample.cancel.insert(name.to_string());
            }
            "--fail" => {
                let name = option_value(args, &mut i, arg)?;
                config.sample.fail.insert(name.to_string());
            }
            "--report" => {
                let path = option_value(args, &mut i, arg)?;
                config.report_path = Some(PathBuf::from(path));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => return Err(format!("Unexpected argument: {}", arg)),
        }
        i += 1;
    }

    Ok(config)
}

/// Prints the colored run summary, with the timing chart when verbose.
fn print_summary(report: &RunReport, verbose: bool) {
    println!();

    if report.dry_run {
        println!("{}", "Planned actions".bold());
        for entry in &report.plan {
            let marker = if !entry.enabled {
                "disabled".yellow()
            } else if !entry.valid {
                "invalid".red()
            } else {
                "ready".green()
            };
            println!("  {}{} [{}]", "  ".repeat(entry.depth), entry.name, marker);
        }
        println!();
        println!("{}", report.get_summary());
        return;
    }

    for event in &report.events {
        let label = match event.event_type {
            EventType::Started => "started".cyan(),
            EventType::Completed => "completed".green(),
            EventType::Skipped => "skipped".yellow(),
            EventType::Cancelled => "cancelled".magenta(),
            EventType::Failed => "failed".red(),
        };
        println!("  {:>6} ms  {:<10} {}", event.elapsed_ms, label, event.path);
    }

    if verbose {
        print!("{}", report.gantt_chart);
    }

    println!();
    let headline = if report.cancelled {
        report.get_summary().yellow()
    } else {
        report.get_summary().green()
    };
    println!("{}", headline);
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);
    print_banner();

    if config.dry_run {
        info!("Mode: DRY RUN (behaviors will not run)");
        println!();
    }

    let root = build_sample_tree(&config.sample)?;

    for name in config.sample.names() {
        if find_action(&root, name).is_none() {
            return Err(format!("No action named '{}' in the sample tree", name).into());
        }
    }

    for name in &config.disable {
        let action = find_action(&root, name)
            .ok_or_else(|| format!("No action named '{}' in the sample tree", name))?;
        info!("Disabling '{}'", action.name());
        action.disable();
    }

    let mut engine = Engine::new(root);
    engine.set_standalone(config.standalone);
    engine.set_dry_run(config.dry_run);

    let report = engine.run().map_err(|e| {
        error!("Run aborted");
        e
    })?;

    print_summary(&report, config.verbose);

    if let Some(path) = config.report_path {
        report.save(&path)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
