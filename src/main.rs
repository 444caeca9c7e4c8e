use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use checkfactor::daemon::{PollLoop, Snapshot, evaluate_all};
use checkfactor::direction::{self, Direction};
use checkfactor::status::{Classification, Rgba, classify, legend};
use checkfactor::products;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging(level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("checkfactor")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("checkfactor.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.unwrap_or("info")))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn resolve_directions(config: &Config) -> Result<Vec<Direction>> {
    if config.directions.is_empty() {
        direction::discover(&config.working_dir).context("Failed to discover directions")
    } else {
        Ok(direction::from_names(&config.working_dir, &config.directions))
    }
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application in {}", config.working_dir.display());

    match &cli.command {
        None => handle_status_command(false, config),
        Some(Commands::Status { json }) => handle_status_command(*json, config),
        Some(Commands::Info { direction }) => handle_info_command(direction, config),
        Some(Commands::Watch { interval, json }) => handle_watch_command(*interval, *json, config),
        Some(Commands::Products { direction }) => handle_products_command(direction, config),
        Some(Commands::Legend) => handle_legend_command(config),
    }
}

fn swatch(color: Rgba) -> ColoredString {
    let (r, g, b) = color.to_rgb8();
    "  ".on_truecolor(r, g, b)
}

fn print_table(directions: &[Direction], entries: &[Classification], config: &Config) {
    let width = directions
        .iter()
        .map(|d| d.display_name(config.trim_names).len())
        .max()
        .unwrap_or(0);

    for (direction, entry) in directions.iter().zip(entries) {
        let state = entry.state.with_reimage_stage(config.reimages);
        println!(
            "{} {:<width$}  {:<15} {}",
            swatch(state.color()),
            direction.display_name(config.trim_names).bold(),
            state.label(),
            format!("({} completed)", entry.completed_count).dimmed(),
            width = width
        );
    }
}

fn handle_status_command(json: bool, config: &Config) -> Result<()> {
    let directions = resolve_directions(config)?;
    let timeout = config.poll.to_poll_config().evaluation_timeout;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    let (entries, unavailable) = runtime.block_on(evaluate_all(&directions, timeout));
    runtime.shutdown_timeout(Duration::from_secs(1));
    info!("Checked {} directions ({} unavailable)", entries.len(), unavailable);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_table(&directions, &entries, config);
    }
    Ok(())
}

fn handle_info_command(name: &str, config: &Config) -> Result<()> {
    let directions = resolve_directions(config)?;
    let direction = direction::find(&directions, name)?;
    let result = classify(direction).context(format!("Failed to check {}", direction.name))?;

    let state = result.state.with_reimage_stage(config.reimages);
    println!("{} {}", swatch(state.color()), state.label().bold());
    println!("{}", result.detail);
    Ok(())
}

fn print_snapshot(directions: &[Direction], snapshot: &Snapshot, json: bool, config: &Config) {
    if json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => log::error!("Failed to serialize snapshot: {}", e),
        }
        return;
    }

    println!(
        "{} {} ({:?})",
        "Check".cyan(),
        snapshot.cycle,
        snapshot.trigger
    );
    println!("{}", snapshot.taken_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed());
    print_table(directions, &snapshot.entries, config);
    println!();
}

fn handle_watch_command(interval: Option<u64>, json: bool, config: &Config) -> Result<()> {
    let directions = resolve_directions(config)?;
    let mut poll_config = config.poll.to_poll_config();
    if let Some(secs) = interval {
        if secs == 0 {
            eyre::bail!("Interval must be greater than zero");
        }
        poll_config.interval = Duration::from_secs(secs);
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    let state = runtime.block_on(async {
        let (poll, handle) = PollLoop::new(poll_config, directions.clone());

        let ctrl_c_handle = handle.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the current check");
                ctrl_c_handle.shutdown();
            }
        });

        // Enter on stdin asks for an immediate check
        let refresh_handle = handle.clone();
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if line.is_err() {
                    break;
                }
                if !refresh_handle.refresh() {
                    log::debug!("Refresh already pending");
                }
            }
        });

        poll.run(|snapshot| print_snapshot(&directions, &snapshot, json, config))
            .await
    });
    // Timed-out evaluations may still hold blocking workers
    runtime.shutdown_timeout(Duration::from_secs(1));

    info!(
        "Watch finished: {} checks, {} evaluations, {} unavailable",
        state.cycle_count, state.total_evaluations, state.total_unavailable
    );
    Ok(())
}

fn print_paths(title: &str, paths: &[PathBuf]) {
    println!("{}", title.cyan());
    if paths.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for path in paths {
        println!("  {}", path.display());
    }
}

fn handle_products_command(name: &str, config: &Config) -> Result<()> {
    let directions = resolve_directions(config)?;
    let direction = direction::find(&directions, name)?;

    if !direction.is_field() {
        print_paths("Selfcal images:", &products::selfcal_images(direction));
        print_paths("TEC solution plots:", &products::selfcal_tec_plots(direction));
        print_paths("Gain solution plots:", &products::selfcal_gain_plots(direction));
        print_paths("Verification images:", &products::verify_images(direction));
    }

    let facet_images = products::facet_images(direction);
    println!("{}", "Full images:".cyan());
    if facet_images.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for image in facet_images {
        println!("  {} {}", format!("[{}]", image.operation).yellow(), image.path.display());
    }
    Ok(())
}

fn handle_legend_command(config: &Config) -> Result<()> {
    for (label, color) in legend(config.reimages) {
        println!("{} {:<15} {}", swatch(color), label, color.to_hex().dimmed());
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(dir) = &cli.working_dir {
        config.working_dir = dir.clone();
    }

    setup_logging(cli.log_level(config.log_level.as_deref())).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
