mod commands;
mod logging;
mod progress;

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use opteyes_core::storage::IndexStore;
use opteyes_core::{AppConfig, Database};
use progress::CliReporter;
use tracing::error;

fn main() {
    dotenv().ok();

    let guard = logging::init_logger();

    let args = Cli::parse();

    let mut config = match opteyes_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            drop(guard);
            process::exit(1);
        }
    };
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }

    let result = match args.command {
        Some(Commands::Sync { json }) => run_sync(&config, json),
        Some(Commands::Add {
            dataset,
            label,
            images,
        }) => run_add(&config, &dataset, &label, &images),
        Some(Commands::List) => run_list(&config),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            Ok(())
        }
        Some(Commands::TruncateDb) => run_truncate(&config),
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        drop(guard);
        process::exit(1);
    }
}

fn open_database(config: &AppConfig) -> anyhow::Result<Database> {
    Database::open(&config.database_path)
        .with_context(|| format!("opening index database {}", config.database_path))
}

fn run_sync(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let db = open_database(config)?;
    let reporter = CliReporter::new();
    let report = match opteyes_core::reconcile(&db, Path::new(&config.data_dir), &reporter) {
        Ok(report) => report,
        Err(err) => {
            reporter.finish_bar();
            return Err(err).context("sync aborted, index left unchanged");
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "datasets: {} added, {} removed",
        format!("{}", report.datasets_added).green(),
        format!("{}", report.datasets_removed).red(),
    );
    println!(
        "datapoints: {} added, {} updated, {} removed",
        format!("{}", report.datapoints_added).green(),
        format!("{}", report.datapoints_updated).cyan(),
        format!("{}", report.datapoints_removed).red(),
    );
    if report.malformed_entries > 0 {
        println!(
            "{} entries ignored (not a datapoint id)",
            format!("{}", report.malformed_entries).yellow()
        );
    }
    Ok(())
}

fn run_add(
    config: &AppConfig,
    dataset: &str,
    label: &str,
    images: &[std::path::PathBuf],
) -> anyhow::Result<()> {
    let images = images
        .iter()
        .map(|path| fs::read(path).with_context(|| format!("reading {}", path.display())))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let db = open_database(config)?;
    let id = opteyes_core::add_datapoint(&db, dataset, label, &images)?;
    println!("Successfully added datapoint {}", format!("{}", id).green());
    Ok(())
}

fn run_list(config: &AppConfig) -> anyhow::Result<()> {
    let db = open_database(config)?;
    for dataset in db.list_datasets()? {
        let count = db.count_datapoints_in_dataset(dataset.id)?;
        println!(
            "{:>5}  {:<24} {:>7} datapoints  {}",
            dataset.id,
            dataset.name.bold(),
            count,
            dataset.path.dimmed()
        );
    }
    Ok(())
}

fn run_truncate(config: &AppConfig) -> anyhow::Result<()> {
    if !prompt_confirm(
        "Are you SURE you want to COMPLETELY DELETE the Database?",
        Some(false),
    )? {
        return Ok(());
    }
    open_database(config)?.truncate_all()?;
    println!("All tables truncated");
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
