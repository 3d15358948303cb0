use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use common::config::Settings;
use etl::explore::{QueryRunner, Report};
use etl::models::RunSummary;
use etl::pipeline::{Phase, Pipeline};
use etl::sql::Region;
use etl::storage::S3Storage;
use etl::warehouse::RedshiftWarehouse;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let preflight = Arg::new("preflight")
        .long("preflight")
        .action(ArgAction::SetTrue)
        .help("Check that the S3 sources exist before loading");

    Command::new("songplay-etl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Loads song and event logs from S3 into a Redshift star schema")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .default_value("dwh.cfg")
                .help("Sets a custom config file"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .global(true)
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Output format for summaries and reports"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Log output format"),
        )
        .subcommand(Command::new("create-tables").about("Drop and recreate all tables"))
        .subcommand(
            Command::new("etl")
                .about("Load staging tables and populate the star schema")
                .arg(preflight.clone()),
        )
        .subcommand(
            Command::new("run")
                .about("Recreate tables, load and transform")
                .arg(preflight)
                .arg(
                    Arg::new("explore")
                        .long("explore")
                        .action(ArgAction::SetTrue)
                        .help("Run the exploratory reports afterwards"),
                ),
        )
        .subcommand(Command::new("explore").about("Print the exploratory reports"))
        .subcommand(Command::new("status").about("Print row counts for every table"))
        .subcommand(Command::new("verify-sources").about("Check that the S3 sources exist"))
}

fn init_tracing(format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    let log_format = matches
        .get_one::<String>("log-format")
        .map(|s| s.as_str())
        .unwrap_or("text");
    init_tracing(log_format);

    if let Err(e) = run(&matches).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config_path = matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or("dwh.cfg");
    let json = matches.get_one::<String>("format").map(|s| s.as_str()) == Some("json");

    let settings = Settings::new(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    info!(config = config_path, "Configuration loaded");

    match matches.subcommand() {
        Some(("create-tables", _)) => {
            let summary = etl::run_pipeline(&settings, &[Phase::Drop, Phase::Create], false).await?;
            print_summary(&summary, json)?;
        }
        Some(("etl", sub)) => {
            let summary =
                etl::run_pipeline(&settings, &[Phase::Copy, Phase::Insert], sub.get_flag("preflight"))
                    .await?;
            print_summary(&summary, json)?;
        }
        Some(("run", sub)) => {
            let mut phases = Phase::LOAD.to_vec();
            if sub.get_flag("explore") {
                phases.push(Phase::Explore);
            }
            let summary = etl::run_pipeline(&settings, &phases, sub.get_flag("preflight")).await?;
            print_summary(&summary, json)?;
        }
        Some(("explore", _)) => {
            let warehouse = RedshiftWarehouse::connect(&settings.cluster).await?;
            let reports = QueryRunner::run_all(&warehouse).await?;
            print_reports(&reports, json)?;
        }
        Some(("status", _)) => {
            let pipeline = Pipeline::from_settings(&settings)?;
            let warehouse = RedshiftWarehouse::connect(&settings.cluster).await?;
            let counts = pipeline.table_counts(&warehouse).await?;
            if json {
                let map: serde_json::Map<String, serde_json::Value> = counts
                    .iter()
                    .map(|(table, count)| (table.name().to_string(), (*count).into()))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                for (table, count) in counts {
                    println!("{:<16} {:>12}", table.name(), count);
                }
            }
        }
        Some(("verify-sources", _)) => {
            let pipeline = Pipeline::from_settings(&settings)?;
            let region = Region::parse(&settings.load.region)?;
            let storage = S3Storage::new(&region).await;
            pipeline.verify_sources(&storage).await?;
            println!("All sources present");
        }
        _ => anyhow::bail!("Please specify a valid subcommand"),
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    for phase in &summary.phases {
        println!(
            "{:<8} {:>3} statements {:>10} rows {:>8} ms",
            phase.phase.name(),
            phase.statements.len(),
            phase.rows_affected(),
            phase.elapsed_ms
        );
    }
    println!(
        "{} statements in {} ms",
        summary.statement_count(),
        summary.elapsed_ms()
    );
    Ok(())
}

fn print_reports(reports: &[Report], json: bool) -> anyhow::Result<()> {
    if json {
        let map: serde_json::Map<String, serde_json::Value> = reports
            .iter()
            .map(|r| Ok((r.query.name().to_string(), serde_json::to_value(&r.rows)?)))
            .collect::<serde_json::Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    for report in reports {
        println!("{}", report.query.title());
        for row in &report.rows {
            println!(
                "  {:<40} {:>8}",
                row.label.as_deref().unwrap_or("(unknown)"),
                row.count
            );
        }
    }
    Ok(())
}
