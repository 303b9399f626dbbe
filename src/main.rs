use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coaching_progress::config::{AppConfig, BackendConfig};
use coaching_progress::metrics::{Delta, MeasurementField};
use coaching_progress::models::StudentProfile;
use coaching_progress::portal::{Backend, Portal};
use coaching_progress::report;
use coaching_progress::resolver::{NotFoundReason, Resolution};
use coaching_progress::store::PgRecordStore;

#[derive(Parser)]
#[command(name = "coaching-progress")]
#[command(about = "Student progress lookups for the coaching dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the Postgres mirror schema
    InitDb,
    /// Import a CSV export into a Postgres mirror table
    Import {
        #[arg(long)]
        table: String,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Check an access code and show the matching profile
    Login {
        #[arg(long)]
        code: String,
    },
    /// Show recent measurements and changes since the previous one
    Measurements {
        #[arg(long)]
        code: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Generate a markdown progress report
    Report {
        #[arg(long)]
        code: String,
        #[arg(long, default_value = "progress.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::InitDb => {
            let store = postgres_store(&config).await?;
            store.init_db().await.context("failed to run migrations")?;
            println!("Schema ready.");
        }
        Commands::Import { table, csv } => {
            let store = postgres_store(&config).await?;
            let inserted = store
                .import_csv(&table, &csv)
                .await
                .with_context(|| format!("failed to import {}", csv.display()))?;
            println!("Inserted {inserted} records into {table} from {}.", csv.display());
        }
        Commands::Login { code } => {
            let portal = portal(&config).await?;
            let Some(profile) = sign_in(&portal, &code).await? else {
                return Ok(());
            };
            println!("Welcome, {} ({}).", profile.name, profile.status.label());
            if let Some(email) = &profile.email {
                println!("- Email: {email}");
            }
            if let (Some(initial), Some(target)) = (profile.initial_weight, profile.target_weight) {
                println!("- Weight goal: {initial:.1} kg -> {target:.1} kg");
            }
            if let Some(objectives) = &profile.objectives {
                println!("- Objectives: {objectives}");
            }
        }
        Commands::Measurements { code, limit } => {
            let portal = portal(&config).await?;
            let Some(profile) = sign_in(&portal, &code).await? else {
                return Ok(());
            };
            let dashboard = portal.dashboard(profile).await?;

            if dashboard.series.is_empty() {
                println!("No measurements recorded yet.");
                return Ok(());
            }

            println!("Latest measurements for {}:", dashboard.profile.first_name());
            for snapshot in dashboard.series.latest_first.iter().take(limit) {
                println!("- {}: {:.1} kg", snapshot.date, snapshot.weight);
            }

            println!("Changes since previous measurement:");
            for field in MeasurementField::ALL {
                if let Delta::Change { magnitude, direction } = dashboard.series.field_delta(field) {
                    println!("- {}: {magnitude:.1} {} ({direction:?})", field.label(), field.unit());
                }
            }

            if let Some(percent) = dashboard.weight_progress {
                println!("Weight goal progress: {percent:.0}%");
            }
        }
        Commands::Report { code, out } => {
            let portal = portal(&config).await?;
            let Some(profile) = sign_in(&portal, &code).await? else {
                return Ok(());
            };
            let dashboard = portal.dashboard(profile).await?;
            std::fs::write(&out, report::build_report(&dashboard))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn portal(config: &AppConfig) -> anyhow::Result<Portal> {
    let backend = Backend::from_config(&config.backend)
        .await
        .context("failed to connect to the record store")?;
    Ok(Portal::new(backend, config.tables.clone()))
}

async fn postgres_store(config: &AppConfig) -> anyhow::Result<PgRecordStore> {
    let BackendConfig::Postgres { database_url } = &config.backend else {
        bail!("DATABASE_URL must be set (and Airtable unset) to manage the Postgres mirror");
    };
    PgRecordStore::connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn sign_in(portal: &Portal, code: &str) -> anyhow::Result<Option<StudentProfile>> {
    let resolution = portal
        .verify_access(code)
        .await
        .context("record store unavailable, try again later")?;

    match resolution {
        Resolution::Found(profile) => Ok(Some(profile)),
        Resolution::Unconfigured => {
            println!("No data source configured. Set AIRTABLE_API_KEY and AIRTABLE_BASE_ID, or DATABASE_URL.");
            Ok(None)
        }
        Resolution::NotFound(NotFoundReason::EmptyTable) => {
            println!("No student records available.");
            Ok(None)
        }
        Resolution::NotFound(_) => {
            println!("Access code not recognised or account inactive.");
            Ok(None)
        }
    }
}
