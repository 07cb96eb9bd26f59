//! CLI definitions and command execution.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::constants;
use crate::error::{Error, Result};
use crate::logic::status::{evaluate, evaluate_all, manual_override, AssetStatus, Evaluation};
use crate::logic::{export, ingest, policy::Policy};
use crate::store::Database;

#[derive(Parser, Debug)]
#[command(name = constants::APP_NAME, version, about = "Asset hostname tracking and compliance classification")]
pub struct Cli {
    /// Set logging to debug
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List assets, optionally filtered
    List {
        /// Only assets with this status (repeatable)
        #[arg(long)]
        status: Vec<String>,
        /// Exclude assets with this status (repeatable)
        #[arg(long)]
        not_status: Vec<String>,
        /// Only assets with a sighting of this attribute kind (repeatable)
        #[arg(long)]
        attribute: Vec<String>,
        /// Exclude assets with a sighting of this attribute kind (repeatable)
        #[arg(long)]
        not_attribute: Vec<String>,
        /// Print raw JSON instead of one line per asset
        #[arg(long)]
        json: bool,
    },
    /// Show one asset and its attribute sightings (re-evaluated on read)
    Show {
        hostname: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete an asset and its sightings
    Delete { hostname: String },
    /// Manually override an asset's status (until the next evaluation)
    SetStatus { hostname: String, status: String },
    /// Re-evaluate one asset from its current sightings
    Evaluate { hostname: String },
    /// Re-evaluate every registered asset
    Refresh,
    /// Record, show or delete a single attribute sighting
    Attribute {
        hostname: String,
        /// The attribute kind (e.g. edr, av, ad)
        name: String,
        /// Detail about this sighting (e.g. the raw log line)
        #[arg(short, long)]
        detail: Option<String>,
        /// Observation time, RFC 3339 or 'Y-m-d H:M:S' UTC; defaults to now
        #[arg(short = 't', long)]
        observed: Option<String>,
        /// Delete the sighting instead
        #[arg(long)]
        delete: bool,
    },
    /// Import a JSON array of events
    ImportData {
        /// Path to the JSON data
        path: PathBuf,
        /// Data source name, used as the attribute kind for every event
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Export the database to a JSON report
    Export,
}

fn parse_status(value: &str) -> Result<AssetStatus> {
    AssetStatus::parse(value).ok_or_else(|| {
        Error::Validation(format!(
            "unknown status {:?}, expected one of: {}",
            value,
            AssetStatus::values().join(", ")
        ))
    })
}

/// Execute the parsed command.
pub fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env();
    let policy = Policy::from_settings(&settings)?;
    let db = Database::open(&settings.database_path)?;
    log::debug!("using database {}", settings.database_path.display());

    match cli.command {
        Commands::List {
            status,
            not_status,
            attribute,
            not_attribute,
            json,
        } => {
            let wanted: Vec<AssetStatus> = status
                .iter()
                .map(|s| parse_status(s))
                .collect::<Result<_>>()?;
            let unwanted: Vec<AssetStatus> = not_status
                .iter()
                .map(|s| parse_status(s))
                .collect::<Result<_>>()?;
            let attribute: Vec<String> = attribute.iter().map(|a| a.to_lowercase()).collect();
            let not_attribute: Vec<String> =
                not_attribute.iter().map(|a| a.to_lowercase()).collect();

            let mut rows = Vec::new();
            for asset in db.list_assets()? {
                if !wanted.is_empty() && !wanted.contains(&asset.status) {
                    continue;
                }
                if unwanted.contains(&asset.status) {
                    continue;
                }
                if !attribute.is_empty() || !not_attribute.is_empty() {
                    let names: Vec<String> = db
                        .list_sightings(&asset.hostname)?
                        .iter()
                        .map(|s| s.name.to_lowercase())
                        .collect();
                    if !attribute.iter().all(|a| names.contains(a)) {
                        continue;
                    }
                    if not_attribute.iter().any(|a| names.contains(a)) {
                        continue;
                    }
                }
                rows.push(asset);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&rows).map_err(
                    |e| Error::Persistence(e.to_string()),
                )?);
            } else {
                for asset in &rows {
                    println!("{}", asset);
                }
            }
        }

        Commands::Show { hostname, json } => {
            // Evaluate on read so the displayed status reflects current time.
            let evaluation = evaluate(&db, &policy, &hostname)?;
            if evaluation.changed {
                log::info!(
                    "{} status: {} -> {}",
                    evaluation.hostname,
                    evaluation.previous_status,
                    evaluation.status
                );
            }
            let asset = db.require_asset(&hostname)?;
            let sightings = db.list_sightings(&asset.hostname)?;

            if json {
                let mut value = serde_json::to_value(&asset)
                    .map_err(|e| Error::Persistence(e.to_string()))?;
                value["attributes"] = serde_json::to_value(&sightings)
                    .map_err(|e| Error::Persistence(e.to_string()))?;
                println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
            } else {
                println!("{}", asset);
                for attribute in &sightings {
                    println!("\t\u{21B3} {}", attribute);
                }
            }
        }

        Commands::Delete { hostname } => {
            db.delete_asset(&hostname)?;
            log::info!("deleted asset {}", hostname.to_uppercase());
        }

        Commands::SetStatus { hostname, status } => {
            let status = parse_status(&status)?;
            let changed = manual_override(&db, &hostname, status)?;
            if changed {
                log::info!("manually set {} to {}", hostname.to_uppercase(), status);
            } else {
                log::info!("{} already {}", hostname.to_uppercase(), status);
            }
            println!("{}", db.require_asset(&hostname)?);
        }

        Commands::Evaluate { hostname } => {
            let evaluation = evaluate(&db, &policy, &hostname)?;
            report_transition(&evaluation);
            println!("{}", db.require_asset(&hostname)?);
        }

        Commands::Refresh => {
            let batch = evaluate_all(&db, &policy)?;
            for evaluation in &batch.evaluated {
                report_transition(evaluation);
            }
            log::info!(
                "evaluated {} assets, {} changed, {} failed",
                batch.evaluated.len(),
                batch.changed_count(),
                batch.failed.len()
            );
            for (hostname, err) in &batch.failed {
                log::error!("{}: {}", hostname, err);
            }
        }

        Commands::Attribute {
            hostname,
            name,
            detail,
            observed,
            delete,
        } => {
            if delete {
                if db.delete_sighting(&hostname, &name)? {
                    log::info!("deleted attribute {} from {}", name, hostname.to_uppercase());
                } else {
                    log::warn!("no attribute {} on {}", name, hostname.to_uppercase());
                }
            } else if detail.is_none() && observed.is_none() {
                // Pure lookup.
                match db.get_sighting(&hostname, &name)? {
                    Some(attribute) => println!("{}", attribute),
                    None => log::warn!(
                        "no attribute {} on {}; pass --detail or --observed to record one",
                        name,
                        hostname.to_uppercase()
                    ),
                }
            } else {
                let observed = match observed {
                    Some(raw) => ingest::parse_observed(&raw).ok_or_else(|| {
                        Error::Validation(format!("unparseable observation time: {}", raw))
                    })?,
                    None => Utc::now(),
                };
                let evaluation =
                    ingest::ingest(&db, &policy, &hostname, &name, observed, detail.as_deref())?;
                report_transition(&evaluation);
                println!("{}", db.require_asset(&hostname)?);
            }
        }

        Commands::ImportData { path, source } => {
            let summary = ingest::import_file(&db, &policy, &path, source.as_deref())?;
            log::info!(
                "imported {} events, skipped {}",
                summary.imported,
                summary.skipped
            );
        }

        Commands::Export => {
            let path = export::export_report(&db, &constants::get_data_dir())?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

/// Status transitions are audit-worthy; log them at the CLI boundary.
fn report_transition(evaluation: &Evaluation) {
    if evaluation.changed {
        log::info!(
            "{} status: {} -> {}",
            evaluation.hostname,
            evaluation.previous_status,
            evaluation.status
        );
    }
}
