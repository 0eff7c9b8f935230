// SPDX-License-Identifier: GPL-3.0-only

//! Deployment agent CLI
//!
//! Drives the disk engine against a fixture disk set: enumerate,
//! run a selection pipeline, apply a partition plan, inspect a BCD
//! store dump. Native service loaders are injected by the hosting
//! task-sequence runtime; this binary wires the fixture backends for
//! dry runs and plan validation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

use deploy_bcd::{BcdStore, BcdValue, MemoryHive};
use deploy_contracts::Disk;
use deploy_disks::{DiskManager, apply_pipeline, default_partition_scheme};
use deploy_testing::{FixtureQueryExecutor, FixtureServiceLoader, FixtureVdsService, load_fixtures};
use deploy_types::{DiskSelectionStep, PartitionDefinition, bytes_to_pretty};
use deploy_vds::{VdsDiskOperations, VdsDiskProvider};
use deploy_wmi::{WmiDiskOperations, WmiDiskProvider};

mod apply;
mod config;

use config::AgentConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Vds,
    Wmi,
}

#[derive(Parser)]
#[command(name = "deploy-agent", about = "deploykit disk engine agent")]
struct Cli {
    /// Agent configuration (TOML); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fixture disk set (JSON) the backends serve
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    /// Native backend to drive
    #[arg(long, global = true, value_enum, default_value_t = Backend::Vds)]
    backend: Backend,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enumerate disks and print them
    Disks,

    /// Run a selection pipeline (JSON list of steps) over the disks
    Select {
        /// Selection steps file
        #[arg(long)]
        steps: PathBuf,
    },

    /// Clean and partition one disk per a plan (or the default scheme)
    Apply {
        /// Target disk id; required unless exactly one disk remains
        #[arg(long)]
        disk: Option<Uuid>,

        /// Partition definitions file (JSON); default scheme if omitted
        #[arg(long)]
        plan: Option<PathBuf>,
    },

    /// Parse and print a BCD store dump (JSON-shaped hive)
    Bcd {
        /// Store dump file
        #[arg(long)]
        store: PathBuf,
    },
}

async fn build_manager(cli: &Cli) -> Result<DiskManager> {
    let fixtures_path = cli
        .fixtures
        .as_ref()
        .context("--fixtures is required for disk commands")?;
    let json = std::fs::read_to_string(fixtures_path)
        .with_context(|| format!("reading fixtures {}", fixtures_path.display()))?;
    let fixtures = load_fixtures(&json)
        .with_context(|| format!("parsing fixtures {}", fixtures_path.display()))?;

    match cli.backend {
        Backend::Vds => {
            let service = FixtureVdsService::new(&fixtures);
            let provider = VdsDiskProvider::connect(FixtureServiceLoader::new(service)).await?;
            let ops = Arc::new(VdsDiskOperations::new(&provider));
            Ok(DiskManager::new(Arc::new(provider), ops))
        }
        Backend::Wmi => {
            let executor = Arc::new(FixtureQueryExecutor::new(&fixtures));
            let provider = WmiDiskProvider::new(executor);
            let ops = Arc::new(WmiDiskOperations::new(&provider));
            Ok(DiskManager::new(Arc::new(provider), ops))
        }
    }
}

async fn print_disks(disks: &[Disk], cancel: &CancellationToken) -> Result<()> {
    for disk in disks {
        let info = disk.info();
        let partitions = disk.partitions(cancel).await?;
        println!(
            "{}  {:<24} {:>10}  {}  {}  {} partition(s)",
            info.id,
            info.friendly_name,
            bytes_to_pretty(info.size, false),
            info.bus_type,
            info.partition_style,
            partitions.len(),
        );
        for partition in partitions {
            println!(
                "    #{} @{:<12} {:>10}  {}",
                partition.index,
                partition.offset,
                bytes_to_pretty(partition.size, false),
                partition
                    .partition_type
                    .name()
                    .unwrap_or("unknown type"),
            );
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = AgentConfig::load_or_default(cli.config.as_deref())?;
    let cancel = CancellationToken::new();

    match &cli.command {
        Command::Disks => {
            let manager = build_manager(&cli).await?;
            let disks = manager.get_disks(&cancel).await?;
            print_disks(&disks, &cancel).await?;
        }

        Command::Select { steps } => {
            let manager = build_manager(&cli).await?;
            let text = std::fs::read_to_string(steps)
                .with_context(|| format!("reading steps {}", steps.display()))?;
            let steps: Vec<DiskSelectionStep> =
                serde_json::from_str(&text).context("parsing selection steps")?;

            let disks = manager.get_disks(&cancel).await?;
            let selected = apply_pipeline(&steps, disks, &cancel).await?;
            if selected.is_empty() {
                bail!("selection pipeline eliminated every disk");
            }
            print_disks(&selected, &cancel).await?;
        }

        Command::Apply { disk, plan } => {
            let manager = build_manager(&cli).await?;
            let disks = manager.get_disks(&cancel).await?;

            let target = match disk {
                Some(id) => disks
                    .iter()
                    .find(|d| d.id() == *id)
                    .with_context(|| format!("no disk with id {id}"))?,
                None => match disks.as_slice() {
                    [only] => only,
                    _ => bail!("--disk is required when more than one disk is present"),
                },
            };

            let definitions: Vec<PartitionDefinition> = match plan {
                Some(path) => {
                    let text = std::fs::read_to_string(path)
                        .with_context(|| format!("reading plan {}", path.display()))?;
                    serde_json::from_str(&text).context("parsing partition plan")?
                }
                None => default_partition_scheme(
                    target.info().partition_style,
                    &config.partitioning,
                ),
            };

            apply::apply_plan(&manager, &config.vds, target.info(), &definitions, &cancel)
                .await?;
            println!("plan applied to {}", target.id());
        }

        Command::Bcd { store } => {
            let text = std::fs::read_to_string(store)
                .with_context(|| format!("reading store {}", store.display()))?;
            let hive: MemoryHive = serde_json::from_str(&text).context("parsing store dump")?;
            let parsed = BcdStore::open(&hive.root())?;

            for object in parsed.objects() {
                println!(
                    "{{{}}} {} ({})",
                    object.id(),
                    object.object_type(),
                    object.name().unwrap_or("unnamed"),
                );
                for element in object.elements() {
                    let rendered = match element.value() {
                        BcdValue::Boolean(value) => value.to_string(),
                        BcdValue::Guid(guid) => format!("{{{guid}}}"),
                        BcdValue::GuidList(guids) => format!("{} object(s)", guids.len()),
                        BcdValue::IntegerList(values) => format!("{values:?}"),
                        BcdValue::Raw(raw) => format!("{raw:?}"),
                    };
                    println!(
                        "  {} {:<24} = {}",
                        element.element_type(),
                        element.name().unwrap_or("?"),
                        rendered,
                    );
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("deploy_agent=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli).await
}
