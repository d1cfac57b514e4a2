use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use inventory_infra::aws::AwsCloud;
use inventory_infra::clock::SystemClock;
use inventory_infra::config::{DeployArgs, DeployConfig, TeardownArgs, TeardownConfig};
use inventory_infra::ensure::Timing;
use inventory_infra::provision::Provisioner;
use inventory_infra::teardown::teardown;

#[derive(Parser)]
#[command(
    name = "inventory_infra",
    about = "Provision or tear down the inventory pipeline",
    long_about = "Provision or tear down the inventory pipeline.\n\
                  Settings come from flags, the environment, or a .env file."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update every pipeline resource and print a summary
    Deploy(DeployArgs),
    /// Delete every pipeline resource, skipping those already gone
    Teardown(TeardownArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Deploy(args) => {
            let config = DeployConfig::try_from(args).context("invalid deploy configuration")?;
            let cloud = AwsCloud::connect(&config.region).context("failed to start AWS clients")?;
            let clock = SystemClock;
            let report = Provisioner::new(&cloud, Timing::new(&clock))
                .run(&config)
                .context("deploy failed")?;
            println!("{report}");
        }
        Commands::Teardown(args) => {
            let config =
                TeardownConfig::try_from(args).context("invalid teardown configuration")?;
            let cloud = AwsCloud::connect(&config.region).context("failed to start AWS clients")?;
            info!(
                region = %config.region,
                suffix = %config.names.suffix,
                "tearing down inventory pipeline"
            );
            let report = teardown(&cloud, &config);
            println!("{report}");
        }
    }

    Ok(())
}
