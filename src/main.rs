use clap::Parser;
use std::path::PathBuf;
use std::process;

mod aws;
mod config;
mod display;
mod error;
mod logging;
mod platform;
mod policy;
mod provision;

use config::SetupConfig;
use error::SetupError;

const VERSION: &str = env!("EDGE_SETUP_VERSION");

#[derive(Parser, Debug)]
#[command(name = "edge-device-setup")]
#[command(about = "Provision the IAM role and policies a SageMaker Edge device fleet needs")]
#[command(
    long_about = "edge-device-setup makes sure the device fleet role exists, creates the fleet and bucket policies if they are missing, and attaches both to the role.\n\nIt is safe to run repeatedly: existing resources are reused and nothing is attached twice.\n\nExample: edge-device-setup --account 123456789012 --device-fleet MyFleet --device-name device-1"
)]
#[command(version = VERSION)]
pub struct Cli {
    #[arg(long, required_unless_present = "dist", help = "AWS account id")]
    pub account: Option<String>,

    #[arg(long, default_value = "us-west-2", help = "AWS region")]
    pub region: String,

    #[arg(
        long,
        alias = "deviceFleet",
        required_unless_present = "dist",
        help = "Name of the device fleet"
    )]
    pub device_fleet: Option<String>,

    #[arg(
        long,
        alias = "deviceName",
        required_unless_present = "dist",
        help = "Name of the device"
    )]
    pub device_name: Option<String>,

    #[arg(long, help = "Target operating system (default: the platform of this binary)")]
    pub os: Option<String>,

    #[arg(long, help = "Target architecture (default: the platform of this binary)")]
    pub arch: Option<String>,

    #[arg(long, help = "Accelerator on the device")]
    pub accelerator: Option<String>,

    #[arg(
        long,
        alias = "iotThingType",
        help = "IoT thing type for the device (default: Sagemaker_<device fleet>)"
    )]
    pub iot_thing_type: Option<String>,

    #[arg(
        long,
        alias = "iotThingName",
        help = "IoT thing name for the device (default: Sagemaker_<device name>)"
    )]
    pub iot_thing_name: Option<String>,

    #[arg(
        long,
        alias = "deviceFleetRole",
        help = "IAM role for the device fleet (default: Sagemaker_<device fleet>_role)"
    )]
    pub device_fleet_role: Option<String>,

    #[arg(
        long,
        alias = "deviceFleetBucket",
        help = "S3 bucket for device data (default: sagemaker-edge-<account>-<device fleet>)"
    )]
    pub device_fleet_bucket: Option<String>,

    #[arg(
        long,
        alias = "s3FolderPrefix",
        help = "S3 prefix for captured data (default: demo)"
    )]
    pub s3_folder_prefix: Option<String>,

    #[arg(
        long,
        alias = "agentDirectory",
        help = "Local path to store the agent (default: ./demo-agent)"
    )]
    pub agent_directory: Option<PathBuf>,

    #[arg(long, help = "Print distribution information and exit")]
    pub dist: bool,
}

async fn run(cli: Cli) -> Result<(), SetupError> {
    let cwd = std::env::current_dir()?;
    let config = SetupConfig::from_args(cli, &cwd)?;
    display::print_block(&config.to_string());

    let client = aws::client::create_iam_client(&config.region).await;

    display::print_info("Provisioning IAM role and policies for the device fleet...");
    let outcome = provision::provision(&client, &config).await?;

    if !outcome.created.is_empty() {
        display::print_warning(
            "New IAM resources can take a few seconds to propagate before they are usable",
        );
    }
    display::print_success(&format!("Device fleet role {} is ready", outcome.role.name));
    display::print_block(&display::outcome_summary(&outcome));

    Ok(())
}

#[tokio::main]
async fn main() {
    logging::init_logging();

    let cli = Cli::parse();

    display::print_block(&display::dist_info(VERSION));
    if cli.dist {
        return;
    }

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        process::exit(1);
    }
}
