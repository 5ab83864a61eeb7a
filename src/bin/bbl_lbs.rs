//! bbl-lbs - Load balancer commands for bbl environments
//!
//! Loads `bbl-state.json` from the state directory, runs one command
//! against it and persists the result.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use lb_provisioner::aws::AwsCli;
use lb_provisioner::bosh::{BoshCli, CloudConfigGenerator, HttpDirectorClient};
use lb_provisioner::certificates::{PemCertificateValidator, StoreCertificateManager};
use lb_provisioner::environment::InfrastructureEnvironmentValidator;
use lb_provisioner::guid::UuidGenerator;
use lb_provisioner::terraform::{Executor, OutputProvider, TerraformCli, TerraformManager};
use lb_provisioner::{
    Collaborators, CreateLbs, CreateLbsConfig, DeleteLbs, DeleteLbsConfig, FileStateStore, Lbs,
};

/// Manage the load balancer of a bbl environment
#[derive(Parser, Debug)]
#[command(name = "bbl-lbs", version, about)]
struct Cli {
    /// Directory holding bbl-state.json
    #[arg(long, global = true, default_value = ".", env = "BBL_STATE_DIR")]
    state_dir: String,

    /// AWS access key id (overrides the value in state)
    #[arg(long, global = true, env = "BBL_AWS_ACCESS_KEY_ID")]
    aws_access_key_id: Option<String>,

    /// AWS secret access key (overrides the value in state)
    #[arg(long, global = true, env = "BBL_AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    aws_secret_access_key: Option<String>,

    /// AWS region (overrides the value in state)
    #[arg(long, global = true, env = "BBL_AWS_REGION")]
    aws_region: Option<String>,

    /// aws CLI binary
    #[arg(long, global = true, default_value = "aws", env = "AWS_CLI")]
    aws_cli: String,

    /// terraform binary
    #[arg(long, global = true, default_value = "terraform", env = "TERRAFORM_BINARY")]
    terraform_binary: String,

    /// bosh CLI binary
    #[arg(long, global = true, default_value = "bosh", env = "BOSH_CLI")]
    bosh_cli: String,

    /// Director reachability timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    director_timeout: u64,

    /// Debug logging
    #[arg(long, short, global = true, default_value = "false")]
    verbose: bool,

    /// JSON log lines
    #[arg(long, global = true, default_value = "false")]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Attach a load balancer
    CreateLbs {
        /// Load balancer type: concourse or cf
        #[arg(long = "type", default_value = "")]
        lb_type: String,

        /// Path to the certificate
        #[arg(long, default_value = "")]
        cert: String,

        /// Path to the private key
        #[arg(long, default_value = "")]
        key: String,

        /// Path to the certificate chain
        #[arg(long, default_value = "")]
        chain: String,

        /// System domain (cf only)
        #[arg(long, default_value = "")]
        domain: String,

        /// Do nothing when a load balancer is already attached
        #[arg(long, default_value = "false")]
        skip_if_exists: bool,
    },

    /// Remove the attached load balancer
    DeleteLbs {
        /// Do nothing when no load balancer is attached
        #[arg(long, default_value = "false")]
        skip_if_missing: bool,
    },

    /// Show the attached load balancer
    Lbs {
        /// Print as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

fn init_logging(verbose: bool, json: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let store = Arc::new(FileStateStore::new(&cli.state_dir));
    let mut state = store.get().await?;
    debug!(path = %store.path().display(), env_id = %state.env_id, "Loaded state");

    if let Some(access_key_id) = &cli.aws_access_key_id {
        state.aws.access_key_id = access_key_id.clone();
    }
    if let Some(secret_access_key) = &cli.aws_secret_access_key {
        state.aws.secret_access_key = secret_access_key.clone();
    }
    if let Some(region) = &cli.aws_region {
        state.aws.region = region.clone();
    }

    let aws = Arc::new(AwsCli::new(&cli.aws_cli, state.aws.clone()));
    let executor: Arc<dyn Executor> = Arc::new(TerraformCli::new(&cli.terraform_binary));
    let output_provider = OutputProvider::new(executor.clone());
    let director = Arc::new(HttpDirectorClient::new(Duration::from_secs(cli.director_timeout)));
    let generator = CloudConfigGenerator::new(aws.clone(), aws.clone(), output_provider.clone());

    let collaborators = Collaborators {
        credential_validator: aws.clone(),
        environment_validator: Arc::new(InfrastructureEnvironmentValidator::new(
            aws.clone(),
            director,
        )),
        certificate_validator: Arc::new(PemCertificateValidator),
        certificate_manager: Arc::new(StoreCertificateManager::new(aws.clone())),
        zone_retriever: aws.clone(),
        stack_manager: aws.clone(),
        terraform_manager: Arc::new(TerraformManager::new(executor.clone())),
        output_provider,
        cloud_config_manager: Arc::new(BoshCli::new(&cli.bosh_cli, generator)),
        guid_generator: Arc::new(UuidGenerator),
        state_store: store.clone(),
    };

    let mutates = !matches!(cli.command, Command::Lbs { .. });
    if mutates && state.uses_terraform() {
        let version = executor.version().await?;
        info!(version = %version, "Using terraform");
    }

    match cli.command {
        Command::CreateLbs {
            lb_type,
            cert,
            key,
            chain,
            domain,
            skip_if_exists,
        } => {
            let config = CreateLbsConfig {
                lb_type,
                cert_path: cert,
                key_path: key,
                chain_path: chain,
                domain,
                skip_if_exists,
            };
            CreateLbs::new(collaborators).execute(&config, state).await?;
        }
        Command::DeleteLbs { skip_if_missing } => {
            DeleteLbs::new(collaborators)
                .execute(&DeleteLbsConfig { skip_if_missing }, state)
                .await?;
        }
        Command::Lbs { json } => {
            let report = Lbs::new(collaborators).execute(&state, json).await?;
            println!("{report}");
        }
    }

    Ok(())
}
