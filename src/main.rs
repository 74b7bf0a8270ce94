//! saseconn CLI
//!
//! # Usage
//!
//! ```bash
//! saseconn -A list_palocations
//! saseconn -A config_saseconn -S "Branch-12" -P "US East" -C INET1,INET2
//! saseconn -A delete_saseconn -S "Branch-12"
//! saseconn -A bind_zone -S "Branch-12" -Z trust
//! ```

use clap::{Parser, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use saseconn::action::{Action, CircuitSelection, Request, ALL_CIRCUITS};
use saseconn::api::HttpSaseApi;
use saseconn::config::Config;
use saseconn::engine::{self, RunOptions};
use saseconn::output::{self, OutputFormat};
use saseconn::SaseError;

#[derive(Parser)]
#[command(name = "saseconn")]
#[command(version)]
#[command(about = "Manage SASE connections of branch sites", long_about = None)]
struct Cli {
    /// Action to perform
    #[arg(long, short = 'A', value_enum)]
    action: Action,

    /// Site name
    #[arg(long, short = 'S')]
    sitename: Option<String>,

    /// Edge location display name
    #[arg(long, short = 'P')]
    palocation: Option<String>,

    /// Comma separated circuit (site WAN interface) names, or ALL for every public circuit
    #[arg(long, short = 'C', default_value = ALL_CIRCUITS)]
    circuit_names: String,

    /// Security zone to bind to SASE service links
    #[arg(long, short = 'Z')]
    zone: Option<String>,

    /// Plan the connection without sending it
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(long, short, value_enum)]
    format: Option<OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    /// Service account client id
    #[arg(long, env = "SASE_CLIENT_ID")]
    client_id: Option<String>,

    /// Service account client secret
    #[arg(long, env = "SASE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Tenant service group id
    #[arg(long, env = "SASE_TSG_ID")]
    tsg_id: Option<String>,

    /// API endpoint URL
    #[arg(long, env = "SASE_API_URL")]
    api_url: Option<String>,

    /// OAuth2 token endpoint
    #[arg(long, env = "SASE_AUTH_URL")]
    auth_url: Option<String>,
}

impl Cli {
    fn flags_config(&self) -> Config {
        Config {
            api_url: self.api_url.clone(),
            auth_url: self.auth_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            tsg_id: self.tsg_id.clone(),
            log_level: None,
            default_format: None,
        }
    }

    fn request(&self) -> Result<Request, SaseError> {
        Ok(Request {
            site: self.sitename.clone(),
            circuits: self.circuit_names.parse::<CircuitSelection>()?,
            location: self.palocation.clone(),
            zone: self.zone.clone(),
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.profile.as_deref()) {
        Ok(file) => file.merge(cli.flags_config()),
        Err(e) => {
            output::print_error(&e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level())),
        )
        .with_target(false)
        .init();

    let format = cli
        .format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(|f| OutputFormat::from_str(f, true).ok())
        })
        .unwrap_or(OutputFormat::Table);

    match execute(&cli, &config).await {
        Ok(outcome) => format.print_outcome(&outcome),
        Err(e) => {
            output::print_error(&e);
            std::process::exit(1);
        }
    }
}

async fn execute(cli: &Cli, config: &Config) -> Result<engine::Outcome, SaseError> {
    let request = cli.request()?;
    request.require(cli.action)?;

    let creds = config.credentials()?;
    debug!("Logging in as {}", config.masked_client_id());
    let api = HttpSaseApi::login(config.api_url(), config.auth_url(), &creds)
        .await
        .map_err(SaseError::Auth)?;

    info!("Running {}", cli.action);
    engine::run(
        &api,
        cli.action,
        &request,
        RunOptions {
            dry_run: cli.dry_run,
        },
    )
    .await
}
