//! `sgs-ctl`: command-line access to a configured SGS100A.
//!
//! ```text
//! sgs-ctl list
//! sgs-ctl --address 192.168.1.50 get frequency
//! sgs-ctl --instrument mw_source set power -10
//! sgs-ctl call reset_all_sweep
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sgs_daq::config::{InstrumentConfig, SgsConfig, DEFAULT_CONFIG_PATH};
use sgs_daq::instrument::{self, sgs100a};
use sgs_daq::ParamValue;

/// Control a Rohde & Schwarz SGS100A over a raw SCPI socket
#[derive(Parser)]
#[command(name = "sgs-ctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Instrument id from the configuration (defaults to the first enabled one)
    #[arg(short, long)]
    instrument: Option<String>,

    /// Override the instrument address (`host` or `host:port`)
    #[arg(short, long)]
    address: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List parameters and functions of the command table
    List,

    /// Query a parameter
    Get {
        /// Parameter name
        name: String,
    },

    /// Validate and set a parameter
    Set {
        /// Parameter name
        name: String,
        /// New value; coerced to the parameter's domain
        value: String,
    },

    /// Run a zero-argument function
    Call {
        /// Function name
        name: String,
    },

    /// Query and parse *IDN?
    Idn,

    /// Send *RST
    Reset,

    /// Run *TST? and print the result code
    SelfTest,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    let level = config
        .as_ref()
        .map(|c| c.application.log_level.clone())
        .unwrap_or_else(|| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();

    if let Commands::List = cli.command {
        let channels = select_instrument(&cli, config.as_ref())
            .map(|inst| sgs100a::ChannelOptions::from(&inst))
            .unwrap_or_default();
        return list(channels);
    }

    let target = select_instrument(&cli, config.as_ref())?;
    let device = instrument::connect(&target)
        .await
        .with_context(|| format!("Failed to open '{}' at {}", target.id, target.address))?;

    match cli.command {
        Commands::List => {}
        Commands::Get { name } => {
            let value = device.get(&name).await?;
            let unit = device
                .registry()
                .parameter(&name)
                .ok()
                .and_then(|spec| spec.unit.clone())
                .unwrap_or_default();
            println!("{} {}", value, unit);
        }
        Commands::Set { name, value } => {
            device.set(&name, ParamValue::Str(value)).await?;
            info!(parameter = %name, "set");
        }
        Commands::Call { name } => {
            if let Some(reply) = device.call_bare_command(&name).await? {
                println!("{}", reply);
            }
        }
        Commands::Idn => println!("{}", device.identify().await?),
        Commands::Reset => device.reset().await?,
        Commands::SelfTest => {
            let code = device.run_self_tests().await?;
            println!("{}", code);
            if code.trim() != "0" {
                bail!("self test reported failure code {}", code);
            }
        }
    }

    device.close();
    Ok(())
}

fn load_config(path: &Path) -> Result<Option<SgsConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let config = SgsConfig::load_from(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    Ok(Some(config))
}

fn select_instrument(cli: &Cli, config: Option<&SgsConfig>) -> Result<InstrumentConfig> {
    let from_config = match (config, cli.instrument.as_deref()) {
        (Some(cfg), Some(id)) => Some(
            cfg.instrument(id)
                .cloned()
                .with_context(|| format!("No instrument '{}' in configuration", id))?,
        ),
        (Some(cfg), None) => cfg.enabled_instruments().first().map(|inst| (*inst).clone()),
        (None, _) => None,
    };

    match (from_config, cli.address.as_deref()) {
        (Some(mut inst), Some(address)) => {
            inst.address = address.to_string();
            Ok(inst)
        }
        (Some(inst), None) => Ok(inst),
        (None, Some(address)) => Ok(InstrumentConfig::new(
            cli.instrument.as_deref().unwrap_or("sgs100a"),
            address,
        )),
        (None, None) => bail!(
            "No instrument configured; pass --address or create {}",
            cli.config.display()
        ),
    }
}

fn list(channels: sgs100a::ChannelOptions) -> Result<()> {
    let registry = sgs100a::parameter_table(channels)?;
    for spec in registry.parameters() {
        println!("{}", spec.describe());
    }
    for function in registry.functions() {
        println!("fn {} ({})", function.name, function.command);
    }
    Ok(())
}
