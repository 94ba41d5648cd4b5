//! Instrument command tables and connection helpers.

pub mod sgs100a;

use tokio::net::TcpStream;
use tracing::info;

use crate::adapters::LineAdapter;
use crate::config::{ConfigError, InstrumentConfig};
use crate::error::AppResult;
use crate::facade::FacadeOptions;
use sgs100a::{ChannelOptions, RohdeSchwarzSgs100a};

impl From<&InstrumentConfig> for ChannelOptions {
    fn from(config: &InstrumentConfig) -> Self {
        Self {
            sensor: config.sensor,
            path: config.path,
        }
    }
}

impl From<&InstrumentConfig> for FacadeOptions {
    fn from(config: &InstrumentConfig) -> Self {
        Self {
            timeout: config.timeout(),
            set_ack: config.set_ack,
        }
    }
}

/// Connect to a configured instrument over a raw TCP socket.
pub async fn connect(
    config: &InstrumentConfig,
) -> AppResult<RohdeSchwarzSgs100a<LineAdapter<TcpStream>>> {
    if config.r#type != "SGS100A" {
        return Err(ConfigError::ValidationError(format!(
            "no command table for instrument type '{}' (instrument '{}')",
            config.r#type, config.id
        ))
        .into());
    }
    info!(instrument = %config.id, address = %config.address, "connecting");
    let transport =
        LineAdapter::connect_tcp(&config.address).await?.with_terminator(config.terminator.as_str());
    sgs100a::open(
        config.id.as_str(),
        transport,
        ChannelOptions::from(config),
        FacadeOptions::from(config),
    )
}
