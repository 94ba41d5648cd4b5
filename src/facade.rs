//! The device facade: a parameter registry bound to one transport.
//!
//! [`DeviceFacade`] owns its registry and its transport exclusively. Every public
//! operation resolves the name, validates locally, then performs at most one
//! write/read round trip while holding the transport lock, so replies cannot be
//! attributed to the wrong command when several tasks share a facade.
//!
//! Each round trip is bounded by the configured timeout. A timeout is reported
//! as [`DaqError::Timeout`] and never retried. A round trip that did not run to
//! completion (timed out, or its future was dropped) may leave a late reply in
//! the stream, so the facade then refuses every further operation with
//! [`DaqError::Transport`] until it is closed and reopened on a fresh transport.
//!
//! ```rust,no_run
//! # async fn demo() -> sgs_daq::AppResult<()> {
//! use sgs_daq::adapters::LineAdapter;
//! use sgs_daq::instrument::sgs100a::{self, ChannelOptions};
//! use sgs_daq::facade::FacadeOptions;
//!
//! let transport = LineAdapter::connect_tcp("192.168.1.50:5025").await?;
//! let source = sgs100a::open("mw_source", transport, ChannelOptions::default(), FacadeOptions::default())?;
//! source.set("frequency", 5e9).await?;
//! source.on().await?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::adapters::Transport;
use crate::error::{AppResult, DaqError};
use crate::parameter::{FunctionSpec, ParamValue, ParameterSpec};
use crate::registry::ParameterRegistry;

/// Default per-operation deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How a set command is acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetAck {
    /// Write and return; no reply is read.
    #[default]
    None,
    /// Append `;*OPC?` and require the reply `1`.
    Opc,
}

/// Per-facade I/O policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacadeOptions {
    /// Deadline for one complete round trip.
    pub timeout: Duration,
    /// How set commands are acknowledged.
    pub set_ack: SetAck,
}

impl Default for FacadeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            set_ack: SetAck::None,
        }
    }
}

/// Parsed `*IDN?` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Manufacturer field.
    pub manufacturer: String,
    /// Model field.
    pub model: String,
    /// Serial number field.
    pub serial: String,
    /// Firmware version field.
    pub firmware: String,
}

impl Identity {
    /// Parse `manufacturer,model,serial,firmware`.
    pub fn parse(reply: &str) -> Option<Self> {
        let (manufacturer, model, serial, firmware): (String, String, String, String) =
            prse::try_parse!(reply.trim(), "{},{},{},{}").ok()?;
        Some(Self {
            manufacturer: manufacturer.trim().to_string(),
            model: model.trim().to_string(),
            serial: serial.trim().to_string(),
            firmware: firmware.trim().to_string(),
        })
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} (serial {}, firmware {})",
            self.manufacturer, self.model, self.serial, self.firmware
        )
    }
}

/// A [`ParameterRegistry`] bound to one exclusively owned transport.
pub struct DeviceFacade<T> {
    id: String,
    registry: ParameterRegistry,
    transport: Mutex<T>,
    options: FacadeOptions,
    // Set while a round trip is on the wire; left set if it never finished.
    in_flight: AtomicBool,
}

impl<T: Transport> DeviceFacade<T> {
    /// Wrap `transport`. The registry may still grow until the first operation.
    pub fn new(
        id: impl Into<String>,
        registry: ParameterRegistry,
        transport: T,
        options: FacadeOptions,
    ) -> Self {
        let id = id.into();
        info!(
            instrument = %id,
            entries = registry.len(),
            timeout_ms = options.timeout.as_millis() as u64,
            set_ack = ?options.set_ack,
            "device facade created"
        );
        Self {
            id,
            registry,
            transport: Mutex::new(transport),
            options,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Instrument id used in log fields.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Timeout and acknowledgment policy.
    pub fn options(&self) -> FacadeOptions {
        self.options
    }

    /// Read-only view of the parameter table.
    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    /// True while a round trip is on the wire, and permanently once one was
    /// abandoned mid-flight. The stream may then still carry its reply, so the
    /// facade no longer talks to the instrument.
    pub fn is_desynchronized(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Add a parameter. Fails once the first device operation has run.
    pub fn register(&mut self, spec: ParameterSpec) -> AppResult<()> {
        self.registry.register(spec)
    }

    /// Add a zero-argument command. Same rules as [`register`](Self::register).
    pub fn register_function(&mut self, function: FunctionSpec) -> AppResult<()> {
        self.registry.register_function(function)
    }

    /// Query a parameter and return its parsed value.
    pub async fn get(&self, name: &str) -> AppResult<ParamValue> {
        let spec = self.registry.parameter(name)?;
        let command = spec
            .get_command
            .as_deref()
            .ok_or_else(|| DaqError::WriteOnlyParameter(name.to_string()))?;

        self.registry.seal();
        let reply = self.query(command).await?;
        spec.decode_reply(command, &reply)
    }

    /// Validate `value`, render the set command and send it.
    pub async fn set(&self, name: &str, value: impl Into<ParamValue>) -> AppResult<()> {
        let spec = self.registry.parameter(name)?;
        let command = spec.render_set(&value.into())?;

        self.registry.seal();
        match self.options.set_ack {
            SetAck::None => self.send(&command).await,
            SetAck::Opc => {
                let command = format!("{};*OPC?", command);
                let reply = self.query(&command).await?;
                if reply.trim() == "1" {
                    Ok(())
                } else {
                    Err(DaqError::UnexpectedReply {
                        command,
                        reply,
                        reason: "operation-complete acknowledgment must be '1'".to_string(),
                    })
                }
            }
        }
    }

    /// Send a registered zero-argument command. Queries return their reply.
    pub async fn call_bare_command(&self, name: &str) -> AppResult<Option<String>> {
        let function = self.registry.function(name)?;

        self.registry.seal();
        if function.is_query() {
            self.query(&function.command).await.map(Some)
        } else {
            self.send(&function.command).await.map(|_| None)
        }
    }

    /// `*RST`
    pub async fn reset(&self) -> AppResult<()> {
        self.call_bare_command("reset").await.map(|_| ())
    }

    /// `*TST?`, raw reply (`0` means all tests passed).
    pub async fn run_self_tests(&self) -> AppResult<String> {
        self.call_bare_command("run_self_tests")
            .await
            .map(Option::unwrap_or_default)
    }

    /// Switch the RF output on.
    pub async fn on(&self) -> AppResult<()> {
        self.set("status", "on").await
    }

    /// Switch the RF output off.
    pub async fn off(&self) -> AppResult<()> {
        self.set("status", "off").await
    }

    /// Query and parse `*IDN?`.
    pub async fn identify(&self) -> AppResult<Identity> {
        const IDN: &str = "*IDN?";
        self.registry.seal();
        let reply = self.query(IDN).await?;
        Identity::parse(&reply).ok_or_else(|| DaqError::UnexpectedReply {
            command: IDN.to_string(),
            reply,
            reason: "expected 'manufacturer,model,serial,firmware'".to_string(),
        })
    }

    /// Release the transport.
    pub fn close(self) -> T {
        info!(instrument = %self.id, "device facade closed");
        self.transport.into_inner()
    }

    async fn send(&self, command: &str) -> AppResult<()> {
        let mut transport = self.transport.lock().await;
        self.begin_round_trip(command)?;
        debug!(instrument = %self.id, "-> {}", command);
        let result = self.bounded(command, transport.write(command)).await;
        self.end_round_trip(&result);
        result
    }

    async fn query(&self, command: &str) -> AppResult<String> {
        let mut transport = self.transport.lock().await;
        self.begin_round_trip(command)?;
        debug!(instrument = %self.id, "-> {}", command);
        let round_trip = async {
            transport.write(command).await?;
            let reply = transport.read_line().await?;
            Ok::<String, DaqError>(reply)
        };
        let result = self.bounded(command, round_trip).await;
        self.end_round_trip(&result);
        let reply = result?;
        debug!(instrument = %self.id, "<- {}", reply);
        Ok(reply)
    }

    // Called with the transport lock held.
    fn begin_round_trip(&self, command: &str) -> AppResult<()> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!(instrument = %self.id, command, "refusing command on desynchronized link");
            return Err(DaqError::Transport(
                "desynchronized after timeout; reconnect".to_string(),
            ));
        }
        Ok(())
    }

    // A timeout leaves the flag set; any other outcome means the exchange finished.
    fn end_round_trip<R>(&self, result: &AppResult<R>) {
        if !matches!(result, Err(DaqError::Timeout { .. })) {
            self.in_flight.store(false, Ordering::SeqCst);
        }
    }

    async fn bounded<R, F>(&self, command: &str, operation: F) -> AppResult<R>
    where
        F: Future<Output = AppResult<R>>,
    {
        match tokio::time::timeout(self.options.timeout, operation).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    instrument = %self.id,
                    command,
                    timeout_ms = self.options.timeout.as_millis() as u64,
                    "instrument did not answer in time"
                );
                Err(DaqError::Timeout {
                    command: command.to_string(),
                    timeout: self.options.timeout,
                })
            }
        }
    }
}
