//! Table-driven SCPI control for the Rohde & Schwarz SGS100A signal generator.
//!
//! Every device setting is a row in a command table ([`parameter::ParameterSpec`]):
//! a query command, a set template, a validator and a reply parser. The
//! [`facade::DeviceFacade`] executes rows against any [`adapters::Transport`],
//! validating values locally before anything reaches the wire.

pub mod adapters;
pub mod config;
pub mod error;
pub mod facade;
pub mod instrument;
pub mod parameter;
pub mod registry;

pub use error::{AppResult, DaqError};
pub use facade::{DeviceFacade, FacadeOptions, Identity, SetAck};
pub use instrument::sgs100a::RohdeSchwarzSgs100a;
pub use parameter::{FunctionSpec, ParamValue, ParameterSpec, ValueParser, Validator};
pub use registry::ParameterRegistry;
