//! Declarative parameter definitions for SCPI instruments.
//!
//! A [`ParameterSpec`] describes one controllable or readable quantity as a row in a
//! command table: the query command, the set-command template, the legal domain, how
//! to parse the reply and an optional unit. Specs are plain data; they never talk to
//! a transport. [`DeviceFacade`](crate::facade::DeviceFacade) executes them.
//!
//! # Example
//!
//! ```rust
//! use sgs_daq::parameter::{ParameterSpec, ValueParser};
//!
//! let frequency = ParameterSpec::new("frequency")
//!     .with_label("Frequency")
//!     .with_unit("Hz")
//!     .with_get("SOUR:FREQ?")
//!     .with_set("SOUR:FREQ {value:.2}")
//!     .with_parser(ValueParser::Float)
//!     .with_range(1e6, 20e9);
//!
//! assert_eq!(frequency.render_set(&5e9.into()).unwrap(), "SOUR:FREQ 5000000000.00");
//! ```
//!
//! # Set templates
//!
//! Templates are rendered with `strfmt`. The single slot is named `value`:
//! `{value}` inserts the value as-is, `{value:.2}` renders a float with two decimals.
//! A template without a slot is sent verbatim.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{AppResult, DaqError};

/// Name of the substitution slot in set templates.
pub const VALUE_SLOT: &str = "value";

// =============================================================================
// ParamValue
// =============================================================================

/// A typed parameter value, either supplied by a caller or parsed from a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer value.
    Int(i64),
    /// Real value.
    Float(f64),
    /// Text token.
    Str(String),
}

impl ParamValue {
    /// Numeric view; strings are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Str(s) => s.trim().parse().ok(),
        }
    }

    /// Integer view; integral floats and numeric strings convert.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) => integral(*v),
            ParamValue::Str(s) => {
                let s = s.trim();
                s.parse()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
        }
    }

    /// Text view, for `Str` values only.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

// =============================================================================
// Validator
// =============================================================================

/// The legal domain of a settable parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Validator {
    /// Any value is accepted.
    #[default]
    Unrestricted,

    /// Real number within inclusive bounds.
    Numbers { min: f64, max: f64 },

    /// Integer within inclusive bounds.
    Ints { min: i64, max: i64 },

    /// One of a closed set of tokens (case-sensitive).
    Enum(Vec<String>),
}

impl Validator {
    /// Inclusive real range.
    #[must_use]
    pub fn numbers(min: f64, max: f64) -> Self {
        Validator::Numbers { min, max }
    }

    /// Any finite real number.
    #[must_use]
    pub fn any_number() -> Self {
        Validator::Numbers {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// Inclusive integer range.
    #[must_use]
    pub fn ints(min: i64, max: i64) -> Self {
        Validator::Ints { min, max }
    }

    /// Closed set of tokens.
    #[must_use]
    pub fn choices<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Validator::Enum(members.into_iter().map(Into::into).collect())
    }

    /// Convert `value` into this domain's representation without checking bounds.
    ///
    /// Returns `None` when the value has no representation in the domain
    /// (e.g. a non-numeric string for a numeric range).
    pub fn coerce(&self, value: &ParamValue) -> Option<ParamValue> {
        match self {
            Validator::Unrestricted => Some(value.clone()),
            Validator::Numbers { .. } => value.as_f64().map(ParamValue::Float),
            Validator::Ints { .. } => value.as_i64().map(ParamValue::Int),
            Validator::Enum(_) => Some(ParamValue::Str(value.to_string())),
        }
    }

    /// Coerce and check `value`. Returns the in-domain value, or `None` if rejected.
    pub fn check(&self, value: &ParamValue) -> Option<ParamValue> {
        let coerced = self.coerce(value)?;
        let accepted = match (self, &coerced) {
            (Validator::Unrestricted, _) => true,
            (Validator::Numbers { min, max }, ParamValue::Float(v)) => {
                v.is_finite() && *min <= *v && *v <= *max
            }
            (Validator::Ints { min, max }, ParamValue::Int(v)) => *min <= *v && *v <= *max,
            (Validator::Enum(members), ParamValue::Str(s)) => members.iter().any(|m| m == s),
            _ => false,
        };
        accepted.then_some(coerced)
    }

    /// A representative in-domain value, used to test-render set templates.
    pub fn sample(&self) -> ParamValue {
        match self {
            Validator::Unrestricted => ParamValue::Float(0.0),
            Validator::Numbers { min, max } => {
                let v = if min.is_finite() {
                    *min
                } else if max.is_finite() {
                    *max
                } else {
                    0.0
                };
                ParamValue::Float(v)
            }
            Validator::Ints { min, .. } => ParamValue::Int(*min),
            Validator::Enum(members) => {
                ParamValue::Str(members.first().cloned().unwrap_or_default())
            }
        }
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Unrestricted => write!(f, "any value"),
            Validator::Numbers { min, max } if min.is_infinite() && max.is_infinite() => {
                write!(f, "any finite number")
            }
            Validator::Numbers { min, max } => write!(f, "a number in [{}, {}]", min, max),
            Validator::Ints { min, max } => write!(f, "an integer in [{}, {}]", min, max),
            Validator::Enum(members) => write!(f, "one of: {}", members.join(", ")),
        }
    }
}

// =============================================================================
// Reply parsing and value mapping
// =============================================================================

/// Converts a raw reply line into a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueParser {
    /// Real number.
    Float,
    /// Integer, also accepting an integral float such as `11.0`.
    Int,
    /// Text reply with surrounding SCPI string quotes removed.
    Str,
}

impl ValueParser {
    /// Decode one reply line.
    pub fn parse(&self, reply: &str) -> Result<ParamValue, String> {
        let reply = reply.trim();
        match self {
            ValueParser::Float => reply
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|e| format!("expected a number ({})", e)),
            ValueParser::Int => ParamValue::Str(reply.to_string())
                .as_i64()
                .map(ParamValue::Int)
                .ok_or_else(|| "expected an integer".to_string()),
            ValueParser::Str => Ok(ParamValue::Str(unquote(reply).to_string())),
        }
    }
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Bidirectional mapping between call-site tokens and wire tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMapping {
    pairs: Vec<(String, String)>,
}

impl ValueMapping {
    /// Pairs of `(call-site token, wire token)`.
    pub fn new<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(user, wire)| (user.into(), wire.into()))
                .collect(),
        }
    }

    /// `on` ↔ `on_val`, `off` ↔ `off_val`.
    pub fn on_off(on_val: &str, off_val: &str) -> Self {
        Self::new([("on", on_val), ("off", off_val)])
    }

    /// Wire token for a call-site token.
    pub fn to_wire(&self, user: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(u, _)| u == user)
            .map(|(_, w)| w.as_str())
    }

    /// Call-site token for a wire token.
    pub fn from_wire(&self, wire: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(_, w)| w == wire)
            .map(|(u, _)| u.as_str())
    }

    /// Call-site tokens in declaration order.
    pub fn user_tokens(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(u, _)| u.as_str())
    }
}

// =============================================================================
// ParameterSpec
// =============================================================================

/// One row of a device command table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Registry key.
    pub name: String,
    /// Human-readable label.
    pub label: Option<String>,
    /// Query command, absent for write-only parameters.
    pub get_command: Option<String>,
    /// Set template with at most one `{value}` slot, absent for read-only parameters.
    pub set_template: Option<String>,
    /// Legal domain for set values.
    pub validator: Validator,
    /// Reply decoder; `None` returns the raw reply.
    pub parser: Option<ValueParser>,
    /// Call-site to wire translation, checked after the validator.
    pub mapping: Option<ValueMapping>,
    /// Documentary unit.
    pub unit: Option<String>,
}

impl ParameterSpec {
    /// An unrestricted parameter with no commands yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            get_command: None,
            set_template: None,
            validator: Validator::Unrestricted,
            parser: None,
            mapping: None,
            unit: None,
        }
    }

    /// Attach a label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the query command.
    #[must_use]
    pub fn with_get(mut self, command: impl Into<String>) -> Self {
        self.get_command = Some(command.into());
        self
    }

    /// Set the set-command template.
    #[must_use]
    pub fn with_set(mut self, template: impl Into<String>) -> Self {
        self.set_template = Some(template.into());
        self
    }

    /// Replace the validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Restrict to an inclusive real range.
    #[must_use]
    pub fn with_range(self, min: f64, max: f64) -> Self {
        self.with_validator(Validator::numbers(min, max))
    }

    /// Restrict to an inclusive integer range.
    #[must_use]
    pub fn with_int_range(self, min: i64, max: i64) -> Self {
        self.with_validator(Validator::ints(min, max))
    }

    /// Restrict to a closed set of tokens.
    #[must_use]
    pub fn with_choices<I, S>(self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_validator(Validator::choices(members))
    }

    /// Attach a value mapping; the validator becomes the set of call-site tokens.
    #[must_use]
    pub fn with_mapping(mut self, mapping: ValueMapping) -> Self {
        self.validator = Validator::choices(mapping.user_tokens());
        self.mapping = Some(mapping);
        self
    }

    /// Shorthand for the common `on`/`off` ↔ `1`/`0` mapping.
    #[must_use]
    pub fn with_on_off(self) -> Self {
        self.with_mapping(ValueMapping::on_off("1", "0"))
    }

    /// Decode replies with `parser`.
    #[must_use]
    pub fn with_parser(mut self, parser: ValueParser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Attach a unit.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Has a query command.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.get_command.is_some()
    }

    /// Has a set template.
    #[must_use]
    pub fn is_settable(&self) -> bool {
        self.set_template.is_some()
    }

    /// Check the value against the validator and translate it to its wire form.
    ///
    /// This is the only gate between a caller's value and the set template.
    pub fn prepare_value(&self, value: &ParamValue) -> AppResult<ParamValue> {
        let checked = self
            .validator
            .check(value)
            .ok_or_else(|| DaqError::Validation {
                name: self.name.clone(),
                value: value.to_string(),
                domain: self.validator.to_string(),
            })?;

        match &self.mapping {
            Some(mapping) => {
                let user = checked.to_string();
                let wire = mapping
                    .to_wire(&user)
                    .ok_or_else(|| DaqError::Validation {
                        name: self.name.clone(),
                        value: user.clone(),
                        domain: self.validator.to_string(),
                    })?;
                Ok(ParamValue::Str(wire.to_string()))
            }
            None => Ok(checked),
        }
    }

    /// Validate `value` and render the full set command.
    pub fn render_set(&self, value: &ParamValue) -> AppResult<String> {
        let template = self
            .set_template
            .as_deref()
            .ok_or_else(|| DaqError::ReadOnlyParameter(self.name.clone()))?;
        let wire_value = self.prepare_value(value)?;
        let wire_value = match wire_value {
            // strfmt applies precision to strings as truncation.
            ParamValue::Str(text) if has_precision(template) => ParamValue::Str(text)
                .as_f64()
                .filter(|v| v.is_finite())
                .map(ParamValue::Float)
                .ok_or_else(|| DaqError::Validation {
                    name: self.name.clone(),
                    value: value.to_string(),
                    domain: "a number (the set command has a fixed precision)".to_string(),
                })?,
            other => other,
        };
        render_template(&self.name, template, &wire_value)
    }

    /// Turn a raw reply into a value: mapping first, then parser, else raw text.
    pub fn decode_reply(&self, command: &str, reply: &str) -> AppResult<ParamValue> {
        let reply = reply.trim();
        let unexpected = |reason: String| DaqError::UnexpectedReply {
            command: command.to_string(),
            reply: reply.to_string(),
            reason,
        };

        if let Some(mapping) = &self.mapping {
            return mapping
                .from_wire(reply)
                .map(|user| ParamValue::Str(user.to_string()))
                .ok_or_else(|| unexpected(format!("not a known value of '{}'", self.name)));
        }

        match self.parser {
            Some(parser) => parser.parse(reply).map_err(unexpected),
            None => Ok(ParamValue::Str(reply.to_string())),
        }
    }

    /// Reject malformed definitions: bad names, direction-less specs and
    /// set templates that cannot render an in-domain value.
    pub fn check_definition(&self) -> AppResult<()> {
        validate_name(&self.name)?;
        if !self.is_readable() && !self.is_settable() {
            return Err(DaqError::InvalidDefinition {
                name: self.name.clone(),
                reason: "needs a query command, a set template, or both".to_string(),
            });
        }
        if let Validator::Enum(members) = &self.validator {
            if members.is_empty() {
                return Err(DaqError::InvalidDefinition {
                    name: self.name.clone(),
                    reason: "empty enumeration; register a function instead".to_string(),
                });
            }
        }
        if self.is_settable() {
            self.render_set(&self.validator.sample())
                .map_err(|e| match e {
                    DaqError::Validation { value, .. } => DaqError::InvalidDefinition {
                        name: self.name.clone(),
                        reason: format!("set template cannot render in-domain value '{}'", value),
                    },
                    other => other,
                })?;
        }
        Ok(())
    }

    /// One-line summary for listings.
    #[must_use]
    pub fn describe(&self) -> String {
        let access = match (self.is_readable(), self.is_settable()) {
            (true, true) => "rw",
            (true, false) => "r ",
            (false, true) => " w",
            (false, false) => "--",
        };
        let mut line = format!("{} {}", access, self.name);
        if let Some(unit) = &self.unit {
            line.push_str(&format!(" [{}]", unit));
        }
        if self.is_settable() {
            line.push_str(&format!(" : {}", self.validator));
        }
        line
    }
}

/// A zero-argument action (reset, self-test, sweep trigger, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Registry key, shared with parameters.
    pub name: String,
    /// Sent verbatim.
    pub command: String,
}

impl FunctionSpec {
    /// A command registered under `name`.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }

    /// Queries end in `?` and produce a reply line.
    #[must_use]
    pub fn is_query(&self) -> bool {
        self.command.trim_end().ends_with('?')
    }

    /// Reject bad names and empty commands.
    pub fn check_definition(&self) -> AppResult<()> {
        validate_name(&self.name)?;
        if self.command.trim().is_empty() {
            return Err(DaqError::InvalidDefinition {
                name: self.name.clone(),
                reason: "empty command".to_string(),
            });
        }
        Ok(())
    }
}

/// Names are table keys: non-empty ASCII alphanumerics and underscores.
pub fn validate_name(name: &str) -> AppResult<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DaqError::InvalidDefinition {
            name: name.to_string(),
            reason: "names may only contain ASCII letters, digits and '_'".to_string(),
        });
    }
    Ok(())
}

/// True when a `{value:...}` slot carries a `.N` precision.
fn has_precision(template: &str) -> bool {
    let open = format!("{{{}:", VALUE_SLOT);
    template
        .split(open.as_str())
        .skip(1)
        .any(|rest| rest.split('}').next().is_some_and(|spec| spec.contains('.')))
}

fn render_template(name: &str, template: &str, value: &ParamValue) -> AppResult<String> {
    let key = VALUE_SLOT.to_string();
    let rendered = match value {
        ParamValue::Float(v) => strfmt::strfmt(template, &HashMap::from([(key, *v)])),
        ParamValue::Int(v) => strfmt::strfmt(template, &HashMap::from([(key, *v)])),
        ParamValue::Str(v) => strfmt::strfmt(template, &HashMap::from([(key, v.clone())])),
    };
    rendered.map_err(|e| DaqError::InvalidDefinition {
        name: name.to_string(),
        reason: format!("cannot render template '{}': {}", template, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frequency() -> ParameterSpec {
        ParameterSpec::new("frequency")
            .with_unit("Hz")
            .with_get("SOUR:FREQ?")
            .with_set("SOUR:FREQ {value:.2}")
            .with_parser(ValueParser::Float)
            .with_range(1e6, 20e9)
    }

    #[test]
    fn test_precision_is_part_of_the_command() {
        let spec = frequency();
        assert_eq!(
            spec.render_set(&ParamValue::Float(5e9)).unwrap(),
            "SOUR:FREQ 5000000000.00"
        );
        // Integers and numeric strings are coerced to the float domain first.
        assert_eq!(
            spec.render_set(&ParamValue::Int(1_000_000)).unwrap(),
            "SOUR:FREQ 1000000.00"
        );
        assert_eq!(
            spec.render_set(&"2.5e9".into()).unwrap(),
            "SOUR:FREQ 2500000000.00"
        );
    }

    #[test]
    fn test_range_is_inclusive() {
        let spec = frequency();
        assert!(spec.render_set(&1e6.into()).is_ok());
        assert!(spec.render_set(&20e9.into()).is_ok());
        assert!(matches!(
            spec.render_set(&20.1e9.into()),
            Err(DaqError::Validation { .. })
        ));
        assert!(spec.render_set(&f64::NAN.into()).is_err());
        assert!(spec.render_set(&"fast".into()).is_err());
    }

    #[test]
    fn test_validation_error_carries_domain() {
        let err = frequency().render_set(&0.5.into()).unwrap_err();
        match err {
            DaqError::Validation {
                name,
                value,
                domain,
            } => {
                assert_eq!(name, "frequency");
                assert_eq!(value, "0.5");
                assert_eq!(domain, "a number in [1000000, 20000000000]");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_int_range() {
        let spec = ParameterSpec::new("points")
            .with_get("SOUR:SWE:FREQ:POIN?")
            .with_set("SOUR:SWE:FREQ:POIN {value}")
            .with_parser(ValueParser::Int)
            .with_int_range(2, 10001);
        assert_eq!(
            spec.render_set(&ParamValue::Float(101.0)).unwrap(),
            "SOUR:SWE:FREQ:POIN 101"
        );
        assert!(spec.render_set(&ParamValue::Float(10.5)).is_err());
        assert!(spec.render_set(&ParamValue::Int(1)).is_err());
    }

    #[test]
    fn test_enum_is_case_sensitive() {
        let spec = ParameterSpec::new("ref_osc_source")
            .with_get("SOUR:ROSC:SOUR?")
            .with_set("SOUR:ROSC:SOUR {value}")
            .with_choices(["INT", "EXT"]);
        assert_eq!(spec.render_set(&"EXT".into()).unwrap(), "SOUR:ROSC:SOUR EXT");
        assert!(spec.render_set(&"ext".into()).is_err());
    }

    #[test]
    fn test_numeric_enum_members_accept_numbers() {
        let spec = ParameterSpec::new("averaging_factor")
            .with_set("SENS:POW:SWE:TIME:AVER:COUN {value}")
            .with_choices(["1", "2", "4", "8"]);
        assert_eq!(
            spec.render_set(&ParamValue::Int(4)).unwrap(),
            "SENS:POW:SWE:TIME:AVER:COUN 4"
        );
        assert!(spec.render_set(&ParamValue::Int(3)).is_err());
    }

    #[test]
    fn test_on_off_mapping_both_directions() {
        let spec = ParameterSpec::new("status")
            .with_get(":OUTP:STAT?")
            .with_set(":OUTP:STAT {value}")
            .with_on_off();
        assert_eq!(spec.render_set(&"on".into()).unwrap(), ":OUTP:STAT 1");
        assert_eq!(spec.render_set(&"off".into()).unwrap(), ":OUTP:STAT 0");
        assert!(spec.render_set(&"1".into()).is_err());

        assert_eq!(
            spec.decode_reply(":OUTP:STAT?", "1").unwrap(),
            ParamValue::Str("on".into())
        );
        assert_eq!(
            spec.decode_reply(":OUTP:STAT?", "0\r").unwrap(),
            ParamValue::Str("off".into())
        );
        assert!(matches!(
            spec.decode_reply(":OUTP:STAT?", "2"),
            Err(DaqError::UnexpectedReply { .. })
        ));
    }

    #[test]
    fn test_parsers() {
        assert_eq!(
            ValueParser::Float.parse("5000000000.00").unwrap(),
            ParamValue::Float(5e9)
        );
        assert_eq!(ValueParser::Int.parse("+11").unwrap(), ParamValue::Int(11));
        assert_eq!(ValueParser::Int.parse("11.0").unwrap(), ParamValue::Int(11));
        assert!(ValueParser::Int.parse("11.5").is_err());
        assert_eq!(
            ValueParser::Str.parse("\"rs_shot\"").unwrap(),
            ParamValue::Str("rs_shot".into())
        );
        assert!(ValueParser::Float.parse("NAN?").is_err());
    }

    #[test]
    fn test_raw_reply_without_parser() {
        let spec = ParameterSpec::new("trigger_mode").with_get("SOUR:LIST:TRIG:MODE?");
        assert_eq!(
            spec.decode_reply("SOUR:LIST:TRIG:MODE?", " AUTO \n").unwrap(),
            ParamValue::Str("AUTO".into())
        );
    }

    #[test]
    fn test_read_only_spec_refuses_set() {
        let spec = ParameterSpec::new("lower_range").with_get("SOUR:POW:RANG:LOW?");
        assert!(matches!(
            spec.render_set(&1.0.into()),
            Err(DaqError::ReadOnlyParameter(_))
        ));
    }

    #[test]
    fn test_template_without_slot_is_verbatim() {
        let spec = ParameterSpec::new("threshold_defaults")
            .with_set("SENS1:POW:SWE:TIME:SENS:TRIG:AUTO ONCE");
        assert_eq!(
            spec.render_set(&0.0.into()).unwrap(),
            "SENS1:POW:SWE:TIME:SENS:TRIG:AUTO ONCE"
        );
    }

    #[test]
    fn test_check_definition() {
        assert!(frequency().check_definition().is_ok());
        assert!(ParameterSpec::new("delete_all_*_files")
            .with_get("X?")
            .check_definition()
            .is_err());
        assert!(ParameterSpec::new("nothing").check_definition().is_err());
        assert!(ParameterSpec::new("broken")
            .with_set("SOUR:FREQ {val}")
            .check_definition()
            .is_err());
        assert!(ParameterSpec::new("empty_enum")
            .with_set("X {value}")
            .with_choices(Vec::<String>::new())
            .check_definition()
            .is_err());
    }

    #[test]
    fn test_fixed_precision_formats_text_as_a_number() {
        let spec = ParameterSpec::new("x").with_set("A {value:.2}");
        assert_eq!(spec.render_set(&"5e9".into()).unwrap(), "A 5000000000.00");
        assert_eq!(spec.render_set(&"-3".into()).unwrap(), "A -3.00");
        assert!(matches!(
            spec.render_set(&"fast".into()),
            Err(DaqError::Validation { .. })
        ));
        assert!(spec.render_set(&"inf".into()).is_err());
        assert!(spec.check_definition().is_ok());

        let spec = ParameterSpec::new("pulse_imp")
            .with_set("SOUR:PGEN:OUTP:IMP {value:.2}")
            .with_choices(["G50", "G1K"]);
        assert!(matches!(
            spec.check_definition(),
            Err(DaqError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_any_number_rejects_non_finite() {
        let spec = ParameterSpec::new("pulse_delay")
            .with_set("SOUR:PULM:DEL {value}")
            .with_validator(Validator::any_number());
        assert_eq!(spec.render_set(&(-2.5).into()).unwrap(), "SOUR:PULM:DEL -2.5");
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            assert!(matches!(
                spec.render_set(&bad.into()),
                Err(DaqError::Validation { .. })
            ));
        }
        assert_eq!(Validator::any_number().to_string(), "any finite number");
    }

    #[test]
    fn test_function_spec() {
        assert!(FunctionSpec::new("run_self_tests", "*TST?").is_query());
        assert!(!FunctionSpec::new("reset", "*RST").is_query());
        assert!(FunctionSpec::new("reset", " ").check_definition().is_err());
    }

    #[test]
    fn test_describe() {
        let line = frequency().describe();
        assert!(line.starts_with("rw frequency [Hz]"));
        assert!(line.contains("a number in"));
    }
}
