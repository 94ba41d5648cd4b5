//! The named-parameter table of a device.
//!
//! A registry is *building* until the facade performs its first device operation,
//! after which it is *sealed*: further registrations fail with
//! [`DaqError::RegistrySealed`]. Parameters and functions share one namespace.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{AppResult, DaqError};
use crate::parameter::{FunctionSpec, ParameterSpec};

/// Named parameters and functions in one namespace.
///
/// Building, then sealed: registration fails once the first device operation
/// has run.
#[derive(Debug, Default)]
pub struct ParameterRegistry {
    parameters: BTreeMap<String, ParameterSpec>,
    functions: BTreeMap<String, FunctionSpec>,
    sealed: AtomicBool,
}

impl ParameterRegistry {
    /// An empty, unsealed registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter. The first registration of a name always wins.
    pub fn register(&mut self, spec: ParameterSpec) -> AppResult<()> {
        self.ensure_open(&spec.name)?;
        self.ensure_unique(&spec.name)?;
        spec.check_definition()?;
        self.parameters.insert(spec.name.clone(), spec);
        Ok(())
    }

    /// Add a zero-argument command under the shared namespace.
    pub fn register_function(&mut self, function: FunctionSpec) -> AppResult<()> {
        self.ensure_open(&function.name)?;
        self.ensure_unique(&function.name)?;
        function.check_definition()?;
        self.functions.insert(function.name.clone(), function);
        Ok(())
    }

    fn ensure_open(&self, name: &str) -> AppResult<()> {
        if self.is_sealed() {
            return Err(DaqError::RegistrySealed(name.to_string()));
        }
        Ok(())
    }

    fn ensure_unique(&self, name: &str) -> AppResult<()> {
        if self.contains(name) {
            return Err(DaqError::DuplicateParameter(name.to_string()));
        }
        Ok(())
    }

    /// Freeze the table. Idempotent.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// True after the first device operation.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// True if a parameter or function has this name.
    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name) || self.functions.contains_key(name)
    }

    /// Look up a parameter.
    pub fn parameter(&self, name: &str) -> AppResult<&ParameterSpec> {
        self.parameters
            .get(name)
            .ok_or_else(|| DaqError::UnknownParameter(name.to_string()))
    }

    /// Look up a function.
    pub fn function(&self, name: &str) -> AppResult<&FunctionSpec> {
        self.functions
            .get(name)
            .ok_or_else(|| DaqError::UnknownParameter(name.to_string()))
    }

    /// Parameters in name order.
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.values()
    }

    /// Functions in name order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionSpec> {
        self.functions.values()
    }

    /// All registered names, parameters first, each group sorted.
    pub fn names(&self) -> Vec<&str> {
        self.parameters
            .keys()
            .chain(self.functions.keys())
            .map(String::as_str)
            .collect()
    }

    /// Parameters plus functions.
    pub fn len(&self) -> usize {
        self.parameters.len() + self.functions.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ValueParser;

    fn power(max: f64) -> ParameterSpec {
        ParameterSpec::new("power")
            .with_get("SOUR:POW?")
            .with_set("SOUR:POW {value:.2}")
            .with_parser(ValueParser::Float)
            .with_range(-120.0, max)
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let mut registry = ParameterRegistry::new();
        registry.register(power(25.0)).unwrap();

        let err = registry.register(power(30.0)).unwrap_err();
        assert!(matches!(err, DaqError::DuplicateParameter(ref n) if n == "power"));
        assert_eq!(
            registry.parameter("power").unwrap().validator,
            crate::parameter::Validator::numbers(-120.0, 25.0)
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_functions_share_namespace() {
        let mut registry = ParameterRegistry::new();
        registry.register(power(25.0)).unwrap();
        assert!(matches!(
            registry.register_function(FunctionSpec::new("power", "*RST")),
            Err(DaqError::DuplicateParameter(_))
        ));

        registry
            .register_function(FunctionSpec::new("reset", "*RST"))
            .unwrap();
        assert!(matches!(
            registry.register(ParameterSpec::new("reset").with_get("X?")),
            Err(DaqError::DuplicateParameter(_))
        ));
        assert_eq!(registry.names(), vec!["power", "reset"]);
    }

    #[test]
    fn test_sealed_registry_rejects_registration() {
        let mut registry = ParameterRegistry::new();
        registry.register(power(25.0)).unwrap();
        registry.seal();
        assert!(registry.is_sealed());
        assert!(matches!(
            registry.register_function(FunctionSpec::new("reset", "*RST")),
            Err(DaqError::RegistrySealed(_))
        ));
        assert!(registry.parameter("power").is_ok());
    }

    #[test]
    fn test_unknown_lookups() {
        let registry = ParameterRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.parameter("frequency"),
            Err(DaqError::UnknownParameter(_))
        ));
        assert!(matches!(
            registry.function("reset"),
            Err(DaqError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_invalid_definition_is_not_inserted() {
        let mut registry = ParameterRegistry::new();
        let err = registry
            .register(ParameterSpec::new("bad name").with_get("X?"))
            .unwrap_err();
        assert!(matches!(err, DaqError::InvalidDefinition { .. }));
        assert!(registry.is_empty());
    }
}
