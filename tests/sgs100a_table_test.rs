//! Shape of the SGS100A command table.

use sgs_daq::instrument::sgs100a::{parameter_table, ChannelOptions};
use sgs_daq::{ParamValue, ParameterRegistry, ValueParser, Validator};

fn table() -> ParameterRegistry {
    parameter_table(ChannelOptions::default()).expect("table builds")
}

#[test]
fn contract_subset_is_exact() {
    let registry = table();

    let cases = [
        ("frequency", "SOUR:FREQ?", "SOUR:FREQ {value:.2}", 1e6, 20e9, "Hz"),
        ("power", "SOUR:POW?", "SOUR:POW {value:.2}", -120.0, 25.0, "dBm"),
        ("phase", "SOUR:PHAS?", "SOUR:PHAS {value:.2}", 0.0, 360.0, "deg"),
    ];
    for (name, get, set, min, max, unit) in cases {
        let spec = registry.parameter(name).unwrap();
        assert_eq!(spec.get_command.as_deref(), Some(get), "{name}");
        assert_eq!(spec.set_template.as_deref(), Some(set), "{name}");
        assert_eq!(spec.validator, Validator::numbers(min, max), "{name}");
        assert_eq!(spec.parser, Some(ValueParser::Float), "{name}");
        assert_eq!(spec.unit.as_deref(), Some(unit), "{name}");
    }

    for (name, root) in [("status", ":OUTP:STAT"), ("IQ_state", ":IQ:STAT")] {
        let spec = registry.parameter(name).unwrap();
        assert_eq!(spec.get_command.as_deref(), Some(format!("{root}?").as_str()));
        assert_eq!(spec.render_set(&"on".into()).unwrap(), format!("{root} 1"));
        assert_eq!(spec.render_set(&"off".into()).unwrap(), format!("{root} 0"));
    }
}

#[test]
fn no_unresolved_placeholders() {
    for sensor in 1..=4 {
        let registry = parameter_table(ChannelOptions { sensor, path: 2 }).unwrap();
        for spec in registry.parameters() {
            for command in [&spec.get_command, &spec.set_template].into_iter().flatten() {
                assert!(!command.contains("{sensor}"), "{}: {}", spec.name, command);
                assert!(!command.contains("{path}"), "{}: {}", spec.name, command);
                assert!(!command.contains("{}"), "{}: {}", spec.name, command);
            }
        }
        for function in registry.functions() {
            assert!(!function.command.contains('{'), "{}", function.name);
        }
    }
}

#[test]
fn every_set_template_renders_a_sample() {
    let registry = table();
    for spec in registry.parameters().filter(|s| s.is_settable()) {
        let command = spec.render_set(&spec.validator.sample());
        let command = command.unwrap_or_else(|e| panic!("{}: {}", spec.name, e));
        assert!(
            command.contains(' '),
            "{}: value must be separated from the header: {}",
            spec.name,
            command
        );
    }
}

#[test]
fn queries_end_with_question_mark() {
    let registry = table();
    for spec in registry.parameters() {
        if let Some(get) = &spec.get_command {
            assert!(get.ends_with('?'), "{}: {}", spec.name, get);
        }
        if let Some(set) = &spec.set_template {
            assert!(!set.contains('?'), "{}: {}", spec.name, set);
        }
    }
}

#[test]
fn lifecycle_functions_are_registered() {
    let registry = table();
    assert_eq!(registry.function("reset").unwrap().command, "*RST");
    let self_test = registry.function("run_self_tests").unwrap();
    assert_eq!(self_test.command, "*TST?");
    assert!(self_test.is_query());
    assert!(registry.function("reset_all_sweep").is_ok());
    assert!(registry.function("autozero").is_ok());
}

#[test]
fn renamed_collisions_are_distinct() {
    let registry = table();
    let get = |name: &str| {
        registry
            .parameter(name)
            .unwrap()
            .get_command
            .clone()
            .unwrap()
    };

    assert_eq!(get("start_freq"), "SENS:POW:SWE:FREQ:STAR?");
    assert_eq!(get("sep_range_start_freq"), "SENS1:POW:SWE:FREQ:SENS:SRAN:STAR?");
    assert_eq!(get("amp_modulation_mode"), "SOUR:AM:MODE?");
    assert_eq!(get("amp_modulation_type"), "SOUR:AM:TYPE?");
    assert_eq!(get("inst_operating_mode"), "SOUR:POW:MODE?");
    assert_eq!(get("level_immediate"), "SOUR:POW:POW?");
    assert_eq!(get("hcopy_size"), "SENS:POW:SWE:HCOP:DEV:SIZE?");
    assert_eq!(get("hcopy_file_name"), "SENS:POW:SWE:HCOP:FILE:NAME?");
    assert!(registry.function("ref_curve_pow_meas").is_ok());
    assert!(registry.parameter("ref_curve_pow_meas_points").is_ok());
}

#[test]
fn two_decimal_entries_round() {
    let registry = table();
    let spec = registry.parameter("IQ_angle").unwrap();
    assert_eq!(
        spec.render_set(&ParamValue::Float(1.234)).unwrap(),
        "SOUR:IQ:IMP:QUAD 1.23"
    );
    let spec = registry.parameter("I_offset").unwrap();
    assert_eq!(spec.render_set(&ParamValue::Int(-3)).unwrap(), "SOUR:IQ:IMP:LEAK:I -3.00");
}

#[test]
fn integer_entries_reject_fractions() {
    let registry = table();
    let spec = registry.parameter("steps_number_RF_sweep").unwrap();
    assert_eq!(
        spec.render_set(&ParamValue::Int(101)).unwrap(),
        "SOUR:SWE:FREQ:POIN 101"
    );
    assert!(spec.render_set(&ParamValue::Float(2.5)).is_err());
    assert!(spec.render_set(&ParamValue::Int(1)).is_err());
}
