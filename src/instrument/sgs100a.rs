//! Rohde & Schwarz SGS100A SGMA RF source, with NRP power-sensor sweep controls.
//!
//! The whole driver is a command table: [`parameter_table`] builds a
//! [`ParameterRegistry`] and [`open`] binds it to a transport. There is no
//! per-parameter code; every get/set goes through the generic facade.
//!
//! Command roots may contain `{sensor}` (NRP sensor channel, `SENS<n>`) and
//! `{path}` (modulation path, `AM<n>`/`FM<n>`/`PM<n>`); both are resolved
//! when the table is built.

use crate::adapters::Transport;
use crate::error::AppResult;
use crate::facade::{DeviceFacade, FacadeOptions};
use crate::parameter::{FunctionSpec, ParameterSpec, ValueParser, Validator};
use crate::registry::ParameterRegistry;

/// The SGS100A driver is the generic facade loaded with this module's table.
pub type RohdeSchwarzSgs100a<T> = DeviceFacade<T>;

const SENSOR_SLOT: &str = "{sensor}";
const PATH_SLOT: &str = "{path}";

/// Channel numbers substituted into command roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOptions {
    /// NRP sensor channel, 1-4.
    pub sensor: u8,
    /// Modulation path, 1-2.
    pub path: u8,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self { sensor: 1, path: 1 }
    }
}

/// Build the complete SGS100A table.
pub fn parameter_table(channels: ChannelOptions) -> AppResult<ParameterRegistry> {
    let mut registry = ParameterRegistry::new();

    let groups = [
        output_and_reference(),
        rf_sweep(),
        nrp_sensor(),
        nrp_hardcopy(),
        nrp_reference_curves(),
        modulation(),
        pulse_modulation(),
        noise_and_pulse_generator(),
        level_control(),
    ];
    for spec in groups.into_iter().flatten() {
        registry.register(resolve(spec, channels))?;
    }

    for function in functions() {
        let command = substitute(&function.command, channels);
        registry.register_function(FunctionSpec::new(function.name, command))?;
    }

    Ok(registry)
}

/// Open an SGS100A over an already-connected transport.
pub fn open<T: Transport>(
    id: impl Into<String>,
    transport: T,
    channels: ChannelOptions,
    options: FacadeOptions,
) -> AppResult<RohdeSchwarzSgs100a<T>> {
    let registry = parameter_table(channels)?;
    Ok(DeviceFacade::new(id, registry, transport, options))
}

fn substitute(command: &str, channels: ChannelOptions) -> String {
    command
        .replace(SENSOR_SLOT, &channels.sensor.to_string())
        .replace(PATH_SLOT, &channels.path.to_string())
}

fn resolve(mut spec: ParameterSpec, channels: ChannelOptions) -> ParameterSpec {
    spec.get_command = spec.get_command.map(|c| substitute(&c, channels));
    spec.set_template = spec.set_template.map(|t| substitute(&t, channels));
    spec
}

// -----------------------------------------------------------------------------
// Row shapes
// -----------------------------------------------------------------------------

/// `<root>?` / `<root> {value}`
fn rw(name: &str, root: &str) -> ParameterSpec {
    ParameterSpec::new(name)
        .with_get(format!("{}?", root))
        .with_set(format!("{} {{value}}", root))
}

/// Query only.
fn ro(name: &str, root: &str) -> ParameterSpec {
    ParameterSpec::new(name).with_get(format!("{}?", root))
}

/// Set only.
fn wo(name: &str, root: &str) -> ParameterSpec {
    ParameterSpec::new(name).with_set(format!("{} {{value}}", root))
}

fn number(name: &str, root: &str, min: f64, max: f64) -> ParameterSpec {
    rw(name, root)
        .with_parser(ValueParser::Float)
        .with_range(min, max)
}

/// Like [`number`] but the value is always sent with two decimals.
fn fixed2(name: &str, root: &str, min: f64, max: f64) -> ParameterSpec {
    ParameterSpec::new(name)
        .with_get(format!("{}?", root))
        .with_set(format!("{} {{value:.2}}", root))
        .with_parser(ValueParser::Float)
        .with_range(min, max)
}

fn any_number(name: &str, root: &str) -> ParameterSpec {
    rw(name, root)
        .with_parser(ValueParser::Float)
        .with_validator(Validator::any_number())
}

fn integer(name: &str, root: &str, min: i64, max: i64) -> ParameterSpec {
    rw(name, root)
        .with_parser(ValueParser::Int)
        .with_int_range(min, max)
}

fn choice(name: &str, root: &str, members: &[&str]) -> ParameterSpec {
    rw(name, root).with_choices(members.iter().copied())
}

/// Instrument-native boolean: the device accepts `0`/`1`/`OFF`/`ON` as-is.
fn state(name: &str, root: &str) -> ParameterSpec {
    choice(name, root, &["0", "1", "OFF", "ON"])
}

/// Call-site `on`/`off`, wire `1`/`0`.
fn switch(name: &str, root: &str) -> ParameterSpec {
    rw(name, root).with_on_off()
}

fn text(name: &str, root: &str) -> ParameterSpec {
    rw(name, root).with_parser(ValueParser::Str)
}

const MAX_SENSE_FREQ: f64 = 1e12;
const INT_EXT: &[&str] = &["INT", "EXT", "int", "ext"];
const REF_FREQS: &[&str] = &["10MHz", "100MHz", "1000MHz"];
const AUTOSCALE: &[&str] = &["OFF", "CEXP", "FEXP", "CFL", "FFL"];
const RUN_MODES: &[&str] = &["SING", "CONT"];
const TIMING_MODES: &[&str] = &["FAST", "NORM", "HPR"];
const MOD_SOURCES: &[&str] = &["LF1", "LF2", "NOIS", "EXT1", "EXT2", "EXT", "INT"];
const COUPLING: &[&str] = &["UNC", "TOT", "RAT"];

// -----------------------------------------------------------------------------
// Tables
// -----------------------------------------------------------------------------

fn output_and_reference() -> Vec<ParameterSpec> {
    vec![
        fixed2("frequency", "SOUR:FREQ", 1e6, 20e9)
            .with_label("Frequency")
            .with_unit("Hz"),
        fixed2("phase", "SOUR:PHAS", 0.0, 360.0)
            .with_label("Phase")
            .with_unit("deg"),
        fixed2("power", "SOUR:POW", -120.0, 25.0)
            .with_label("Power")
            .with_unit("dBm"),
        switch("status", ":OUTP:STAT").with_label("RF output"),
        switch("IQ_state", ":IQ:STAT").with_label("IQ modulation"),
        choice("ref_osc_source", "SOUR:ROSC:SOUR", INT_EXT),
        choice("LO_source", "SOUR:LOSC:SOUR", INT_EXT),
        choice(
            "ref_LO_out",
            "CONN:REFL:OUTP",
            &["REF", "LO", "OFF", "ref", "lo", "off", "Off"],
        ),
        choice("ref_osc_output_freq", "SOUR:ROSC:OUTP:FREQ", REF_FREQS),
        choice("ref_osc_external_freq", "SOUR:ROSC:EXT:FREQ", REF_FREQS),
        switch("IQ_impairments", ":SOUR:IQ:IMP:STAT"),
        fixed2("I_offset", "SOUR:IQ:IMP:LEAK:I", -10.0, 10.0).with_unit("%"),
        fixed2("Q_offset", "SOUR:IQ:IMP:LEAK:Q", -10.0, 10.0).with_unit("%"),
        fixed2("IQ_gain_imbalance", "SOUR:IQ:IMP:IQR", -1.0, 1.0).with_unit("dB"),
        fixed2("IQ_angle", "SOUR:IQ:IMP:QUAD", -8.0, 8.0).with_unit("deg"),
        choice("trigger_source", "SOUR:LIST:TRIG:SOUR", &["IMM", "BUS", "EXT"]),
        choice(
            "trigger_mode",
            "SOUR:LIST:TRIG:MODE",
            &["AUTO", "EXT", "EGAT", "SING", "ESIN"],
        ),
    ]
}

fn rf_sweep() -> Vec<ParameterSpec> {
    vec![
        state("NRP_set_status", "INIT:POW:CONT"),
        choice("RS_compatibility", "SWE:TYPE", &["ADV", "STAN"]),
        number("dwell_time_step", "SOUR:SWE:POW:DWEL", 0.001, 100.0).with_unit("s"),
        choice("freq_sweep_type", "SOUR:SWE:GEN", &["STEP", "ANAL"]),
        choice("cycle_mode", "SOUR:SWE:POW:MODE", &["AUTO", "MAN", "STEP"]),
        ro("query_lvlsweep_spacing", "SOUR:SWE:POW:SPAC:MODE"),
        number("log_det_step_size", "SOUR:SWE:POW:STEP:LOG", 0.01, 139.0).with_unit("dB"),
        number("dwell_time_freqsweep_step", "SOUR:SWE:FREQ:DWEL", 0.001, 100.0)
            .with_unit("s"),
        choice(
            "cycle_mode_freqsweep",
            "SOUR:SWE:FREQ:MODE",
            &["AUTO", "MAN", "STEP"],
        ),
        integer("steps_number_RF_sweep", "SOUR:SWE:FREQ:POIN", 2, 10_001),
        choice("calc_freq_int_mode", "SOUR:SWE:FREQ:SPAC", &["LIN", "LOG"]),
        choice("waveform_shape_freqsweep", "SOUR:SWE:POW:SHAP", &["SAWT", "TRI"]),
        state("signal_changes_active", "SOUR:SWE:POW:RETR"),
        ro("query_sweep_state", "SOUR:SWE:POW:RUNN"),
        number("log_det_step_width", "SOUR:SWE:FREQ:STEP:LOG", 0.01, 100.0).with_unit("%"),
        number("lin_det_step_width", "SOUR:SWE:FREQ:STEP:LIN", 0.001, 20e9).with_unit("Hz"),
        number("ramp_sweep_duration", "SOUR:SWE:FREQ:TIME", 0.01, 100.0).with_unit("s"),
    ]
}

fn nrp_sensor() -> Vec<ParameterSpec> {
    vec![
        // frequency-mode sensor settings
        number(
            "lvl_offset",
            "SENS{sensor}:POW:SWE:FREQ:SENS:OFFS",
            -100.0,
            100.0,
        )
        .with_unit("dB"),
        state("offset_state", "SENS{sensor}:POW:SWE:FREQ:SENS:OFFS:STAT"),
        number(
            "sep_range_start_freq",
            "SENS{sensor}:POW:SWE:FREQ:SENS:SRAN:STAR",
            0.0,
            MAX_SENSE_FREQ,
        )
        .with_unit("Hz"),
        number(
            "sep_range_stop_freq",
            "SENS{sensor}:POW:SWE:FREQ:SENS:SRAN:STOP",
            0.0,
            MAX_SENSE_FREQ,
        )
        .with_unit("Hz"),
        state("pow_meas_state", "SENS{sensor}:POW:SWE:FREQ:SENS:SRAN:STAT"),
        // power-mode sensor settings
        number(
            "set_offset_level",
            "SENS{sensor}:POW:SWE:POW:SENS:OFFS",
            -100.0,
            100.0,
        )
        .with_unit("dB"),
        state("offset_level_state", "SENS{sensor}:POW:SWE:POW:SENS:OFFS:STAT"),
        number(
            "sep_freq_set",
            "SENS{sensor}:POW:SWE:POW:SENS:SFR",
            0.0,
            MAX_SENSE_FREQ,
        )
        .with_unit("Hz"),
        state("sep_freq_activate", "SENS{sensor}:POW:SWE:POW:SENS:SFR:STAT"),
        // time-mode sensor settings
        number(
            "sep_freq_time_set",
            "SENS{sensor}:POW:SWE:TIME:SENS:OFFS",
            -100.0,
            100.0,
        )
        .with_unit("dB"),
        state(
            "sep_freq_time_activate",
            "SENS{sensor}:POW:SWE:TIME:SENS:OFFS:STAT",
        ),
        state("pulse_data_an_state", "SENS{sensor}:POW:SWE:TIME:SENS:PULS:STAT"),
        choice(
            "sense_time_treshold_base",
            "SENS{sensor}:POW:SWE:TIME:SENS:PULS:THR:BASE",
            &["VOLT", "POW"],
        ),
        number(
            "upper_ref_lvl",
            "SENS{sensor}:POW:SWE:TIME:SENS:PULS:THR:POW:HREF",
            0.0,
            100.0,
        )
        .with_unit("%"),
        number(
            "lower_ref_lvl",
            "SENS{sensor}:POW:SWE:TIME:SENS:PULS:THR:POW:LREF",
            0.0,
            100.0,
        )
        .with_unit("%"),
        number(
            "mid_ref_lvl",
            "SENS{sensor}:POW:SWE:TIME:SENS:PULS:THR:POW:REF",
            0.0,
            100.0,
        )
        .with_unit("%"),
        number(
            "define_sep_fr",
            "SENS{sensor}:POW:SWE:TIME:SENS:SFR",
            0.0,
            MAX_SENSE_FREQ,
        )
        .with_unit("Hz"),
        state("sweep_time_state", "SENS{sensor}:POW:SWE:TIME:SENS:SFR:STAT"),
        number(
            "set_dropout_time",
            "SENS{sensor}:POW:SWE:TIME:SENS:TRIG:DTIM",
            0.0,
            10.0,
        )
        .with_unit("s"),
        number(
            "set_hyst_int_trigger",
            "SENS{sensor}:POW:SWE:TIME:SENS:TRIG:HYST",
            0.0,
            10.0,
        )
        .with_unit("dB"),
        number(
            "trigger_level",
            "SENS{sensor}:POW:SWE:TIME:SENS:TRIG:LEV",
            -200.0,
            100.0,
        )
        .with_unit("dBm"),
        choice(
            "trigger_pol",
            "SENS{sensor}:POW:SWE:TIME:SENS:TRIG:SLOP",
            &["POS", "NEG"],
        ),
        choice(
            "trg_sens",
            "SENS{sensor}:POW:SWE:TIME:SENS:TRIG:SOUR",
            &["FREE", "AUTO", "INT", "EXT"],
        ),
        // power analysis: frequency mode
        choice("freq_mode_poweran_set", "SENS:POW:SWE:FREQ:RMOD", &["CONT", "SING"]),
        choice("spacing_freqan_set", "SENS:POW:SWE:FREQ:SPAC:MODE", &["LIN", "LOG"]),
        number("start_freq", "SENS:POW:SWE:FREQ:STAR", 0.0, MAX_SENSE_FREQ).with_unit("Hz"),
        integer("steps_num_freqmode", "SENS:POW:SWE:FREQ:STEP", 1, 1000),
        number("stop_freq", "SENS:POW:SWE:FREQ:STOP", 0.0, MAX_SENSE_FREQ).with_unit("Hz"),
        choice("speed_mode_meas", "SENS:POW:SWE:FREQ:TIM:MODE", TIMING_MODES),
        choice("y_autoscale", "SENS:POW:SWE:FREQ:YSC:AUTO", AUTOSCALE),
        number("max_y_axis", "SENS:POW:SWE:FREQ:YSC:MAX", -200.0, 100.0).with_unit("dBm"),
        number("min_y_axis", "SENS:POW:SWE:FREQ:YSC:MIN", -200.0, 100.0).with_unit("dBm"),
        // power analysis: power mode
        choice("measurement_mode", "SENS:POW:SWE:MODE", &["FREQ", "POW", "TIME"]),
        choice("pow_mode_poweran_set", "SENS:POW:SWE:POW:RMOD", RUN_MODES),
        choice("spacing_poweran_set", "SENS:POW:SWE:POW:SPAC:MODE", &["LIN"]),
        number("start_power_analysis", "SENS:POW:SWE:POW:STAR", -145.0, 20.0)
            .with_unit("dBm"),
        integer("steps_num_powmode", "SENS:POW:SWE:POW:STEP", 10, 1000),
        number("stop_power_analysis", "SENS:POW:SWE:POW:STOP", -145.0, 20.0)
            .with_unit("dBm"),
        choice("timing_mode_powan", "SENS:POW:SWE:POW:TIM:MODE", TIMING_MODES),
        choice("y_pow_autoscale", "SENS:POW:SWE:POW:YSC:AUTO", AUTOSCALE),
        number("max_y_axis_powmode", "SENS:POW:SWE:POW:YSC:MAX", -200.0, 100.0)
            .with_unit("dBm"),
        number("min_y_axis_powmode", "SENS:POW:SWE:POW:YSC:MIN", -200.0, 100.0)
            .with_unit("dBm"),
        choice("power_analysis_mode", "SENS:POW:SWE:RMOD", RUN_MODES),
        // power analysis: time mode
        choice(
            "averaging_factor",
            "SENS:POW:SWE:TIME:AVER:COUN",
            &["1", "2", "4", "8", "16", "32", "64", "128", "256", "512", "1024"],
        ),
        choice("time_mode_poweran_set", "SENS:POW:SWE:TIME:RMOD", RUN_MODES),
        choice("spacing_timean_set", "SENS:POW:SWE:TIME:SPAC:MODE", &["LIN"]),
        number("starttime_pow_vs_time", "SENS:POW:SWE:TIME:STAR", -1.0, 1.0).with_unit("s"),
        integer("num_steps_pow_vs_time", "SENS:POW:SWE:TIME:STEP", 10, 1000),
        number("stoptime_pow_vs_time", "SENS:POW:SWE:TIME:STOP", 0.0, 2.0).with_unit("s"),
        choice("which_trigger", "SENS:POW:SWE:TIME:TEV", &["AND", "OR"]),
        choice("y_time_autoscale", "SENS:POW:SWE:TIME:YSC:AUTO", AUTOSCALE),
        number("max_y_axis_timemode", "SENS:POW:SWE:TIME:YSC:MAX", -200.0, 100.0)
            .with_unit("dBm"),
        number("min_y_axis_timemode", "SENS:POW:SWE:TIME:YSC:MIN", -200.0, 100.0)
            .with_unit("dBm"),
    ]
}

fn nrp_hardcopy() -> Vec<ParameterSpec> {
    vec![
        choice("output_dev", "SENS:POW:SWE:HCOP:DEV", &["FILE", "PRIN"]),
        choice(
            "bitmap_format",
            "SENS:POW:SWE:HCOP:DEV:LANG",
            &["BMP", "JPG", "XPM", "PNG", "CSV"],
        ),
        choice("decimal_point", "SENS:POW:SWE:HCOP:DEV:LANG:CSV:DPO", &["DOT", "COMM"]),
        choice("header_csv_row", "SENS:POW:SWE:HCOP:DEV:LANG:CSV:HEAD", &["OFF", "STAN"]),
        choice("csv_orientation", "SENS:POW:SWE:HCOP:DEV:LANG:CSV:ORI", &["HOR", "VERT"]),
        choice(
            "csv_separator",
            "SENS:POW:SWE:HCOP:DEV:LANG:CSV:COL:SEP",
            &["TAB", "SEM", "COMM", "BLAN"],
        ),
        choice(
            "hcopy_size",
            "SENS:POW:SWE:HCOP:DEV:SIZE",
            &["320,240", "640,480", "800,600", "1024,768"],
        ),
        text("hcopy_file_name", "SENS:POW:SWE:HCOP:FILE:NAME"),
        state("autonaming_state", "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:STAT"),
        text("hcopy_dir", "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:DIR"),
        ro("query_all_hcopy_files", "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:FILE")
            .with_parser(ValueParser::Str),
        ro("query_day", "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:FILE:DAY")
            .with_parser(ValueParser::Int),
        state(
            "day_in_filename_state",
            "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:FILE:DAY:STAT",
        ),
        ro("query_month", "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:FILE:MONT")
            .with_parser(ValueParser::Int),
        state(
            "month_in_filename_state",
            "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:FILE:MONT:STAT",
        ),
        ro("query_number", "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:FILE:NUMB")
            .with_parser(ValueParser::Int),
        text("prefix_filename_set", "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:FILE:PREF"),
        state(
            "prefix_in_filename_state",
            "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:FILE:PREF:STAT",
        ),
        ro("query_year", "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:FILE:YEAR")
            .with_parser(ValueParser::Int),
        state(
            "year_in_filename_state",
            "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:FILE:YEAR:STAT",
        ),
    ]
}

fn nrp_reference_curves() -> Vec<ParameterSpec> {
    vec![
        integer("n_points_from_reference", "SENS:POW:SWE:FREQ:REF:DATA:POIN", 10, 1000),
        text("x_set_freq_meas", "SENS:POW:SWE:FREQ:REF:DATA:XVAL"),
        text("y_set_freq_meas", "SENS:POW:SWE:FREQ:REF:DATA:YVAL"),
        ro("ref_curve_pow_meas_points", "SENS:POW:SWE:POW:REF:DATA:POIN")
            .with_parser(ValueParser::Int),
        text("x_set_pow_meas", "SENS:POW:SWE:POW:REF:DATA:XVAL"),
        text("y_set_pow_meas", "SENS:POW:SWE:POW:REF:DATA:YVAL"),
        ro("query_npoints_ref_curve_timemeas", "SENS:POW:SWE:TIME:REF:DATA:POIN")
            .with_parser(ValueParser::Int),
        text("x_set_time_meas", "SENS:POW:SWE:TIME:REF:DATA:XVAL"),
        text("y_set_time_meas", "SENS:POW:SWE:TIME:REF:DATA:YVAL"),
    ]
}

fn modulation() -> Vec<ParameterSpec> {
    vec![
        state("all_modulation_state", "SOUR:MOD:ALL:STAT"),
        // amplitude
        state("modulation_state", "SOUR:AM{path}:STAT"),
        choice("modulation_source_amp", "SOUR:AM{path}:SOUR", MOD_SOURCES),
        number("perc_amp_modulation", "SOUR:AM{path}:DEPT", 0.0, 100.0).with_unit("%"),
        number("perc_lin_amp_modulation", "SOUR:AM:DEPT:LIN", 0.0, 100.0).with_unit("%"),
        number("perc_exp_amp_modulation", "SOUR:AM{path}:DEPT:EXP", 0.0, 100.0)
            .with_unit("dB"),
        choice("amp_modulation_mode", "SOUR:AM:MODE", &["SCAN", "NORM"]),
        number("depth_LF_signal", "SOUR:AM:DEPT:SUM", 0.0, 100.0).with_unit("%"),
        choice("coupling_mode", "SOUR:AM:DEV:MODE", COUPLING),
        number("dev_ratio", "SOUR:AM:RAT", 0.0, 100.0).with_unit("%"),
        number("sensitivity_exp_ext_sign", "SOUR:AM{path}:SENS:EXP", 0.0, 100.0),
        number("sensitivity_lin_ext_sign", "SOUR:AM{path}:SENS:LIN", 0.0, 100.0),
        choice("amp_modulation_type", "SOUR:AM:TYPE", &["LIN", "EXP"]),
        // frequency
        state("freq_modulation_state", "SOUR:FM{path}:STAT"),
        number("dev_freq_modulation", "SOUR:FM{path}:DEV", 0.0, 10_000.0).with_unit("Hz"),
        choice("modulation_source_freq", "SOUR:FM{path}:SOUR", MOD_SOURCES),
        choice("freq_coupling_mode", "SOUR:FM:DEV:MODE", COUPLING),
        number("freq_total_dev", "SOUR:FM:DEV:SUM", 0.0, 40e6).with_unit("Hz"),
        number("freq_dev_ratio", "SOUR:FM:RAT", 0.0, 100.0).with_unit("%"),
        choice("freq_modulation_mode", "SOUR:FM:MODE", &["HBAN", "LNO"]),
        ro("query_sens_signal", "SOUR:FM:SENS").with_parser(ValueParser::Float),
        // phase
        state("phase_modulation_state", "SOUR:PM{path}:STAT"),
        choice("modulation_source_phase", "SOUR:PM{path}:SOUR", MOD_SOURCES),
        choice("phase_modulation_mode", "SOUR:PM:MODE", &["HBAN", "LNO", "HDEV"]),
        choice("phase_coupling_mode", "SOUR:PM:DEV:MODE", COUPLING),
        number("phase_total_dev", "SOUR:PM:DEV:SUM", 0.0, 20.0).with_unit("rad"),
        number("phase_dev_ratio", "SOUR:PM:RAT", 0.0, 100.0).with_unit("%"),
        ro("query_sens_signal_phase", "SOUR:PM:SENS").with_parser(ValueParser::Float),
        number("phase_mod_dev_rad", "SOUR:PM{path}:DEV", 0.0, 2.0).with_unit("rad"),
    ]
}

fn pulse_modulation() -> Vec<ParameterSpec> {
    vec![
        choice("pulse_modulation_mode", "SOUR:PULM:MODE", &["SING", "DOUB", "PTR"]),
        choice(
            "pulse_mod_trg_mode",
            "SOUR:PULM:TRIG:MODE",
            &["AUTO", "EXT", "EGAT", "SING", "ESIN"],
        ),
        switch("pulsemod_state", "SOUR:PULM:STAT"),
        choice("pulsemod_source", "SOUR:PULM:SOUR", INT_EXT),
        choice("pulse_pol", "SOUR:PULM:POL", &["NORM", "INV"]),
        fixed2("pulse_width", "SOUR:PULM:WIDT", 20.0, 100.0),
        choice("pulse_imp", "SOUR:PULM:IMP", &["G50", "G10K"]),
        number("pulse_period", "SOUR:PULM:PER", 2e-8, 100.0).with_unit("s"),
        any_number("pulse_delay", "SOUR:PULM:DEL").with_unit("s"),
        any_number("pulse_double_delay", "SOUR:PULM:DOUB:DEL").with_unit("s"),
        any_number("double_pulse_width", "SOUR:PULM:DOUB:WIDT").with_unit("s"),
        state("double_pulse_width_RS", "SOUR:PULM:DOUB:STAT"),
        choice("set_transition_mode", "SOUR:PULM:TTYP", &["SMO", "FAST"]),
        number("set_ipt_thr", "SOUR:PULM:THR", 0.0, 2.0).with_unit("V"),
        choice("trig_pulm_mode", "SOUR:PULM:INT:TRA:TRIG", &["IMM"]),
        // pulse trains
        ro("query_pulse_train", "SOUR:PULM:TRA:CAT").with_parser(ValueParser::Str),
        wo("delete_pulse_train", "SOUR:PULM:TRA:DEL"),
        text("pulse_train_ontime", "SOUR:PULM:TRA:ONT"),
        text("pulse_train_offtime", "SOUR:PULM:TRA:OFFT"),
        ro("number_rep_points", "SOUR:PULM:TRA:REP:POIN").with_parser(ValueParser::Int),
        ro("number_on_rep_points", "SOUR:PULM:TRA:ONT:POIN").with_parser(ValueParser::Int),
        ro("number_off_rep_points", "SOUR:PULM:TRA:OFFT:POIN").with_parser(ValueParser::Int),
        ro("number_reps_one_pulse", "SOUR:PULM:TRA:REP").with_parser(ValueParser::Str),
        text("pulse_train_select", "SOUR:PULM:TRA:SEL"),
    ]
}

fn noise_and_pulse_generator() -> Vec<ParameterSpec> {
    vec![
        number("set_noise_lvl", "SOUR:NOIS:BWID", 1e5, 1e7).with_unit("Hz"),
        state("bwd_limitation", "SOUR:NOIS:BWID:STAT"),
        choice("noise_power_density", "SOUR:NOIS:DIST", &["GAUS", "EQU"]),
        number("noise_level_relative", "SOUR:NOIS:LEV:REL", -149.18, -52.67).with_unit("dB"),
        choice("pulse_output_pol", "SOUR:PGEN:OUTP:POL", &["NORM", "INV"]),
        state("pulse_output_state", "SOUR:PGEN:OUTP:STAT"),
        state("video_signal_out_state", "SOUR:PGEN:STAT"),
    ]
}

fn level_control() -> Vec<ParameterSpec> {
    vec![
        choice(
            "output_level_adj",
            "SOUR:POW:ALC:STAT",
            &["0", "OFF", "AUTO", "1", "ON", "ONT", "PRES", "OFFT"],
        ),
        choice("ALC_sensitivity", "SOUR:POW:ALC:DSEN", &["AUTO", "FIX"]),
        choice("ctrl_lvl_temp_state", "SOUR:POW:ALC:SONC", &["OFF", "SONC"]),
        choice("step_attenuator_low", "SOUR:POW:ATT:PATT", &["MECH", "ELEC"]),
        choice("attenuator_state", "SOUR:POW:ATT:RFOF:MODE", &["UNCH", "FATT"]),
        state("signal_lvl_display", "SOUR:POW:EMF:STAT"),
        choice(
            "lvl_beah_set",
            "SOUR:POW:LBEH",
            &["AUTO", "UNIN", "MON", "CVSW", "HDUN"],
        ),
        any_number("max_RF_output", "SOUR:POW:LIM:AMPL").with_unit("dBm"),
        choice("RF_lvl_mode", "SOUR:POW:LMOD", &["NORM", "LOWN", "LOWD"]),
        any_number("sweep_lvl", "SOUR:POW:MAN").with_unit("dBm"),
        choice("inst_operating_mode", "SOUR:POW:MODE", &["CW", "FIX", "SWE"]),
        any_number("level_immediate", "SOUR:POW:POW").with_unit("dBm"),
        any_number("RF_lvl_start", "SOUR:POW:STAR").with_unit("dBm"),
        any_number("RF_lvl_stop", "SOUR:POW:STOP").with_unit("dBm"),
        choice("step_width_RF", "SOUR:POW:STEP:MODE", &["DEC", "USER"]),
        number("step_width_RF_set", "SOUR:POW:STEP:INCR", 0.0, 200.0).with_unit("dB"),
        number(
            "offset_level_downstream_inst",
            "SOUR:POW:LEV:IMM:OFFS",
            -100.0,
            100.0,
        )
        .with_unit("dB"),
        choice("which_level_conf", "SOUR:POW:LEV:IMM:RCL", &["INCL", "EXCL"]),
        wo("RF_lvl_DUT", "SOUR:POW:LEV:IMM:AMPL").with_choices(["UP", "DOWN"]),
        ro("lower_range", "SOUR:POW:RANG:LOW").with_parser(ValueParser::Float),
        ro("upper_range", "SOUR:POW:RANG:UPP").with_parser(ValueParser::Float),
        state("range_warn_ignore", "SOUR:POW:WIGN"),
    ]
}

fn functions() -> Vec<FunctionSpec> {
    [
        ("reset", "*RST"),
        ("run_self_tests", "*TST?"),
        ("reset_all_sweep", "SOUR:SWE:RES:ALL"),
        ("freq_sweep_execute", "SOUR:SWE:POW:EXEC"),
        ("phase_reference", "SOUR:PHAS:REF"),
        ("autozero", "SENS{sensor}:POW:ZERO"),
        ("set_thd_default", "SENS{sensor}:POW:SWE:TIME:SENS:TRIG:AUTO ONCE"),
        ("sweep_abort", "SENS:POW:SWE:ABOR"),
        ("NRP_start", "SENS:POW:SWE:INIT"),
        ("ref_curv", "SENS:POW:SWE:FREQ:REF:DATA:COPY"),
        ("ref_curve_pow_meas", "SENS:POW:SWE:POW:REF:DATA:COPY"),
        ("ref_curve_timemeas", "SENS:POW:SWE:TIME:REF:DATA:COPY"),
        ("y_scale_rst", "SENS:POW:SWE:FREQ:YSC:AUTO:RES"),
        ("y_pow_scale_rst", "SENS:POW:SWE:POW:YSC:AUTO:RES"),
        ("y_time_scale_rst", "SENS:POW:SWE:TIME:YSC:AUTO:RES"),
        ("trg_hcopy", "SENS:POW:SWE:HCOP:EXEC"),
        ("delete_all_hcopy_files", "SENS:POW:SWE:HCOP:FILE:NAME:AUTO:DIR:CLE"),
        ("pulse_mod_trg_gen", "SOUR:PULM:INT:TRA:TRIG:IMM"),
    ]
    .into_iter()
    .map(|(name, command)| FunctionSpec::new(name, command))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParamValue;

    #[test]
    fn test_table_builds() {
        let registry = parameter_table(ChannelOptions::default()).unwrap();
        assert!(registry.len() > 200);
        assert!(!registry.is_sealed());
    }

    #[test]
    fn test_channels_are_substituted() {
        let registry = parameter_table(ChannelOptions { sensor: 3, path: 2 }).unwrap();
        assert_eq!(
            registry.parameter("lvl_offset").unwrap().get_command.as_deref(),
            Some("SENS3:POW:SWE:FREQ:SENS:OFFS?")
        );
        assert_eq!(
            registry
                .parameter("modulation_state")
                .unwrap()
                .render_set(&"ON".into())
                .unwrap(),
            "SOUR:AM2:STAT ON"
        );
        assert_eq!(registry.function("autozero").unwrap().command, "SENS3:POW:ZERO");
    }

    #[test]
    fn test_instrument_native_state_tokens() {
        let registry = parameter_table(ChannelOptions::default()).unwrap();
        let spec = registry.parameter("signal_changes_active").unwrap();
        assert_eq!(
            spec.render_set(&ParamValue::Int(1)).unwrap(),
            "SOUR:SWE:POW:RETR 1"
        );
        assert!(spec.render_set(&"on".into()).is_err());
    }

    #[test]
    fn test_write_only_step_direction() {
        let registry = parameter_table(ChannelOptions::default()).unwrap();
        let spec = registry.parameter("RF_lvl_DUT").unwrap();
        assert!(!spec.is_readable());
        assert_eq!(
            spec.render_set(&"UP".into()).unwrap(),
            "SOUR:POW:LEV:IMM:AMPL UP"
        );
    }
}
