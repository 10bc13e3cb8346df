//! # demo_siggen
//!
//! A simulated signal-generator instrument wired to the SCPI core.
//!
//! The binary is the transport adapter the core deliberately does not
//! contain: it reads command lines from stdin, hands them to
//! `ScpiContext::execute`, prints replies to stdout and maps dispatch
//! failures onto instrument error codes in the queue, so
//! `SYSTEM:ERROR?` behaves like on a real box. The "hardware" is a plain
//! struct shared with the handlers; no synthesizer chip required.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use scpi_core::{
    DispatchError, ErrorSink, RegisterError, Reply, ScpiContext, parse_numeric,
};
use scpi_macros::scpi_tree;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const PROMPT: &str = "SCPI> ";
const IDENTITY: &str = "OIC,0.1,SCPI Signal Generator,0";

const FREQUENCY_DEFAULT: f64 = 1e6;
const FREQUENCY_MIN: f64 = 0.0;
const FREQUENCY_MAX: f64 = 5e7;

const VOLTAGE_DEFAULT: f64 = 0.0;
const VOLTAGE_MIN: f64 = -10.0;
const VOLTAGE_MAX: f64 = 10.0;

/// The simulated instrument state shared with the command handlers.
#[derive(Debug)]
struct SignalGenerator {
    frequency: f64,
    voltage: f64,
    output_on: bool,
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self {
            frequency: FREQUENCY_DEFAULT,
            voltage: VOLTAGE_DEFAULT,
            output_on: false,
        }
    }
}

/// Registers the instrument command surface.
fn build_context(device: &Rc<RefCell<SignalGenerator>>) -> Result<ScpiContext, RegisterError> {
    let mut ctx = ScpiContext::new();

    let measure = Rc::clone(device);
    let set_voltage = Rc::clone(device);
    let set_frequency = Rc::clone(device);
    let get_frequency = Rc::clone(device);
    let set_output = Rc::clone(device);
    let get_output = Rc::clone(device);
    let get_state = Rc::clone(device);

    scpi_tree!(ctx, {
        "IDENTIFY?" / "ID?" => |_, _| Ok(Reply::text(format!("{IDENTITY}\n")));
        "MEASURE" / "MEAS" => {
            "VOLTAGE?" / "VOLT?" => move |_, _| {
                let dev = measure.borrow();
                let volts = if dev.output_on { dev.voltage } else { 0.0 };
                Ok(Reply::text(format!("{volts:e}\n")))
            };
        };
        "SOURCE" / "SOUR" => {
            "VOLTAGE" / "VOLT" => move |errors, tokens| {
                let value = parse_argument(
                    errors,
                    tokens,
                    VOLTAGE_DEFAULT,
                    VOLTAGE_MIN,
                    VOLTAGE_MAX,
                    b"V",
                )?;
                set_voltage.borrow_mut().voltage = value;
                Ok(Reply::none())
            };
            "FREQUENCY" / "FREQ" => move |errors, tokens| {
                let value = parse_argument(
                    errors,
                    tokens,
                    FREQUENCY_DEFAULT,
                    FREQUENCY_MIN,
                    FREQUENCY_MAX,
                    b"Hz",
                )?;
                set_frequency.borrow_mut().frequency = value;
                Ok(Reply::none())
            };
            "FREQUENCY?" / "FREQ?" => move |_, _| {
                Ok(Reply::text(format!("{:e}\n", get_frequency.borrow().frequency)))
            };
        };
        "OUTPUT" / "OUTP" => move |errors, tokens| {
            let Some(arg) = tokens.first() else {
                return Err(missing_parameter(errors));
            };
            let on = match arg.text() {
                b"ON" => true,
                b"OFF" => false,
                text => (0.5 + parse_numeric(text, 0.0, 0.0, 1.0).value) as i64 != 0,
            };
            set_output.borrow_mut().output_on = on;
            Ok(Reply::none())
        } {
            "STATE?" / "STAT?" => move |_, _| {
                Ok(Reply::text(format!("{}\n", i32::from(get_state.borrow().output_on))))
            };
        };
        "OUTPUT?" / "OUTP?" => move |_, _| {
            Ok(Reply::text(format!("{}\n", i32::from(get_output.borrow().output_on))))
        };
    });

    Ok(ctx)
}

/// Queues `-109,"Missing parameter"` and returns the matching status.
fn missing_parameter(errors: &mut dyn ErrorSink) -> DispatchError {
    let err = DispatchError::command(-109, "Missing parameter");
    errors.push(scpi_core::ErrorEntry::new(-109, "Missing parameter"));
    err
}

/// Parses the first data token as a numeric argument, accepting only the
/// expected unit (or none at all).
fn parse_argument(
    errors: &mut dyn ErrorSink,
    tokens: &[scpi_core::Token<'_>],
    default_value: f64,
    min_value: f64,
    max_value: f64,
    expected_unit: &[u8],
) -> Result<f64, DispatchError> {
    let Some(arg) = tokens.first() else {
        return Err(missing_parameter(errors));
    };

    let numeric = parse_numeric(arg.text(), default_value, min_value, max_value);
    if let Some(unit) = numeric.unit {
        if unit != expected_unit {
            let err = DispatchError::command(-131, "Invalid suffix");
            errors.push(scpi_core::ErrorEntry::new(-131, "Invalid suffix"));
            return Err(err);
        }
    }
    if numeric.value < min_value || numeric.value > max_value {
        let err = DispatchError::command(-222, "Data out of range");
        errors.push(scpi_core::ErrorEntry::new(-222, "Data out of range"));
        return Err(err);
    }

    Ok(numeric.value)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .init();

    let device = Rc::new(RefCell::new(SignalGenerator::default()));
    let mut ctx = build_context(&device).expect("command registration");

    info!("simulated signal generator ready, ^D or 'exit' quits");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    print!("{PROMPT}");
    let _ = stdout.flush();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim_end();

        if line == "exit" {
            break;
        }

        if !line.is_empty() {
            match ctx.execute(line.as_bytes()) {
                Ok(reply) => {
                    if !reply.is_empty() {
                        print!("{reply}");
                    }
                }
                // The core reports statuses; mapping them onto instrument
                // error codes is this adapter's policy.
                Err(DispatchError::CommandNotFound) => {
                    debug!(line, "command not found");
                    ctx.push_error(-113, "Undefined header");
                }
                Err(DispatchError::NoCallback) => {
                    ctx.push_error(-100, "Command error");
                }
                Err(DispatchError::Command { .. }) => {
                    // Handlers queue their own diagnostics before failing.
                }
            }
        }

        print!("{PROMPT}");
        let _ = stdout.flush();
    }

    info!("shutting down");
}
