//! joulemeter - Main entry point
//!
//! Prints the energy consumed by the local machine over a fixed window.

use joulemeter_lib::machine::Machine;
use joulemeter_lib::report;

/// Length of the measurement window
const MEASUREMENT_SECONDS: u64 = 10;

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout carries only the report line
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let machine = Machine::local()?;
    let energy = machine.energy();

    let measurement = report::measure(energy.counter(), MEASUREMENT_SECONDS, std::thread::sleep)?;
    println!("{}", measurement);

    Ok(())
}
