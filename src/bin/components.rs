//! joulemeter - per-component CPU energy
//!
//! Resets the RAPL counter, waits a fixed window and prints the joules
//! consumed by the CPU packages and, where the hardware reports them,
//! their cores, DRAM and integrated graphics.

use std::thread;
use std::time::Duration;

use joulemeter_lib::energy::Counter;
use joulemeter_lib::machine::Machine;

const SLEEP_SECONDS: u64 = 10;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let machine = Machine::local()?;
    let Some(counter) = machine.energy().cpus_counter() else {
        println!("Cpu counters not present on this machine.");
        std::process::exit(1);
    };

    counter.reset()?;
    println!("Sleeping {} seconds.", SLEEP_SECONDS);
    thread::sleep(Duration::from_secs(SLEEP_SECONDS));

    let mut line = format!("Total Cpus Joules: {}", counter.joules_cpu_all()?);
    if counter.has_joules_cores() {
        line.push_str(&format!(" Total Cores Joules: {}", counter.joules_cores_all()?));
    }
    if counter.has_joules_dram() {
        line.push_str(&format!(" Total Dram Joules: {}", counter.joules_dram_all()?));
    }
    if counter.has_joules_graphic() {
        line.push_str(&format!(" Total Graphic Joules: {}", counter.joules_graphic_all()?));
    }
    println!("{}", line);

    for id in counter.packages() {
        let components = counter.joules_components(id)?;
        log::info!("package {}: {:.1} W average", id, (components / SLEEP_SECONDS as f64).cpu);
    }

    Ok(())
}
