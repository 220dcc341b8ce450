//! Linux energy counters backed by sysfs
//!
//! Supports:
//! - RAPL (Running Average Power Limit) zones via /sys/class/powercap
//! - hwmon energy meters via /sys/class/hwmon (energyN_input)
//!
//! Both interfaces expose cumulative microjoule counters. The RAPL ones wrap
//! at `max_energy_range_uj`, so every domain remembers the last raw value and
//! accumulates the difference on each read.

use crate::core::{CounterType, Error, Joules, JoulesCpu, Result};
use crate::energy::Counter;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const MICROJOULES_PER_JOULE: f64 = 1_000_000.0;

/// hwmon chips whose energy inputs are per-core CPU sensors rather than a machine meter
const CPU_HWMON_CHIPS: &[&str] = &["amd_energy"];

/// Energy consumed between two raw readings, accounting for a single wrap.
///
/// The counter takes every value in `0..=max_energy`, so stepping from the
/// maximum back to zero is itself one microjoule.
pub(crate) fn energy_delta(last: u64, current: u64, max_energy: Option<u64>) -> u64 {
    if current >= last {
        current - last
    } else {
        match max_energy {
            Some(max) => max.saturating_sub(last) + 1 + current,
            None => current,
        }
    }
}

fn read_trimmed(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(s.trim().to_string()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(Error::PermissionDenied(format!(
            "Cannot read {} (try running with sudo or add CAP_SYS_RAWIO)",
            path.display()
        ))),
        Err(e) => Err(Error::Io(e)),
    }
}

fn read_u64(path: &Path) -> Result<u64> {
    let value = read_trimmed(path)?;
    value.parse().map_err(|_| Error::Parse {
        path: path.to_path_buf(),
        value,
    })
}

struct DomainState {
    last_raw: u64,
    joules: Joules,
}

/// A single cumulative microjoule counter file
struct EnergyDomain {
    energy_path: PathBuf,
    max_energy: Option<u64>,
    state: Mutex<DomainState>,
}

impl EnergyDomain {
    fn open(energy_path: PathBuf, max_energy: Option<u64>) -> Result<Self> {
        let initial = read_u64(&energy_path)?;
        Ok(Self {
            energy_path,
            max_energy,
            state: Mutex::new(DomainState {
                last_raw: initial,
                joules: 0.0,
            }),
        })
    }

    fn joules(&self) -> Result<Joules> {
        let current = read_u64(&self.energy_path)?;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let delta = energy_delta(state.last_raw, current, self.max_energy);
        state.joules += delta as f64 / MICROJOULES_PER_JOULE;
        state.last_raw = current;

        Ok(state.joules)
    }

    fn reset(&self) -> Result<()> {
        let current = read_u64(&self.energy_path)?;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.last_raw = current;
        state.joules = 0.0;
        Ok(())
    }
}

fn joules_or_zero(domain: Option<&EnergyDomain>) -> Result<Joules> {
    domain.map_or(Ok(0.0), EnergyDomain::joules)
}

// ===== RAPL (CPUs counter) =====

/// One RAPL package zone and whichever sub-zones it exposes
struct RaplPackage {
    package: EnergyDomain,
    cores: Option<EnergyDomain>,
    graphic: Option<EnergyDomain>,
    dram: Option<EnergyDomain>,
}

impl RaplPackage {
    fn open_zone(zone: &Path) -> Result<EnergyDomain> {
        let max_energy = read_u64(&zone.join("max_energy_range_uj")).ok();
        EnergyDomain::open(zone.join("energy_uj"), max_energy)
    }

    fn open(zone: &Path, sub_zones: &[PathBuf]) -> Result<Self> {
        let mut package = Self {
            package: Self::open_zone(zone)?,
            cores: None,
            graphic: None,
            dram: None,
        };

        for sub_zone in sub_zones {
            let name = match read_trimmed(&sub_zone.join("name")) {
                Ok(name) => name,
                Err(_) => continue,
            };
            let slot = match name.as_str() {
                "core" => &mut package.cores,
                "uncore" => &mut package.graphic,
                "dram" => &mut package.dram,
                _ => {
                    log::debug!("Ignoring RAPL sub-zone {:?} ({})", sub_zone, name);
                    continue;
                }
            };
            match Self::open_zone(sub_zone) {
                Ok(domain) => *slot = Some(domain),
                Err(e) => log::warn!("RAPL sub-zone {:?} ({}) unreadable: {}", sub_zone, name, e),
            }
        }

        Ok(package)
    }

    fn components(&self) -> Result<JoulesCpu> {
        Ok(JoulesCpu::new(
            self.package.joules()?,
            joules_or_zero(self.cores.as_ref())?,
            joules_or_zero(self.graphic.as_ref())?,
            joules_or_zero(self.dram.as_ref())?,
        ))
    }

    fn reset(&self) -> Result<()> {
        self.package.reset()?;
        for domain in [&self.cores, &self.graphic, &self.dram].into_iter().flatten() {
            domain.reset()?;
        }
        Ok(())
    }
}

/// Parses "intel-rapl:N" into (N, None) and "intel-rapl:N:M" into (N, Some(M))
fn parse_zone_name(name: &str) -> Option<(u32, Option<u32>)> {
    let rest = name.strip_prefix("intel-rapl:")?;
    let mut parts = rest.split(':');
    let package = parts.next()?.parse().ok()?;
    let sub = match parts.next() {
        Some(s) => Some(s.parse().ok()?),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((package, sub))
}

/// CPU energy counter reading RAPL package zones
pub struct CpusCounter {
    packages: BTreeMap<u32, RaplPackage>,
}

impl CpusCounter {
    /// Detect RAPL packages below `powercap_root`.
    ///
    /// Returns `Ok(None)` when no readable package zone exists.
    pub fn detect(powercap_root: &Path) -> Result<Option<Self>> {
        let entries = match fs::read_dir(powercap_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("powercap not available at {:?}", powercap_root);
                return Ok(None);
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let mut zones: BTreeMap<u32, (Option<PathBuf>, Vec<PathBuf>)> = BTreeMap::new();
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some((package, sub)) = parse_zone_name(&file_name.to_string_lossy()) else {
                continue;
            };
            let slot = zones.entry(package).or_default();
            match sub {
                None => slot.0 = Some(entry.path()),
                Some(_) => slot.1.push(entry.path()),
            }
        }

        let mut packages = BTreeMap::new();
        for (index, (zone, mut sub_zones)) in zones {
            let Some(zone) = zone else { continue };

            // psys and other non-package top-level zones are not per-CPU
            let name = read_trimmed(&zone.join("name")).unwrap_or_default();
            if !name.starts_with("package") {
                log::debug!("Skipping RAPL zone {:?} ({})", zone, name);
                continue;
            }
            // Keyed by zone index: names like "package-1-die-0" are not unique ids
            let id = index;

            // Sub-zones may also be nested inside the package directory
            if sub_zones.is_empty() {
                if let Ok(nested) = fs::read_dir(&zone) {
                    sub_zones.extend(
                        nested
                            .flatten()
                            .filter(|e| parse_zone_name(&e.file_name().to_string_lossy()).is_some_and(|(_, s)| s.is_some()))
                            .map(|e| e.path()),
                    );
                }
            }
            sub_zones.sort();

            match RaplPackage::open(&zone, &sub_zones) {
                Ok(package) => {
                    log::info!("Found RAPL package {} ({}) at {:?}", id, name, zone);
                    packages.insert(id, package);
                }
                Err(e) => log::warn!("RAPL zone {:?} unreadable: {}", zone, e),
            }
        }

        if packages.is_empty() {
            log::info!("No readable RAPL package zones below {:?}", powercap_root);
            return Ok(None);
        }

        Ok(Some(Self { packages }))
    }

    fn package(&self, id: u32) -> Result<&RaplPackage> {
        self.packages.get(&id).ok_or(Error::UnknownPackage(id))
    }

    /// Identifiers of the CPU packages covered by this counter
    pub fn packages(&self) -> Vec<u32> {
        self.packages.keys().copied().collect()
    }

    /// Joules consumed by a package and its components since creation or the last reset
    pub fn joules_components(&self, id: u32) -> Result<JoulesCpu> {
        self.package(id)?.components()
    }

    pub fn joules_components_all(&self) -> Result<JoulesCpu> {
        let mut total = JoulesCpu::default();
        for package in self.packages.values() {
            total += package.components()?;
        }
        Ok(total)
    }

    pub fn joules_cpu(&self, id: u32) -> Result<Joules> {
        self.package(id)?.package.joules()
    }

    pub fn joules_cpu_all(&self) -> Result<Joules> {
        self.packages.values().map(|p| p.package.joules()).sum()
    }

    pub fn has_joules_cores(&self) -> bool {
        self.packages.values().all(|p| p.cores.is_some())
    }

    pub fn joules_cores(&self, id: u32) -> Result<Joules> {
        joules_or_zero(self.package(id)?.cores.as_ref())
    }

    pub fn joules_cores_all(&self) -> Result<Joules> {
        self.packages.values().map(|p| joules_or_zero(p.cores.as_ref())).sum()
    }

    pub fn has_joules_graphic(&self) -> bool {
        self.packages.values().all(|p| p.graphic.is_some())
    }

    pub fn joules_graphic(&self, id: u32) -> Result<Joules> {
        joules_or_zero(self.package(id)?.graphic.as_ref())
    }

    pub fn joules_graphic_all(&self) -> Result<Joules> {
        self.packages.values().map(|p| joules_or_zero(p.graphic.as_ref())).sum()
    }

    pub fn has_joules_dram(&self) -> bool {
        self.packages.values().all(|p| p.dram.is_some())
    }

    pub fn joules_dram(&self, id: u32) -> Result<Joules> {
        joules_or_zero(self.package(id)?.dram.as_ref())
    }

    pub fn joules_dram_all(&self) -> Result<Joules> {
        self.packages.values().map(|p| joules_or_zero(p.dram.as_ref())).sum()
    }
}

impl Counter for CpusCounter {
    fn joules(&self) -> Result<Joules> {
        self.joules_cpu_all()
    }

    fn reset(&self) -> Result<()> {
        for package in self.packages.values() {
            package.reset()?;
        }
        Ok(())
    }

    fn counter_type(&self) -> CounterType {
        CounterType::Cpus
    }
}

// ===== hwmon (plug counter) =====

/// Whole-machine energy meter exposed through hwmon
pub struct PlugCounter {
    label: String,
    domain: EnergyDomain,
}

impl PlugCounter {
    /// Detect the first hwmon energy input below `hwmon_root`
    pub fn detect(hwmon_root: &Path) -> Result<Option<Self>> {
        let entries = match fs::read_dir(hwmon_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("hwmon not available at {:?}", hwmon_root);
                return Ok(None);
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let mut chips: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        chips.sort();

        for chip in chips {
            let chip_name = read_trimmed(&chip.join("name")).unwrap_or_default();
            if CPU_HWMON_CHIPS.contains(&chip_name.as_str()) {
                continue;
            }

            for i in 1..=32 {
                let energy_path = chip.join(format!("energy{}_input", i));
                if !energy_path.exists() {
                    continue;
                }
                let label = read_trimmed(&chip.join(format!("energy{}_label", i)))
                    .unwrap_or_else(|_| format!("{} energy{}", chip_name, i));

                match EnergyDomain::open(energy_path.clone(), None) {
                    Ok(domain) => {
                        log::info!("Found hwmon energy meter at {:?} ({})", energy_path, label);
                        return Ok(Some(Self { label, domain }));
                    }
                    Err(e) => log::warn!("hwmon energy input {:?} unreadable: {}", energy_path, e),
                }
            }
        }

        Ok(None)
    }

    /// Sensor label, or "<chip> energyN" when the driver provides none
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Counter for PlugCounter {
    fn joules(&self) -> Result<Joules> {
        self.domain.joules()
    }

    fn reset(&self) -> Result<()> {
        self.domain.reset()
    }

    fn counter_type(&self) -> CounterType {
        CounterType::Plug
    }
}
