//! Fixed-window energy measurement
//!
//! Reads a counter, waits, reads it again and reports the difference.

use crate::core::{Joules, Result};
use crate::energy::Counter;
use std::fmt;
use std::time::Duration;

/// Outcome of a measurement window
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    /// Joules consumed during `seconds`
    Consumed { joules: Joules, seconds: u64 },
    /// The machine has no energy counter
    Unavailable,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Consumed { joules, seconds } => {
                write!(f, "Consumed {} joules in the last {} seconds.", joules, seconds)
            }
            Measurement::Unavailable => f.write_str("Energy counters not available."),
        }
    }
}

/// Measure the energy consumed over `seconds`, blocking through `sleep`.
///
/// Without a counter nothing is read and `sleep` is never called.
pub fn measure<F>(counter: Option<&dyn Counter>, seconds: u64, sleep: F) -> Result<Measurement>
where
    F: FnOnce(Duration),
{
    let Some(counter) = counter else {
        return Ok(Measurement::Unavailable);
    };

    let start_joules = counter.joules()?;
    sleep(Duration::from_secs(seconds));
    let end_joules = counter.joules()?;
    log::debug!("{} counter: {} J -> {} J", counter.counter_type(), start_joules, end_joules);

    Ok(Measurement::Consumed {
        joules: end_joules - start_joules,
        seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CounterType, Error};
    use std::cell::Cell;
    use std::sync::Mutex;

    /// Counter replaying a fixed sequence of readings
    struct ScriptedCounter {
        readings: Mutex<Vec<Joules>>,
    }

    impl ScriptedCounter {
        fn new(readings: &[Joules]) -> Self {
            let mut readings = readings.to_vec();
            readings.reverse();
            Self { readings: Mutex::new(readings) }
        }
    }

    impl Counter for ScriptedCounter {
        fn joules(&self) -> Result<Joules> {
            self.readings
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| Error::PermissionDenied("no more readings".to_string()))
        }

        fn reset(&self) -> Result<()> {
            Ok(())
        }

        fn counter_type(&self) -> CounterType {
            CounterType::Cpus
        }
    }

    #[test]
    fn test_consumed() {
        let counter = ScriptedCounter::new(&[100.0, 137.5]);
        let slept = Cell::new(None);

        let m = measure(Some(&counter), 10, |d| slept.set(Some(d))).unwrap();

        assert_eq!(m, Measurement::Consumed { joules: 37.5, seconds: 10 });
        assert_eq!(m.to_string(), "Consumed 37.5 joules in the last 10 seconds.");
        assert_eq!(slept.get(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_delta_is_second_minus_first() {
        let counter = ScriptedCounter::new(&[5.0, 20.0]);
        match measure(Some(&counter), 1, |_| {}).unwrap() {
            Measurement::Consumed { joules, .. } => assert_eq!(joules, 15.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unavailable() {
        let slept = Cell::new(false);

        let m = measure(None, 10, |_| slept.set(true)).unwrap();

        assert_eq!(m, Measurement::Unavailable);
        assert_eq!(m.to_string(), "Energy counters not available.");
        assert!(!slept.get());
    }

    #[test]
    fn test_read_failure_propagates() {
        let counter = ScriptedCounter::new(&[1.0]);
        assert!(measure(Some(&counter), 0, |_| {}).is_err());
    }

    #[test]
    fn test_repeated_measurements_are_independent() {
        let counter = ScriptedCounter::new(&[0.0, 4.0, 4.0, 9.0]);

        let first = measure(Some(&counter), 1, |_| {}).unwrap();
        let second = measure(Some(&counter), 1, |_| {}).unwrap();

        assert_eq!(first, Measurement::Consumed { joules: 4.0, seconds: 1 });
        assert_eq!(second, Measurement::Consumed { joules: 5.0, seconds: 1 });
    }
}
