// Shared test helpers

use std::collections::VecDeque;
use std::sync::Mutex;

use traffic_stats::counters::{CounterError, CounterSource, Counters};

pub fn counters(received_bytes: u64, sent_bytes: u64) -> Counters {
    Counters {
        received_bytes,
        sent_bytes,
    }
}

/// Counter source fed from a script of reads; when the script runs out it
/// repeats the last successful reading. `Err` entries simulate failed OS
/// reads.
pub struct ScriptedCounters {
    script: Mutex<VecDeque<Result<Counters, String>>>,
    last: Mutex<Counters>,
}

impl ScriptedCounters {
    pub fn new(script: Vec<Result<Counters, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(Counters::default()),
        }
    }

    pub fn constant(received_bytes: u64, sent_bytes: u64) -> Self {
        Self::new(vec![Ok(counters(received_bytes, sent_bytes))])
    }
}

impl CounterSource for ScriptedCounters {
    fn read_counters(&self) -> Result<Counters, CounterError> {
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(c)) => {
                *self.last.lock().unwrap() = c;
                Ok(c)
            }
            Some(Err(msg)) => Err(CounterError::Unavailable(msg)),
            None => Ok(*self.last.lock().unwrap()),
        }
    }
}

/// Counter source whose both counters grow by `step` on every read.
pub struct IncrementingCounters {
    step: u64,
    state: Mutex<Counters>,
}

impl IncrementingCounters {
    pub fn new(start: Counters, step: u64) -> Self {
        Self {
            step,
            state: Mutex::new(start),
        }
    }
}

impl CounterSource for IncrementingCounters {
    fn read_counters(&self) -> Result<Counters, CounterError> {
        let mut state = self.state.lock().unwrap();
        let current = *state;
        state.received_bytes += self.step;
        state.sent_bytes += self.step;
        Ok(current)
    }
}
