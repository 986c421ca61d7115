use std::cell::{Cell, RefCell};

use chrono::Utc;
use tracing::{debug, trace};

use crate::execution_log::{ExecutionLog, ExecutionLogEntry, Variables};

/// Receives the calls injected by the instrumentation pass.
///
/// One tracker serves one run. Neither entry point can fail: anything that
/// goes wrong inside is dropped so the traced program never sees it.
#[derive(Debug)]
pub struct Tracker {
    log: RefCell<ExecutionLog>,
    last_timestamp: Cell<i64>,
    busy: Cell<bool>,
    mirror: bool,
}

/// Marks a tracker call in progress; released on drop
#[derive(Debug)]
pub struct Recording<'a> {
    busy: &'a Cell<bool>,
}

impl Drop for Recording<'_> {
    fn drop(&mut self) {
        self.busy.set(false);
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Tracker {
    pub fn new(mirror: bool) -> Self {
        Self {
            log: RefCell::new(ExecutionLog::new()),
            last_timestamp: Cell::new(i64::MIN),
            busy: Cell::new(false),
            mirror,
        }
    }

    /// Whether calls are mirrored to the tracing sink
    pub fn mirrors(&self) -> bool {
        self.mirror
    }

    /// Enter a tracker call.
    ///
    /// Returns `None` while another call is still snapshotting its arguments;
    /// calls made from inside a snapshot are dropped.
    pub fn begin(&self) -> Option<Recording<'_>> {
        if self.busy.replace(true) {
            trace!("tracker call during snapshot dropped");
            return None;
        }
        Some(Recording { busy: &self.busy })
    }

    /// Record a line hit with a snapshot of the variables in view
    pub fn track_line(&self, line: u32, variables: Variables) {
        if self.mirror {
            debug!(
                target: "codeflow_core::tracker",
                "Line {}: {}",
                line,
                serde_json::to_string(&variables).unwrap_or_default()
            );
        }

        let entry = ExecutionLogEntry::new(line, variables, self.next_timestamp());
        match self.log.try_borrow_mut() {
            Ok(mut log) => log.push(entry),
            Err(_) => trace!(line, "execution log busy, entry dropped"),
        }
    }

    /// Observe a declaration; informational only, nothing is recorded
    pub fn track_var(&self, name: &str, value: &serde_json::Value, line: u32) {
        if self.mirror {
            debug!(target: "codeflow_core::tracker", "Var {} @{} = {}", name, line, value);
        }
    }

    pub fn len(&self) -> usize {
        self.log.try_borrow().map(|log| log.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the log collected so far
    pub fn snapshot(&self) -> ExecutionLog {
        self.log.try_borrow().map(|log| log.clone()).unwrap_or_default()
    }

    /// Hand over the collected log, leaving the tracker empty
    pub fn take_log(&self) -> ExecutionLog {
        self.log
            .try_borrow_mut()
            .map(|mut log| std::mem::take(&mut *log))
            .unwrap_or_default()
    }

    fn next_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis().max(self.last_timestamp.get());
        self.last_timestamp.set(now);
        now
    }
}
