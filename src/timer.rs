use chrono::{DateTime, Duration, Utc};
use log::{debug, info};

/// Measures one pipeline stage. `stop` logs the elapsed time at `info`.
pub struct Timer {
    label: String,
    started_at: Option<DateTime<Utc>>,
    elapsed: Option<Duration>,
}

impl Timer {
    pub fn new(label: &str) -> Self {
        Timer { label: label.to_owned(), started_at: None, elapsed: None }
    }

    pub fn new_start(label: &str) -> Self {
        let mut timer = Timer::new(label);
        timer.start();
        timer
    }

    /// Restarts the clock and forgets any earlier measurement.
    pub fn start(&mut self) {
        debug!("{} ...", self.label);
        self.elapsed = None;
        self.started_at = Some(Utc::now());
    }

    /// Ignored when the timer is not running.
    pub fn stop(&mut self) {
        if let Some(started) = self.started_at.take() {
            let elapsed = Utc::now() - started;
            info!("{}: {} ms", self.label, elapsed.num_milliseconds());
            self.elapsed = Some(elapsed);
        } else {
            debug!("{}: stop() on an idle timer", self.label);
        }
    }

    /// Last completed measurement in milliseconds, 0 before the first `stop`.
    pub fn millis(&self) -> i64 {
        self.elapsed.as_ref().map_or(0, Duration::num_milliseconds)
    }
}
