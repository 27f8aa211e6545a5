use std::time::{Duration, Instant};

use log::info;

/// Elapsed-time clock of an interview session. Stopping it freezes the
/// elapsed time; it cannot be restarted.
#[derive(Clone, Debug)]
pub struct SessionClock {
    start_time: Instant,
    stopped_after: Option<Duration>,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            start_time: Instant::now(),
            stopped_after: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.stopped_after.unwrap_or_else(|| self.start_time.elapsed())
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    pub fn is_running(&self) -> bool {
        self.stopped_after.is_none()
    }

    pub fn stop(&mut self) -> Duration {
        if self.stopped_after.is_none() {
            let elapsed = self.start_time.elapsed();
            self.stopped_after = Some(elapsed);
            info!("⏹️ Session clock stopped at {}", format_elapsed(elapsed));
        }
        self.elapsed()
    }
}

/// `MM:SS`, both parts zero-padded; minutes keep growing past an hour.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_seconds = elapsed.as_secs();
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

pub fn format_elapsed_ms(elapsed_ms: u64) -> String {
    format_elapsed(Duration::from_millis(elapsed_ms))
}
