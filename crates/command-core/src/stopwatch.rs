use protocol::CommandResponse;
use std::fmt::Display;
use std::time::{Duration, Instant, SystemTime};

#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started_at: SystemTime,
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started_at: SystemTime::now(),
            started: Instant::now(),
        }
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn complete(&self, result: impl Into<String>) -> CommandResponse {
        CommandResponse::completed(result, self.started_at, self.elapsed())
    }

    pub fn fail(&self, error: impl Display) -> CommandResponse {
        CommandResponse::failed(error.to_string(), self.started_at, self.elapsed())
    }
}
