use parking_lot::Mutex;

use super::{Job, JobScheduler};

/// Collects jobs so tests can drain and run them deterministically.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    jobs: Mutex<Vec<Job>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Job> {
        std::mem::take(&mut *self.jobs.lock())
    }

    pub fn pending(&self) -> Vec<Job> {
        self.jobs.lock().clone()
    }
}

impl JobScheduler for RecordingScheduler {
    fn schedule(&self, job: Job) {
        self.jobs.lock().push(job);
    }
}
