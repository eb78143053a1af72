use std::sync::Arc;

use crate::config::Config;
use crate::scheduler::Scheduler;

pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(Scheduler::new(config.latency())))
    }
}
