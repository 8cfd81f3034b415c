use std::sync::Arc;

use connwatch::{Detector, Directory};

/// Shared handler state; the evaluation loop owns the dispatcher separately
pub struct AppState {
    pub detector: Arc<dyn Detector>,
    pub directory: Arc<dyn Directory>,
}

impl AppState {
    pub fn new(detector: Arc<dyn Detector>, directory: Arc<dyn Directory>) -> Self {
        Self { detector, directory }
    }
}
