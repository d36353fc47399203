use std::sync::Arc;

use crate::agent::KidAgent;

pub const SERVICE_NAME: &str = "Kid Agent";

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<KidAgent>,
}

impl AppState {
    pub fn new(agent: KidAgent) -> Self {
        Self {
            agent: Arc::new(agent),
        }
    }
}
