// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, exam::ExamService};

#[derive(Clone)]
pub struct AppState {
    pub exam: Arc<ExamService>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<ExamService> {
    fn from_ref(state: &AppState) -> Self {
        state.exam.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
