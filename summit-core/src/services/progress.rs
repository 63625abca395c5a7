//! Shared distance goal progress.

use super::de::null_as_empty;
use crate::http::{ApiClient, ApiError};
use serde::{Deserialize, Serialize};

pub const PROGRESS_PATH: &str = "/api/progress";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContribution {
    pub name: String,
    pub total_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub goal: f64,
    pub current_progress: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub contributions: Vec<UserContribution>,
}

impl GoalProgress {
    /// Whole-number percentage towards the goal, capped at 100.
    pub fn percent(&self) -> u32 {
        crate::goals::percent(self.current_progress, self.goal)
    }
}

pub struct ProgressService {
    api: ApiClient,
}

impl ProgressService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn progress(&self) -> Result<GoalProgress, ApiError> {
        self.api.get_json(PROGRESS_PATH).await
    }
}
