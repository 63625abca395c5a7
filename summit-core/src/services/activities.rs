//! The signed-in user's Strava activities.

use super::cache::{Cached, LoadOutcome};
use crate::http::{ApiClient, ApiError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub const ACTIVITIES_PATH: &str = "/api/activities";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub strava_activity_id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Metres.
    pub distance: f64,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub map_polyline: String,
    /// At least one peak was summited on this activity.
    #[serde(default)]
    pub has_summit: bool,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl Activity {
    pub fn distance_km(&self) -> f64 {
        self.distance / 1000.0
    }
}

pub struct ActivityService {
    api: ApiClient,
    path: &'static str,
    activities: Cached<Vec<Activity>>,
}

impl ActivityService {
    pub fn new(api: ApiClient) -> Self {
        Self::with_path(api, ACTIVITIES_PATH, "activities")
    }

    /// Same caching behaviour against another activity list endpoint.
    pub(crate) fn with_path(api: ApiClient, path: &'static str, name: &'static str) -> Self {
        Self {
            api,
            path,
            activities: Cached::new(name),
        }
    }

    /// Fetch the list unless it is cached (and `force` is false) or a fetch
    /// is already running.
    pub async fn load(&self, force: bool) -> Result<LoadOutcome, ApiError> {
        self.activities
            .load(force, || self.api.get_json(self.path))
            .await
    }

    pub async fn refresh(&self) -> Result<LoadOutcome, ApiError> {
        self.load(true).await
    }

    pub fn activities(&self) -> Option<Vec<Activity>> {
        self.activities.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Vec<Activity>>> {
        self.activities.subscribe()
    }
}
