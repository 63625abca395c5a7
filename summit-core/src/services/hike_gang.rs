//! Hike Gang shared activity feed.

use super::activities::{Activity, ActivityService};
use super::cache::LoadOutcome;
use crate::http::{ApiClient, ApiError, ApiRequest};
use tokio::sync::watch;
use tracing::info;

pub const HIKE_GANG_ACTIVITIES_PATH: &str = "/hikegang/activities";
pub const HIKE_GANG_SYNC_PATH: &str = "/hikegang/sync";

pub struct HikeGangService {
    api: ApiClient,
    activities: ActivityService,
}

impl HikeGangService {
    pub fn new(api: ApiClient) -> Self {
        Self {
            activities: ActivityService::with_path(
                api.clone(),
                HIKE_GANG_ACTIVITIES_PATH,
                "hike_gang_activities",
            ),
            api,
        }
    }

    pub async fn load(&self, force: bool) -> Result<LoadOutcome, ApiError> {
        self.activities.load(force).await
    }

    pub async fn refresh(&self) -> Result<LoadOutcome, ApiError> {
        self.activities.refresh().await
    }

    pub fn activities(&self) -> Option<Vec<Activity>> {
        self.activities.activities()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Vec<Activity>>> {
        self.activities.subscribe()
    }

    /// Ask the backend to pull fresh activities from Strava. The response
    /// shape is not fixed, so it is returned as raw JSON.
    pub async fn trigger_sync(&self) -> Result<serde_json::Value, ApiError> {
        info!("Triggering Hike Gang sync");
        let request = ApiRequest::post(HIKE_GANG_SYNC_PATH).json(&serde_json::json!({}))?;
        self.api.send_json(request).await
    }
}
