use crate::http::{ApiClient, ApiError};
use serde::{Deserialize, Serialize};

pub const PROFILE_PATH: &str = "/api/profile";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    // Misspelt on the wire
    #[serde(rename = "strava_athelete_id", alias = "strava_athlete_id")]
    pub strava_athlete_id: i64,
    /// Metres.
    #[serde(default)]
    pub last_distance: f64,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

pub struct ProfileService {
    api: ApiClient,
}

impl ProfileService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.api.get_json(PROFILE_PATH).await
    }
}
