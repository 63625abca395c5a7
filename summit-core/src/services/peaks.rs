//! Peaks and per-peak summit summaries.

use super::cache::{Cached, LoadOutcome};
use super::de::null_as_empty;
use crate::http::{ApiClient, ApiError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub const PEAKS_PATH: &str = "/api/peaks";
pub const PEAK_SUMMARIES_PATH: &str = "/api/peak-summaries";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub id: i64,
    #[serde(default)]
    pub osm_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    #[serde(default)]
    pub elevation_meters: f64,
    /// Visited by the current user.
    #[serde(default)]
    pub is_summited: bool,
}

/// One summit of a peak, as listed in [`PeakSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummitedActivity {
    pub user_id: i64,
    pub user_name: String,
    pub activity_id: i64,
    pub summited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakSummary {
    pub peak_id: i64,
    pub peak_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub summits: Vec<SummitedActivity>,
}

impl PeakSummary {
    pub fn summit_count(&self) -> usize {
        self.summits.len()
    }

    /// Most recent summit, if any.
    pub fn latest_summit(&self) -> Option<&SummitedActivity> {
        self.summits.iter().max_by_key(|s| s.summited_at)
    }
}

/// Cached peak list. Unlike activities, peaks are loaded once per session.
pub struct PeakService {
    api: ApiClient,
    peaks: Cached<Vec<Peak>>,
}

impl PeakService {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            peaks: Cached::new("peaks"),
        }
    }

    pub async fn load(&self) -> Result<LoadOutcome, ApiError> {
        self.peaks
            .load(false, || self.api.get_json(PEAKS_PATH))
            .await
    }

    pub fn peaks(&self) -> Option<Vec<Peak>> {
        self.peaks.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Vec<Peak>>> {
        self.peaks.subscribe()
    }

    /// Uncached summit summaries for every peak.
    pub async fn summaries(&self) -> Result<Vec<PeakSummary>, ApiError> {
        self.api.get_json(PEAK_SUMMARIES_PATH).await
    }
}
