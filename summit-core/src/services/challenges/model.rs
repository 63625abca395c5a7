//! Challenge wire types. The backend uses camelCase for everything here.

use crate::services::de::null_as_empty;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeType {
    Predefined,
    Custom,
    YearlyGoal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionMode {
    Collaborative,
    Competitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    Friends,
    Public,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub challenge_type: ChallengeType,
    pub competition_mode: CompetitionMode,
    pub visibility: Visibility,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub created_by_user_id: Option<i64>,
    #[serde(default)]
    pub created_by_group_id: Option<i64>,
    #[serde(default)]
    pub target_count: Option<i64>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A challenge together with the caller's progress on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeWithProgress {
    #[serde(flatten)]
    pub challenge: Challenge,
    #[serde(default)]
    pub total_peaks: i64,
    #[serde(default)]
    pub completed_peaks: i64,
    #[serde(default)]
    pub is_joined: bool,
    #[serde(default)]
    pub is_completed: bool,
}

impl ChallengeWithProgress {
    /// Whole-number percentage of peaks completed.
    pub fn progress_percent(&self) -> u32 {
        super::labels::progress_percent(self.completed_peaks, self.total_peaks)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePeak {
    pub id: i64,
    pub challenge_id: i64,
    pub peak_id: i64,
    #[serde(default)]
    pub sort_order: i64,
    pub created_at: String,
    pub name: String,
    #[serde(default)]
    pub alt_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub is_summited: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeParticipant {
    pub id: i64,
    pub challenge_id: i64,
    pub user_id: i64,
    pub joined_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub peaks_completed: i64,
    #[serde(default)]
    pub total_peaks: i64,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: i64,
    pub user_name: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    pub peaks_completed: i64,
    pub total_peaks: i64,
    /// 0-100.
    pub progress: f64,
    pub joined_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummitLogEntry {
    pub id: i64,
    pub challenge_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub peak_id: Option<i64>,
    #[serde(default)]
    pub activity_id: Option<i64>,
    pub summited_at: String,
    pub created_at: String,
    #[serde(default)]
    pub peak_name: Option<String>,
    #[serde(default)]
    pub peak_elevation: Option<f64>,
}

/// Fields shared by create and update requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeFields {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub challenge_type: ChallengeType,
    pub competition_mode: CompetitionMode,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChallengeRequest {
    #[serde(flatten)]
    pub fields: ChallengeFields,
    pub peak_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChallengeRequest {
    pub id: i64,
    #[serde(flatten)]
    pub fields: ChallengeFields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetChallengePeaksRequest<'a> {
    pub peak_ids: &'a [i64],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddGroupRequest {
    pub group_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_override: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummitRequest {
    pub peak_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<i64>,
    pub summited_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) struct CreateChallengeResponse {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeDetail {
    pub challenge: ChallengeWithProgress,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub peaks: Vec<ChallengePeak>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub participants: Vec<ChallengeParticipant>,
}

/// A page of challenges. `challenges` may be `null` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ChallengeList<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub challenges: Vec<T>,
    #[serde(default)]
    pub total: i64,
}
