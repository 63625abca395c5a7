//! Peak-bagging challenges: CRUD, discovery, participation and progress.

mod labels;
mod model;

pub use labels::{difficulty_color, progress_percent, DEFAULT_DIFFICULTY_COLOR};
pub use model::{
    AddGroupRequest, Challenge, ChallengeDetail, ChallengeFields, ChallengeList,
    ChallengeParticipant, ChallengePeak, ChallengeType, ChallengeWithProgress, CompetitionMode,
    CreateChallengeRequest, LeaderboardEntry, RecordSummitRequest, SummitLogEntry,
    UpdateChallengeRequest, Visibility,
};

use super::cache::{Cached, LoadOutcome};
use crate::http::{ApiClient, ApiError, ApiRequest};
use model::{CreateChallengeResponse, SetChallengePeaksRequest};
use tokio::sync::watch;
use tracing::info;

const CHALLENGES_PATH: &str = "/api/challenges";
const CHALLENGE_PATH: &str = "/api/challenge";
const FEATURED_PATH: &str = "/api/challenges/featured";
const PUBLIC_PATH: &str = "/api/challenges/public";
const SEARCH_PATH: &str = "/api/challenges/search";
const PEAKS_PATH: &str = "/api/challenge-peaks";
const JOIN_PATH: &str = "/api/challenge-join";
const LEAVE_PATH: &str = "/api/challenge-leave";
const PARTICIPANTS_PATH: &str = "/api/challenge-participants";
const LEADERBOARD_PATH: &str = "/api/challenge-leaderboard";
const SUMMIT_LOG_PATH: &str = "/api/challenge-summit-log";
const SUMMIT_PATH: &str = "/api/challenge-summit";
const CHALLENGE_GROUP_PATH: &str = "/api/challenge-group";
const GROUP_CHALLENGES_PATH: &str = "/api/group-challenges";

/// Optional filters for [`ChallengeService::public`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicFilter {
    pub region: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub struct ChallengeService {
    api: ApiClient,
    mine: Cached<Vec<ChallengeWithProgress>>,
}

impl ChallengeService {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            mine: Cached::new("user_challenges"),
        }
    }

    // -------------------------------------------------------------------------
    // CRUD
    // -------------------------------------------------------------------------

    /// Create a challenge and return its id.
    pub async fn create(&self, request: &CreateChallengeRequest) -> Result<i64, ApiError> {
        let created: CreateChallengeResponse = self
            .api
            .send_json(ApiRequest::post(CHALLENGES_PATH).json(request)?)
            .await?;
        info!(challenge_id = created.id, "Created challenge");
        Ok(created.id)
    }

    pub async fn get(&self, id: i64) -> Result<ChallengeDetail, ApiError> {
        self.api
            .send_json(ApiRequest::get(CHALLENGE_PATH).query("id", id))
            .await
    }

    pub async fn update(&self, request: &UpdateChallengeRequest) -> Result<(), ApiError> {
        self.api
            .send(ApiRequest::put(CHALLENGE_PATH).json(request)?)
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api
            .send(ApiRequest::delete(CHALLENGE_PATH).query("id", id))
            .await
    }

    // -------------------------------------------------------------------------
    // Discovery
    // -------------------------------------------------------------------------

    /// Challenges the caller created or joined.
    pub async fn user_challenges(&self) -> Result<ChallengeList<ChallengeWithProgress>, ApiError> {
        self.api.get_json(CHALLENGES_PATH).await
    }

    /// Fetch [`Self::user_challenges`] into the shared cache.
    pub async fn load_user_challenges(&self, force: bool) -> Result<LoadOutcome, ApiError> {
        self.mine
            .load(force, || async {
                Ok(self.user_challenges().await?.challenges)
            })
            .await
    }

    pub fn cached_user_challenges(&self) -> Option<Vec<ChallengeWithProgress>> {
        self.mine.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Vec<ChallengeWithProgress>>> {
        self.mine.subscribe()
    }

    pub async fn featured(&self) -> Result<ChallengeList<Challenge>, ApiError> {
        self.api.get_json(FEATURED_PATH).await
    }

    pub async fn public(&self, filter: &PublicFilter) -> Result<ChallengeList<Challenge>, ApiError> {
        let request = ApiRequest::get(PUBLIC_PATH)
            .query_opt("region", filter.region.as_deref().filter(|r| !r.is_empty()))
            .query_opt("limit", filter.limit.filter(|n| *n > 0))
            .query_opt("offset", filter.offset.filter(|n| *n > 0));
        self.api.send_json(request).await
    }

    pub async fn search(
        &self,
        query: &str,
        limit: Option<u32>,
    ) -> Result<ChallengeList<Challenge>, ApiError> {
        let request = ApiRequest::get(SEARCH_PATH)
            .query("q", query)
            .query_opt("limit", limit.filter(|n| *n > 0));
        self.api.send_json(request).await
    }

    // -------------------------------------------------------------------------
    // Peaks
    // -------------------------------------------------------------------------

    pub async fn peaks(&self, challenge_id: i64) -> Result<Vec<ChallengePeak>, ApiError> {
        self.api
            .send_json(ApiRequest::get(PEAKS_PATH).query("challengeId", challenge_id))
            .await
    }

    /// Replace the challenge's peak list.
    pub async fn set_peaks(&self, challenge_id: i64, peak_ids: &[i64]) -> Result<(), ApiError> {
        let request = ApiRequest::put(PEAKS_PATH)
            .query("challengeId", challenge_id)
            .json(&SetChallengePeaksRequest { peak_ids })?;
        self.api.send(request).await
    }

    // -------------------------------------------------------------------------
    // Participation
    // -------------------------------------------------------------------------

    pub async fn join(&self, challenge_id: i64) -> Result<(), ApiError> {
        let request = ApiRequest::post(JOIN_PATH)
            .query("challengeId", challenge_id)
            .json(&serde_json::json!({}))?;
        self.api.send(request).await?;
        info!(challenge_id, "Joined challenge");
        Ok(())
    }

    pub async fn leave(&self, challenge_id: i64) -> Result<(), ApiError> {
        self.api
            .send(ApiRequest::delete(LEAVE_PATH).query("challengeId", challenge_id))
            .await?;
        info!(challenge_id, "Left challenge");
        Ok(())
    }

    pub async fn participants(
        &self,
        challenge_id: i64,
    ) -> Result<Vec<ChallengeParticipant>, ApiError> {
        self.api
            .send_json(ApiRequest::get(PARTICIPANTS_PATH).query("challengeId", challenge_id))
            .await
    }

    pub async fn leaderboard(&self, challenge_id: i64) -> Result<Vec<LeaderboardEntry>, ApiError> {
        self.api
            .send_json(ApiRequest::get(LEADERBOARD_PATH).query("challengeId", challenge_id))
            .await
    }

    // -------------------------------------------------------------------------
    // Progress
    // -------------------------------------------------------------------------

    /// Summit log for a challenge, optionally narrowed to one user.
    pub async fn summit_log(
        &self,
        challenge_id: i64,
        user_id: Option<i64>,
    ) -> Result<Vec<SummitLogEntry>, ApiError> {
        let request = ApiRequest::get(SUMMIT_LOG_PATH)
            .query("challengeId", challenge_id)
            .query_opt("userId", user_id);
        self.api.send_json(request).await
    }

    pub async fn record_summit(
        &self,
        challenge_id: i64,
        request: &RecordSummitRequest,
    ) -> Result<(), ApiError> {
        let request = ApiRequest::post(SUMMIT_PATH)
            .query("challengeId", challenge_id)
            .json(request)?;
        self.api.send(request).await
    }

    // -------------------------------------------------------------------------
    // Groups
    // -------------------------------------------------------------------------

    pub async fn add_group(
        &self,
        challenge_id: i64,
        request: &AddGroupRequest,
    ) -> Result<(), ApiError> {
        let request = ApiRequest::post(CHALLENGE_GROUP_PATH)
            .query("challengeId", challenge_id)
            .json(request)?;
        self.api.send(request).await
    }

    pub async fn remove_group(&self, challenge_id: i64, group_id: i64) -> Result<(), ApiError> {
        let request = ApiRequest::delete(CHALLENGE_GROUP_PATH)
            .query("challengeId", challenge_id)
            .query("groupId", group_id);
        self.api.send(request).await
    }

    pub async fn group_challenges(
        &self,
        group_id: i64,
    ) -> Result<ChallengeList<Challenge>, ApiError> {
        self.api
            .send_json(ApiRequest::get(GROUP_CHALLENGES_PATH).query("groupId", group_id))
            .await
    }
}
