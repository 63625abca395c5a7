//! Groups, their members and shared goals.

use super::de::{f64_from_number_or_string, i64_from_number_or_string, null_as_empty};
use crate::http::{ApiClient, ApiError, ApiRequest};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const GROUPS_PATH: &str = "/api/groups";
pub const GROUP_MEMBERS_PATH: &str = "/api/group-members";
pub const GROUP_GOALS_PATH: &str = "/api/group-goals";
pub const GROUP_CONTRIBUTION_PATH: &str = "/api/group-members-contribution";
pub const GROUP_GOAL_PROGRESS_PATH: &str = "/api/group-goal-progress";

/// Role given to members who join with a group code.
pub const DEFAULT_MEMBER_ROLE: &str = "member";

// =============================================================================
// Models
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    #[serde(deserialize_with = "i64_from_number_or_string")]
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Response of `GET /api/groups`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserGroups {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_by: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: i64,
    pub group_id: i64,
    pub user_id: i64,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

/// How a group goal is measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalType {
    Distance,
    Elevation,
    SummitCount,
    SpecificSummits,
    Other(String),
}

impl GoalType {
    pub fn parse(s: &str) -> Self {
        match s {
            "distance" => GoalType::Distance,
            "elevation" => GoalType::Elevation,
            "summit_count" => GoalType::SummitCount,
            "specific_summits" => GoalType::SpecificSummits,
            other => GoalType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GoalType::Distance => "distance",
            GoalType::Elevation => "elevation",
            GoalType::SummitCount => "summit_count",
            GoalType::SpecificSummits => "specific_summits",
            GoalType::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupGoal {
    pub id: i64,
    pub group_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub goal_type: String,
    /// Kilometres, metres or a summit count depending on `goal_type`.
    #[serde(deserialize_with = "f64_from_number_or_string")]
    pub target_value: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_summits: Vec<i64>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl GroupGoal {
    pub fn kind(&self) -> GoalType {
        GoalType::parse(&self.goal_type)
    }
}

/// A member's activity totals within a goal's date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberContribution {
    pub group_member_id: i64,
    pub group_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub role: String,
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub total_activities: i64,
    /// Metres.
    #[serde(default)]
    pub total_distance: f64,
    #[serde(default)]
    pub total_unique_summits: i64,
    #[serde(default)]
    pub total_summits: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub created_by: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateGroupRequest {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinGroupRequest {
    pub group_code: String,
    pub user_id: i64,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateGroupMemberRequest {
    pub group_id: i64,
    pub user_id: i64,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

/// Body for creating (`id == None`) or updating a group goal.
#[derive(Debug, Clone, Serialize)]
pub struct GroupGoalRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub group_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub goal_type: String,
    pub target_value: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_summits: Vec<i64>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct CreatedId {
    #[serde(alias = "group_id", alias = "goal_id", alias = "groupID", alias = "goalID")]
    id: i64,
}

#[derive(Debug, Deserialize)]
struct GoalsEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    goals: Vec<GroupGoal>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct MembersEnvelope<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    members: Vec<T>,
}

/// Server-computed progress of a single goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgressResponse {
    #[serde(rename = "goalID")]
    pub goal_id: i64,
    /// Percentage, capped at 100 by the backend.
    pub progress: f64,
}

// =============================================================================
// Service
// =============================================================================

pub struct GroupService {
    api: ApiClient,
}

impl GroupService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Create a group and return its id.
    pub async fn create_group(&self, request: &CreateGroupRequest) -> Result<i64, ApiError> {
        let created: CreatedId = self
            .api
            .send_json(ApiRequest::post(GROUPS_PATH).json(request)?)
            .await?;
        info!(group_id = created.id, "Created group");
        Ok(created.id)
    }

    pub async fn list_groups(&self) -> Result<UserGroups, ApiError> {
        self.api.get_json(GROUPS_PATH).await
    }

    pub async fn update_group(&self, request: &UpdateGroupRequest) -> Result<(), ApiError> {
        self.api
            .send(ApiRequest::put(GROUPS_PATH).json(request)?)
            .await
    }

    pub async fn delete_group(&self, group_id: i64) -> Result<(), ApiError> {
        self.api
            .send(ApiRequest::delete(GROUPS_PATH).query("groupID", group_id))
            .await
    }

    /// Join the group identified by an invite code.
    pub async fn join_group(&self, group_code: &str, user_id: i64) -> Result<(), ApiError> {
        let request = JoinGroupRequest {
            group_code: group_code.to_string(),
            user_id,
            role: DEFAULT_MEMBER_ROLE.to_string(),
        };
        self.api
            .send(ApiRequest::post(GROUP_MEMBERS_PATH).json(&request)?)
            .await
    }

    /// Leave a group. The backend takes the member from the access token.
    pub async fn leave_group(&self, group_id: i64) -> Result<(), ApiError> {
        self.api
            .send(ApiRequest::delete(GROUP_MEMBERS_PATH).query("groupID", group_id))
            .await
    }

    pub async fn update_member(&self, request: &UpdateGroupMemberRequest) -> Result<(), ApiError> {
        self.api
            .send(ApiRequest::put(GROUP_MEMBERS_PATH).json(request)?)
            .await
    }

    pub async fn members(&self, group_id: i64) -> Result<Vec<GroupMember>, ApiError> {
        let envelope: MembersEnvelope<GroupMember> = self
            .api
            .send_json(ApiRequest::get(GROUP_MEMBERS_PATH).query("groupID", group_id))
            .await?;
        Ok(envelope.members)
    }

    pub async fn goals(&self, group_id: i64) -> Result<Vec<GroupGoal>, ApiError> {
        let envelope: GoalsEnvelope = self
            .api
            .send_json(ApiRequest::get(GROUP_GOALS_PATH).query("groupID", group_id))
            .await?;
        Ok(envelope.goals)
    }

    /// Create a goal and return its id.
    pub async fn create_goal(&self, request: &GroupGoalRequest) -> Result<i64, ApiError> {
        let created: CreatedId = self
            .api
            .send_json(ApiRequest::post(GROUP_GOALS_PATH).json(request)?)
            .await?;
        Ok(created.id)
    }

    pub async fn update_goal(&self, request: &GroupGoalRequest) -> Result<(), ApiError> {
        self.api
            .send(ApiRequest::put(GROUP_GOALS_PATH).json(request)?)
            .await
    }

    pub async fn delete_goal(&self, goal_id: i64) -> Result<(), ApiError> {
        self.api
            .send(ApiRequest::delete(GROUP_GOALS_PATH).query("goalID", goal_id))
            .await
    }

    /// Per-member totals between two dates (inclusive, sent as `YYYY-MM-DD`).
    pub async fn member_contributions(
        &self,
        group_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MemberContribution>, ApiError> {
        let request = ApiRequest::get(GROUP_CONTRIBUTION_PATH)
            .query("groupID", group_id)
            .query("startDate", start.format("%Y-%m-%d"))
            .query("endDate", end.format("%Y-%m-%d"));
        let envelope: MembersEnvelope<MemberContribution> = self.api.send_json(request).await?;
        Ok(envelope.members)
    }

    pub async fn goal_progress(&self, goal_id: i64) -> Result<GoalProgressResponse, ApiError> {
        self.api
            .send_json(ApiRequest::get(GROUP_GOAL_PROGRESS_PATH).query("goalID", goal_id))
            .await
    }
}
