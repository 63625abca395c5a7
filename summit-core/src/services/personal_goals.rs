//! Personal yearly distance, elevation and summit goals.

use crate::http::{ApiClient, ApiError, ApiRequest};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

pub const PERSONAL_GOALS_PATH: &str = "/api/personal-goals";
pub const ALL_PERSONAL_GOALS_PATH: &str = "/api/personal-goals/all";

/// Kilometres.
pub const DEFAULT_DISTANCE_GOAL: f64 = 1000.0;
/// Metres.
pub const DEFAULT_ELEVATION_GOAL: f64 = 50_000.0;
pub const DEFAULT_SUMMIT_GOAL: i64 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalYearlyGoal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub year: i32,
    /// Kilometres.
    pub distance_goal: f64,
    /// Metres.
    pub elevation_goal: f64,
    pub summit_goal: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PersonalYearlyGoal {
    /// A goal for `year` with every target at its default.
    pub fn with_defaults(year: i32) -> Self {
        Self {
            id: None,
            user_id: None,
            year,
            distance_goal: DEFAULT_DISTANCE_GOAL,
            elevation_goal: DEFAULT_ELEVATION_GOAL,
            summit_goal: DEFAULT_SUMMIT_GOAL,
            created_at: None,
            updated_at: None,
        }
    }
}

fn current_year() -> i32 {
    Utc::now().year()
}

pub struct PersonalGoalsService {
    api: ApiClient,
    current: watch::Sender<Option<PersonalYearlyGoal>>,
}

impl PersonalGoalsService {
    pub fn new(api: ApiClient) -> Self {
        let (current, _rx) = watch::channel(None);
        Self { api, current }
    }

    /// Goal for `year`, or the backend's default year when `None`. The
    /// result becomes the cached current goal.
    pub async fn goals(&self, year: Option<i32>) -> Result<PersonalYearlyGoal, ApiError> {
        let goal: PersonalYearlyGoal = self
            .api
            .send_json(ApiRequest::get(PERSONAL_GOALS_PATH).query_opt("year", year))
            .await?;
        self.current.send_replace(Some(goal.clone()));
        Ok(goal)
    }

    pub async fn current_year_goals(&self) -> Result<PersonalYearlyGoal, ApiError> {
        self.goals(Some(current_year())).await
    }

    /// Create or update a goal. The saved goal becomes the cached current goal.
    pub async fn save(&self, goal: &PersonalYearlyGoal) -> Result<PersonalYearlyGoal, ApiError> {
        let saved: PersonalYearlyGoal = self
            .api
            .send_json(ApiRequest::post(PERSONAL_GOALS_PATH).json(goal)?)
            .await?;
        debug!(year = saved.year, "Saved personal goals");
        self.current.send_replace(Some(saved.clone()));
        Ok(saved)
    }

    pub async fn all(&self) -> Result<Vec<PersonalYearlyGoal>, ApiError> {
        self.api.get_json(ALL_PERSONAL_GOALS_PATH).await
    }

    pub fn current(&self) -> Option<PersonalYearlyGoal> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PersonalYearlyGoal>> {
        self.current.subscribe()
    }

    /// Change one target on the cached goal and save it. Without a cached
    /// goal a current-year goal with default targets is used as the base.
    async fn update_with(
        &self,
        apply: impl FnOnce(&mut PersonalYearlyGoal),
    ) -> Result<PersonalYearlyGoal, ApiError> {
        let mut goal = self
            .current()
            .unwrap_or_else(|| PersonalYearlyGoal::with_defaults(current_year()));
        apply(&mut goal);
        self.save(&goal).await
    }

    pub async fn update_distance_goal(&self, km: f64) -> Result<PersonalYearlyGoal, ApiError> {
        self.update_with(|g| g.distance_goal = km).await
    }

    pub async fn update_elevation_goal(&self, metres: f64) -> Result<PersonalYearlyGoal, ApiError> {
        self.update_with(|g| g.elevation_goal = metres).await
    }

    pub async fn update_summit_goal(&self, count: i64) -> Result<PersonalYearlyGoal, ApiError> {
        self.update_with(|g| g.summit_goal = count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::client;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    /// Echo the posted goal back with an id, like the backend does.
    fn echo_with_id(req: &Request) -> ResponseTemplate {
        let mut goal: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
        goal["id"] = 1.into();
        ResponseTemplate::new(200).set_body_json(goal)
    }

    #[tokio::test]
    async fn test_update_without_cache_uses_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/personal-goals"))
            .and(body_json(serde_json::json!({
                "year": current_year(),
                "distance_goal": 1000.0,
                "elevation_goal": 50000.0,
                "summit_goal": 35
            })))
            .respond_with(echo_with_id)
            .expect(1)
            .mount(&server)
            .await;

        let service = PersonalGoalsService::new(client(&server));
        let saved = service.update_summit_goal(35).await.unwrap();

        assert_eq!(saved.summit_goal, 35);
        assert_eq!(saved.id, Some(1));
        assert_eq!(service.current(), Some(saved));
    }

    #[tokio::test]
    async fn test_update_keeps_other_targets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/personal-goals"))
            .and(query_param("year", "2024"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 5,
                "user_id": 7,
                "year": 2024,
                "distance_goal": 800.0,
                "elevation_goal": 30000.0,
                "summit_goal": 12
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/personal-goals"))
            .and(body_json(serde_json::json!({
                "id": 5,
                "user_id": 7,
                "year": 2024,
                "distance_goal": 1200.0,
                "elevation_goal": 30000.0,
                "summit_goal": 12
            })))
            .respond_with(echo_with_id)
            .expect(1)
            .mount(&server)
            .await;

        let service = PersonalGoalsService::new(client(&server));
        service.goals(Some(2024)).await.unwrap();
        let saved = service.update_distance_goal(1200.0).await.unwrap();
        assert_eq!(saved.year, 2024);
        assert_eq!(saved.distance_goal, 1200.0);
    }

    #[tokio::test]
    async fn test_goals_without_year_sends_no_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/personal-goals"))
            .and(|req: &Request| req.url.query().is_none())
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "year": 2025,
                "distance_goal": 1000.0,
                "elevation_goal": 50000.0,
                "summit_goal": 20
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = PersonalGoalsService::new(client(&server));
        let mut rx = service.subscribe();
        service.goals(None).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().year, 2025);
    }

    #[tokio::test]
    async fn test_all_goals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/personal-goals/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"year": 2024, "distance_goal": 800.0, "elevation_goal": 1.0, "summit_goal": 1},
                {"year": 2025, "distance_goal": 900.0, "elevation_goal": 1.0, "summit_goal": 1}
            ])))
            .mount(&server)
            .await;

        let all = PersonalGoalsService::new(client(&server)).all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].distance_goal, 900.0);
    }
}
