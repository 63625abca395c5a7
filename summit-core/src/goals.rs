//! Goal progress arithmetic for group and personal goals.

use crate::services::groups::{GoalType, GroupGoal, MemberContribution};

/// `min(100, round(current / target * 100))`.
///
/// Returns 0 when the target is not a positive finite number or the
/// current value is negative or non-finite.
pub fn percent(current: f64, target: f64) -> u32 {
    if !target.is_finite() || target <= 0.0 || !current.is_finite() || current <= 0.0 {
        return 0;
    }
    let pct = (current / target * 100.0).round();
    pct.min(100.0) as u32
}

/// Progress towards one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalStatus {
    pub current: f64,
    pub target: f64,
    pub percent: u32,
}

impl GoalStatus {
    pub fn new(current: f64, target: f64) -> Self {
        Self {
            current,
            target,
            percent: percent(current, target),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percent >= 100
    }
}

/// Unique summits across all members against a summit-count target.
pub fn summit_progress(members: &[MemberContribution], target: f64) -> GoalStatus {
    let total: i64 = members.iter().map(|m| m.total_unique_summits).sum();
    GoalStatus::new(total as f64, target)
}

/// Distance across all members, converted from metres to kilometres,
/// against a target in kilometres.
pub fn distance_progress(members: &[MemberContribution], target_km: f64) -> GoalStatus {
    let metres: f64 = members.iter().map(|m| m.total_distance).sum();
    GoalStatus::new(metres / 1000.0, target_km)
}

/// Progress for a group goal from member totals, when it can be derived
/// from them. Elevation and specific-summit goals need data the
/// contribution totals do not carry.
pub fn group_goal_progress(goal: &GroupGoal, members: &[MemberContribution]) -> Option<GoalStatus> {
    match goal.kind() {
        GoalType::Distance => Some(distance_progress(members, goal.target_value)),
        GoalType::SummitCount => Some(summit_progress(members, goal.target_value)),
        GoalType::Elevation | GoalType::SpecificSummits | GoalType::Other(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(user_id: i64, distance_m: f64, unique_summits: i64) -> MemberContribution {
        MemberContribution {
            group_member_id: user_id,
            group_id: 1,
            user_id,
            role: "member".to_string(),
            joined_at: "2025-01-01T00:00:00Z".parse().unwrap(),
            total_activities: 1,
            total_distance: distance_m,
            total_unique_summits: unique_summits,
            total_summits: unique_summits,
        }
    }

    fn goal(goal_type: &str, target: f64) -> GroupGoal {
        GroupGoal {
            id: 1,
            group_id: 1,
            name: "goal".to_string(),
            description: None,
            goal_type: goal_type.to_string(),
            target_value: target,
            target_summits: Vec::new(),
            start_date: "2025-01-01T00:00:00Z".parse().unwrap(),
            end_date: "2025-12-31T00:00:00Z".parse().unwrap(),
            created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(50.0, 200.0), 25);
        assert_eq!(percent(1.0, 3.0), 33);
        assert_eq!(percent(2.0, 3.0), 67);
        assert_eq!(percent(500.0, 100.0), 100);
        assert_eq!(percent(10.0, 0.0), 0);
        assert_eq!(percent(10.0, -5.0), 0);
        assert_eq!(percent(10.0, f64::NAN), 0);
        assert_eq!(percent(f64::INFINITY, 10.0), 0);
        assert_eq!(percent(-3.0, 10.0), 0);
    }

    #[test]
    fn test_summit_progress_sums_unique_summits() {
        let members = [member(1, 0.0, 3), member(2, 0.0, 4)];
        let status = summit_progress(&members, 20.0);
        assert_eq!(status.current, 7.0);
        assert_eq!(status.percent, 35);
        assert!(!status.is_complete());
    }

    #[test]
    fn test_distance_progress_converts_to_km() {
        let members = [member(1, 30_000.0, 0), member(2, 20_500.0, 0)];
        let status = distance_progress(&members, 100.0);
        assert!((status.current - 50.5).abs() < 1e-9);
        assert_eq!(status.percent, 51);
    }

    #[test]
    fn test_distance_progress_caps_at_100() {
        let status = distance_progress(&[member(1, 250_000.0, 0)], 100.0);
        assert_eq!(status.percent, 100);
        assert!(status.is_complete());
    }

    #[test]
    fn test_group_goal_dispatch() {
        let members = [member(1, 10_000.0, 2)];
        assert_eq!(
            group_goal_progress(&goal("distance", 20.0), &members).unwrap().percent,
            50
        );
        assert_eq!(
            group_goal_progress(&goal("summit_count", 4.0), &members).unwrap().percent,
            50
        );
        assert!(group_goal_progress(&goal("elevation", 1000.0), &members).is_none());
        assert!(group_goal_progress(&goal("weird", 1.0), &members).is_none());
    }

    #[test]
    fn test_empty_group_is_zero() {
        assert_eq!(summit_progress(&[], 10.0).percent, 0);
        assert_eq!(distance_progress(&[], 10.0).current, 0.0);
    }
}
