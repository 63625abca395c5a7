//! Display helpers for challenge attributes.

use super::model::{ChallengeType, CompetitionMode, Visibility};

/// Neutral grey for unknown or missing difficulty.
pub const DEFAULT_DIFFICULTY_COLOR: &str = "#9E9E9E";

impl ChallengeType {
    pub fn label(self) -> &'static str {
        match self {
            ChallengeType::Predefined => "Featured",
            ChallengeType::Custom => "Custom",
            ChallengeType::YearlyGoal => "Yearly Goal",
        }
    }
}

impl CompetitionMode {
    pub fn label(self) -> &'static str {
        match self {
            CompetitionMode::Collaborative => "Collaborative",
            CompetitionMode::Competitive => "Competitive",
        }
    }
}

impl Visibility {
    pub fn label(self) -> &'static str {
        match self {
            Visibility::Private => "Private",
            Visibility::Friends => "Friends Only",
            Visibility::Public => "Public",
        }
    }
}

/// Hex colour for a difficulty string, case-insensitive.
pub fn difficulty_color(difficulty: Option<&str>) -> &'static str {
    match difficulty.map(str::to_ascii_lowercase).as_deref() {
        Some("easy") => "#4CAF50",
        Some("moderate") => "#FF9800",
        Some("hard") => "#f44336",
        Some("expert") => "#9C27B0",
        _ => DEFAULT_DIFFICULTY_COLOR,
    }
}

/// `round(completed / total * 100)`, or 0 when there are no peaks.
pub fn progress_percent(completed: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    let pct = (completed.max(0) as f64 / total as f64 * 100.0).round();
    pct as u32
}
