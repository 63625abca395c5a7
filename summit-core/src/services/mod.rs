//! Typed clients for the backend's domain endpoints.
//!
//! Every service shares one [`ApiClient`], so all calls go through the
//! auth interceptor.

mod cache;
mod de;

pub mod activities;
pub mod challenges;
pub mod favourites;
pub mod groups;
pub mod hike_gang;
pub mod peaks;
pub mod personal_goals;
pub mod profile;
pub mod progress;

pub use activities::{Activity, ActivityService};
pub use cache::LoadOutcome;
pub use challenges::ChallengeService;
pub use favourites::FavouritesService;
pub use groups::GroupService;
pub use hike_gang::HikeGangService;
pub use peaks::{Peak, PeakService, PeakSummary};
pub use personal_goals::{PersonalGoalsService, PersonalYearlyGoal};
pub use profile::{ProfileService, UserProfile};
pub use progress::{GoalProgress, ProgressService};

use crate::http::ApiClient;

/// One instance of every service, sharing a client.
pub struct Services {
    pub activities: ActivityService,
    pub peaks: PeakService,
    pub hike_gang: HikeGangService,
    pub groups: GroupService,
    pub challenges: ChallengeService,
    pub personal_goals: PersonalGoalsService,
    pub favourites: FavouritesService,
    pub progress: ProgressService,
    pub profile: ProfileService,
}

impl Services {
    pub fn new(api: &ApiClient) -> Self {
        Self {
            activities: ActivityService::new(api.clone()),
            peaks: PeakService::new(api.clone()),
            hike_gang: HikeGangService::new(api.clone()),
            groups: GroupService::new(api.clone()),
            challenges: ChallengeService::new(api.clone()),
            personal_goals: PersonalGoalsService::new(api.clone()),
            favourites: FavouritesService::new(api.clone()),
            progress: ProgressService::new(api.clone()),
            profile: ProfileService::new(api.clone()),
        }
    }
}
