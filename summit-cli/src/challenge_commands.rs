//! `summit challenges ...`

use crate::output::{api_error, print_json, print_table, yes_no};
use crate::Context;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use serde::de::DeserializeOwned;
use summit_core::services::challenges::{
    Challenge, ChallengeFields, ChallengeType, ChallengeWithProgress, CompetitionMode,
    CreateChallengeRequest, PublicFilter, RecordSummitRequest, Visibility,
};
use summit_core::{SortDirection, TableSort};

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// Challenges you created or joined, with progress.
    Mine {
        #[arg(long)]
        refresh: bool,
    },
    /// Featured challenges.
    Featured,
    /// Browse public challenges.
    Public {
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Search challenges by name.
    Search {
        query: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Details, peaks and participants of one challenge.
    Show { id: i64 },
    /// Create a challenge from a list of peak ids.
    Create {
        name: String,
        /// Peak ids to include.
        #[arg(long = "peak", required = true)]
        peaks: Vec<i64>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_wire::<ChallengeType>, default_value = "custom")]
        challenge_type: ChallengeType,
        #[arg(long, value_parser = parse_wire::<CompetitionMode>, default_value = "collaborative")]
        mode: CompetitionMode,
        #[arg(long, value_parser = parse_wire::<Visibility>, default_value = "private")]
        visibility: Visibility,
        /// YYYY-MM-DD.
        #[arg(long)]
        deadline: Option<NaiveDate>,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
    },
    /// Delete a challenge you own.
    Delete { id: i64 },
    Join { id: i64 },
    Leave { id: i64 },
    /// Participant ranking.
    Leaderboard {
        id: i64,
        /// Column to sort by (rank, name, peaks, progress, completed).
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Summits logged against a challenge.
    Log {
        id: i64,
        #[arg(long)]
        user: Option<i64>,
    },
    /// Log a summit of one of the challenge's peaks.
    Record {
        id: i64,
        #[arg(long)]
        peak: i64,
        #[arg(long)]
        activity: Option<i64>,
    },
}

/// Parse a lowercase wire name such as `yearly_goal` into a challenge enum.
fn parse_wire<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown value `{value}`"))
}

fn print_challenges(challenges: &[Challenge]) {
    let rows: Vec<Vec<String>> = challenges
        .iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                c.name.clone(),
                c.challenge_type.label().to_string(),
                c.competition_mode.label().to_string(),
                c.region.clone().unwrap_or_default(),
                c.difficulty.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["Id", "Name", "Type", "Mode", "Region", "Difficulty"], &rows);
}

fn print_progress(challenges: &[ChallengeWithProgress]) {
    let rows: Vec<Vec<String>> = challenges
        .iter()
        .map(|c| {
            vec![
                c.challenge.id.to_string(),
                c.challenge.name.clone(),
                format!("{}/{}", c.completed_peaks, c.total_peaks),
                format!("{}%", c.progress_percent()),
                yes_no(c.is_completed),
            ]
        })
        .collect();
    print_table(&["Id", "Name", "Peaks", "Progress", "Completed"], &rows);
}

pub async fn handle_challenges(ctx: &Context, action: ChallengeAction) -> Result<()> {
    let service = &ctx.session.services().challenges;

    match action {
        ChallengeAction::Mine { refresh } => {
            service
                .load_user_challenges(refresh)
                .await
                .map_err(api_error)?;
            let mine = service.cached_user_challenges().unwrap_or_default();
            if ctx.json {
                return print_json(&mine);
            }
            print_progress(&mine);
        }
        ChallengeAction::Featured => {
            let list = service.featured().await.map_err(api_error)?;
            if ctx.json {
                return print_json(&list);
            }
            print_challenges(&list.challenges);
        }
        ChallengeAction::Public {
            region,
            limit,
            offset,
        } => {
            let filter = PublicFilter {
                region,
                limit,
                offset,
            };
            let list = service.public(&filter).await.map_err(api_error)?;
            if ctx.json {
                return print_json(&list);
            }
            print_challenges(&list.challenges);
            println!("{} of {} shown", list.challenges.len(), list.total);
        }
        ChallengeAction::Search { query, limit } => {
            let list = service.search(&query, limit).await.map_err(api_error)?;
            if ctx.json {
                return print_json(&list);
            }
            print_challenges(&list.challenges);
        }
        ChallengeAction::Show { id } => {
            let detail = service.get(id).await.map_err(api_error)?;
            if ctx.json {
                return print_json(&detail);
            }
            let c = &detail.challenge;
            println!("{} [{}]", c.challenge.name, c.challenge.challenge_type.label());
            if let Some(description) = &c.challenge.description {
                println!("{description}");
            }
            println!(
                "{} | {} | difficulty {} | {}% complete",
                c.challenge.competition_mode.label(),
                c.challenge.visibility.label(),
                c.challenge.difficulty.as_deref().unwrap_or("-"),
                c.progress_percent()
            );
            if let Some(deadline) = &c.challenge.deadline {
                println!("Deadline: {deadline}");
            }
            println!();
            let peaks: Vec<Vec<String>> = detail
                .peaks
                .iter()
                .map(|p| {
                    vec![
                        p.peak_id.to_string(),
                        p.name.clone(),
                        format!("{:.0}", p.elevation),
                        yes_no(p.is_summited),
                    ]
                })
                .collect();
            print_table(&["Peak", "Name", "Elevation (m)", "Summited"], &peaks);
            println!();
            let participants: Vec<Vec<String>> = detail
                .participants
                .iter()
                .map(|p| {
                    vec![
                        p.user_name.clone(),
                        format!("{}/{}", p.peaks_completed, p.total_peaks),
                    ]
                })
                .collect();
            print_table(&["Participant", "Peaks"], &participants);
        }
        ChallengeAction::Create {
            name,
            peaks,
            description,
            challenge_type,
            mode,
            visibility,
            deadline,
            region,
            difficulty,
        } => {
            let request = CreateChallengeRequest {
                fields: ChallengeFields {
                    name,
                    description,
                    challenge_type,
                    competition_mode: mode,
                    visibility,
                    start_date: None,
                    deadline: deadline.map(|d| d.format("%Y-%m-%d").to_string()),
                    target_count: None,
                    region,
                    difficulty,
                },
                peak_ids: peaks,
            };
            let id = service.create(&request).await.map_err(api_error)?;
            println!("Created challenge {id}.");
        }
        ChallengeAction::Delete { id } => {
            service.delete(id).await.map_err(api_error)?;
            println!("Deleted challenge {id}.");
        }
        ChallengeAction::Join { id } => {
            service.join(id).await.map_err(api_error)?;
            println!("Joined challenge {id}.");
        }
        ChallengeAction::Leave { id } => {
            service.leave(id).await.map_err(api_error)?;
            println!("Left challenge {id}.");
        }
        ChallengeAction::Leaderboard { id, sort, desc } => {
            let mut entries = service.leaderboard(id).await.map_err(api_error)?;
            if let Some(column) = sort {
                let direction = if desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                };
                TableSort::by(column, direction).apply(&mut entries);
            }
            if ctx.json {
                return print_json(&entries);
            }
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|e| {
                    vec![
                        e.rank.to_string(),
                        e.user_name.clone(),
                        format!("{}/{}", e.peaks_completed, e.total_peaks),
                        format!("{:.0}%", e.progress),
                    ]
                })
                .collect();
            print_table(&["Rank", "Name", "Peaks", "Progress"], &rows);
        }
        ChallengeAction::Log { id, user } => {
            let log = service.summit_log(id, user).await.map_err(api_error)?;
            if ctx.json {
                return print_json(&log);
            }
            let rows: Vec<Vec<String>> = log
                .iter()
                .map(|entry| {
                    vec![
                        entry.summited_at.clone(),
                        entry.user_id.to_string(),
                        entry.peak_name.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["When", "User", "Peak"], &rows);
        }
        ChallengeAction::Record { id, peak, activity } => {
            let request = RecordSummitRequest {
                peak_id: peak,
                activity_id: activity,
                summited_at: Utc::now().to_rfc3339(),
            };
            service
                .record_summit(id, &request)
                .await
                .map_err(api_error)?;
            println!("Recorded summit of peak {peak}.");
        }
    }
    Ok(())
}
