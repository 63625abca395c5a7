//! `summit groups ...`

use crate::output::{api_error, print_json, print_table};
use crate::Context;
use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::Subcommand;
use serde::Serialize;
use summit_core::goals::{group_goal_progress, GoalStatus};
use summit_core::services::groups::{
    CreateGroupRequest, GoalType, GroupGoal, GroupGoalRequest, UpdateGroupRequest,
};

#[derive(Subcommand)]
pub enum GroupAction {
    /// Groups you belong to.
    List,
    Create { name: String },
    Rename { id: i64, name: String },
    Delete { id: i64 },
    /// Join with an invite code.
    Join { code: String },
    Leave { id: i64 },
    Members { id: i64 },
    /// Group goals and how far along each one is.
    Goals { id: i64 },
    /// Add a goal to a group.
    AddGoal {
        group: i64,
        name: String,
        /// distance (km), elevation (m), summit_count or specific_summits.
        #[arg(long, default_value = "distance")]
        goal_type: String,
        #[arg(long)]
        target: f64,
        /// YYYY-MM-DD.
        #[arg(long)]
        start: NaiveDate,
        /// YYYY-MM-DD.
        #[arg(long)]
        end: NaiveDate,
        #[arg(long)]
        description: Option<String>,
        /// Peak ids for specific_summits goals.
        #[arg(long = "peak")]
        peaks: Vec<i64>,
    },
    DeleteGoal { id: i64 },
}

#[derive(Serialize)]
struct GoalRow<'a> {
    #[serde(flatten)]
    goal: &'a GroupGoal,
    percent: u32,
    current: Option<f64>,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc)
}

/// Progress from member totals where possible, otherwise the backend's figure.
async fn goal_status(ctx: &Context, goal: &GroupGoal) -> Result<(u32, Option<f64>)> {
    let groups = &ctx.session.services().groups;
    if matches!(goal.kind(), GoalType::Distance | GoalType::SummitCount) {
        let members = groups
            .member_contributions(
                goal.group_id,
                goal.start_date.date_naive(),
                goal.end_date.date_naive(),
            )
            .await
            .map_err(api_error)?;
        if let Some(GoalStatus {
            current, percent, ..
        }) = group_goal_progress(goal, &members)
        {
            return Ok((percent, Some(current)));
        }
    }
    let progress = groups.goal_progress(goal.id).await.map_err(api_error)?;
    Ok((summit_core::percent(progress.progress, 100.0), None))
}

pub async fn handle_groups(ctx: &Context, action: GroupAction) -> Result<()> {
    let services = ctx.session.services();
    let groups = &services.groups;

    match action {
        GroupAction::List => {
            let mine = groups.list_groups().await.map_err(api_error)?;
            if ctx.json {
                return print_json(&mine);
            }
            let rows: Vec<Vec<String>> = mine
                .groups
                .iter()
                .map(|g| {
                    vec![
                        g.id.to_string(),
                        g.name.clone(),
                        g.created_at.format("%Y-%m-%d").to_string(),
                    ]
                })
                .collect();
            print_table(&["Id", "Name", "Created"], &rows);
        }
        GroupAction::Create { name } => {
            let me = services.profile.profile().await.map_err(api_error)?;
            let id = groups
                .create_group(&CreateGroupRequest {
                    name,
                    created_by: me.id,
                })
                .await
                .map_err(api_error)?;
            println!("Created group {id}.");
        }
        GroupAction::Rename { id, name } => {
            groups
                .update_group(&UpdateGroupRequest { id, name })
                .await
                .map_err(api_error)?;
            println!("Renamed group {id}.");
        }
        GroupAction::Delete { id } => {
            groups.delete_group(id).await.map_err(api_error)?;
            println!("Deleted group {id}.");
        }
        GroupAction::Join { code } => {
            let me = services.profile.profile().await.map_err(api_error)?;
            groups.join_group(&code, me.id).await.map_err(api_error)?;
            println!("Joined group.");
        }
        GroupAction::Leave { id } => {
            groups.leave_group(id).await.map_err(api_error)?;
            println!("Left group {id}.");
        }
        GroupAction::Members { id } => {
            let members = groups.members(id).await.map_err(api_error)?;
            if ctx.json {
                return print_json(&members);
            }
            let rows: Vec<Vec<String>> = members
                .iter()
                .map(|m| {
                    vec![
                        m.user_id.to_string(),
                        m.role.clone(),
                        m.joined_at.format("%Y-%m-%d").to_string(),
                    ]
                })
                .collect();
            print_table(&["User", "Role", "Joined"], &rows);
        }
        GroupAction::Goals { id } => {
            let goals = groups.goals(id).await.map_err(api_error)?;
            let mut rows = Vec::with_capacity(goals.len());
            for goal in &goals {
                let (percent, current) = goal_status(ctx, goal).await?;
                rows.push(GoalRow {
                    goal,
                    percent,
                    current,
                });
            }
            if ctx.json {
                return print_json(&rows);
            }
            let table: Vec<Vec<String>> = rows
                .iter()
                .map(|r| {
                    let current = r
                        .current
                        .map(|c| format!("{c:.1}"))
                        .unwrap_or_else(|| "-".to_string());
                    vec![
                        r.goal.id.to_string(),
                        r.goal.name.clone(),
                        r.goal.goal_type.clone(),
                        format!("{current} / {}", r.goal.target_value),
                        format!("{}%", r.percent),
                        format!(
                            "{} to {}",
                            r.goal.start_date.format("%Y-%m-%d"),
                            r.goal.end_date.format("%Y-%m-%d")
                        ),
                    ]
                })
                .collect();
            print_table(
                &["Id", "Name", "Type", "Progress", "Percent", "Dates"],
                &table,
            );
        }
        GroupAction::AddGoal {
            group,
            name,
            goal_type,
            target,
            start,
            end,
            description,
            peaks,
        } => {
            if end < start {
                bail!("End date {end} is before start date {start}");
            }
            let request = GroupGoalRequest {
                id: None,
                group_id: group,
                name,
                description,
                goal_type: GoalType::parse(&goal_type).as_str().to_string(),
                target_value: target,
                target_summits: peaks,
                start_date: start_of_day(start),
                end_date: start_of_day(end),
            };
            let id = groups.create_goal(&request).await.map_err(api_error)?;
            println!("Created goal {id}.");
        }
        GroupAction::DeleteGoal { id } => {
            groups.delete_goal(id).await.map_err(api_error)?;
            println!("Deleted goal {id}.");
        }
    }
    Ok(())
}
