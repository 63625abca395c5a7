//! Personal goals, favourite peaks and shared progress.

use crate::output::{api_error, print_json, print_table};
use crate::Context;
use anyhow::{bail, Result};
use chrono::Datelike;
use clap::Subcommand;
use summit_core::services::PersonalYearlyGoal;
use summit_core::GoalStatus;
use tracing::warn;

#[derive(Subcommand)]
pub enum GoalAction {
    /// Targets for a year, with distance covered so far.
    Show {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Every year with goals set.
    All,
    /// Change one or more targets for the current year.
    Set {
        /// Kilometres.
        #[arg(long)]
        distance: Option<f64>,
        /// Metres.
        #[arg(long)]
        elevation: Option<f64>,
        #[arg(long)]
        summits: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum FavouriteAction {
    List,
    Add { peak_id: i64 },
    Remove { peak_id: i64 },
}

fn goal_rows(goal: &PersonalYearlyGoal) -> Vec<Vec<String>> {
    vec![
        vec!["Year".to_string(), goal.year.to_string()],
        vec!["Distance".to_string(), format!("{} km", goal.distance_goal)],
        vec!["Elevation".to_string(), format!("{} m", goal.elevation_goal)],
        vec!["Summits".to_string(), goal.summit_goal.to_string()],
    ]
}

/// Kilometres covered by cached activities started in `year`.
async fn distance_in_year(ctx: &Context, year: i32) -> Option<f64> {
    let activities = &ctx.session.services().activities;
    if let Err(e) = activities.load(false).await {
        warn!(error = %e, "Could not load activities for goal progress");
        return None;
    }
    let km = activities
        .activities()
        .unwrap_or_default()
        .iter()
        .filter(|a| a.start_date.year() == year)
        .map(|a| a.distance_km())
        .sum();
    Some(km)
}

pub async fn handle_goals(ctx: &Context, action: GoalAction) -> Result<()> {
    let service = &ctx.session.services().personal_goals;

    match action {
        GoalAction::Show { year } => {
            let goal = match year {
                Some(year) => service.goals(Some(year)).await,
                None => service.current_year_goals().await,
            }
            .map_err(api_error)?;
            let distance = distance_in_year(ctx, goal.year)
                .await
                .map(|km| GoalStatus::new(km, goal.distance_goal));

            if ctx.json {
                return print_json(&serde_json::json!({
                    "goal": goal,
                    "distance_km": distance.map(|d| d.current),
                    "distance_percent": distance.map(|d| d.percent),
                }));
            }

            let mut rows = goal_rows(&goal);
            if let Some(status) = distance {
                rows.push(vec![
                    "Distance so far".to_string(),
                    format!("{:.1} km ({}%)", status.current, status.percent),
                ]);
            }
            print_table(&["Goal", "Target"], &rows);
        }
        GoalAction::All => {
            let all = service.all().await.map_err(api_error)?;
            if ctx.json {
                return print_json(&all);
            }
            let rows: Vec<Vec<String>> = all
                .iter()
                .map(|g| {
                    vec![
                        g.year.to_string(),
                        g.distance_goal.to_string(),
                        g.elevation_goal.to_string(),
                        g.summit_goal.to_string(),
                    ]
                })
                .collect();
            print_table(&["Year", "Distance (km)", "Elevation (m)", "Summits"], &rows);
        }
        GoalAction::Set {
            distance,
            elevation,
            summits,
        } => {
            if distance.is_none() && elevation.is_none() && summits.is_none() {
                bail!("Nothing to set. Pass --distance, --elevation or --summits.");
            }
            // Start from the stored goal so untouched targets keep their values
            if let Err(e) = service.current_year_goals().await {
                warn!(error = %e, "No stored goals, starting from defaults");
            }
            if let Some(km) = distance {
                service.update_distance_goal(km).await.map_err(api_error)?;
            }
            if let Some(metres) = elevation {
                service.update_elevation_goal(metres).await.map_err(api_error)?;
            }
            if let Some(count) = summits {
                service.update_summit_goal(count).await.map_err(api_error)?;
            }
            if let Some(goal) = service.current() {
                if ctx.json {
                    return print_json(&goal);
                }
                print_table(&["Goal", "Target"], &goal_rows(&goal));
            }
        }
    }
    Ok(())
}

pub async fn handle_favourites(ctx: &Context, action: FavouriteAction) -> Result<()> {
    let service = &ctx.session.services().favourites;
    let ids = match action {
        FavouriteAction::List => service.load().await,
        FavouriteAction::Add { peak_id } => service.add(peak_id).await,
        FavouriteAction::Remove { peak_id } => service.remove(peak_id).await,
    }
    .map_err(api_error)?;

    if ctx.json {
        return print_json(&ids);
    }
    let rows: Vec<Vec<String>> = ids.iter().map(|id| vec![id.to_string()]).collect();
    print_table(&["Peak"], &rows);
    Ok(())
}

pub async fn progress(ctx: &Context) -> Result<()> {
    let progress = ctx
        .session
        .services()
        .progress
        .progress()
        .await
        .map_err(api_error)?;

    if ctx.json {
        return print_json(&progress);
    }

    println!(
        "{:.1} of {:.0} km ({}%)",
        progress.current_progress,
        progress.goal,
        progress.percent()
    );
    let rows: Vec<Vec<String>> = progress
        .contributions
        .iter()
        .map(|c| vec![c.name.clone(), format!("{:.1}", c.total_distance)])
        .collect();
    print_table(&["Name", "Km"], &rows);
    Ok(())
}
