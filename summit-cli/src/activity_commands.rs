//! Activity, Hike Gang and peak listings.

use crate::output::{api_error, print_json, print_table, yes_no};
use crate::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use summit_core::services::{Activity, Peak};
use summit_core::{filter_rows, SortDirection, TableRow, TableSort};
use tracing::{info, warn};

#[derive(Args)]
pub struct ListArgs {
    /// Fetch again even if the list is cached.
    #[arg(long)]
    pub refresh: bool,
    /// Column to sort by (name, distance, date, summit).
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort descending.
    #[arg(long, requires = "sort")]
    pub desc: bool,
    /// Only rows whose name or description contains this text.
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Args)]
pub struct PeakArgs {
    /// Show who summited each peak instead of the peak list.
    #[arg(long)]
    pub summaries: bool,
    /// Only peaks you have summited.
    #[arg(long)]
    pub summited: bool,
    /// Column to sort by (name, elevation, summited).
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long, requires = "sort")]
    pub desc: bool,
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Subcommand)]
pub enum HikeGangAction {
    /// List the shared activity feed.
    List(ListArgs),
    /// Ask the backend to pull the latest activities from Strava.
    Sync,
}

fn table_sort(column: Option<&str>, desc: bool) -> TableSort {
    match column {
        Some(column) => {
            let direction = if desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            TableSort::by(column, direction)
        }
        None => TableSort::default(),
    }
}

/// Sort then filter `rows` the way the listing flags ask.
fn arrange<'a, R: TableRow>(
    rows: &'a mut [R],
    sort: Option<&str>,
    desc: bool,
    filter: Option<&str>,
) -> Vec<&'a R> {
    table_sort(sort, desc).apply(rows);
    filter_rows(rows, filter.unwrap_or_default())
}

fn print_activities(ctx: &Context, mut activities: Vec<Activity>, args: &ListArgs) -> Result<()> {
    let rows = arrange(
        &mut activities,
        args.sort.as_deref(),
        args.desc,
        args.filter.as_deref(),
    );

    if ctx.json {
        return print_json(&rows);
    }

    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|a| {
            vec![
                a.start_date.format("%Y-%m-%d").to_string(),
                a.name.clone(),
                format!("{:.1}", a.distance_km()),
                yes_no(a.has_summit),
            ]
        })
        .collect();
    print_table(&["Date", "Name", "Km", "Summit"], &table);
    Ok(())
}

pub async fn list_activities(ctx: &Context, args: ListArgs) -> Result<()> {
    let service = &ctx.session.services().activities;
    service.load(args.refresh).await.map_err(api_error)?;
    print_activities(ctx, service.activities().unwrap_or_default(), &args)
}

pub async fn handle_hike_gang(ctx: &Context, action: HikeGangAction) -> Result<()> {
    let service = &ctx.session.services().hike_gang;
    match action {
        HikeGangAction::List(args) => {
            service.load(args.refresh).await.map_err(api_error)?;
            print_activities(ctx, service.activities().unwrap_or_default(), &args)
        }
        HikeGangAction::Sync => {
            let result = service.trigger_sync().await.map_err(api_error)?;
            info!("Hike Gang sync triggered");
            if ctx.json {
                print_json(&result)
            } else {
                println!("Sync started.");
                Ok(())
            }
        }
    }
}

pub async fn list_peaks(ctx: &Context, args: PeakArgs) -> Result<()> {
    let services = ctx.session.services();

    if args.summaries {
        let summaries = services.peaks.summaries().await.map_err(api_error)?;
        if ctx.json {
            return print_json(&summaries);
        }
        let table: Vec<Vec<String>> = summaries
            .iter()
            .map(|s| {
                let latest = s
                    .latest_summit()
                    .map(|l| format!("{} ({})", l.user_name, l.summited_at.format("%Y-%m-%d")))
                    .unwrap_or_default();
                vec![s.peak_name.clone(), s.summit_count().to_string(), latest]
            })
            .collect();
        print_table(&["Peak", "Summits", "Latest"], &table);
        return Ok(());
    }

    services.peaks.load().await.map_err(api_error)?;
    if let Err(e) = services.favourites.load().await {
        warn!(error = %e, "Could not load favourites");
    }

    let mut peaks: Vec<Peak> = services.peaks.peaks().unwrap_or_default();
    if args.summited {
        peaks.retain(|p| p.is_summited);
    }
    let rows = arrange(
        &mut peaks,
        args.sort.as_deref(),
        args.desc,
        args.filter.as_deref(),
    );

    if ctx.json {
        return print_json(&rows);
    }

    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|p| {
            let star = if services.favourites.is_favourite(p.id) { "*" } else { "" };
            vec![
                p.id.to_string(),
                format!("{}{star}", p.name),
                format!("{:.0}", p.elevation_meters),
                yes_no(p.is_summited),
            ]
        })
        .collect();
    print_table(&["Id", "Name", "Elevation (m)", "Summited"], &table);
    Ok(())
}
