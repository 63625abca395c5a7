//! `summit login`, `logout`, `status` and `profile`.

use crate::output::{api_error, print_json, print_table, yes_no};
use crate::Context;
use anyhow::{Context as _, Result};
use std::io::{self, Write};
use summit_core::CallbackParams;
use tracing::warn;

pub async fn login(ctx: &Context, no_browser: bool, callback: Option<String>) -> Result<()> {
    let flow = ctx.session.login();
    let url = flow.begin_login()?;

    println!("Authorize Summit Seekers with Strava:\n\n  {url}\n");
    if !no_browser {
        if let Err(e) = webbrowser::open(url.as_str()) {
            warn!(error = %e, "Could not open browser");
            println!("Could not open a browser. Open the URL above manually.");
        }
    }
    flow.mark_redirected();

    let input = match callback {
        Some(input) => input,
        None => prompt_for_redirect()?,
    };

    let user_id = flow
        .handle_callback(&CallbackParams::parse(&input))
        .await
        .context("Login failed")?;

    if ctx.json {
        print_json(&serde_json::json!({ "logged_in": true, "user_id": user_id }))
    } else {
        println!("Logged in as user {user_id}.");
        Ok(())
    }
}

fn prompt_for_redirect() -> Result<String> {
    print!("After approving, paste the URL you were redirected to: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read redirect URL")?;
    Ok(line)
}

pub fn logout(ctx: &Context) -> Result<()> {
    ctx.session.login().logout()?;
    println!("Logged out.");
    Ok(())
}

pub fn status(ctx: &Context) -> Result<()> {
    let settings = ctx.session.settings();
    let logged_in = ctx.session.is_logged_in();

    if ctx.json {
        return print_json(&serde_json::json!({
            "logged_in": logged_in,
            "api_base_url": settings.api_base_url,
            "version": summit_core::VERSION,
        }));
    }

    print_table(
        &["Setting", "Value"],
        &[
            vec!["Logged in".to_string(), yes_no(logged_in)],
            vec!["Backend".to_string(), settings.api_base_url.clone()],
            vec!["Version".to_string(), summit_core::VERSION.to_string()],
        ],
    );
    Ok(())
}

pub async fn profile(ctx: &Context) -> Result<()> {
    let profile = ctx
        .session
        .services()
        .profile
        .profile()
        .await
        .map_err(api_error)?;

    if ctx.json {
        return print_json(&profile);
    }

    print_table(
        &["Field", "Value"],
        &[
            vec!["User".to_string(), profile.id.to_string()],
            vec!["Strava athlete".to_string(), profile.strava_athlete_id.to_string()],
            vec![
                "Last distance".to_string(),
                format!("{:.1} km", profile.last_distance / 1000.0),
            ],
            vec![
                "Last updated".to_string(),
                profile.last_updated.unwrap_or_default(),
            ],
        ],
    );
    Ok(())
}
