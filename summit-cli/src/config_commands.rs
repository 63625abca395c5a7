//! `summit config show|set|reset|path`.

use crate::output::{print_json, print_table};
use anyhow::{bail, Context as _, Result};
use clap::Subcommand;
use serde_json::Value;
use summit_core::{Database, Settings};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current settings.
    Show,
    /// Change one setting, e.g. `summit config set api_base_url https://example.com`.
    Set { key: String, value: String },
    /// Restore every setting to its default.
    Reset,
    /// Print the database location.
    Path,
}

/// Apply `key = value` to `settings`, keeping the field's JSON type.
fn apply_setting(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let mut json = serde_json::to_value(settings)?;
    let Some(fields) = json.as_object_mut() else {
        bail!("Settings are not a JSON object");
    };
    let Some(current) = fields.get(key) else {
        let known: Vec<&str> = fields.keys().map(String::as_str).collect();
        bail!("Unknown setting `{key}`. Known settings: {}", known.join(", "));
    };

    let new_value = match current {
        Value::Number(_) => {
            let n: u64 = value
                .parse()
                .with_context(|| format!("`{key}` expects a whole number"))?;
            Value::from(n)
        }
        _ => Value::String(value.to_string()),
    };
    fields.insert(key.to_string(), new_value);

    let mut updated: Settings = serde_json::from_value(json)?;
    updated.validate();
    Ok(updated)
}

fn show(settings: &Settings, json: bool) -> Result<()> {
    if json {
        return print_json(settings);
    }
    let value = serde_json::to_value(settings)?;
    let rows: Vec<Vec<String>> = value
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .map(|(k, v)| {
                    let shown = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    vec![k.clone(), shown]
                })
                .collect()
        })
        .unwrap_or_default();
    print_table(&["Setting", "Value"], &rows);
    Ok(())
}

pub fn handle_config(action: ConfigAction, db: &Database, json: bool) -> Result<()> {
    match action {
        ConfigAction::Show => show(&Settings::load(db), json),
        ConfigAction::Set { key, value } => {
            let updated = apply_setting(&Settings::load(db), &key, &value)?;
            updated.save(db)?;
            show(&updated, json)
        }
        ConfigAction::Reset => {
            let defaults = Settings::default();
            defaults.save(db)?;
            show(&defaults, json)
        }
        ConfigAction::Path => {
            println!("{}", db.path().display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_string_setting() {
        let updated =
            apply_setting(&Settings::default(), "api_base_url", "http://localhost:8080/").unwrap();
        assert_eq!(updated.api_base_url, "http://localhost:8080");
    }

    #[test]
    fn test_apply_number_setting_is_clamped() {
        let updated =
            apply_setting(&Settings::default(), "login_failure_delay_ms", "999999").unwrap();
        assert_eq!(updated.login_failure_delay_ms, 30_000);
        assert!(apply_setting(&Settings::default(), "login_failure_delay_ms", "soon").is_err());
    }

    #[test]
    fn test_unknown_setting() {
        let err = apply_setting(&Settings::default(), "colour", "blue").unwrap_err();
        assert!(err.to_string().contains("Unknown setting"));
    }
}
