//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{DocError, DocResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "source.api_url",
    "source.owner",
    "source.timeout_secs",
    "source.catalog_ttl_secs",
    "source.latest_ttl_secs",
    "source.max_pages",
    "build.docs_root",
    "build.work_dir",
    "build.base_url",
    "build.shared_folder",
    "build.command",
    "build.timeout_secs",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> DocResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => {
            let mut config = config.clone();
            set_value(&mut config, &key, &value)?;
            manager.save(&config).await?;

            let ctx = UiContext::detect();
            ui::step_ok(&ctx, &format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> DocResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> DocResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok(
        &ctx,
        &format!("Configuration initialized at {}", path.display()),
    );

    Ok(())
}

/// Apply a dot-separated `key` to `config`
fn set_value(config: &mut Config, key: &str, value: &str) -> DocResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(DocError::User(format!(
                    "Invalid log format: {}. Use text/json",
                    value
                )))
            }
        },

        ["source", "api_url"] => config.source.api_url = value.to_string(),
        ["source", "owner"] => config.source.owner = value.to_string(),
        ["source", "timeout_secs"] => config.source.timeout_secs = parse_positive(value)?,
        ["source", "catalog_ttl_secs"] => config.source.catalog_ttl_secs = parse_u64(value)?,
        ["source", "latest_ttl_secs"] => config.source.latest_ttl_secs = parse_u64(value)?,
        ["source", "max_pages"] => {
            config.source.max_pages = usize::try_from(parse_positive(value)?)
                .map_err(|_| DocError::User(format!("Invalid number: {}", value)))?
        }

        ["build", "docs_root"] => config.build.docs_root = PathBuf::from(value),
        ["build", "work_dir"] => config.build.work_dir = PathBuf::from(value),
        ["build", "base_url"] => config.build.base_url = value.to_string(),
        ["build", "shared_folder"] => config.build.shared_folder = PathBuf::from(value),
        ["build", "command"] => {
            let command: Vec<String> = value.split_whitespace().map(str::to_string).collect();
            if command.is_empty() {
                return Err(DocError::User("build.command cannot be empty".to_string()));
            }
            config.build.command = command;
        }
        ["build", "timeout_secs"] => config.build.timeout_secs = parse_positive(value)?,

        _ => {
            return Err(DocError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

fn parse_u64(value: &str) -> DocResult<u64> {
    value
        .parse()
        .map_err(|_| DocError::User(format!("Invalid number: {}", value)))
}

/// Like [`parse_u64`] but zero is rejected
fn parse_positive(value: &str) -> DocResult<u64> {
    match parse_u64(value)? {
        0 => Err(DocError::User(format!("{} must be greater than zero", value))),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_known_keys() {
        let mut config = Config::default();
        set_value(&mut config, "source.owner", "acme").unwrap();
        set_value(&mut config, "source.latest_ttl_secs", "0").unwrap();
        set_value(&mut config, "build.command", "make docs").unwrap();
        set_value(&mut config, "general.log_format", "json").unwrap();

        assert_eq!(config.source.owner, "acme");
        assert_eq!(config.source.latest_ttl_secs, 0);
        assert_eq!(config.build.command, vec!["make", "docs"]);
        assert_eq!(config.general.log_format, "json");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut config = Config::default();
        let err = set_value(&mut config, "vm.name", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown config key"));
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(set_value(&mut config, "build.timeout_secs", "0").is_err());
        assert!(set_value(&mut config, "source.timeout_secs", "soon").is_err());
        assert!(set_value(&mut config, "general.log_format", "xml").is_err());
        assert!(set_value(&mut config, "build.command", "   ").is_err());
    }

    #[test]
    fn every_valid_key_is_settable() {
        for key in VALID_KEYS {
            let mut config = Config::default();
            let value = match *key {
                "general.log_format" => "json",
                k if k.ends_with("_secs") || k.ends_with("max_pages") => "5",
                _ => "x",
            };
            set_value(&mut config, key, value).unwrap();
        }
    }
}
