use std::path::PathBuf;

use anyhow::Context;
use critter_core::Settings;

/// Values given on the command line or through the environment. Each one
/// replaces the matching field of the settings file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub server: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Load the settings file and layer `overrides` on top.
///
/// Priority, highest first:
/// 1. `--server` / `--user` / `--password` (or their `CRITTER_*` variables)
/// 2. The file named by `--config` / `CRITTER_CONFIG`
/// 3. `~/.config/critter/settings.yaml`
/// 4. Built-in defaults
///
/// Returns the settings together with the file they were read from, which is
/// also where `critter config save` writes them back.
pub fn resolve(overrides: Overrides) -> anyhow::Result<(Settings, PathBuf)> {
    let path = match overrides.config {
        Some(p) => p,
        None => Settings::default_path().context("failed to locate settings file")?,
    };
    let mut settings = Settings::load(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;

    if let Some(server) = overrides.server {
        settings.server = server;
    }
    if let Some(user) = overrides.user {
        settings.username = user;
    }
    if let Some(password) = overrides.password {
        settings.password = password;
    }
    Ok((settings, path))
}
