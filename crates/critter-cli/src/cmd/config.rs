use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use critter_core::Settings;
use std::path::Path;

const MASK: &str = "********";

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective settings (password masked)
    Show,

    /// Write the effective settings to the settings file
    Save,
}

pub fn run(
    settings: &Settings,
    path: &Path,
    subcmd: ConfigSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(settings, path, json),
        ConfigSubcommand::Save => save(settings, path, json),
    }
}

fn masked(settings: &Settings) -> Settings {
    let mut shown = settings.clone();
    if !shown.password.is_empty() {
        shown.password = MASK.to_string();
    }
    shown
}

fn show(settings: &Settings, path: &Path, json: bool) -> anyhow::Result<()> {
    let shown = masked(settings);
    if json {
        return print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "settings": shown,
        }));
    }
    println!("file:        {}", path.display());
    println!("server:      {}", shown.server_url());
    println!("username:    {}", shown.username);
    println!("password:    {}", shown.password);
    println!("patch order: {:?}", shown.patch_order);
    println!("timeout:     {}s", shown.timeout_secs);
    Ok(())
}

fn save(settings: &Settings, path: &Path, json: bool) -> anyhow::Result<()> {
    settings
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "settings saved");
    if json {
        print_json(&serde_json::json!({ "saved": path.display().to_string() }))
    } else {
        println!("Saved settings to {}", path.display());
        Ok(())
    }
}
