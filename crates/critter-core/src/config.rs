use crate::error::{CritterError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_SERVER: &str = "http://localhost:6060/crucible";
pub const SETTINGS_FILE: &str = ".config/critter/settings.yaml";

// ---------------------------------------------------------------------------
// PatchOrder
// ---------------------------------------------------------------------------

/// Order in which queued patches are uploaded.
///
/// `Lifo` uploads the most recently added patch first; `Fifo` uploads them
/// in the order they were added to the review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOrder {
    #[default]
    Lifo,
    Fifo,
}

impl std::str::FromStr for PatchOrder {
    type Err = CritterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lifo" => Ok(PatchOrder::Lifo),
            "fifo" => Ok(PatchOrder::Fifo),
            other => Err(CritterError::Configuration(format!(
                "unknown patch order '{other}': expected lifo or fifo"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Persisted connection settings for the review service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub patch_order: PatchOrder,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: default_server(),
            username: String::new(),
            password: String::new(),
            patch_order: PatchOrder::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Settings {
    /// `~/.config/critter/settings.yaml`
    pub fn default_path() -> Result<PathBuf> {
        let home = home::home_dir().ok_or(CritterError::HomeNotFound)?;
        Ok(home.join(SETTINGS_FILE))
    }

    /// Load settings from `path`, falling back to defaults when the file does
    /// not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&data)?;
        Ok(settings)
    }

    /// Atomic write through a temp file in the same directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let data = serde_yaml::to_string(self)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Server URL with a scheme and without trailing slashes.
    pub fn server_url(&self) -> String {
        let trimmed = self.server.trim().trim_end_matches('/');
        if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.patch_order, PatchOrder::Lifo);
        assert_eq!(settings.timeout_secs, 30);
    }

    #[test]
    fn save_then_load_preserves_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/settings.yaml");
        let settings = Settings {
            server: "crucible.example.com".into(),
            username: "alice".into(),
            password: "s3cret".into(),
            patch_order: PatchOrder::Fifo,
            timeout_secs: 5,
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "username: bob\npatch_order: fifo\n").unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.username, "bob");
        assert_eq!(settings.server, DEFAULT_SERVER);
        assert_eq!(settings.patch_order, PatchOrder::Fifo);
    }

    #[test]
    fn server_url_adds_scheme_and_strips_slash() {
        let mut settings = Settings {
            server: "stella:6060/crucible/".into(),
            ..Default::default()
        };
        assert_eq!(settings.server_url(), "http://stella:6060/crucible");

        settings.server = "https://review.example.com".into();
        assert_eq!(settings.server_url(), "https://review.example.com");
    }

    #[test]
    fn patch_order_parses() {
        assert_eq!("fifo".parse::<PatchOrder>().unwrap(), PatchOrder::Fifo);
        assert_eq!("lifo".parse::<PatchOrder>().unwrap(), PatchOrder::Lifo);
        assert!(matches!(
            "random".parse::<PatchOrder>(),
            Err(CritterError::Configuration(_))
        ));
    }
}
