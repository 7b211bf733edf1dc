use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File, Map};
use serde::Deserialize;

use crate::db::DEFAULT_DB_PATH;

pub const DEFAULT_LISTING_URL: &str = "https://www.burnside.sa.gov.au/Planning-Business/Planning-Development/Development-Applications/Development-Applications-on-Public-Notification";
pub const DEFAULT_COMMENT_URL: &str = "mailto:burnside@burnside.sa.gov.au";
pub const DEFAULT_LISTING_SELECTOR: &str = "div.list-container a";

const DEFAULT_CONFIG_FILE: &str = "planning_notices";
const ENV_PREFIX: &str = "PLANNING";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub listing_url: String,
    pub listing_selector: String,
    pub comment_url: String,
    pub db_path: PathBuf,
    pub pacing: PacingSettings,
    pub fetch: FetchSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    pub min_delay_ms: u64,
    pub jitter_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
    pub proxy: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            listing_selector: DEFAULT_LISTING_SELECTOR.to_string(),
            comment_url: DEFAULT_COMMENT_URL.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            pacing: PacingSettings::default(),
            fetch: FetchSettings::default(),
        }
    }
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            min_delay_ms: 1000,
            jitter_ms: 2000,
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("planning_notices/", env!("CARGO_PKG_VERSION")).to_string(),
            // the council site has served an incomplete certificate chain before
            accept_invalid_certs: true,
            proxy: None,
        }
    }
}

impl Settings {
    /// Defaults, then the optional config file, then `PLANNING_*` environment variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(file, None)
    }

    /// As `load`, reading variables from `env` instead of the process when given.
    fn load_with_env(file: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Config::builder()
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Command-line flags of `run`, applied over every other layer.
    pub fn apply_run_overrides(
        &mut self,
        listing_url: Option<String>,
        db_path: Option<PathBuf>,
        min_delay_ms: Option<u64>,
        jitter_ms: Option<u64>,
    ) {
        if let Some(url) = listing_url {
            self.listing_url = url;
        }
        if let Some(path) = db_path {
            self.db_path = path;
        }
        if let Some(ms) = min_delay_ms {
            self.pacing.min_delay_ms = ms;
        }
        if let Some(ms) = jitter_ms {
            self.pacing.jitter_ms = ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "db_path = \"out/notices.sqlite\"\n\n[pacing]\njitter_ms = 0\n"
        )
        .unwrap();
        file
    }

    fn env(vars: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn file_overrides_defaults() {
        let file = config_file();
        let settings = Settings::load_with_env(Some(file.path()), env(&[])).unwrap();
        assert_eq!(settings.db_path, PathBuf::from("out/notices.sqlite"));
        assert_eq!(settings.pacing.jitter_ms, 0);
        assert_eq!(settings.pacing.min_delay_ms, 1000);
        assert_eq!(settings.listing_selector, DEFAULT_LISTING_SELECTOR);
        assert!(settings.fetch.proxy.is_none());
    }

    #[test]
    fn environment_overrides_file() {
        let file = config_file();
        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[
                ("PLANNING_DB_PATH", "env.sqlite"),
                ("PLANNING_PACING__JITTER_MS", "750"),
                ("PLANNING_FETCH__PROXY", "http://proxy.local:3128"),
                ("OTHER_DB_PATH", "ignored.sqlite"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.db_path, PathBuf::from("env.sqlite"));
        assert_eq!(settings.pacing.jitter_ms, 750);
        assert_eq!(settings.fetch.proxy.as_deref(), Some("http://proxy.local:3128"));
        assert_eq!(settings.pacing.min_delay_ms, 1000);
    }

    #[test]
    fn run_flags_override_environment() {
        let file = config_file();
        let mut settings = Settings::load_with_env(
            Some(file.path()),
            env(&[("PLANNING_DB_PATH", "env.sqlite"), ("PLANNING_PACING__JITTER_MS", "750")]),
        )
        .unwrap();

        settings.apply_run_overrides(
            Some("https://council.example.gov.au/notices".to_string()),
            Some(PathBuf::from("cli.sqlite")),
            None,
            Some(5),
        );
        assert_eq!(settings.listing_url, "https://council.example.gov.au/notices");
        assert_eq!(settings.db_path, PathBuf::from("cli.sqlite"));
        assert_eq!(settings.pacing.jitter_ms, 5);
        assert_eq!(settings.pacing.min_delay_ms, 1000);
    }

    #[test]
    fn absent_flags_keep_configured_values() {
        let mut settings = Settings::load_with_env(None, env(&[])).unwrap();
        settings.apply_run_overrides(None, None, None, None);
        assert_eq!(settings.listing_url, DEFAULT_LISTING_URL);
        assert_eq!(settings.db_path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(
            Settings::load_with_env(Some(Path::new("/nonexistent/planning.toml")), env(&[]))
                .is_err()
        );
    }
}
