use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::{env, fs};

/// Runtime settings for the grading engine, read from `.env` and the process environment.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub email_from_name: String,
    pub frontend_url: String,
}

static CONFIG: OnceCell<Config> = OnceCell::new();

impl Config {
    /// Loads `env_path` (if present) and caches the resulting config for the process.
    pub fn init(env_path: &str) -> &'static Self {
        dotenvy::from_filename(env_path).ok();

        CONFIG.get_or_init(|| {
            let config = Self::from_env();
            if let Some(parent) = std::path::Path::new(&config.log_file).parent() {
                // Best effort: the logger reports a missing directory itself.
                let _ = fs::create_dir_all(parent);
            }
            config
        })
    }

    /// Builds a config from the current environment without touching the global.
    pub fn from_env() -> Self {
        let project_name = env::var("PROJECT_NAME").unwrap_or_else(|_| "grading-engine".into());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/grading.log".into());
        let email_from_name =
            env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "Academic Records".into());
        let frontend_url = env::var("FRONTEND_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "http://localhost:3000".into());

        Config {
            project_name,
            log_level,
            log_file,
            email_from_name,
            frontend_url,
        }
    }

    /// Returns the global config, if [`Config::init`] has run.
    pub fn get() -> Option<&'static Self> {
        CONFIG.get()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            project_name: "grading-engine".into(),
            log_level: "info".into(),
            log_file: "logs/grading.log".into(),
            email_from_name: "Academic Records".into(),
            frontend_url: "http://localhost:3000".into(),
        }
    }
}
