use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/widget.json";
pub const DEFAULT_CLIENT_ID: &str = "Sma14N_67a056";
pub const BASE_URL_ENV: &str = "CHAT_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub init_path: String,
    pub chat_path: String,
    pub client_id: String,
    pub index: String,
    pub sop_namespace: String,
    pub kb_namespace: String,
    pub assistant_name: String,
    pub user_name: String,
    pub greeting: String,
    /// Enables `GET` polling of the chat endpoint when set.
    pub poll_interval_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            init_path: "/api/init".to_string(),
            chat_path: "/api/chat".to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            index: "default-index".to_string(),
            sop_namespace: "KAR001_LISGHP".to_string(),
            kb_namespace: "KAR001_LISGHP".to_string(),
            assistant_name: "Ray".to_string(),
            user_name: "You".to_string(),
            greeting: "Hi, how can i assist you today?".to_string(),
            poll_interval_secs: None,
        }
    }
}

impl AppConfig {
    pub fn init_url(&self) -> String {
        self.endpoint(&self.init_path)
    }

    pub fn chat_url(&self) -> String {
        self.endpoint(&self.chat_path)
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Applies `CHAT_BASE_URL` (also read from `.env`) on top of the file values.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                log::info!("Using {BASE_URL_ENV}={base_url}");
                self.base_url = base_url;
            }
        }
        self
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}
