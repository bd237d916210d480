use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "chartdesk.toml";
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: Url,
    pub download_dir: PathBuf,
    pub log_filter: String,
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    server_url: Option<String>,
    download_dir: Option<PathBuf>,
    log_filter: Option<String>,
}

pub fn load_settings(config_path: Option<&Path>, overrides: &Overrides) -> Result<Settings> {
    load_settings_with(config_path, overrides, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    config_path: Option<&Path>,
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let mut server_url = DEFAULT_SERVER_URL.to_string();
    let mut download_dir = PathBuf::from(DEFAULT_DOWNLOAD_DIR);
    let mut log_filter = DEFAULT_LOG_FILTER.to_string();

    let file_cfg = match config_path {
        Some(path) => Some(read_config_file(path)?),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                Some(read_config_file(path)?)
            } else {
                None
            }
        }
    };
    if let Some(file_cfg) = file_cfg {
        if let Some(v) = file_cfg.server_url {
            server_url = v;
        }
        if let Some(v) = file_cfg.download_dir {
            download_dir = v;
        }
        if let Some(v) = file_cfg.log_filter {
            log_filter = v;
        }
    }

    if let Some(v) = env("CHARTDESK_SERVER_URL") {
        server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        server_url = v;
    }
    if let Some(v) = env("CHARTDESK_DOWNLOAD_DIR") {
        download_dir = PathBuf::from(v);
    }
    if let Some(v) = env("APP__DOWNLOAD_DIR") {
        download_dir = PathBuf::from(v);
    }
    if let Some(v) = env("CHARTDESK_LOG") {
        log_filter = v;
    }

    if let Some(v) = &overrides.server_url {
        server_url = v.clone();
    }
    if let Some(v) = &overrides.download_dir {
        download_dir = v.clone();
    }

    Ok(Settings {
        server_url: parse_server_url(&server_url)?,
        download_dir,
        log_filter,
    })
}

fn read_config_file(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config file '{}'", path.display()))
}

fn parse_server_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid server url '{raw}'"))?;
    anyhow::ensure!(
        matches!(url.scheme(), "http" | "https"),
        "server url '{raw}' must use http or https"
    );
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
