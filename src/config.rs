// src/config.rs
use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_SOURCES_PATH: &str = "NEWS_SOURCES_PATH";
const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";

/// SMTP transport settings, sourced from the environment. Sender address and
/// credential are required; host and port fall back to the usual defaults.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub sender: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl MailConfig {
    pub fn from_env() -> Result<Self> {
        let sender = std::env::var("SENDER_EMAIL").context("SENDER_EMAIL missing")?;
        let password = std::env::var("SENDER_PASSWORD").context("SENDER_PASSWORD missing")?;
        let host = std::env::var("SMTP_SERVER").unwrap_or_else(|_| "smtp.gmail.com".to_string());
        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(587);
        Ok(Self {
            sender,
            password,
            host,
            port,
        })
    }
}

/// Non-mail process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub cache_path: PathBuf,
    pub fire_time: NaiveTime,
    pub poll_secs: u64,
    /// Pre-fills the subscription input; activation still needs an explicit
    /// subscribe.
    pub prefill_recipient: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let cache_path = std::env::var("NEWS_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("output.json"));
        let fire_time = match std::env::var("DIGEST_FIRE_TIME") {
            Ok(v) => parse_fire_time(&v).unwrap_or_else(|| {
                tracing::warn!(
                    value = v.as_str(),
                    "invalid DIGEST_FIRE_TIME (want HH:MM), using default"
                );
                default_fire_time()
            }),
            Err(_) => default_fire_time(),
        };
        let poll_secs = std::env::var("CLOCK_POLL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        let prefill_recipient = std::env::var("RECIPIENT_EMAIL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Self {
            cache_path,
            fire_time,
            poll_secs,
            prefill_recipient,
        }
    }
}

pub fn default_fire_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).expect("08:00 is a valid time")
}

pub fn parse_fire_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// One configured headline source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedEntry {
    pub name: String,
    pub rss: String,
    /// Site front page; informational only.
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedFile {
    sources: Vec<FeedEntry>,
}

/// Load the feed list from an explicit TOML path.
pub fn load_feeds_from(path: &Path) -> Result<Vec<FeedEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading feed config from {}", path.display()))?;
    let file: FeedFile = toml::from_str(&content)
        .with_context(|| format!("parsing feed config {}", path.display()))?;
    Ok(file.sources)
}

/// Feed list resolution:
/// 1) $NEWS_SOURCES_PATH
/// 2) config/sources.toml
/// 3) built-in BBC default
pub fn load_feeds_default() -> Result<Vec<FeedEntry>> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_feeds_from(&pb);
        }
        anyhow::bail!("NEWS_SOURCES_PATH points to non-existent path");
    }
    let default_p = PathBuf::from(DEFAULT_SOURCES_PATH);
    if default_p.exists() {
        return load_feeds_from(&default_p);
    }
    Ok(default_feeds())
}

pub fn default_feeds() -> Vec<FeedEntry> {
    vec![FeedEntry {
        name: "bbc".to_string(),
        rss: "http://feeds.bbci.co.uk/news/rss.xml".to_string(),
        link: Some("https://www.bbc.com/news".to_string()),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_time_parses_and_rejects() {
        assert_eq!(
            parse_fire_time("08:00"),
            NaiveTime::from_hms_opt(8, 0, 0)
        );
        assert_eq!(
            parse_fire_time(" 21:45 "),
            NaiveTime::from_hms_opt(21, 45, 0)
        );
        assert_eq!(parse_fire_time("8am"), None);
        assert_eq!(parse_fire_time(""), None);
    }

    #[test]
    fn feed_file_parses_with_optional_link() {
        let toml = r#"
            [[sources]]
            name = "bbc"
            rss = "http://feeds.bbci.co.uk/news/rss.xml"
            link = "https://www.bbc.com/news"

            [[sources]]
            name = "wire"
            rss = "https://example.test/rss.xml"
        "#;
        let file: FeedFile = toml::from_str(toml).unwrap();
        assert_eq!(file.sources.len(), 2);
        assert_eq!(file.sources[0].name, "bbc");
        assert_eq!(file.sources[1].link, None);
    }

    #[serial_test::serial]
    #[test]
    fn env_path_takes_precedence() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("sources.toml");
        std::fs::write(&p, "[[sources]]\nname = \"x\"\nrss = \"https://x.test/rss\"\n").unwrap();

        std::env::set_var(ENV_SOURCES_PATH, p.display().to_string());
        let feeds = load_feeds_default().unwrap();
        std::env::remove_var(ENV_SOURCES_PATH);

        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].name, "x");
    }

    #[serial_test::serial]
    #[test]
    fn dangling_env_path_errors() {
        std::env::set_var(ENV_SOURCES_PATH, "/nonexistent/sources.toml");
        let res = load_feeds_default();
        std::env::remove_var(ENV_SOURCES_PATH);
        assert!(res.is_err());
    }
}
