// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use basecoat_app::MAX_DEBOUNCE;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "basecoat";
pub const SERVER_URL_ENV: &str = "BASECOAT_SERVER_URL";
const CONFIG_PATH_ENV: &str = "BASECOAT_CONFIG_PATH";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
const DEFAULT_SERVER_TIMEOUT: &str = "5s";
const DEFAULT_SEARCH_DEBOUNCE: &str = "625ms";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub search: Search,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: Server::default(),
            search: Search::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Some(DEFAULT_SERVER_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
    pub debounce: Option<String>,
}

impl Default for Search {
    fn default() -> Self {
        Self {
            debounce: Some(DEFAULT_SEARCH_DEBOUNCE.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub path: Option<String>,
    pub level: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            path: None,
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [server], [search], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.server.base_url {
            basecoat_client::validate_base_url(base_url)
                .with_context(|| format!("server.base_url in {}", path.display()))?;
        }

        if let Some(timeout) = &self.server.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "server.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(debounce) = &self.search.debounce {
            let parsed = parse_duration(debounce)?;
            if parsed.is_zero() {
                bail!(
                    "search.debounce in {} must be positive, got {}",
                    path.display(),
                    debounce
                );
            }
            if parsed > MAX_DEBOUNCE {
                bail!(
                    "search.debounce in {} must be at most {}s, got {}",
                    path.display(),
                    MAX_DEBOUNCE.as_secs(),
                    debounce
                );
            }
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).with_context(|| {
                format!(
                    "log.level in {} is not a valid filter: {level:?}",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    /// The file value wins, then `BASECOAT_SERVER_URL`, then the default.
    pub fn server_base_url(&self) -> String {
        if let Some(base_url) = &self.server.base_url {
            return base_url.trim_end_matches('/').to_owned();
        }
        match env::var(SERVER_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => value.trim().trim_end_matches('/').to_owned(),
            _ => DEFAULT_SERVER_URL.to_owned(),
        }
    }

    pub fn server_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.server
                .timeout
                .as_deref()
                .unwrap_or(DEFAULT_SERVER_TIMEOUT),
        )
    }

    pub fn search_debounce(&self) -> Result<Duration> {
        parse_duration(
            self.search
                .debounce
                .as_deref()
                .unwrap_or(DEFAULT_SEARCH_DEBOUNCE),
        )
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }
        let cache_root = dirs::cache_dir()
            .ok_or_else(|| anyhow!("cannot resolve cache directory; set [log].path"))?;
        Ok(cache_root.join(APP_NAME).join(format!("{APP_NAME}.log")))
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# basecoat config\n# Place this file at: {}\n\nversion = 1\n\n[server]\n# Optional. Falls back to ${} and then {}\n# base_url = \"{}\"\ntimeout = \"{}\"\n\n[search]\n# Quiet period after the last keystroke before the listing is filtered\ndebounce = \"{}\"\n\n[log]\n# Optional. Default is the platform cache dir (for example ~/.cache/basecoat/basecoat.log)\n# path = \"/absolute/path/to/basecoat.log\"\nlevel = \"{}\"\n",
            path.display(),
            SERVER_URL_ENV,
            DEFAULT_SERVER_URL,
            DEFAULT_SERVER_URL,
            DEFAULT_SERVER_TIMEOUT,
            DEFAULT_SEARCH_DEBOUNCE,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("invalid duration {raw:?}; value is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 625ms or 5s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, SERVER_URL_ENV, parse_duration};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.search_debounce()?, Duration::from_millis(625));
        assert_eq!(config.server_timeout()?, Duration::from_secs(5));
        assert_eq!(config.log_level(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[server]\nbase_url = \"http://paint.local\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[server], [search], and [log]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[server]\nbase_url = \"http://paint.local:9000/\"\ntimeout = \"2s\"\n[search]\ndebounce = \"300ms\"\n[log]\npath = \"/tmp/basecoat-test.log\"\nlevel = \"basecoat=debug\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.server_base_url(), "http://paint.local:9000");
        assert_eq!(config.server_timeout()?, Duration::from_secs(2));
        assert_eq!(config.search_debounce()?, Duration::from_millis(300));
        assert_eq!(config.log_path()?, PathBuf::from("/tmp/basecoat-test.log"));
        assert_eq!(config.log_level(), "basecoat=debug");
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("BASECOAT_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("BASECOAT_CONFIG_PATH");
        }
        assert_eq!(resolved?, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("BASECOAT_CONFIG_PATH");
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("basecoat/config.toml"));
        Ok(())
    }

    #[test]
    fn server_url_prefers_config_over_env_override() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) =
            write_config("version = 1\n[server]\nbase_url = \"http://from-config:8080\"\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(SERVER_URL_ENV, "http://from-env:8080");
        }
        let config = Config::load(&path);
        let resolved = config.map(|config| config.server_base_url());
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(SERVER_URL_ENV);
        }
        assert_eq!(resolved?, "http://from-config:8080");
        Ok(())
    }

    #[test]
    fn server_url_uses_env_override_when_config_is_silent() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(SERVER_URL_ENV, "http://from-env:9090/");
        }
        let config = Config::load(&path);
        let resolved = config.map(|config| config.server_base_url());
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(SERVER_URL_ENV);
        }
        assert_eq!(resolved?, "http://from-env:9090");
        Ok(())
    }

    #[test]
    fn server_url_defaults_to_localhost_when_unset() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(SERVER_URL_ENV);
        }
        let config = Config::default();
        assert_eq!(config.server_base_url(), "http://localhost:8080");
        Ok(())
    }

    #[test]
    fn non_http_base_url_is_rejected() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[server]\nbase_url = \"ftp://paint.local\"\n")?;
        let error = Config::load(&path).expect_err("ftp base_url should fail validation");
        let message = format!("{error:#}");
        assert!(message.contains("server.base_url"), "got {message}");
        assert!(message.contains("http or https"), "got {message}");
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("625ms")?, Duration::from_millis(625));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        Ok(())
    }

    #[test]
    fn durations_reject_garbage() {
        let error = parse_duration("soon").expect_err("invalid duration should fail");
        assert!(error.to_string().contains("invalid duration"));

        let error =
            parse_duration("307445734561825861m").expect_err("overflowing minutes should fail");
        assert!(error.to_string().contains("invalid duration"));
    }

    #[test]
    fn overflowing_timeout_is_an_error_not_a_panic() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[server]\ntimeout = \"307445734561825861m\"\n")?;
        let error = Config::load(&path).expect_err("overflowing timeout should fail");
        assert!(error.to_string().contains("invalid duration"));
        Ok(())
    }

    #[test]
    fn debounce_above_the_limit_is_rejected() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[search]\ndebounce = \"18446744073709551615s\"\n")?;
        let error = Config::load(&path).expect_err("huge debounce should fail");
        let message = error.to_string();
        assert!(message.contains("search.debounce"), "got {message}");
        assert!(message.contains("at most 60s"), "got {message}");

        let (_temp, path) = write_config("version = 1\n[search]\ndebounce = \"1m\"\n")?;
        assert_eq!(Config::load(&path)?.search_debounce()?, Duration::from_secs(60));
        Ok(())
    }

    #[test]
    fn zero_timeout_and_debounce_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[server]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("server.timeout"));

        let (_temp, path) = write_config("version = 1\n[search]\ndebounce = \"0ms\"\n")?;
        let error = Config::load(&path).expect_err("zero debounce should fail");
        assert!(error.to_string().contains("search.debounce"));
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"basecoat=loud\"\n")?;
        let error = Config::load(&path).expect_err("bogus level should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn example_config_includes_required_sections() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[server]"));
        assert!(example.contains("[search]"));
        assert!(example.contains("[log]"));
        assert!(example.contains("debounce = \"625ms\""));

        let (_temp, written) = write_config(&example)?;
        let parsed = Config::load(&written)?;
        assert_eq!(parsed.search_debounce()?, Duration::from_millis(625));
        Ok(())
    }
}
