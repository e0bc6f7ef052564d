use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_MODEL: &str = "llama3.2:1b";
pub const DEFAULT_DAEMON_HOST: &str = "localhost";
pub const DEFAULT_DAEMON_PORT: u16 = 11434;
pub const DEFAULT_API_HOST: &str = "0.0.0.0";
pub const DEFAULT_API_PORT: u16 = 8000;

/// Runtime settings, read once at start-up.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Model provisioned before hand-off; `None` disables provisioning.
    pub default_model: Option<String>,
    pub daemon: DaemonSettings,
    pub api: ApiSettings,
    pub readiness: ReadinessSettings,
    /// Skip spawning the daemon and talk to one that is already running.
    pub attach: bool,
    pub shell: String,
}

#[derive(Debug, Clone)]
pub struct DaemonSettings {
    pub host: String,
    pub port: u16,
    pub bin: String,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy)]
pub struct ReadinessSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(1),
        }
    }
}

impl DaemonSettings {
    /// Value handed to the daemon as its `OLLAMA_HOST` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL clients use. A wildcard bind is reached over loopback.
    pub fn base_url(&self) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" | "" => "127.0.0.1",
            "[::]" => "[::1]",
            other => other,
        };
        format!("http://{}:{}", host, self.port)
    }
}

impl ApiSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Settings {
    /// Load from the process environment, including any `.env` file.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_model = match lookup("DEFAULT_MODEL") {
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(value.trim().to_string()),
            None => Some(DEFAULT_MODEL.to_string()),
        };

        let raw_host = lookup("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_DAEMON_HOST.to_string());
        let (host, embedded_port) = split_host_port(&raw_host)?;
        let explicit_port = lookup("OLLAMA_PORT")
            .map(|raw| parse_or("OLLAMA_PORT", Some(raw), DEFAULT_DAEMON_PORT))
            .transpose()?;
        let port = match (embedded_port, explicit_port) {
            (Some(embedded), Some(explicit)) if embedded != explicit => {
                return Err(Error::Config(format!(
                    "OLLAMA_HOST carries port {embedded} but OLLAMA_PORT is {explicit}"
                )));
            }
            (Some(port), _) | (None, Some(port)) => port,
            (None, None) => DEFAULT_DAEMON_PORT,
        };

        let daemon = DaemonSettings {
            host,
            port,
            bin: lookup("OLLAMA_BIN").unwrap_or_else(|| "ollama".to_string()),
        };

        let api = ApiSettings {
            host: lookup("API_HOST").unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
            port: parse_or("API_PORT", lookup("API_PORT"), DEFAULT_API_PORT)?,
        };

        let defaults = ReadinessSettings::default();
        let max_attempts = parse_or(
            "READY_MAX_ATTEMPTS",
            lookup("READY_MAX_ATTEMPTS"),
            defaults.max_attempts,
        )?;
        if max_attempts == 0 {
            return Err(Error::Config("READY_MAX_ATTEMPTS must be at least 1".into()));
        }
        let interval_ms = parse_or(
            "READY_INTERVAL_MS",
            lookup("READY_INTERVAL_MS"),
            defaults.interval.as_millis() as u64,
        )?;

        let attach = match lookup("ATTACH_DAEMON") {
            Some(value) => parse_flag(&value)
                .ok_or_else(|| Error::Config(format!("ATTACH_DAEMON: invalid flag '{value}'")))?,
            None => false,
        };

        Ok(Self {
            default_model,
            daemon,
            api,
            readiness: ReadinessSettings {
                max_attempts,
                interval: Duration::from_millis(interval_ms),
            },
            attach,
            shell: lookup("SHELL")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "/bin/bash".to_string()),
        })
    }

    /// Model used when a request names none.
    pub fn fallback_model(&self) -> &str {
        self.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key}: cannot parse '{value}'"))),
    }
}

/// Split `OLLAMA_HOST` the way the daemon reads it: an optional scheme, then
/// `host`, `host:port`, `[v6]` or `[v6]:port`. A bare IPv6 address gets
/// bracketed so it can be joined with a port.
fn split_host_port(raw: &str) -> Result<(String, Option<u16>)> {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    let bad_port = |port: &str| Error::Config(format!("OLLAMA_HOST: invalid port '{port}' in '{raw}'"));

    if let Some(rest) = without_scheme.strip_prefix('[') {
        let (addr, tail) = rest
            .split_once(']')
            .ok_or_else(|| Error::Config(format!("OLLAMA_HOST: unclosed '[' in '{raw}'")))?;
        let host = format!("[{addr}]");
        return match tail.strip_prefix(':') {
            Some(port) => Ok((host, Some(port.parse().map_err(|_| bad_port(port))?))),
            None if tail.is_empty() => Ok((host, None)),
            None => Err(Error::Config(format!("OLLAMA_HOST: unexpected '{tail}' in '{raw}'"))),
        };
    }

    match without_scheme.matches(':').count() {
        0 => Ok((without_scheme.to_string(), None)),
        1 => {
            let (host, port) = without_scheme.split_once(':').unwrap_or((without_scheme, ""));
            Ok((host.to_string(), Some(port.parse().map_err(|_| bad_port(port))?)))
        }
        _ => Ok((format!("[{without_scheme}]"), None)),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
