use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dealerdash_core::locale::Locale;
use dealerdash_core::pagination::clamp_page_size;

/// Dashboard configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Versioned API root (default: `http://localhost:4000/api/v1`).
    pub api_base_url: String,
    /// Locale for new sessions (default: `en`).
    pub locale: Locale,
    /// Per-request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Rows per list page (default: `10`).
    pub page_size: u32,
    /// Where the signed-in session is kept (default: `.dealerdash-session.json`).
    pub session_file: PathBuf,
    /// 360° service settings; `None` disables the `media360` commands.
    pub media360: Option<Media360Config>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media360Config {
    pub url: String,
    pub token: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("{set} is set but {missing} is missing")]
    Incomplete {
        set: &'static str,
        missing: &'static str,
    },
}

impl DashboardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                          |
    /// |------------------------|----------------------------------|
    /// | `API_BASE_URL`         | `http://localhost:4000/api/v1`   |
    /// | `DASHBOARD_LOCALE`     | `en`                             |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                             |
    /// | `PAGE_SIZE`            | `10`                             |
    /// | `SESSION_FILE`         | `.dealerdash-session.json`       |
    /// | `MEDIA360_URL`         | unset                            |
    /// | `MEDIA360_TOKEN`       | unset                            |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_base_url = var("API_BASE_URL")
            .unwrap_or_else(|| "http://localhost:4000/api/v1".into())
            .trim_end_matches('/')
            .to_string();
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                var: "API_BASE_URL",
                expected: "an http(s) URL",
                value: api_base_url,
            });
        }

        let locale = match var("DASHBOARD_LOCALE") {
            Some(value) => Locale::from_str(value.trim()).map_err(|_| ConfigError::Invalid {
                var: "DASHBOARD_LOCALE",
                expected: "'ar' or 'en'",
                value,
            })?,
            None => Locale::default(),
        };

        let request_timeout_secs: u64 = parse_var(
            "REQUEST_TIMEOUT_SECS",
            var("REQUEST_TIMEOUT_SECS"),
            30,
            "a positive number of seconds",
        )?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "REQUEST_TIMEOUT_SECS",
                expected: "a positive number of seconds",
                value: "0".into(),
            });
        }

        let page_size: u32 = parse_var("PAGE_SIZE", var("PAGE_SIZE"), 10, "a whole number")?;

        let session_file = var("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".dealerdash-session.json"));

        let media360 = match (var("MEDIA360_URL"), var("MEDIA360_TOKEN")) {
            (Some(url), Some(token)) => Some(Media360Config { url, token }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    set: "MEDIA360_URL",
                    missing: "MEDIA360_TOKEN",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    set: "MEDIA360_TOKEN",
                    missing: "MEDIA360_URL",
                })
            }
        };

        Ok(Self {
            api_base_url,
            locale,
            request_timeout_secs,
            page_size: clamp_page_size(Some(page_size)),
            session_file,
            media360,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: name,
            expected,
            value: raw,
        }),
        None => Ok(default),
    }
}
