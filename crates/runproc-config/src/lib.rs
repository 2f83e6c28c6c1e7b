// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for runproc.
//!
//! A config file names reusable [`RequestEntry`] descriptors and a few global
//! settings. Entries convert into [`runproc::Request`] values with
//! [`RequestEntry::to_request`].
#![deny(unsafe_code)]
#![warn(missing_docs)]

use runproc::{Input, Request};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file could not be read.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// An environment override held a value of the wrong shape.
    #[error("invalid value for {var}: {reason}")]
    InvalidOverride {
        /// Environment variable name.
        var: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },

    /// A request name was not present in the config.
    #[error("unknown request '{name}'")]
    UnknownRequest {
        /// Name that was looked up.
        name: String,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A request path is relative and will resolve against `PATH` or the
    /// working directory.
    RelativePath {
        /// Request name.
        request: String,
        /// The configured path.
        path: String,
    },
    /// A request timeout is unusually large.
    LargeTimeout {
        /// Request name.
        request: String,
        /// Timeout in milliseconds.
        ms: u64,
    },
    /// The environment is not inherited and no variables are set.
    EmptyEnvironment {
        /// Request name.
        request: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::RelativePath { request, path } => {
                write!(f, "request '{request}' uses relative path '{path}'")
            }
            ConfigWarning::LargeTimeout { request, ms } => {
                write!(f, "request '{request}' has a large timeout ({ms}ms)")
            }
            ConfigWarning::EmptyEnvironment { request } => {
                write!(f, "request '{request}' runs with an empty environment")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level runproc configuration.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct RunprocConfig {
    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Deadline applied to requests that do not set `timeout_ms`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_timeout_ms: Option<u64>,

    /// Named request descriptors.
    #[serde(default)]
    pub requests: BTreeMap<String, RequestEntry>,
}

impl Default for RunprocConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".into()),
            default_timeout_ms: None,
            requests: BTreeMap::new(),
        }
    }
}

impl RunprocConfig {
    /// Look up a request entry by name.
    pub fn request(&self, name: &str) -> Result<&RequestEntry, ConfigError> {
        self.requests
            .get(name)
            .ok_or_else(|| ConfigError::UnknownRequest {
                name: name.to_string(),
            })
    }

    /// The deadline for a request entry, falling back to `default_timeout_ms`.
    pub fn timeout_for(&self, entry: &RequestEntry) -> Option<Duration> {
        entry
            .timeout_ms
            .or(self.default_timeout_ms)
            .map(Duration::from_millis)
    }
}

/// A named, reusable description of a process to run.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct RequestEntry {
    /// Executable path.
    pub path: String,
    /// Arguments passed to the executable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Environment assignments.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Whether the parent's environment is inherited.
    #[serde(default = "default_true")]
    pub inherit_env: bool,
    /// Working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Literal text written to the child's stdin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    /// File whose contents become the child's stdin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin_file: Option<String>,
    /// Deadline in milliseconds (1..=86 400 000).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl RequestEntry {
    /// An entry for `path` with every other field at its default.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            inherit_env: true,
            dir: None,
            stdin: None,
            stdin_file: None,
            timeout_ms: None,
        }
    }

    /// Convert into an invocable [`Request`].
    ///
    /// `stdin` takes precedence over `stdin_file`; validation rejects entries
    /// that set both.
    pub fn to_request(&self) -> Request {
        let mut request = Request::new(&self.path)
            .args(self.args.iter().cloned())
            .envs(self.env.clone())
            .inherit_env(self.inherit_env);
        if let Some(dir) = &self.dir {
            request = request.dir(dir);
        }
        request.stdin = match (&self.stdin, &self.stdin_file) {
            (Some(text), _) => Some(Input::from(text.as_str())),
            (None, Some(file)) => Some(Input::File(file.into())),
            (None, None) => None,
        };
        request
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum allowed timeout in milliseconds (24 hours).
const MAX_TIMEOUT_MS: u64 = 86_400_000;

/// Threshold above which a timeout generates a warning (1 hour).
const LARGE_TIMEOUT_THRESHOLD_MS: u64 = 3_600_000;

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`RunprocConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`RunprocConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<RunprocConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            debug!(target: "runproc.config", path = %p.display(), "loaded config file");
            parse_toml(&content)?
        }
        None => RunprocConfig::default(),
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Parse a TOML string into a [`RunprocConfig`].
pub fn parse_toml(content: &str) -> Result<RunprocConfig, ConfigError> {
    toml::from_str::<RunprocConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides from the process environment.
///
/// Recognised variables:
/// - `RUNPROC_LOG_LEVEL`
/// - `RUNPROC_DEFAULT_TIMEOUT_MS`
pub fn apply_env_overrides(config: &mut RunprocConfig) -> Result<(), ConfigError> {
    apply_overrides_from(config, |var| std::env::var(var).ok())
}

/// Apply overrides using `lookup` in place of the process environment.
pub fn apply_overrides_from<F>(config: &mut RunprocConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("RUNPROC_LOG_LEVEL") {
        config.log_level = Some(val);
    }
    if let Some(val) = lookup("RUNPROC_DEFAULT_TIMEOUT_MS") {
        let ms = val
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidOverride {
                var: "RUNPROC_DEFAULT_TIMEOUT_MS".into(),
                reason: e.to_string(),
            })?;
        config.default_timeout_ms = Some(ms);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (empty paths, conflicting stdin sources, out-of-range
/// timeouts) are returned as a [`ConfigError::ValidationError`]; soft issues
/// come back as warnings.
pub fn validate_config(config: &RunprocConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    if let Some(ms) = config.default_timeout_ms
        && (ms == 0 || ms > MAX_TIMEOUT_MS)
    {
        errors.push(format!(
            "default_timeout_ms {ms} out of range (1..={MAX_TIMEOUT_MS})"
        ));
    }

    for (name, entry) in &config.requests {
        if name.is_empty() {
            errors.push("request name must not be empty".into());
        }

        if entry.path.trim().is_empty() {
            errors.push(format!("request '{name}': path must not be empty"));
        } else if Path::new(&entry.path).is_relative() {
            warnings.push(ConfigWarning::RelativePath {
                request: name.clone(),
                path: entry.path.clone(),
            });
        }

        if entry.stdin.is_some() && entry.stdin_file.is_some() {
            errors.push(format!(
                "request '{name}': stdin and stdin_file are mutually exclusive"
            ));
        }

        if let Some(ms) = entry.timeout_ms {
            if ms == 0 || ms > MAX_TIMEOUT_MS {
                errors.push(format!(
                    "request '{name}': timeout {ms}ms out of range (1..={MAX_TIMEOUT_MS})"
                ));
            } else if ms > LARGE_TIMEOUT_THRESHOLD_MS {
                warnings.push(ConfigWarning::LargeTimeout {
                    request: name.clone(),
                    ms,
                });
            }
        }

        if !entry.inherit_env && entry.env.is_empty() {
            warnings.push(ConfigWarning::EmptyEnvironment {
                request: name.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations.  Values in `overlay` take precedence over `base`.
///
/// Request maps are combined; on name collisions the overlay entry wins.
pub fn merge_configs(base: RunprocConfig, overlay: RunprocConfig) -> RunprocConfig {
    let mut requests = base.requests;
    requests.extend(overlay.requests);
    RunprocConfig {
        log_level: overlay.log_level.or(base.log_level),
        default_timeout_ms: overlay.default_timeout_ms.or(base.default_timeout_ms),
        requests,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let cfg = RunprocConfig::default();
        let warnings = validate_config(&cfg).expect("default config should be valid");
        assert!(warnings.is_empty());
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn parse_valid_toml_string() {
        let toml = r#"
            log_level = "debug"
            default_timeout_ms = 5000

            [requests.cat]
            path = "/bin/cat"
            stdin = "line 1\nline 2\n"
            env = { GREETING = "hi" }
        "#;
        let cfg = parse_toml(toml).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.default_timeout_ms, Some(5000));
        let cat = cfg.request("cat").unwrap();
        assert_eq!(cat.path, "/bin/cat");
        assert!(cat.inherit_env);
        assert_eq!(cat.env["GREETING"], "hi");
    }

    #[test]
    fn parse_invalid_toml_gives_parse_error() {
        let err = parse_toml("this is [not valid toml =").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn missing_path_gives_parse_error() {
        let err = parse_toml("[requests.bad]\nargs = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn unknown_request_is_an_error() {
        let err = RunprocConfig::default().request("nope").unwrap_err();
        assert_eq!(err.to_string(), "unknown request 'nope'");
    }

    #[test]
    fn to_request_carries_every_field() {
        let mut entry = RequestEntry::new("/bin/echo");
        entry.args = vec!["a".into(), "b".into()];
        entry.env.insert("K".into(), "V".into());
        entry.inherit_env = false;
        entry.dir = Some("/tmp".into());
        entry.stdin = Some("hi".into());

        let req = entry.to_request();
        assert_eq!(req.path, std::path::PathBuf::from("/bin/echo"));
        assert_eq!(req.args, vec!["a", "b"]);
        assert_eq!(req.env.get("K").map(String::as_str), Some("V"));
        assert!(!req.inherit_env);
        assert_eq!(req.dir, Some(std::path::PathBuf::from("/tmp")));
        assert_eq!(req.stdin, Some(Input::Bytes(b"hi".to_vec())));
    }

    #[test]
    fn to_request_uses_stdin_file() {
        let mut entry = RequestEntry::new("/bin/cat");
        entry.stdin_file = Some("/tmp/in.txt".into());
        assert_eq!(
            entry.to_request().stdin,
            Some(Input::File("/tmp/in.txt".into()))
        );
    }

    #[test]
    fn timeout_falls_back_to_default() {
        let cfg = RunprocConfig {
            default_timeout_ms: Some(250),
            ..Default::default()
        };
        let mut entry = RequestEntry::new("/bin/true");
        assert_eq!(cfg.timeout_for(&entry), Some(Duration::from_millis(250)));
        entry.timeout_ms = Some(10);
        assert_eq!(cfg.timeout_for(&entry), Some(Duration::from_millis(10)));
    }

    #[test]
    fn overrides_apply() {
        let mut cfg = RunprocConfig::default();
        apply_overrides_from(&mut cfg, |var| match var {
            "RUNPROC_LOG_LEVEL" => Some("trace".into()),
            "RUNPROC_DEFAULT_TIMEOUT_MS" => Some("1500".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("trace"));
        assert_eq!(cfg.default_timeout_ms, Some(1500));
    }

    #[test]
    fn non_numeric_timeout_override_is_rejected() {
        let mut cfg = RunprocConfig::default();
        let err = apply_overrides_from(&mut cfg, |var| {
            (var == "RUNPROC_DEFAULT_TIMEOUT_MS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { .. }));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[requests.t]\npath = \"/usr/bin/true\"").unwrap();
        let cfg = load_config(Some(file.path())).unwrap();
        assert!(cfg.requests.contains_key("t"));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let err = load_config(Some(Path::new("/does-not-exist/runproc.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn merge_overlay_wins() {
        let mut base = RunprocConfig::default();
        base.requests
            .insert("a".into(), RequestEntry::new("/bin/a"));
        base.requests
            .insert("b".into(), RequestEntry::new("/bin/b"));
        let mut overlay = RunprocConfig {
            log_level: None,
            default_timeout_ms: Some(100),
            requests: BTreeMap::new(),
        };
        overlay
            .requests
            .insert("b".into(), RequestEntry::new("/bin/b2"));

        let merged = merge_configs(base, overlay);
        assert_eq!(merged.log_level.as_deref(), Some("info"));
        assert_eq!(merged.default_timeout_ms, Some(100));
        assert_eq!(merged.requests["a"].path, "/bin/a");
        assert_eq!(merged.requests["b"].path, "/bin/b2");
    }
}
