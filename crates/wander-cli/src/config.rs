//! Layered configuration for the `wander` binary.
//!
//! Four layers, later ones winning:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. `<config dir>/default.toml` – the base file layer.
//! 3. `<config dir>/<env>/env.toml` – per-environment overlay with
//!    optional fields; only the fields present override the base.
//! 4. `WANDER_*` environment variables, applied last.
//!
//! The config directory is `config/` relative to the working directory,
//! overridable with `WANDER_CONFIG_DIR`. The environment name comes from
//! `WANDER_ENV` (default `dev`) and is resolved by the caller.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wander_types::WanderError;

/// Resolved configuration for one run of the binary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub wander: WanderSection,
}

/// Endpoint of the external message bus.
///
/// The in-process transport ignores it, but the endpoint stays in the
/// configuration surface because it is where a networked bus client
/// attaches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusConfig {
    #[serde(default = "default_bus_host")]
    pub host: String,
    #[serde(default = "default_bus_port")]
    pub port: u16,
}

/// Log level and destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path; absent means stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Behavior tunables surfaced to operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WanderSection {
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f64,
    #[serde(default = "default_speed")]
    pub drive_speed: f32,
    #[serde(default = "default_speed")]
    pub turn_speed: f32,
    /// Spawn the simulated subsystems so the behavior is exercisable
    /// without hardware.
    #[serde(default)]
    pub simulate: bool,
}

fn default_bus_host() -> String {
    "localhost".to_string()
}
fn default_bus_port() -> u16 {
    6379
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_distance_threshold() -> f64 {
    40.0
}
fn default_speed() -> f32 {
    1.0
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: default_bus_host(),
            port: default_bus_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for WanderSection {
    fn default() -> Self {
        Self {
            distance_threshold: default_distance_threshold(),
            drive_speed: default_speed(),
            turn_speed: default_speed(),
            simulate: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Overlay
// ─────────────────────────────────────────────────────────────────────────────

/// Per-environment overlay: every field optional, present fields win.
#[derive(Debug, Default, Deserialize)]
struct Overlay {
    #[serde(default)]
    bus: BusOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
    #[serde(default)]
    wander: WanderOverlay,
}

#[derive(Debug, Default, Deserialize)]
struct BusOverlay {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingOverlay {
    level: Option<String>,
    file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WanderOverlay {
    distance_threshold: Option<f64>,
    drive_speed: Option<f32>,
    turn_speed: Option<f32>,
    simulate: Option<bool>,
}

impl Overlay {
    fn apply(self, cfg: &mut Config) {
        if let Some(v) = self.bus.host {
            cfg.bus.host = v;
        }
        if let Some(v) = self.bus.port {
            cfg.bus.port = v;
        }
        if let Some(v) = self.logging.level {
            cfg.logging.level = v;
        }
        if let Some(v) = self.logging.file {
            cfg.logging.file = Some(v);
        }
        if let Some(v) = self.wander.distance_threshold {
            cfg.wander.distance_threshold = v;
        }
        if let Some(v) = self.wander.drive_speed {
            cfg.wander.drive_speed = v;
        }
        if let Some(v) = self.wander.turn_speed {
            cfg.wander.turn_speed = v;
        }
        if let Some(v) = self.wander.simulate {
            cfg.wander.simulate = v;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

/// The root of the layered config tree.
pub fn config_dir() -> PathBuf {
    std::env::var("WANDER_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"))
}

/// Load the configuration for `env_name`, applying all four layers.
pub fn load(env_name: &str) -> Result<Config, WanderError> {
    let mut cfg = load_files(&config_dir(), env_name)?;
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load only the file layers (defaults + overlay) under `dir`.
/// Extracted so tests can exercise layering without touching the
/// process environment.
pub(crate) fn load_files(dir: &Path, env_name: &str) -> Result<Config, WanderError> {
    let mut cfg: Config = read_toml(&dir.join("default.toml"))?.unwrap_or_default();
    if let Some(overlay) = read_toml::<Overlay>(&dir.join(env_name).join("env.toml"))? {
        overlay.apply(&mut cfg);
    }
    Ok(cfg)
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, WanderError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| WanderError::Config(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| WanderError::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Apply `WANDER_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `WANDER_BUS_HOST` | `bus.host` |
/// | `WANDER_BUS_PORT` | `bus.port` (ignored when not a valid port) |
/// | `WANDER_LOG_LEVEL` | `logging.level` |
/// | `WANDER_LOG_FILE` | `logging.file` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("WANDER_BUS_HOST") {
        cfg.bus.host = v;
    }
    if let Ok(v) = std::env::var("WANDER_BUS_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.bus.port = port;
    }
    if let Ok(v) = std::env::var("WANDER_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Ok(v) = std::env::var("WANDER_LOG_FILE") {
        cfg.logging.file = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn builtin_defaults_when_no_files_exist() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_files(dir.path(), "dev").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.bus.host, "localhost");
        assert_eq!(cfg.bus.port, 6379);
        assert!((cfg.wander.distance_threshold - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_file_layer_overrides_builtins() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("default.toml"),
            "[bus]\nhost = \"robot.local\"\n\n[logging]\nlevel = \"warn\"\n",
        );
        let cfg = load_files(dir.path(), "dev").unwrap();
        assert_eq!(cfg.bus.host, "robot.local");
        assert_eq!(cfg.logging.level, "warn");
        // Untouched sections keep their built-in defaults.
        assert_eq!(cfg.bus.port, 6379);
    }

    #[test]
    fn environment_overlay_wins_over_default_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("default.toml"),
            "[logging]\nlevel = \"info\"\n\n[wander]\ndistance_threshold = 40.0\n",
        );
        write(
            &dir.path().join("dev").join("env.toml"),
            "[logging]\nlevel = \"debug\"\n\n[wander]\nsimulate = true\n",
        );
        let cfg = load_files(dir.path(), "dev").unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.wander.simulate);
        // Fields absent from the overlay survive from the base layer.
        assert!((cfg.wander.distance_threshold - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overlay_for_other_environment_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("prod").join("env.toml"),
            "[logging]\nlevel = \"error\"\n",
        );
        let cfg = load_files(dir.path(), "dev").unwrap();
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn malformed_default_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("default.toml"), "not valid toml [[[");
        let result = load_files(dir.path(), "dev");
        assert!(matches!(result, Err(WanderError::Config(_))));
    }

    #[test]
    fn env_override_changes_bus_host() {
        // SAFETY: tests touching env vars each use distinct variables and
        // assert only the fields those variables control.
        unsafe { std::env::set_var("WANDER_BUS_HOST", "bus.robot.local") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.bus.host, "bus.robot.local");
        unsafe { std::env::remove_var("WANDER_BUS_HOST") };
    }

    #[test]
    fn env_override_ignores_invalid_port() {
        unsafe { std::env::set_var("WANDER_BUS_PORT", "not-a-port") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.bus.port, 6379);
        unsafe { std::env::remove_var("WANDER_BUS_PORT") };
    }

    #[test]
    fn env_override_sets_log_file() {
        unsafe { std::env::set_var("WANDER_LOG_FILE", "/var/log/wander.log") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.logging.file.as_deref(), Some("/var/log/wander.log"));
        unsafe { std::env::remove_var("WANDER_LOG_FILE") };
    }
}
