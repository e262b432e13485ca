/// External configuration loader.
///
/// Reads `config.toml` from an explicit path, or else from the executable's
/// directory or the CWD. Missing files and missing keys fall back to
/// defaults; command-line flags are applied on top by `cli`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::logging::{LogConfig, LogLevel};

const CONFIG_FILE: &str = "config.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub display: DisplayConfig,
    pub gate_turns: bool,
    /// Binding group name → key names. Only listed groups are overridden.
    pub keys: HashMap<String, Vec<String>>,
    pub gamepad: GamepadConfig,
    pub sound_enabled: bool,
    pub log: LogConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub path: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    pub autotile: bool,
    pub glyph_columns: u32,
    pub panel_width: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GamepadConfig {
    pub wait: Vec<String>,
    pub focus_game: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    server: TomlServer,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    input: TomlInput,
    #[serde(default)]
    keys: HashMap<String, Vec<String>>,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    sound: TomlSound,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlServer {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_path")]
    path: String,
    #[serde(default = "default_name")]
    name: String,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_true")]
    autotile: bool,
    #[serde(default = "default_glyph_columns")]
    glyph_columns: u32,
    #[serde(default = "default_panel_width")]
    panel_width: usize,
}

#[derive(Deserialize, Debug)]
struct TomlInput {
    #[serde(default = "default_true")]
    gate_turns: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_wait_buttons")]
    wait: Vec<String>,
    #[serde(default = "default_focus_buttons")]
    focus_game: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_true")]
    enabled: bool,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default)]
    level: LogLevel,
    #[serde(default = "default_log_file")]
    file: String,
}

// ── Defaults ──

fn default_host() -> String { "127.0.0.1:8000".into() }
fn default_path() -> String { "/server/".into() }
fn default_name() -> String { "player".into() }
fn default_true() -> bool { true }
fn default_glyph_columns() -> u32 { 2 }
fn default_panel_width() -> usize { 32 }
fn default_wait_buttons() -> Vec<String> { vec!["A".into()] }
fn default_focus_buttons() -> Vec<String> { vec!["Start".into()] }
fn default_log_file() -> String { "mprl.log".into() }

impl Default for TomlServer {
    fn default() -> Self {
        TomlServer { host: default_host(), path: default_path(), name: default_name() }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay {
            autotile: true,
            glyph_columns: default_glyph_columns(),
            panel_width: default_panel_width(),
        }
    }
}

impl Default for TomlInput {
    fn default() -> Self {
        TomlInput { gate_turns: true }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad { wait: default_wait_buttons(), focus_game: default_focus_buttons() }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound { enabled: true }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog { level: LogLevel::default(), file: default_log_file() }
    }
}

impl From<TomlConfig> for ClientConfig {
    fn from(cfg: TomlConfig) -> Self {
        // An empty file name turns the log file off.
        let file = (!cfg.log.file.trim().is_empty()).then(|| PathBuf::from(cfg.log.file));
        ClientConfig {
            server: ServerConfig {
                host: cfg.server.host,
                path: cfg.server.path,
                name: cfg.server.name,
            },
            display: DisplayConfig {
                autotile: cfg.display.autotile,
                glyph_columns: cfg.display.glyph_columns.max(1),
                panel_width: cfg.display.panel_width,
            },
            gate_turns: cfg.input.gate_turns,
            keys: cfg.keys,
            gamepad: GamepadConfig {
                wait: cfg.gamepad.wait,
                focus_game: cfg.gamepad.focus_game,
            },
            sound_enabled: cfg.sound.enabled,
            log: LogConfig { level: cfg.log.level, file },
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

impl ClientConfig {
    /// Load from `explicit` if given (any failure is an error), otherwise
    /// search the exe directory and then the CWD for `config.toml`.
    ///
    /// Runs before logging is up, so problems in a searched file are
    /// printed to stderr and also returned as warnings for the log.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Vec<String>), ConfigError> {
        if let Some(path) = explicit {
            let text = std::fs::read_to_string(path)
                .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
            let cfg = Self::parse(&text)
                .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
            return Ok((cfg, Vec::new()));
        }

        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&candidate_dirs(), &mut warnings);
        Ok((toml_cfg.into(), warnings))
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(Into::into)
    }
}

/// Exe dir + CWD, deduplicated.
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// First readable `config.toml` wins. A parse error stops the search and
/// yields defaults.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    let msg = format!("{} parse error, using defaults: {e}", path.display());
                    eprintln!("Warning: {msg}");
                    warnings.push(msg);
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                let msg = format!("could not read {}: {e}", path.display());
                eprintln!("Warning: {msg}");
                warnings.push(msg);
            }
        }
    }
    TomlConfig::default()
}

/// Log the warnings collected while loading, once logging is up.
pub fn report(warnings: &[String]) {
    for w in warnings {
        warn!("{w}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = ClientConfig::parse("").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1:8000");
        assert_eq!(cfg.server.path, "/server/");
        assert!(cfg.display.autotile);
        assert_eq!(cfg.display.glyph_columns, 2);
        assert!(cfg.gate_turns);
        assert!(cfg.sound_enabled);
        assert!(cfg.keys.is_empty());
        assert_eq!(cfg.log.level, LogLevel::Info);
        assert_eq!(cfg.log.file, Some(PathBuf::from("mprl.log")));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = ClientConfig::parse(
            r#"
            [server]
            name = "ann"

            [display]
            autotile = false

            [keys]
            west = ["a", "left"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.name, "ann");
        assert_eq!(cfg.server.host, "127.0.0.1:8000");
        assert!(!cfg.display.autotile);
        assert_eq!(cfg.display.panel_width, 32);
        assert_eq!(cfg.keys["west"], vec!["a".to_string(), "left".to_string()]);
    }

    #[test]
    fn zero_glyph_columns_is_clamped() {
        let cfg = ClientConfig::parse("[display]\nglyph_columns = 0").unwrap();
        assert_eq!(cfg.display.glyph_columns, 1);
    }

    #[test]
    fn empty_log_file_disables_file_logging() {
        let cfg = ClientConfig::parse("[log]\nfile = \"\"\nlevel = \"trace\"").unwrap();
        assert_eq!(cfg.log.file, None);
        assert_eq!(cfg.log.level, LogLevel::Trace);
    }

    #[test]
    fn bad_types_are_errors() {
        assert!(ClientConfig::parse("[input]\ngate_turns = \"yes\"").is_err());
    }

    #[test]
    fn explicit_missing_file_is_fatal() {
        let err = ClientConfig::load(Some(Path::new("/nonexistent/mprl.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn searched_parse_error_falls_back() {
        let dir = std::env::temp_dir().join(format!("mprl-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE), "[server\nhost=").unwrap();

        let mut warnings = Vec::new();
        let cfg: ClientConfig = load_toml(&[dir.clone()], &mut warnings).into();
        assert_eq!(cfg.server.host, "127.0.0.1:8000");
        assert_eq!(warnings.len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
