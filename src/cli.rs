use std::path::PathBuf;

use clap::Parser;

use crate::config::ClientConfig;
use crate::logging::LogLevel;

/// Terminal client for the multiplayer roguelike.
#[derive(Parser, Debug)]
#[command(name = "mprl", version, about)]
pub struct Cli {
    /// Server address, `host:port` (or a full ws:// URL).
    #[arg(long)]
    pub host: Option<String>,

    /// WebSocket path on the server.
    #[arg(long)]
    pub path: Option<String>,

    /// Display name sent when joining.
    #[arg(long)]
    pub name: Option<String>,

    /// Read settings from this file instead of searching for config.toml.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Log to this file; an empty name logs to stderr.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<String>,

    /// Draw walls as `#` instead of box-drawing junctions.
    #[arg(long)]
    pub no_autotile: bool,
}

impl Cli {
    /// Flags given on the command line win over the file.
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(path) = &self.path {
            config.server.path = path.clone();
        }
        if let Some(name) = &self.name {
            config.server.name = name.clone();
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }
        if let Some(file) = &self.log_file {
            config.log.file = (!file.trim().is_empty()).then(|| PathBuf::from(file));
        }
        if self.no_autotile {
            config.display.autotile = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "mprl", "--host", "example.org:9000", "--name", "bob", "--log-level", "debug", "--no-autotile",
        ]);
        let mut cfg = ClientConfig::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.server.host, "example.org:9000");
        assert_eq!(cfg.server.path, "/server/");
        assert_eq!(cfg.server.name, "bob");
        assert_eq!(cfg.log.level, LogLevel::Debug);
        assert!(!cfg.display.autotile);
    }

    #[test]
    fn empty_log_file_means_stderr() {
        let mut cfg = ClientConfig::default();
        Cli::parse_from(["mprl", "--log-file", ""]).apply(&mut cfg);
        assert_eq!(cfg.log.file, None);

        Cli::parse_from(["mprl", "--log-file", "other.log"]).apply(&mut cfg);
        assert_eq!(cfg.log.file, Some(PathBuf::from("other.log")));
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let mut cfg = ClientConfig::default();
        Cli::parse_from(["mprl"]).apply(&mut cfg);
        assert_eq!(cfg.server, ClientConfig::default().server);
        assert!(cfg.display.autotile);
    }
}
