//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Startup configuration: the per-symbol tick/lot table and process settings
// (listen address, event buffer size), loaded from a TOML file whose path is
// given on the command line.
//
// | Component | Description                                                      |
// |-----------|--------------------------------------------------------------------|
// | Cli       | clap-derived command-line arguments                                |
// | FileConfig| serde-deserialized shape of the TOML config file                   |
//--------------------------------------------------------------------------------------------------

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::models::types::SymbolConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Limit-order matching engine server")]
pub struct Cli {
    /// Path to the TOML symbol/tick/lot configuration file.
    #[arg(long)]
    pub config: PathBuf,

    /// Address the HTTP/WebSocket server binds to.
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,
}

#[derive(Debug, Deserialize)]
struct SymbolEntry {
    symbol: String,
    tick_size: Decimal,
    lot_size: Decimal,
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default = "default_event_buffer")]
    event_buffer: usize,
    symbols: Vec<SymbolEntry>,
}

fn default_event_buffer() -> usize {
    4096
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config declares no symbols; at least one is required")]
    NoSymbols,
}

/// The engine's fully resolved startup configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub symbols: Vec<SymbolConfig>,
    pub event_buffer: usize,
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if file.symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        let symbols = file
            .symbols
            .into_iter()
            .map(|s| SymbolConfig {
                symbol: s.symbol,
                tick_size: s.tick_size,
                lot_size: s.lot_size,
            })
            .collect();
        Ok(Self {
            symbols,
            event_buffer: file.event_buffer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_symbols_and_defaults_event_buffer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [[symbols]]
            symbol = "BTC-USD"
            tick_size = "0.01"
            lot_size = "0.0001"

            [[symbols]]
            symbol = "ETH-USD"
            tick_size = "0.01"
            lot_size = "0.001"
            "#
        )
        .unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.symbols.len(), 2);
        assert_eq!(config.event_buffer, 4096);
    }

    #[test]
    fn explicit_event_buffer_overrides_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            event_buffer = 256

            [[symbols]]
            symbol = "BTC-USD"
            tick_size = "0.01"
            lot_size = "0.0001"
            "#
        )
        .unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.event_buffer, 256);
    }

    #[test]
    fn empty_symbol_table_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "symbols = []").unwrap();
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigError::NoSymbols)
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            EngineConfig::load("/nonexistent/path.toml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
