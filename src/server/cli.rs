//! Command-line interface and layered configuration for the picows server.
//!
//! Settings are merged from built-in defaults, `.picows.toml` in the working
//! directory, `PICOWS_*` environment variables and finally command-line
//! flags, each layer overriding the previous one.

use std::{ffi::OsString, path::PathBuf, time::Duration};

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    connection::ConnectionConfig,
    handshake::HandshakeOptions,
    protocol::{
        DEFAULT_SESSION_COOKIE,
        DEFAULT_SESSION_PREFIX,
        ENGINE_NAME,
        HANDSHAKE_TIMEOUT,
        WRITE_TIMEOUT,
        default_session_save_path,
    },
    session::SessionSettings,
};

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".picows.toml";

/// Prefix of environment variables that override configuration.
pub const ENV_PREFIX: &str = "PICOWS_";

/// Errors raised while assembling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line arguments were rejected.
    #[error(transparent)]
    Cli(#[from] clap::Error),
    /// A configuration layer could not be merged.
    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),
}

/// Runtime configuration for the server binary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Server bind address.
    pub bind: String,
    /// Cookie carrying the session id.
    pub session_cookie_name: String,
    /// Directory holding session files.
    pub session_save_path: PathBuf,
    /// Prefix of session file names.
    pub session_file_prefix: String,
    /// Name advertised in `X-Engine`.
    pub engine_name: String,
    /// Deadline for reading the upgrade request and writing the reply.
    pub handshake_timeout_ms: u64,
    /// Deadline for each outbound frame.
    pub write_timeout_ms: u64,
    /// Text message sent to every newly established connection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_owned(),
            session_cookie_name: DEFAULT_SESSION_COOKIE.to_owned(),
            session_save_path: default_session_save_path(),
            session_file_prefix: DEFAULT_SESSION_PREFIX.to_owned(),
            engine_name: ENGINE_NAME.to_owned(),
            handshake_timeout_ms: millis(HANDSHAKE_TIMEOUT),
            write_timeout_ms: millis(WRITE_TIMEOUT),
            greeting: None,
        }
    }
}

fn millis(duration: Duration) -> u64 { u64::try_from(duration.as_millis()).unwrap_or(u64::MAX) }

impl AppConfig {
    /// Merge all configuration layers using the process arguments.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if arguments are invalid or a layer fails to
    /// parse.
    pub fn load() -> Result<Self, ConfigError> { Self::load_from_iter(std::env::args_os()) }

    /// Merge all configuration layers using `args` as the command line.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if arguments are invalid or a layer fails to
    /// parse.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        Self::merge(&cli)
    }

    /// Merge defaults, file and environment with already parsed flags.
    ///
    /// # Errors
    /// Returns [`ConfigError::Figment`] if a layer fails to parse.
    pub fn merge(cli: &Cli) -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(cli))
            .extract()
            .map_err(|e| ConfigError::Figment(Box::new(e)))
    }

    /// Per-connection settings derived from this configuration.
    #[must_use]
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            session: SessionSettings {
                cookie_name: self.session_cookie_name.clone(),
                save_path: self.session_save_path.clone(),
                file_prefix: self.session_file_prefix.clone(),
            },
            handshake: HandshakeOptions {
                engine_name: self.engine_name.clone(),
                timeout: Duration::from_millis(self.handshake_timeout_ms),
            },
            write_timeout: Duration::from_millis(self.write_timeout_ms),
        }
    }
}

/// Command-line flags; every flag overrides the matching config key.
#[derive(Parser, Serialize, Debug, Default, Clone)]
#[command(author, version, about)]
pub struct Cli {
    /// Server bind address.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// Cookie carrying the session id.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cookie_name: Option<String>,
    /// Directory holding session files.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_save_path: Option<PathBuf>,
    /// Prefix of session file names.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_file_prefix: Option<String>,
    /// Name advertised in `X-Engine`.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_name: Option<String>,
    /// Handshake deadline in milliseconds.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handshake_timeout_ms: Option<u64>,
    /// Outbound frame deadline in milliseconds.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_timeout_ms: Option<u64>,
    /// Text message sent to every newly established connection.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}
