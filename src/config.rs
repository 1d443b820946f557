use crate::services::pagination::DEFAULT_PAGE_SIZE;
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::env::{self, VarError};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATABASE_URL: &str = "sqlite://./data/tasks.db";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub page_size: u32,
}

/// What the binary was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Serve,
    Migrate,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Task management REST API")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Host to bind to (overrides TASK_API_HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind to (overrides TASK_API_PORT)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Database URL (overrides TASK_API_DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Rows per page on list endpoints (overrides TASK_API_PAGE_SIZE)
    #[arg(long, global = true)]
    pub page_size: Option<u32>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Bind address as `host:port` or just `port`
        bind: Option<String>,
    },
    /// Apply the database schema and exit
    Migrate,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and mode.
    pub fn from_env_and_args() -> Result<(Self, Mode)> {
        Self::resolve(Args::parse(), |key| env::var(key))
    }

    /// Merge parsed `args` over values read through `var`.
    ///
    /// Precedence: positional bind address, then flags, then environment,
    /// then defaults.
    pub fn resolve(
        args: Args,
        var: impl Fn(&str) -> Result<String, VarError>,
    ) -> Result<(Self, Mode)> {
        // --- Environment fallback ---
        let env_host = read_var(&var, "TASK_API_HOST")?.unwrap_or_else(|| DEFAULT_HOST.into());
        let env_port = parse_var(&var, "TASK_API_PORT")?.unwrap_or(DEFAULT_PORT);
        let env_db = read_var(&var, "TASK_API_DATABASE_URL")?
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let env_page_size = parse_var(&var, "TASK_API_PAGE_SIZE")?.unwrap_or(DEFAULT_PAGE_SIZE);

        // --- Merge ---
        let mut cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            page_size: args.page_size.unwrap_or(env_page_size),
        };
        if cfg.page_size == 0 {
            bail!("page size must be at least 1");
        }

        let mode = match args.command {
            None => Mode::Serve,
            Some(Command::Migrate) => Mode::Migrate,
            Some(Command::Serve { bind }) => {
                if let Some(bind) = bind {
                    let (host, port) = parse_bind(&bind)?;
                    if let Some(host) = host {
                        cfg.host = host;
                    }
                    cfg.port = port;
                }
                Mode::Serve
            }
        };

        Ok((cfg, mode))
    }

    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn read_var(
    var: &impl Fn(&str) -> Result<String, VarError>,
    key: &str,
) -> Result<Option<String>> {
    match var(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Result<String, VarError>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    read_var(var, key)?
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("parsing {} value `{}`", key, value))
        })
        .transpose()
}

/// Split `host:port`, `[v6]:port` or a bare `port`.
fn parse_bind(bind: &str) -> Result<(Option<String>, u16)> {
    let Some((host, port)) = bind.rsplit_once(':') else {
        let port = bind
            .parse::<u16>()
            .with_context(|| format!("parsing bind address `{}`", bind))?;
        return Ok((None, port));
    };
    let port = port
        .parse::<u16>()
        .with_context(|| format!("parsing port in bind address `{}`", bind))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        bail!("bind address `{}` has an empty host", bind);
    }
    Ok((Some(host.to_string()), port))
}
