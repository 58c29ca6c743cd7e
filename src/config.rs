#![cfg(feature = "web")]

use crate::loader::{DEFAULT_DATA_URL, DataSource, LoadError};
use clap::Parser;
use reqwest::Url;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Command-line and environment configuration of the dashboard server.
#[derive(Parser, Debug, Clone)]
#[command(name = "dashboard", about = "Student enrollment dashboard")]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "DASHBOARD_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Where to load the dataset from: an http(s) URL, a path on this
    /// server (leading `/`), or a local file
    #[arg(long, env = "DASHBOARD_DATA_URL", default_value = DEFAULT_DATA_URL)]
    pub data_url: String,

    /// Directory served as static files; the default data URL points into it
    #[arg(long, env = "DASHBOARD_PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,
}

impl Config {
    /// Base URL of this server once it listens on `local`, used to resolve
    /// relative data URLs.
    pub fn base_url(local: SocketAddr) -> Result<Url, LoadError> {
        let addr = match local.ip() {
            ip if ip.is_unspecified() => SocketAddr::from(([127, 0, 0, 1], local.port())),
            _ => local,
        };
        Url::parse(&format!("http://{}", addr))
            .map_err(|e| LoadError::InvalidLocation(format!("{}: {}", addr, e)))
    }

    pub fn data_source(&self, local: SocketAddr) -> Result<DataSource, LoadError> {
        DataSource::resolve(&self.data_url, &Self::base_url(local)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_url: DEFAULT_DATA_URL.to_string(),
            public_dir: PathBuf::from("public"),
        }
    }
}
