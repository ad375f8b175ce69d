use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use emf_config::Config;

/// emf error catalog service
#[derive(Debug, Parser)]
#[command(name = "emf", about = "Serves the merged error taxonomy of an emf service")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "emf.toml", env = "EMF_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "EMF_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Answer every request with full error details
    #[arg(long, env = "EMF_DEBUG_MODE")]
    pub debug_mode: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded file
    pub fn apply(&self, config: &mut Config) {
        if let Some(listen) = self.listen {
            config.server.listen_address = Some(listen);
        }
        config.server.debug_mode |= self.debug_mode;
    }
}
