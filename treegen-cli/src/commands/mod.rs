//! Command implementations for the treegen CLI

use clap::Args;
use treegen_core::ClientConfig;

pub mod serve;
pub mod watch;

pub use serve::run_serve;
pub use watch::run_watch;

/// Connection overrides shared by `watch` and `tui`
#[derive(Args, Debug, Clone, Default)]
pub struct ClientArgs {
    /// Relay server base URL (default: http://localhost:5000)
    #[arg(long, env = "TREEGEN_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Number of images to collect before closing the stream (default: 5)
    #[arg(long, value_name = "N", value_parser = parse_limit)]
    pub limit: Option<usize>,
}

impl ClientArgs {
    /// Config values with command-line overrides applied
    pub fn apply(&self, config: &ClientConfig) -> ClientConfig {
        let mut config = config.clone();
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(limit) = self.limit {
            config.image_limit = limit;
        }
        config
    }
}

fn parse_limit(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("limit must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
