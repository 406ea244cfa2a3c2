//! HTTP relay server command
//!
//! Runs the generator on each `/run-main` request and serves the rendered images.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use treegen_core::ServerSettings;
use treegen_server::{run_server, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:5000)
    #[arg(long, short = 'b', env = "TREEGEN_BIND")]
    pub bind: Option<SocketAddr>,

    /// Directory rendered images are served from (default: ./pics)
    #[arg(long, value_name = "DIR")]
    pub pics_dir: Option<PathBuf>,

    /// Allow all origins (true) or only localhost origins (false)
    #[arg(long, value_name = "BOOL")]
    pub cors_permissive: Option<bool>,

    /// Working directory for the generator process
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Generator command and arguments (default: python main.py)
    #[arg(last = true, value_name = "CMD")]
    pub command: Vec<String>,
}

impl ServeArgs {
    /// Config values with command-line overrides applied
    fn apply(&self, settings: &ServerSettings) -> ServerSettings {
        let mut settings = settings.clone();
        if let Some(bind) = self.bind {
            settings.bind = bind;
        }
        if let Some(dir) = &self.pics_dir {
            settings.pics_dir = dir.clone();
        }
        if let Some(permissive) = self.cors_permissive {
            settings.cors_permissive = permissive;
        }
        if let Some(dir) = &self.workdir {
            settings.workdir = Some(dir.clone());
        }
        if !self.command.is_empty() {
            settings.generator = self.command.clone();
        }
        settings
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, settings: &ServerSettings) -> Result<()> {
    let config = ServerConfig::from(&args.apply(settings));

    tracing::info!("Starting treegen relay on {}", config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(config).await.context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_settings() {
        let args = ServeArgs {
            bind: Some("0.0.0.0:8080".parse().unwrap()),
            cors_permissive: Some(false),
            command: vec!["python3".into(), "forest.py".into()],
            ..ServeArgs::default()
        };
        let settings = args.apply(&ServerSettings::default());

        assert_eq!(settings.bind.port(), 8080);
        assert!(!settings.cors_permissive);
        assert_eq!(settings.generator, ["python3", "forest.py"]);
        assert_eq!(settings.pics_dir, PathBuf::from("pics"));
    }

    #[test]
    fn empty_command_keeps_configured_generator() {
        let settings = ServeArgs::default().apply(&ServerSettings::default());
        assert_eq!(settings, ServerSettings::default());
    }
}
