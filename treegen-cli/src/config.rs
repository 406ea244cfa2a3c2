use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use treegen_core::config::LOCAL_CONFIG_FILE;
use treegen_core::GalleryConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show config file paths
    Path,
    /// Print the effective configuration as TOML
    Show,
    /// Write a default config file
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,

    /// Write ./treegen.toml instead of ~/.treegen/config.toml
    #[arg(long)]
    pub local: bool,
}

pub fn run_config(args: ConfigArgs, effective: &GalleryConfig) -> Result<()> {
    match args.command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(effective),
        ConfigCommands::Init(args) => run_init(args),
    }
}

fn run_path() -> Result<()> {
    let global = GalleryConfig::global_path()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?;

    println!("global: {}{}", global.display(), presence(&global));
    let local = Path::new(LOCAL_CONFIG_FILE);
    println!("local:  {}{}", local.display(), presence(local));

    Ok(())
}

fn presence(path: &Path) -> &'static str {
    if path.exists() {
        ""
    } else {
        " (not found)"
    }
}

fn run_show(effective: &GalleryConfig) -> Result<()> {
    print!("{}", effective.to_toml()?);
    Ok(())
}

fn run_init(args: InitArgs) -> Result<()> {
    let config_path = if args.local {
        PathBuf::from(LOCAL_CONFIG_FILE)
    } else {
        GalleryConfig::global_path()
            .ok_or_else(|| anyhow!("Could not determine home directory"))?
    };

    write_default(&config_path, args.force)?;

    println!("✅ Created config at: {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit the config: $EDITOR {}", config_path.display());
    println!("  2. Point client.base_url at your relay server");
    println!("  3. Run: treegen config show");

    Ok(())
}

fn write_default(config_path: &Path, force: bool) -> Result<()> {
    // Check if config already exists
    if config_path.exists() && !force {
        return Err(anyhow!(
            "Config already exists at {}\n\nUse --force to overwrite",
            config_path.display()
        ));
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = GalleryConfig::default().to_toml()?;
    std::fs::write(config_path, content)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_default(&path, false).unwrap();

        let loaded = GalleryConfig::from_path(&path).unwrap();
        assert_eq!(loaded, GalleryConfig::default());
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[client]\nimage_limit = 9\n").unwrap();

        assert!(write_default(&path, false).is_err());
        assert_eq!(GalleryConfig::from_path(&path).unwrap().client.image_limit, 9);

        write_default(&path, true).unwrap();
        assert_eq!(GalleryConfig::from_path(&path).unwrap().client.image_limit, 5);
    }
}
