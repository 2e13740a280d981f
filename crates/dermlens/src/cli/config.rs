//! The `dermlens config` command.

use std::path::Path;

use clap::{Args, Subcommand};
use dermlens_core::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Print where the config file is looked up
    Path,

    /// Write the default analysis settings to the config file
    Init {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

pub fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    let path = Config::default_path();
    match args.command {
        ConfigCommand::Show => print!("{}", render_effective(&path)?),
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Init { force } => {
            write_defaults(&path, force)?;
            tracing::info!("Wrote default config to {:?}", path);
            println!("Configuration initialized at: {}", path.display());
        }
    }
    Ok(())
}

/// Effective settings, headed by a comment naming their origin.
fn render_effective(path: &Path) -> anyhow::Result<String> {
    let (origin, config) = if path.is_file() {
        (format!("# Loaded from {}", path.display()), Config::load_from(path)?)
    } else {
        (
            format!("# No file at {}; built-in defaults", path.display()),
            Config::default(),
        )
    };
    Ok(format!("{origin}\n{}\n", config.to_toml()?))
}

fn write_defaults(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default().to_toml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        write_defaults(&path, false).unwrap();
        assert!(write_defaults(&path, false).is_err());
        write_defaults(&path, true).unwrap();

        let written = Config::load_from(&path).unwrap();
        assert_eq!(written.scoring.max_conditions, 5);
    }

    #[test]
    fn test_show_names_its_origin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let rendered = render_effective(&path).unwrap();
        assert!(rendered.starts_with("# No file at"));
        assert!(rendered.contains("[scoring]"));

        std::fs::write(&path, "[scoring]\nmax_conditions = 3\n").unwrap();
        let rendered = render_effective(&path).unwrap();
        assert!(rendered.starts_with("# Loaded from"));
        assert!(rendered.contains("max_conditions = 3"));
    }
}
