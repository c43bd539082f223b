use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use tgs_config::CutoverConfig;
use tgs_runtime::lifecycle::{Cutover, wait_for_signal};
use tgs_runtime::tracing_init::init_tracing;

#[derive(Parser)]
#[command(name = "tg-switch", about = "Blue/green switchover for ELBv2 target groups")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which target groups match the filter, without changing anything
    Classify {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Move the live group's healthy targets into every candidate group
    Switch {
        #[command(flatten)]
        common: CommonArgs,
        /// Deregister the moved targets from the live group afterwards
        #[arg(long)]
        remove_source: bool,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Path to tg-switch.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Value of the `Environment` tag
    #[arg(long = "env")]
    environment: Option<String>,
    /// Value of the `Elb-Type` tag
    #[arg(long)]
    elb_type: Option<String>,
    /// Value of the `Path-Name` tag
    #[arg(long = "path")]
    path_name: Option<String>,
    /// AWS region override
    #[arg(long)]
    region: Option<String>,
}

impl CommonArgs {
    /// Load the config file (if any) and apply command-line overrides.
    /// Returns the config and the directory relative paths resolve against.
    fn resolve(self) -> Result<(CutoverConfig, PathBuf)> {
        let (mut config, base_dir) = match &self.config {
            Some(path) => {
                let path = path
                    .canonicalize()
                    .map_err(|e| anyhow::anyhow!("config path '{}': {e}", path.display()))?;
                let base_dir = path
                    .parent()
                    .map(PathBuf::from)
                    .ok_or_else(|| anyhow::anyhow!("config path has no parent directory"))?;
                (CutoverConfig::load(&path)?, base_dir)
            }
            None => (CutoverConfig::default(), std::env::current_dir()?),
        };
        config
            .filter
            .apply_overrides(self.environment, self.elb_type, self.path_name);
        if self.region.is_some() {
            config.aws.region = self.region;
        }
        config.validate()?;
        Ok((config, base_dir))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { common } => {
            let (config, base_dir) = common.resolve()?;
            let _guard = init_tracing(&config.logging, &base_dir)?;

            let cutover = Cutover::bootstrap(&config)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            let result = cutover.classify().await.map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("{}", serde_json::to_string_pretty(&result.group_names())?);
        }
        Commands::Switch {
            common,
            remove_source,
        } => {
            let (mut config, base_dir) = common.resolve()?;
            if remove_source {
                config.switchover.remove_source = true;
            }
            let _guard = init_tracing(&config.logging, &base_dir)?;

            let cutover = Cutover::bootstrap(&config)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;

            let cancel = CancellationToken::new();
            tokio::spawn(wait_for_signal(cancel.clone()));

            let report = cutover
                .run_until_cancelled(cancel)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn common(args: &[&str]) -> CommonArgs {
        let mut argv = vec!["tg-switch", "classify"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Classify { common } => common,
            Commands::Switch { .. } => unreachable!(),
        }
    }

    #[test]
    fn flags_alone_are_enough() {
        let (config, _) = common(&["--env", "prod", "--elb-type", "api", "--path", "reports"])
            .resolve()
            .unwrap();
        assert_eq!(config.filter.require().unwrap(), ("prod", "api", "reports"));
        assert_eq!(config.aws.region, None);
    }

    #[test]
    fn flags_override_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tg-switch.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[filter]\nenvironment = \"staging\"\nelb_type = \"api\"\npath_name = \"reports\"\n\n[aws]\nregion = \"eu-west-1\""
        )
        .unwrap();

        let (config, base_dir) = common(&[
            "--config",
            path.to_str().unwrap(),
            "--env",
            "prod",
            "--region",
            "us-west-2",
        ])
        .resolve()
        .unwrap();

        assert_eq!(config.filter.require().unwrap(), ("prod", "api", "reports"));
        assert_eq!(config.aws.region.as_deref(), Some("us-west-2"));
        assert_eq!(base_dir, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn blank_region_flag_is_rejected() {
        let err = common(&["--env", "prod", "--region", " "]).resolve().err().unwrap();
        assert!(err.to_string().contains("aws.region"), "{err}");
    }

    #[test]
    fn switch_accepts_remove_source() {
        let cli = Cli::try_parse_from(["tg-switch", "switch", "--env", "prod", "--remove-source"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Switch {
                remove_source: true,
                ..
            }
        ));
    }
}
