pub mod commands;
pub mod config;
pub mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use minimap_state::Roster;
use std::path::PathBuf;

use config::ScoutConfig;
use pipeline::Scout;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "minimap_scout=debug,minimap_vision=info,map_semantics=info";

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();
}

/// Command line of the `minimap-scout` binary.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "minimap-scout", version, about = "Locate champions on a minimap crop")]
pub struct CliArgs {
    /// Minimap crop to analyze
    pub minimap: PathBuf,

    /// Ally champions, comma separated
    #[arg(long, value_delimiter = ',')]
    pub allies: Vec<String>,

    /// Enemy champions, comma separated
    #[arg(long, value_delimiter = ',')]
    pub enemies: Vec<String>,

    /// Directory holding `icons/` and `map_regions.json`
    #[arg(long = "data", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    pub fn roster(&self) -> Roster {
        Roster::new(trimmed(&self.allies), trimmed(&self.enemies))
    }
}

fn trimmed(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Entry point of the `minimap-scout` binary. `args` includes the program
/// name.
pub async fn run<I: IntoIterator<Item = String>>(args: I) -> Result<()> {
    let cli = match CliArgs::try_parse_from(args) {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => {
            e.print()?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let roster = cli.roster();
    let mut config = ScoutConfig::load_or_default(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    tracing::info!("Data directory: {}", config.data_dir.display());

    let scout = Scout::new(config)?;
    let report = scout
        .locate_with_timeout(cli.minimap.clone(), roster)
        .await?
        .with_context(|| format!("Detection timed out for {}", cli.minimap.display()))?;

    println!("{}", serde_json::to_string_pretty(&commands::report_json(&report))?);
    println!();
    println!("{}", report.summary());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    fn parse(list: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("minimap-scout").chain(list.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_full_command_line() {
        let cli = parse(&[
            "map.png", "--allies", "Ahri, Garen", "--enemies", "Zed", "--data", "/tmp/d", "--config", "c.json",
        ])
        .unwrap();
        assert_eq!(cli.minimap, PathBuf::from("map.png"));
        assert_eq!(cli.enemies, vec!["Zed"]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/d")));
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));

        let roster = cli.roster();
        assert_eq!(roster.allies(), ["Ahri".to_string(), "Garen".to_string()]);
    }

    #[test]
    fn test_parse_equals_syntax() {
        let cli = parse(&["map.png", "--allies=Ahri,Garen", "--enemies=Zed"]).unwrap();
        assert_eq!(cli.allies, vec!["Ahri", "Garen"]);
        assert_eq!(cli.enemies, vec!["Zed"]);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            parse(&["--allies", "Ahri"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert!(parse(&["map.png", "--allies"]).is_err());
        assert_eq!(
            parse(&["map.png", "--verbose"]).unwrap_err().kind(),
            ErrorKind::UnknownArgument
        );
        assert!(parse(&["a.png", "b.png"]).is_err());
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }

    #[test]
    fn test_parse_minimal() {
        let cli = parse(&["map.png"]).unwrap();
        assert!(cli.allies.is_empty() && cli.enemies.is_empty());
        assert!(cli.data_dir.is_none());
        assert!(cli.roster().is_empty());
    }

    #[test]
    fn test_bundled_regions_load() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("data")
            .join(minimap_vision::REGIONS_FILE);
        let annotations = map_semantics::MapAnnotations::load(&path).unwrap();
        let base = map_semantics::CanonicalPoint::new(50.0, 460.0);
        assert_eq!(annotations.describe(base, 3), "inside blue base");
    }
}
