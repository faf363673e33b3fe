use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// `+` includes a component, `-` excludes it; an omitted flag keeps the
/// default (size on, everything else off).
fn parse_toggle(value: &str) -> Result<bool, String> {
    match value {
        "+" => Ok(true),
        "-" => Ok(false),
        other => Err(format!("expected '+' or '-', got '{other}'")),
    }
}

#[derive(Debug, Parser)]
#[command(name = "dupehound")]
#[command(about = "Find duplicate files using a persistent, incremental index", long_about = None)]
pub struct Cli {
    /// Root directory to scan
    pub path: PathBuf,

    /// Toggle the sampled content fingerprint component
    #[arg(long, value_parser = parse_toggle, allow_hyphen_values = true, value_name = "+/-")]
    pub content: Option<bool>,

    /// Toggle the file-size component
    #[arg(long, value_parser = parse_toggle, allow_hyphen_values = true, value_name = "+/-")]
    pub size: Option<bool>,

    /// Toggle the modification-time component
    #[arg(long, value_parser = parse_toggle, allow_hyphen_values = true, value_name = "+/-")]
    pub mtime: Option<bool>,

    /// Toggle the creation-time component
    #[arg(long, value_parser = parse_toggle, allow_hyphen_values = true, value_name = "+/-")]
    pub ctime: Option<bool>,

    /// Toggle the case-folded file-name component
    #[arg(long, value_parser = parse_toggle, allow_hyphen_values = true, value_name = "+/-")]
    pub name: Option<bool>,

    /// Worker thread count (default: number of CPUs)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Index database path
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Ignore the cache and treat every path as new
    #[arg(long)]
    pub full_scan: bool,

    /// Glob pattern to skip (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Print groups instead of prompting interactively
    #[arg(long, value_name = "FORMAT")]
    pub report: Option<ReportFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dupehound_core::HashComponents;

    fn mask_from(cli: &Cli) -> HashComponents {
        let mut mask = HashComponents::default();
        if let Some(on) = cli.content {
            mask.set(HashComponents::CONTENT, on);
        }
        if let Some(on) = cli.size {
            mask.set(HashComponents::SIZE, on);
        }
        if let Some(on) = cli.mtime {
            mask.set(HashComponents::MODIFIED, on);
        }
        if let Some(on) = cli.ctime {
            mask.set(HashComponents::CREATED, on);
        }
        if let Some(on) = cli.name {
            mask.set(HashComponents::FILE_NAME, on);
        }
        mask
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["dupehound", "/tmp"]);
        assert_eq!(mask_from(&cli).bits(), HashComponents::SIZE.bits());
        assert!(!cli.full_scan);
        assert!(cli.db.is_none());
        assert!(cli.report.is_none());
    }

    #[test]
    fn test_component_toggles() {
        let cli = Cli::parse_from([
            "dupehound", "/tmp", "--content", "+", "--size", "-", "--name", "+",
        ]);
        let mask = mask_from(&cli);
        assert!(mask.contains(HashComponents::CONTENT));
        assert!(mask.contains(HashComponents::FILE_NAME));
        assert!(!mask.contains(HashComponents::SIZE));
    }

    #[test]
    fn test_bad_toggle_rejected() {
        assert!(Cli::try_parse_from(["dupehound", "/tmp", "--content", "yes"]).is_err());
    }

    #[test]
    fn test_full_surface() {
        let cli = Cli::parse_from([
            "dupehound",
            "/data",
            "--mtime",
            "+",
            "--ctime",
            "+",
            "--workers",
            "4",
            "--db",
            "/tmp/idx.db",
            "--full-scan",
            "--ignore",
            "*.log",
            "--ignore",
            "**/target",
        ]);
        assert_eq!(cli.workers, Some(4));
        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("/tmp/idx.db")));
        assert!(cli.full_scan);
        assert_eq!(cli.ignore.len(), 2);
        let mask = mask_from(&cli);
        assert!(mask.contains(HashComponents::MODIFIED));
        assert!(mask.contains(HashComponents::CREATED));
        assert!(mask.contains(HashComponents::SIZE));
    }
}
