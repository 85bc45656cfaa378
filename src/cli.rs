//! Command-line interface definitions.
//!
//! Secrets can come from the environment instead of flags.

use crate::outputs::dashboard::Sections;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for dew_analytics.
///
/// # Examples
///
/// ```sh
/// # Scrape editions, write domain.json and the n-gram keyword files
/// dew_analytics keywords
///
/// # Pull Bitly click metrics (token from BITLY_ACCESS_TOKEN)
/// dew_analytics clicks
///
/// # Render every dashboard section and print it
/// dew_analytics -d ./data dashboard --geography --top-links --keywords --domains --print
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory for the data files (country.csv in, JSON and dashboard out)
    #[arg(short, long, global = true, env = "DEW_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Optional path to an analysis config YAML file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape the newsletter editions and write domain and n-gram keyword statistics
    Keywords,

    /// Pull click metrics from Bitly and write country and top link statistics
    Clicks {
        /// Bitly personal access token
        #[arg(long, env = "BITLY_ACCESS_TOKEN", hide_env_values = true)]
        bitly_token: String,

        /// Country code CSV (defaults to `<data-dir>/country.csv`)
        #[arg(long)]
        country_csv: Option<PathBuf>,
    },

    /// Render the dashboard from the data files
    Dashboard(DashboardArgs),
}

#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Geography distribution of readers (the default when no section is chosen)
    #[arg(long)]
    pub geography: bool,

    /// Top 3 links per edition
    #[arg(long)]
    pub top_links: bool,

    /// Top keywords of every configured n-gram run
    #[arg(long)]
    pub keywords: bool,

    /// Most linked domains
    #[arg(long)]
    pub domains: bool,

    /// Rows per keyword and domain table
    #[arg(long, default_value_t = 25)]
    pub limit: usize,

    /// Also print the dashboard to stdout
    #[arg(long)]
    pub print: bool,
}

impl DashboardArgs {
    /// Selected sections; geography alone when none was chosen.
    pub fn sections(&self) -> Sections {
        let sections = Sections {
            geography: self.geography,
            top_links: self.top_links,
            keywords: self.keywords,
            domains: self.domains,
        };
        if sections.geography || sections.top_links || sections.keywords || sections.domains {
            sections
        } else {
            Sections::geography_only()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["dew_analytics", "--data-dir", "./out", "keywords"]);
        assert_eq!(cli.data_dir, PathBuf::from("./out"));
        assert!(cli.config.is_none());
        assert!(matches!(cli.command, Command::Keywords));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["dew_analytics", "keywords", "-c", "analysis.yaml", "-d", "/tmp/dew"]);
        assert_eq!(cli.config, Some(PathBuf::from("analysis.yaml")));
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/dew"));
    }

    #[test]
    fn test_clicks_token_flag() {
        let cli = Cli::parse_from(["dew_analytics", "clicks", "--bitly-token", "secret"]);
        match cli.command {
            Command::Clicks {
                bitly_token,
                country_csv,
            } => {
                assert_eq!(bitly_token, "secret");
                assert!(country_csv.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_dashboard_defaults_to_geography() {
        let cli = Cli::parse_from(["dew_analytics", "dashboard"]);
        let Command::Dashboard(args) = cli.command else {
            panic!("expected dashboard");
        };
        assert_eq!(args.sections(), Sections::geography_only());
        assert_eq!(args.limit, 25);
    }

    #[test]
    fn test_dashboard_sections() {
        let cli = Cli::parse_from(["dew_analytics", "dashboard", "--top-links", "--keywords", "--limit", "5"]);
        let Command::Dashboard(args) = cli.command else {
            panic!("expected dashboard");
        };
        let sections = args.sections();
        assert!(!sections.geography);
        assert!(sections.top_links);
        assert!(sections.keywords);
        assert_eq!(args.limit, 5);
    }
}
