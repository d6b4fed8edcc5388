use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

mod api;
mod error;
mod logging;
mod models;
mod query;
mod render;
mod report;
mod settings;
mod shell;
mod sync;
#[cfg(test)]
mod testing;

use api::HttpStudentApi;
use query::{QueryState, QueryStateManager};
use sync::DataSynchronizer;

#[derive(Parser)]
#[command(name = "student-dashboard")]
#[command(about = "Paginated, filterable view of student records and statistics", long_about = None)]
struct Cli {
    /// Base URL of the student API (overrides config and DASHBOARD_API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct QueryArgs {
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
    /// Rows per page (defaults to the configured page size)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    page_size: Option<u32>,
    /// Match student names
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    min_gpa: Option<f64>,
    #[arg(long)]
    max_gpa: Option<f64>,
}

impl QueryArgs {
    /// Goes through the mutators so the pagination-reset rules apply the
    /// same way they do interactively: filters first, then the page.
    fn into_manager(self, default_page_size: u32) -> QueryStateManager {
        let mut manager =
            QueryStateManager::new(QueryState::with_page_size(default_page_size));
        if let Some(page_size) = self.page_size {
            manager.set_page_size(page_size);
        }
        if let Some(search) = self.search {
            manager.set_search(search);
        }
        if self.min_gpa.is_some() {
            manager.set_min_gpa(self.min_gpa);
        }
        if self.max_gpa.is_some() {
            manager.set_max_gpa(self.max_gpa);
        }
        manager.set_page(self.page);
        manager
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page and render the dashboard
    Show {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Show the aggregate statistics only
    Stats,
    /// Browse interactively, one command per line
    Browse {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Generate a markdown report for one page
    Report {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export one page of students as CSV
    Export {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, default_value = "students.csv")]
        csv: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet)?;

    let dashboard_config = settings::load(cli.api_url.as_deref())?;
    info!(api = %dashboard_config.api_base_url, "using student API");

    let api = HttpStudentApi::new(
        &dashboard_config.api_base_url,
        dashboard_config.request_timeout(),
    )
    .context("failed to build HTTP client")?;
    let sync = DataSynchronizer::new(
        api,
        dashboard_config.stale_responses,
        dashboard_config.stats_refresh,
    );

    match cli.command {
        Commands::Show { query } => {
            let manager = query.into_manager(dashboard_config.default_page_size);
            sync.refresh_all(manager.state()).await;
            println!(
                "{}",
                render::render_dashboard(manager.state(), &sync.snapshot())
            );
        }
        Commands::Stats => {
            sync.refresh_stats().await;
            match sync.snapshot().stats {
                Some(stats) => println!("{}", render::stats_table(&stats)),
                None => println!("Statistics unavailable."),
            }
        }
        Commands::Browse { query } => {
            let mut manager = query.into_manager(dashboard_config.default_page_size);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell::run(&mut manager, &sync, stdin, &mut std::io::stdout()).await?;
        }
        Commands::Report { query, out } => {
            let manager = query.into_manager(dashboard_config.default_page_size);
            sync.refresh_all(manager.state()).await;
            let report =
                report::build_report(manager.state(), &sync.snapshot(), chrono::Utc::now());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { query, csv } => {
            let manager = query.into_manager(dashboard_config.default_page_size);
            sync.refresh_all(manager.state()).await;
            let written = report::write_csv(&csv, &sync.snapshot().records)
                .with_context(|| format!("failed to write {}", csv.display()))?;
            println!("Exported {written} students to {}.", csv.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_args(args: &[&str]) -> QueryArgs {
        let mut argv = vec!["student-dashboard", "show"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Show { query } => query,
            _ => unreachable!("parsed a show command"),
        }
    }

    #[test]
    fn query_flags_build_state() {
        let manager = query_args(&["--page", "3", "--search", "lee", "--max-gpa", "3.5"])
            .into_manager(10);
        let state = manager.state();
        assert_eq!(state.page, 3);
        assert_eq!(state.page_size, 10);
        assert_eq!(state.search, "lee");
        assert_eq!(state.min_gpa, None);
        assert_eq!(state.max_gpa, Some(3.5));
    }

    #[test]
    fn page_size_defaults_from_config() {
        let manager = query_args(&[]).into_manager(25);
        assert_eq!(manager.state(), &QueryState::with_page_size(25));

        let manager = query_args(&["--page-size", "50"]).into_manager(25);
        assert_eq!(manager.state().page_size, 50);
    }

    #[test]
    fn rejects_page_zero() {
        let result = Cli::try_parse_from(["student-dashboard", "show", "--page", "0"]);
        assert!(result.is_err());
    }
}
