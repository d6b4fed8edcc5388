//! Interactive browsing: one command per line, each one mutating the query
//! state and refreshing the view.

use std::io::Write;

use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::api::StudentApi;
use crate::query::{Change, QueryStateManager};
use crate::render;
use crate::sync::DataSynchronizer;

pub const HELP: &str = "\
Commands:
  search <text>     filter by name (no text clears the search)
  min <gpa|none>    set or clear the minimum GPA
  max <gpa|none>    set or clear the maximum GPA
  page <n>          jump to page n
  size <n>          rows per page
  next | prev       move one page
  refresh           re-fetch the page and the statistics
  help              show this list
  quit              leave";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Search(String),
    MinGpa(Option<f64>),
    MaxGpa(Option<f64>),
    Page(u32),
    PageSize(u32),
    Next,
    Prev,
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ShellError {
    #[error("unknown command `{0}`, type `help` for the list")]
    UnknownCommand(String),
    #[error("`{0}` needs a value")]
    MissingArgument(&'static str),
    #[error("`{value}` is not a valid {expected}")]
    InvalidValue {
        value: String,
        expected: &'static str,
    },
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, ShellError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "search" | "s" => ShellCommand::Search(rest.to_string()),
        "min" => ShellCommand::MinGpa(parse_gpa(rest, "min")?),
        "max" => ShellCommand::MaxGpa(parse_gpa(rest, "max")?),
        "page" | "p" => ShellCommand::Page(parse_positive(rest, "page")?),
        "size" => ShellCommand::PageSize(parse_positive(rest, "size")?),
        "next" | "n" => ShellCommand::Next,
        "prev" => ShellCommand::Prev,
        "refresh" | "r" => ShellCommand::Refresh,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(ShellError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_gpa(value: &str, command: &'static str) -> Result<Option<f64>, ShellError> {
    match value {
        "" => Err(ShellError::MissingArgument(command)),
        "none" | "-" => Ok(None),
        _ => value
            .parse::<f64>()
            .ok()
            .filter(|gpa| gpa.is_finite())
            .map(Some)
            .ok_or_else(|| ShellError::InvalidValue {
                value: value.to_string(),
                expected: "GPA",
            }),
    }
}

fn parse_positive(value: &str, command: &'static str) -> Result<u32, ShellError> {
    if value.is_empty() {
        return Err(ShellError::MissingArgument(command));
    }
    value
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ShellError::InvalidValue {
            value: value.to_string(),
            expected: "positive number",
        })
}

/// How the view has to be refreshed after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Refresh(Change),
    RefreshAll,
    Stay,
}

/// Routes a command to the query state. `total_pages` of 0 means the page
/// count is unknown and `next` is not bounded.
pub fn apply_command(
    manager: &mut QueryStateManager,
    command: ShellCommand,
    total_pages: u64,
) -> Step {
    let page = manager.state().page;
    match command {
        ShellCommand::Search(text) => Step::Refresh(manager.set_search(text)),
        ShellCommand::MinGpa(value) => Step::Refresh(manager.set_min_gpa(value)),
        ShellCommand::MaxGpa(value) => Step::Refresh(manager.set_max_gpa(value)),
        ShellCommand::Page(page) => Step::Refresh(manager.set_page(page)),
        ShellCommand::PageSize(size) => Step::Refresh(manager.set_page_size(size)),
        ShellCommand::Next if total_pages == 0 || u64::from(page) < total_pages => {
            match page.checked_add(1) {
                Some(next) => Step::Refresh(manager.set_page(next)),
                None => Step::Stay,
            }
        }
        ShellCommand::Prev if page > 1 => Step::Refresh(manager.set_page(page - 1)),
        ShellCommand::Refresh => Step::RefreshAll,
        ShellCommand::Next | ShellCommand::Prev | ShellCommand::Help | ShellCommand::Quit => {
            Step::Stay
        }
    }
}

fn show<A: StudentApi, W: Write>(
    out: &mut W,
    manager: &QueryStateManager,
    sync: &DataSynchronizer<A>,
) -> std::io::Result<()> {
    writeln!(out, "{}", render::render_dashboard(manager.state(), &sync.snapshot()))
}

fn prompt<W: Write>(out: &mut W) -> std::io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}

/// Reads commands from `input` until `quit` or end of input and draws the
/// dashboard to `out`.
///
/// Refreshes run alongside the reader: the view is drawn as soon as a
/// command is dispatched (showing the loading state) and again whenever a
/// request settles, and a new command can be issued while an older one is
/// still in flight. At end of input the outstanding refreshes are awaited;
/// `quit` abandons them.
pub async fn run<'s, A, R, W>(
    manager: &mut QueryStateManager,
    sync: &'s DataSynchronizer<A>,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    A: StudentApi,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut pending: FuturesUnordered<LocalBoxFuture<'s, ()>> = FuturesUnordered::new();
    pending.push(sync.refresh_all(manager.state()).boxed_local());
    show(out, manager, sync)?;
    writeln!(out, "Type `help` for commands.")?;
    prompt(out)?;

    let mut lines = input.lines();
    let mut input_open = true;
    loop {
        tokio::select! {
            Some(()) = pending.next(), if !pending.is_empty() => {
                show(out, manager, sync)?;
                prompt(out)?;
            }
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    input_open = false;
                    continue;
                };

                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => {
                        prompt(out)?;
                        continue;
                    }
                    Err(err) => {
                        writeln!(out, "{err}")?;
                        prompt(out)?;
                        continue;
                    }
                };

                match command {
                    ShellCommand::Quit => break,
                    ShellCommand::Help => {
                        writeln!(out, "{HELP}")?;
                        prompt(out)?;
                        continue;
                    }
                    _ => {}
                }

                let total = sync
                    .snapshot()
                    .stats
                    .map_or(0, |stats| stats.total_students);
                let total_pages = render::total_pages(total, manager.state().page_size);
                let refresh = match apply_command(manager, command, total_pages) {
                    Step::Refresh(change) => sync.refresh(manager.state(), change).boxed_local(),
                    Step::RefreshAll => sync.refresh_all(manager.state()).boxed_local(),
                    Step::Stay => {
                        writeln!(out, "Already at the edge of the result set.")?;
                        prompt(out)?;
                        continue;
                    }
                };
                pending.push(refresh);
                show(out, manager, sync)?;
                prompt(out)?;
            }
            else => break,
        }
    }

    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryState;
    use crate::sync::{StalePolicy, StatsRefresh};
    use crate::testing::{stats, student, FakeApi};

    #[test]
    fn parses_commands_and_arguments() {
        assert_eq!(
            parse_command("search  Avery Lee "),
            Ok(Some(ShellCommand::Search("Avery Lee".to_string())))
        );
        assert_eq!(
            parse_command("search"),
            Ok(Some(ShellCommand::Search(String::new())))
        );
        assert_eq!(parse_command("min 3.5"), Ok(Some(ShellCommand::MinGpa(Some(3.5)))));
        assert_eq!(parse_command("max none"), Ok(Some(ShellCommand::MaxGpa(None))));
        assert_eq!(parse_command("page 4"), Ok(Some(ShellCommand::Page(4))));
        assert_eq!(parse_command("SIZE 25"), Ok(Some(ShellCommand::PageSize(25))));
        assert_eq!(parse_command("next"), Ok(Some(ShellCommand::Next)));
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            parse_command("jump 3"),
            Err(ShellError::UnknownCommand("jump".to_string()))
        );
        assert_eq!(parse_command("page"), Err(ShellError::MissingArgument("page")));
        assert!(matches!(
            parse_command("page 0"),
            Err(ShellError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_command("min high"),
            Err(ShellError::InvalidValue { .. })
        ));
    }

    #[test]
    fn filter_commands_reset_to_first_page() {
        let mut manager = QueryStateManager::new(QueryState {
            page: 6,
            ..QueryState::default()
        });

        let step = apply_command(&mut manager, ShellCommand::MinGpa(Some(3.0)), 25);
        assert_eq!(step, Step::Refresh(Change::Filter));
        assert_eq!(manager.state().page, 1);
        assert_eq!(manager.state().min_gpa, Some(3.0));
    }

    #[test]
    fn next_and_prev_stay_within_bounds() {
        let mut manager = QueryStateManager::default();
        assert_eq!(apply_command(&mut manager, ShellCommand::Prev, 3), Step::Stay);

        assert_eq!(
            apply_command(&mut manager, ShellCommand::Next, 3),
            Step::Refresh(Change::Pagination)
        );
        apply_command(&mut manager, ShellCommand::Next, 3);
        assert_eq!(manager.state().page, 3);
        assert_eq!(apply_command(&mut manager, ShellCommand::Next, 3), Step::Stay);

        apply_command(&mut manager, ShellCommand::Prev, 3);
        assert_eq!(manager.state().page, 2);
    }

    #[test]
    fn next_is_unbounded_without_stats() {
        let mut manager = QueryStateManager::default();
        apply_command(&mut manager, ShellCommand::Next, 0);
        assert_eq!(manager.state().page, 2);
    }

    #[test]
    fn next_stops_at_the_last_representable_page() {
        let mut manager = QueryStateManager::new(QueryState {
            page: u32::MAX,
            ..QueryState::default()
        });
        assert_eq!(apply_command(&mut manager, ShellCommand::Next, 0), Step::Stay);
        assert_eq!(manager.state().page, u32::MAX);
    }

    fn last_frame(output: &str) -> &str {
        output
            .rsplit("Student Data Dashboard")
            .next()
            .unwrap_or_default()
    }

    #[tokio::test(start_paused = true)]
    async fn shows_loading_and_lets_newer_command_win() {
        let api = FakeApi::default()
            .page(1, 50, Some(vec![student(1, "Response A")]))
            .page(2, 10, Some(vec![student(2, "Response B")]))
            .with_stats(stats(250));
        let sync = DataSynchronizer::new(api, StalePolicy::LatestOnly, StatsRefresh::OnFilterChange);
        let mut manager = QueryStateManager::default();
        let mut out = Vec::new();

        run(&mut manager, &sync, &b"page 2\n"[..], &mut out)
            .await
            .unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Loading..."));
        let last = last_frame(&output);
        assert!(last.contains("Response B"));
        assert!(!last.contains("Response A"));
        assert!(!last.contains("Loading..."));
        assert!(!output.contains("Response A"));
        assert_eq!(manager.state().page, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn quit_leaves_without_waiting_for_the_page() {
        let api = FakeApi::default().page(1, 1_000, Some(vec![student(1, "Avery Lee")]));
        let sync = DataSynchronizer::new(api, StalePolicy::LatestOnly, StatsRefresh::OnFilterChange);
        let mut manager = QueryStateManager::default();
        let mut out = Vec::new();

        run(&mut manager, &sync, &b"help\nquit\n"[..], &mut out)
            .await
            .unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Commands:"));
        assert!(!output.contains("Avery Lee"));
        assert!(!sync.snapshot().loading);
    }
}
