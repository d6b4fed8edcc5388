//! Terminal rendering of the dashboard: stat cards, the student table and
//! the pagination footer.

use std::fmt::Write;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{StatsSummary, StudentRecord};
use crate::query::QueryState;
use crate::sync::Snapshot;

pub const NOT_AVAILABLE: &str = "N/A";

/// Integer with thousands separators, e.g. `1,250`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut output = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            output.push(',');
        }
        output.push(ch);
    }
    output
}

pub fn format_gpa(gpa: Option<f64>) -> String {
    match gpa {
        Some(value) => format!("{value:.2}"),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// A rate in `[0, 1]` as a percentage with one decimal.
pub fn format_percent(rate: Option<f64>) -> String {
    match rate {
        Some(value) => format!("{:.1}%", value * 100.0),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Style class for an academic status, e.g. `status-needs-improvement`.
pub fn status_class(status: &str) -> String {
    let slug: Vec<String> = status
        .split_whitespace()
        .map(|part| part.to_lowercase())
        .collect();
    format!("status-{}", slug.join("-"))
}

fn status_color(status: &str) -> Option<Color> {
    match status_class(status).as_str() {
        "status-excellent" | "status-good" => Some(Color::Green),
        "status-fair" => Some(Color::Yellow),
        "status-poor" | "status-needs-improvement" => Some(Color::Red),
        _ => None,
    }
}

/// Title/value pairs for the four summary cards.
pub fn stat_cards(stats: &StatsSummary) -> [(&'static str, String); 4] {
    [
        ("Total Students", format_count(stats.total_students)),
        ("Average GPA", format_gpa(stats.average_gpa)),
        ("Average Attendance", format_percent(stats.average_attendance)),
        ("Grade Levels", stats.grade_levels.to_string()),
    ]
}

pub fn stats_table(stats: &StatsSummary) -> Table {
    let cards = stat_cards(stats);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(cards.iter().map(|(title, _)| header_cell(title)));
    table.add_row(
        cards
            .iter()
            .map(|(_, value)| Cell::new(value).add_attribute(Attribute::Bold)),
    );
    for index in 0..cards.len() {
        align_column(&mut table, index, CellAlignment::Center);
    }
    table
}

pub fn students_table(records: &[StudentRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
    table.set_header(vec![
        header_cell("ID"),
        header_cell("Name"),
        header_cell("Age"),
        header_cell("Grade Level"),
        header_cell("GPA"),
        header_cell("Attendance Rate"),
        header_cell("Academic Status"),
        header_cell("Subjects"),
    ]);
    for record in records {
        table.add_row(vec![
            Cell::new(&record.student_id).fg(Color::DarkGrey),
            Cell::new(&record.name),
            Cell::new(record.age),
            Cell::new(&record.grade_level),
            Cell::new(format_gpa(record.gpa)),
            Cell::new(format_percent(record.attendance_rate)),
            status_cell(&record.academic_status),
            Cell::new(record.subjects.join(", ")),
        ]);
    }
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Right);
    table
}

pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size))
}

/// One-based, inclusive row range shown on `page`, or `None` when the page
/// lies past the end.
pub fn page_range(page: u32, page_size: u32, total: u64) -> Option<(u64, u64)> {
    let page = u64::from(page.max(1));
    let size = u64::from(page_size);
    let first = (page - 1) * size + 1;
    if size == 0 || first > total {
        return None;
    }
    Some((first, (page * size).min(total)))
}

pub fn pagination_footer(query: &QueryState, total: u64) -> String {
    match page_range(query.page, query.page_size, total) {
        Some((first, last)) => format!("{first}-{last} of {total} students"),
        None => format!("0 of {total} students"),
    }
}

/// How many page links to keep at each end of the list and on each side of
/// the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub left_edge: u64,
    pub left_current: u64,
    pub right_current: u64,
    pub right_edge: u64,
}

impl PageWindow {
    /// First and last page plus two either side of the current one.
    pub const COMPACT: PageWindow = PageWindow {
        left_edge: 1,
        left_current: 2,
        right_current: 2,
        right_edge: 1,
    };

    /// Page numbers to offer around `current`, with `None` marking an
    /// elided gap.
    pub fn pages(&self, total_pages: u64, current: u64) -> Vec<Option<u64>> {
        let last_page = total_pages;
        if last_page == 0 {
            return vec![];
        }

        let mut pages = Vec::new();

        let left_end = (1 + self.left_edge).min(last_page + 1);
        pages.extend((1..left_end).map(Some));

        let mid_start = left_end.max(current.saturating_sub(self.left_current));
        let mid_end = current
            .saturating_add(self.right_current + 1)
            .min(last_page + 1);
        if mid_start > left_end {
            pages.push(None);
        }
        pages.extend((mid_start..mid_end).map(Some));

        let right_start = mid_end.max(last_page.saturating_sub(self.right_edge) + 1);
        if right_start > mid_end {
            pages.push(None);
        }
        pages.extend((right_start..=last_page).map(Some));

        pages
    }
}

fn page_window_line(total_pages: u64, current: u64) -> String {
    PageWindow::COMPACT
        .pages(total_pages, current)
        .into_iter()
        .map(|page| match page {
            Some(page) if page == current => format!("[{page}]"),
            Some(page) => page.to_string(),
            None => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn describe_filters(query: &QueryState) -> String {
    if !query.has_filters() {
        return "none".to_string();
    }
    let mut parts = Vec::new();
    if !query.search.is_empty() {
        parts.push(format!("name matches \"{}\"", query.search));
    }
    match (query.min_gpa, query.max_gpa) {
        (Some(min), Some(max)) => parts.push(format!("GPA {min:.1} to {max:.1}")),
        (Some(min), None) => parts.push(format!("GPA at least {min:.1}")),
        (None, Some(max)) => parts.push(format!("GPA at most {max:.1}")),
        (None, None) => {}
    }
    parts.join(", ")
}

/// Full dashboard view for one snapshot.
pub fn render_dashboard(query: &QueryState, snapshot: &Snapshot) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Student Data Dashboard");
    match &snapshot.stats {
        Some(stats) => {
            let _ = writeln!(output, "{}", stats_table(stats));
        }
        None => {
            let _ = writeln!(output, "Statistics unavailable.");
        }
    }

    let _ = writeln!(output, "Filters: {}", describe_filters(query));
    if snapshot.loading {
        let _ = writeln!(output, "Loading...");
    }

    if snapshot.records.is_empty() {
        let _ = writeln!(output, "No students on this page.");
    } else {
        let _ = writeln!(output, "{}", students_table(&snapshot.records));
    }

    let total = snapshot.stats.as_ref().map_or(0, |stats| stats.total_students);
    let _ = writeln!(output, "{}", pagination_footer(query, total));
    let pages = total_pages(total, query.page_size);
    if pages > 1 {
        let _ = writeln!(
            output,
            "Pages: {}  ({} per page)",
            page_window_line(pages, u64::from(query.page)),
            query.page_size
        );
    }

    output
}

fn status_cell(status: &str) -> Cell {
    match status_color(status) {
        Some(color) => Cell::new(status).fg(color),
        None => Cell::new(status),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
