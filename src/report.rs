use std::fmt::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::models::{StatusSummary, StudentRecord};
use crate::query::QueryState;
use crate::render;
use crate::sync::Snapshot;

pub fn summarize_by_status(records: &[StudentRecord]) -> Vec<StatusSummary> {
    let mut map: std::collections::HashMap<String, (usize, f64, usize)> =
        std::collections::HashMap::new();

    for record in records {
        let entry = map
            .entry(record.academic_status.clone())
            .or_insert((0, 0.0, 0));
        entry.0 += 1;
        if let Some(gpa) = record.gpa {
            entry.1 += gpa;
            entry.2 += 1;
        }
    }

    let mut summaries: Vec<StatusSummary> = map
        .into_iter()
        .map(|(academic_status, (count, total_gpa, graded))| StatusSummary {
            academic_status,
            count,
            avg_gpa: if graded == 0 {
                None
            } else {
                Some(total_gpa / graded as f64)
            },
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.academic_status.cmp(&b.academic_status))
    });
    summaries
}

pub fn build_report(
    query: &QueryState,
    snapshot: &Snapshot,
    generated_at: DateTime<Utc>,
) -> String {
    let summaries = summarize_by_status(&snapshot.records);

    let mut output = String::new();

    let _ = writeln!(output, "# Student Data Report");
    let _ = writeln!(
        output,
        "Generated {} for page {} ({} per page), filters: {}",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        query.page,
        query.page_size,
        render::describe_filters(query)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");

    match &snapshot.stats {
        Some(stats) => {
            for (title, value) in render::stat_cards(stats) {
                let _ = writeln!(output, "- {title}: {value}");
            }
        }
        None => {
            let _ = writeln!(output, "Statistics unavailable.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Academic Status Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No students on this page.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} students (avg GPA {})",
                summary.academic_status,
                summary.count,
                render::format_gpa(summary.avg_gpa)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students");

    if snapshot.records.is_empty() {
        let _ = writeln!(output, "No students on this page.");
    } else {
        let _ = writeln!(
            output,
            "| ID | Name | Age | Grade Level | GPA | Attendance | Status | Subjects |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|---|");
        for record in &snapshot.records {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {} |",
                record.student_id,
                record.name,
                record.age,
                record.grade_level,
                render::format_gpa(record.gpa),
                render::format_percent(record.attendance_rate),
                record.academic_status,
                record.subjects.join(", ")
            );
        }
    }

    let total = snapshot
        .stats
        .as_ref()
        .map_or(0, |stats| stats.total_students);
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", render::pagination_footer(query, total));

    output
}

#[derive(serde::Serialize)]
struct CsvRow<'a> {
    student_id: String,
    name: &'a str,
    age: i32,
    grade_level: String,
    gpa: Option<f64>,
    attendance_rate: Option<f64>,
    academic_status: &'a str,
    subjects: String,
    grades: String,
    enrollment_date: Option<chrono::NaiveDate>,
    performance_score: Option<f64>,
}

pub fn write_csv(path: &Path, records: &[StudentRecord]) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;

    for record in records {
        writer.serialize(CsvRow {
            student_id: record.student_id.to_string(),
            name: &record.name,
            age: record.age,
            grade_level: record.grade_level.to_string(),
            gpa: record.gpa,
            attendance_rate: record.attendance_rate,
            academic_status: &record.academic_status,
            subjects: record.subjects.join(";"),
            grades: record.grades.join(";"),
            enrollment_date: record.enrollment_date,
            performance_score: record.performance_score,
        })?;
    }

    writer.flush()?;
    Ok(records.len())
}
