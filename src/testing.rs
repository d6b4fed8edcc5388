//! Scripted stand-ins shared by the synchronizer and shell tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::api::StudentApi;
use crate::error::{FetchError, Result};
use crate::models::{GradeLevel, StatsSummary, StudentId, StudentRecord};
use crate::query::QueryState;

pub fn student(id: i64, name: &str) -> StudentRecord {
    StudentRecord {
        student_id: StudentId::Number(id),
        name: name.to_string(),
        age: 16,
        grade_level: GradeLevel::Number(10),
        gpa: Some(3.2),
        attendance_rate: Some(0.9),
        academic_status: "Good".to_string(),
        subjects: vec!["Math".to_string()],
        enrollment_date: None,
        grades: Vec::new(),
        performance_score: None,
    }
}

pub fn stats(total_students: u64) -> StatsSummary {
    StatsSummary {
        total_students,
        average_gpa: Some(3.1),
        average_attendance: Some(0.88),
        grade_levels: 4,
    }
}

/// Scripted API: each page answers after a fixed delay, `None` means the
/// request fails.
#[derive(Default)]
pub struct FakeApi {
    pub pages: HashMap<u32, (u64, Option<Vec<StudentRecord>>)>,
    pub stats: Option<StatsSummary>,
    pub list_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
}

impl FakeApi {
    pub fn page(mut self, page: u32, delay_ms: u64, records: Option<Vec<StudentRecord>>) -> Self {
        self.pages.insert(page, (delay_ms, records));
        self
    }

    pub fn with_stats(mut self, stats: StatsSummary) -> Self {
        self.stats = Some(stats);
        self
    }
}

impl StudentApi for FakeApi {
    async fn list_students(&self, query: &QueryState) -> Result<Vec<StudentRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, records) = self.pages.get(&query.page).cloned().unwrap_or((0, None));
        tokio::time::sleep(Duration::from_millis(delay)).await;
        records.ok_or_else(|| FetchError::Transport("connection refused".to_string()))
    }

    async fn fetch_stats(&self) -> Result<StatsSummary> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        self.stats
            .clone()
            .ok_or(FetchError::Status { status: 500 })
    }
}
