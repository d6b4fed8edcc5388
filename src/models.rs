use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Row key for a student. The API sends integers today but the dashboard
/// never does arithmetic on it, so text ids are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StudentId {
    Number(i64),
    Text(String),
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeLevel {
    Number(i64),
    Text(String),
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: StudentId,
    pub name: String,
    pub age: i32,
    pub grade_level: GradeLevel,
    #[serde(default)]
    pub gpa: Option<f64>,
    #[serde(default)]
    pub attendance_rate: Option<f64>,
    pub academic_status: String,
    #[serde(default, deserialize_with = "nullable_strings")]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub enrollment_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "nullable_strings")]
    pub grades: Vec<String>,
    #[serde(default)]
    pub performance_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_students: u64,
    #[serde(default)]
    pub average_gpa: Option<f64>,
    #[serde(default)]
    pub average_attendance: Option<f64>,
    pub grade_levels: u32,
}

#[derive(Debug, Clone)]
pub struct StatusSummary {
    pub academic_status: String,
    pub count: usize,
    pub avg_gpa: Option<f64>,
}

/// Aggregated arrays from the API come back as `null` or `[null]` for
/// students without subject rows.
fn nullable_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(values.unwrap_or_default().into_iter().flatten().collect())
}
