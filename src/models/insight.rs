use serde::{Deserialize, Serialize};

use crate::models::employee::EmployeeRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
            Grade::NotApplicable => "N/A",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub base: i64,
    pub speed_bonus: i64,
    pub overdue_penalty: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreStats {
    pub total: i64,
    pub completed: i64,
    pub overdue: i64,
    pub completed_on_time: i64,
}

/// Deterministic productivity assessment over one employee's task history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityScore {
    pub score: i64,
    pub grade: Grade,
    pub insight: String,
    pub breakdown: ScoreBreakdown,
    pub stats: ScoreStats,
}

/// One row of the org-wide productivity report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeScore {
    pub employee: EmployeeRecord,
    #[serde(flatten)]
    pub result: ProductivityScore,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    /// The role's full expected-skill list, in catalog order.
    pub required: Vec<String>,
    pub missing: Vec<String>,
    /// Declared skills, passed through unmodified.
    pub has: Vec<String>,
    pub coverage_percent: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSkillGap {
    pub employee: EmployeeRecord,
    pub gap: SkillGap,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationBreakdown {
    pub skill_score: i64,
    pub workload_score: i64,
    pub prod_contrib: i64,
}

/// One ranked candidate for a task assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub employee: EmployeeRecord,
    pub total_score: i64,
    /// Matched required skills, lowercased.
    pub matched_skills: Vec<String>,
    pub active_tasks: i64,
    pub breakdown: RecommendationBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    pub title: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
}
