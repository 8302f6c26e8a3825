use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::db::repositories::employee_repository::EmployeeRepository;
use crate::db::repositories::task_repository::TaskRepository;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::insight::{
    EmployeeScore, Grade, ProductivityScore, ScoreBreakdown, ScoreStats,
};
use crate::models::session::Principal;
use crate::models::task::{TaskRecord, TaskStatus};

const OVERDUE_PENALTY: f64 = 5.0;
const MAX_PENALTY: f64 = 20.0;
const SPEED_BONUS_MAX: f64 = 10.0;

const NO_TASKS_INSIGHT: &str = "No tasks assigned yet.";

/// Org-wide productivity reporting over the deterministic scorer below.
pub struct ProductivityService {
    db: DbPool,
}

impl ProductivityService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Scores every employee of the caller's organization over their own
    /// task history, best score first.
    pub fn score_organization(&self, principal: &Principal) -> AppResult<Vec<EmployeeScore>> {
        principal.require_admin()?;

        let conn = self.db.get_connection()?;
        let employees =
            EmployeeRepository::list_by_organization_by_name(&conn, &principal.organization_id)?;
        let tasks = TaskRepository::list_by_organization(&conn, &principal.organization_id)?
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?;

        let mut by_employee = group_by_assignee(tasks);
        let now = Utc::now();

        let mut rows = Vec::with_capacity(employees.len());
        for employee in employees {
            let employee = employee.into_record()?;
            let own = by_employee.remove(&employee.id).unwrap_or_default();
            let result = score_productivity(&own, now);
            rows.push(EmployeeScore { employee, result });
        }
        rows.sort_by(|a, b| b.result.score.cmp(&a.result.score));

        debug!(
            target: "app::scoring",
            organization_id = %principal.organization_id,
            employees = rows.len(),
            "productivity report computed"
        );
        Ok(rows)
    }
}

pub(crate) fn group_by_assignee(tasks: Vec<TaskRecord>) -> HashMap<String, Vec<TaskRecord>> {
    let mut by_employee: HashMap<String, Vec<TaskRecord>> = HashMap::new();
    for task in tasks {
        if let Some(owner) = task.employee_id.clone() {
            by_employee.entry(owner).or_default().push(task);
        }
    }
    by_employee
}

/// Deterministic productivity score over one employee's tasks.
///
/// Completion rate sets the base (0..=100), finishing before the due date
/// earns up to 10 bonus points, and each overdue task costs 5 points up to a
/// cap of 20. The result is clamped to 0..=100 before rounding. An empty
/// task list scores 0 with grade N/A rather than erroring.
pub fn score_productivity(tasks: &[TaskRecord], now: DateTime<Utc>) -> ProductivityScore {
    if tasks.is_empty() {
        return ProductivityScore {
            score: 0,
            grade: Grade::NotApplicable,
            insight: NO_TASKS_INSIGHT.to_string(),
            breakdown: ScoreBreakdown::default(),
            stats: ScoreStats::default(),
        };
    }

    let total = tasks.len() as i64;
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count() as i64;
    let overdue = tasks
        .iter()
        .filter(|t| {
            t.status != TaskStatus::Completed && matches!(t.due_at, Some(due) if due < now)
        })
        .count() as i64;
    let completed_on_time = tasks
        .iter()
        .filter(|t| {
            t.status == TaskStatus::Completed
                && matches!(
                    (t.due_at, t.completed_at),
                    (Some(due), Some(done)) if done <= due
                )
        })
        .count() as i64;

    let base = completed as f64 / total as f64 * 100.0;
    let speed_bonus = if completed > 0 {
        completed_on_time as f64 / completed as f64 * SPEED_BONUS_MAX
    } else {
        0.0
    };
    let overdue_penalty = (overdue as f64 * OVERDUE_PENALTY).min(MAX_PENALTY);

    let score = (base + speed_bonus - overdue_penalty).clamp(0.0, 100.0).round() as i64;
    let (grade, insight) = grade_for(score);

    ProductivityScore {
        score,
        grade,
        insight: insight.to_string(),
        breakdown: ScoreBreakdown {
            base: base.round() as i64,
            speed_bonus: speed_bonus.round() as i64,
            overdue_penalty: overdue_penalty as i64,
        },
        stats: ScoreStats {
            total,
            completed,
            overdue,
            completed_on_time,
        },
    }
}

fn grade_for(score: i64) -> (Grade, &'static str) {
    if score >= 85 {
        (Grade::A, "Exceptional performer. Consistently delivers on time.")
    } else if score >= 70 {
        (Grade::B, "Solid performer with minor room for improvement.")
    } else if score >= 50 {
        (Grade::C, "Average performer, task completion speed needs work.")
    } else if score >= 30 {
        (Grade::D, "Below average, consider workload rebalancing.")
    } else {
        (Grade::F, "Critical: very low completion or lots of overdue tasks.")
    }
}
