use chrono::{DateTime, Utc};
use tracing::debug;

use crate::db::repositories::employee_repository::EmployeeRepository;
use crate::db::repositories::task_repository::TaskRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::employee::EmployeeRecord;
use crate::models::insight::{AssignmentRequest, Recommendation, RecommendationBreakdown};
use crate::models::session::Principal;
use crate::models::task::{TaskRecord, TaskStatus};
use crate::services::productivity_service::score_productivity;
use crate::services::skill_gap_service::{matches_any, normalize_declared};

const SKILL_WEIGHT: f64 = 50.0;
const WORKLOAD_WEIGHT: f64 = 30.0;
const WORKLOAD_COST_PER_TASK: f64 = 6.0;
const PRODUCTIVITY_WEIGHT: f64 = 20.0;

/// Ranks candidates for a task assignment.
pub struct RecommendationService {
    db: DbPool,
}

impl RecommendationService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn recommend_for_task(
        &self,
        principal: &Principal,
        request: &AssignmentRequest,
    ) -> AppResult<Vec<Recommendation>> {
        principal.require_admin()?;
        if request.title.trim().is_empty() {
            return Err(AppError::validation("task title is required"));
        }

        let conn = self.db.get_connection()?;
        let employees = EmployeeRepository::list_active(&conn, &principal.organization_id)?
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?;
        let tasks = TaskRepository::list_by_organization(&conn, &principal.organization_id)?
            .into_iter()
            .map(|row| row.into_record())
            .collect::<AppResult<Vec<_>>>()?;

        let ranking = recommend_assignee(&request.required_skills, &employees, &tasks, Utc::now());
        debug!(
            target: "app::scoring",
            organization_id = %principal.organization_id,
            candidates = ranking.len(),
            title = %request.title,
            "assignment ranking computed"
        );
        Ok(ranking)
    }
}

/// Scores every active employee for a task: up to 50 points for skill match,
/// 30 for a light current workload, 20 for productivity history. Tasks with
/// no skill requirements award the full neutral 50 to every candidate.
///
/// Equal totals order by lighter workload, then employee id, so the ranking
/// is deterministic whatever order the candidates arrive in.
pub fn recommend_assignee(
    required_skills: &[String],
    employees: &[EmployeeRecord],
    tasks: &[TaskRecord],
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    let required_lower: Vec<String> = required_skills
        .iter()
        .map(|skill| skill.to_lowercase())
        .collect();

    let mut ranking: Vec<Recommendation> = employees
        .iter()
        .filter(|employee| employee.is_active)
        .map(|employee| {
            let own: Vec<TaskRecord> = tasks
                .iter()
                .filter(|task| task.employee_id.as_deref() == Some(employee.id.as_str()))
                .cloned()
                .collect();
            let active_tasks = own
                .iter()
                .filter(|task| task.status != TaskStatus::Completed)
                .count() as i64;

            let declared = normalize_declared(&employee.skills);
            let matched_skills: Vec<String> = required_lower
                .iter()
                .filter(|req| matches_any(&declared, req))
                .cloned()
                .collect();

            let skill_score = if required_lower.is_empty() {
                SKILL_WEIGHT
            } else {
                matched_skills.len() as f64 / required_lower.len() as f64 * SKILL_WEIGHT
            };
            let workload_score =
                (WORKLOAD_WEIGHT - active_tasks as f64 * WORKLOAD_COST_PER_TASK).max(0.0);
            let productivity = score_productivity(&own, now);
            let prod_contrib = productivity.score as f64 / 100.0 * PRODUCTIVITY_WEIGHT;

            Recommendation {
                employee: employee.clone(),
                total_score: (skill_score + workload_score + prod_contrib).round() as i64,
                matched_skills,
                active_tasks,
                breakdown: RecommendationBreakdown {
                    skill_score: skill_score.round() as i64,
                    workload_score: workload_score.round() as i64,
                    prod_contrib: prod_contrib.round() as i64,
                },
            }
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then(a.active_tasks.cmp(&b.active_tasks))
            .then(a.employee.id.cmp(&b.employee.id))
    });
    ranking
}
