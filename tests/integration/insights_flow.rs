use chrono::{Duration, Utc};
use tempfile::tempdir;
use workpulse::db::DbPool;
use workpulse::error::AppError;
use workpulse::models::employee::{EmployeeCreateInput, EmployeeUpdateInput};
use workpulse::models::insight::AssignmentRequest;
use workpulse::models::organization::OrganizationRegisterInput;
use workpulse::models::session::{Principal, Role};
use workpulse::models::task::{TaskCreateInput, TaskStatus, TaskStatusUpdate};
use workpulse::services::auth_service::AuthService;
use workpulse::services::employee_service::EmployeeService;
use workpulse::services::productivity_service::ProductivityService;
use workpulse::services::recommendation_service::RecommendationService;
use workpulse::services::skill_gap_service::SkillGapService;
use workpulse::services::task_service::TaskService;

struct Fixture {
    pool: DbPool,
    admin: Principal,
    _dir: tempfile::TempDir,
}

fn setup() -> Fixture {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("insights.sqlite")).expect("db pool");
    let auth = AuthService::new(pool.clone());
    let (_, session) = auth
        .register_organization(OrganizationRegisterInput {
            name: "Insight Labs".into(),
            email: "admin@insight.test".into(),
            password: "hunter2-rotated".into(),
            industry: Some("Software".into()),
        })
        .expect("register");
    let admin = auth.verify(&session.token).expect("verify");
    Fixture {
        pool,
        admin,
        _dir: dir,
    }
}

fn hire(
    fixture: &Fixture,
    name: &str,
    email: &str,
    role: &str,
    skills: &[&str],
) -> workpulse::models::employee::EmployeeRecord {
    EmployeeService::new(fixture.pool.clone())
        .create_employee(
            &fixture.admin,
            EmployeeCreateInput {
                name: name.into(),
                email: email.into(),
                role: role.into(),
                department: "Delivery".into(),
                skills: Some(skills.iter().map(|s| s.to_string()).collect()),
                wallet_address: None,
                password: None,
            },
        )
        .expect("create employee")
}

fn assign_completed(fixture: &Fixture, employee_id: &str, title: &str) {
    let tasks = TaskService::new(fixture.pool.clone());
    let task = tasks
        .create_task(
            &fixture.admin,
            TaskCreateInput {
                title: title.into(),
                employee_id: Some(employee_id.into()),
                due_at: Some(Utc::now() + Duration::days(3)),
                ..Default::default()
            },
        )
        .expect("create task");
    tasks
        .set_status(
            &fixture.admin,
            &task.id,
            TaskStatusUpdate {
                status: TaskStatus::Completed,
                proof_ref: None,
            },
        )
        .expect("complete task");
}

fn assign_overdue(fixture: &Fixture, employee_id: &str, title: &str) {
    TaskService::new(fixture.pool.clone())
        .create_task(
            &fixture.admin,
            TaskCreateInput {
                title: title.into(),
                employee_id: Some(employee_id.into()),
                due_at: Some(Utc::now() - Duration::days(2)),
                ..Default::default()
            },
        )
        .expect("create overdue task");
}

#[test]
fn productivity_report_ranks_best_first() {
    let fixture = setup();
    let strong = hire(&fixture, "Vera Strong", "vera@insight.test", "Software Engineer", &["SQL"]);
    let weak = hire(&fixture, "Will Weak", "will@insight.test", "Software Engineer", &["Git"]);
    let idle = hire(&fixture, "Ida Idle", "ida@insight.test", "Analyst", &[]);

    assign_completed(&fixture, &strong.id, "Done on time 1");
    assign_completed(&fixture, &strong.id, "Done on time 2");
    assign_overdue(&fixture, &weak.id, "Slipping 1");
    assign_overdue(&fixture, &weak.id, "Slipping 2");

    let report = ProductivityService::new(fixture.pool.clone())
        .score_organization(&fixture.admin)
        .expect("report");

    assert_eq!(report.len(), 3);
    assert_eq!(report[0].employee.id, strong.id);
    assert_eq!(report[0].result.score, 100);
    assert_eq!(report[0].result.stats.completed_on_time, 2);

    // Zero tasks is the defined N/A edge case, not an error.
    let idle_row = report
        .iter()
        .find(|row| row.employee.id == idle.id)
        .expect("idle row");
    assert_eq!(idle_row.result.score, 0);
    assert_eq!(idle_row.result.grade.as_str(), "N/A");

    let weak_row = report
        .iter()
        .find(|row| row.employee.id == weak.id)
        .expect("weak row");
    assert_eq!(weak_row.result.stats.overdue, 2);
    assert!(weak_row.result.score < report[0].result.score);

    // Scores arrive sorted descending.
    let scores: Vec<i64> = report.iter().map(|row| row.result.score).collect();
    let mut sorted = scores.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(scores, sorted);
}

#[test]
fn skill_gap_report_covers_every_employee_by_name() {
    let fixture = setup();
    hire(
        &fixture,
        "Zoe Quill",
        "zoe@insight.test",
        "Designer",
        &["Figma", "css"],
    );
    hire(&fixture, "Abe North", "abe@insight.test", "Astronaut", &["Piloting"]);

    let report = SkillGapService::new(fixture.pool.clone())
        .gaps_for_organization(&fixture.admin)
        .expect("gap report");

    assert_eq!(report.len(), 2);
    // Ordered by employee name.
    assert_eq!(report[0].employee.name, "Abe North");
    assert_eq!(report[1].employee.name, "Zoe Quill");

    // Unknown role: nothing expected, full coverage.
    assert!(report[0].gap.required.is_empty());
    assert_eq!(report[0].gap.coverage_percent, 100);

    // Designer catalog: Figma and CSS matched, three missing.
    let designer = &report[1].gap;
    assert_eq!(designer.coverage_percent, 40);
    assert_eq!(
        designer.missing,
        vec![
            "UI/UX".to_string(),
            "Prototyping".to_string(),
            "User Research".to_string()
        ]
    );
}

#[test]
fn recommendation_ranks_skill_matched_light_loaded_performers() {
    let fixture = setup();
    let matched = hire(
        &fixture,
        "Nia Match",
        "nia@insight.test",
        "DevOps Engineer",
        &["Docker", "Kubernetes"],
    );
    let busy = hire(
        &fixture,
        "Bo Busy",
        "bo@insight.test",
        "DevOps Engineer",
        &["Docker", "Kubernetes"],
    );
    let unrelated = hire(
        &fixture,
        "Uma Far",
        "uma@insight.test",
        "Sales Rep",
        &["CRM"],
    );

    // Load Bo up with six open tasks: workload score floors at zero.
    let tasks = TaskService::new(fixture.pool.clone());
    for i in 0..6 {
        tasks
            .create_task(
                &fixture.admin,
                TaskCreateInput {
                    title: format!("Standing duty {i}"),
                    employee_id: Some(busy.id.clone()),
                    ..Default::default()
                },
            )
            .expect("load task");
    }

    let recommendations = RecommendationService::new(fixture.pool.clone())
        .recommend_for_task(
            &fixture.admin,
            &AssignmentRequest {
                title: "Harden the deployment pipeline".into(),
                required_skills: vec!["Docker".into(), "Kubernetes".into()],
            },
        )
        .expect("recommendations");

    assert_eq!(recommendations.len(), 3);
    assert_eq!(recommendations[0].employee.id, matched.id);
    assert_eq!(recommendations[0].breakdown.skill_score, 50);
    assert_eq!(recommendations[0].breakdown.workload_score, 30);
    assert_eq!(
        recommendations[0].matched_skills,
        vec!["docker".to_string(), "kubernetes".to_string()]
    );

    let bo = recommendations
        .iter()
        .find(|rec| rec.employee.id == busy.id)
        .expect("bo row");
    assert_eq!(bo.active_tasks, 6);
    assert_eq!(bo.breakdown.workload_score, 0);

    let uma = recommendations
        .iter()
        .find(|rec| rec.employee.id == unrelated.id)
        .expect("uma row");
    assert_eq!(uma.breakdown.skill_score, 0);
}

#[test]
fn recommendation_excludes_inactive_candidates_entirely() {
    let fixture = setup();
    let only = hire(
        &fixture,
        "Solo Act",
        "solo@insight.test",
        "Analyst",
        &["SQL"],
    );
    EmployeeService::new(fixture.pool.clone())
        .update_employee(
            &fixture.admin,
            &only.id,
            EmployeeUpdateInput {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .expect("deactivate");

    let recommendations = RecommendationService::new(fixture.pool.clone())
        .recommend_for_task(
            &fixture.admin,
            &AssignmentRequest {
                title: "Quarterly analysis".into(),
                required_skills: vec!["SQL".into()],
            },
        )
        .expect("recommendations");
    assert!(recommendations.is_empty());
}

#[test]
fn insight_surfaces_are_admin_only() {
    let fixture = setup();
    let worker = hire(
        &fixture,
        "Wes Rank",
        "wes@insight.test",
        "Analyst",
        &["SQL"],
    );
    let me = Principal {
        principal_id: worker.id.clone(),
        organization_id: fixture.admin.organization_id.clone(),
        role: Role::Employee,
    };

    assert!(matches!(
        ProductivityService::new(fixture.pool.clone()).score_organization(&me),
        Err(AppError::Forbidden { .. })
    ));
    assert!(matches!(
        SkillGapService::new(fixture.pool.clone()).gaps_for_organization(&me),
        Err(AppError::Forbidden { .. })
    ));
    assert!(matches!(
        RecommendationService::new(fixture.pool.clone()).recommend_for_task(
            &me,
            &AssignmentRequest {
                title: "Anything".into(),
                required_skills: vec![],
            }
        ),
        Err(AppError::Forbidden { .. })
    ));
}

#[test]
fn recommendation_requires_a_title() {
    let fixture = setup();
    assert!(matches!(
        RecommendationService::new(fixture.pool.clone()).recommend_for_task(
            &fixture.admin,
            &AssignmentRequest {
                title: "   ".into(),
                required_skills: vec![],
            }
        ),
        Err(AppError::Validation { .. })
    ));
}
