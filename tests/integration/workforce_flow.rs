use chrono::{Duration, Utc};
use tempfile::tempdir;
use workpulse::db::DbPool;
use workpulse::error::AppError;
use workpulse::models::employee::{EmployeeCreateInput, EmployeeUpdateInput};
use workpulse::models::organization::OrganizationRegisterInput;
use workpulse::models::session::{Principal, Role};
use workpulse::models::task::{
    TaskCreateInput, TaskFilter, TaskStatus, TaskStatusUpdate, TaskUpdateInput,
};
use workpulse::services::auth_service::AuthService;
use workpulse::services::dashboard_service::DashboardService;
use workpulse::services::employee_service::EmployeeService;
use workpulse::services::task_service::TaskService;

struct Fixture {
    pool: DbPool,
    admin: Principal,
    _dir: tempfile::TempDir,
}

fn setup(email: &str) -> Fixture {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("workforce.sqlite")).expect("db pool");
    let auth = AuthService::new(pool.clone());
    let (_, session) = auth
        .register_organization(OrganizationRegisterInput {
            name: "Acme Corp".into(),
            email: email.into(),
            password: "hunter2-rotated".into(),
            industry: None,
        })
        .expect("register");
    let admin = auth.verify(&session.token).expect("verify");
    Fixture {
        pool,
        admin,
        _dir: dir,
    }
}

fn employee_input(name: &str, email: &str) -> EmployeeCreateInput {
    EmployeeCreateInput {
        name: name.into(),
        email: email.into(),
        role: "Software Engineer".into(),
        department: "Engineering".into(),
        skills: Some(vec!["SQL".into(), "Git".into()]),
        wallet_address: None,
        password: None,
    }
}

fn employee_principal(fixture: &Fixture, employee_id: &str) -> Principal {
    Principal {
        principal_id: employee_id.into(),
        organization_id: fixture.admin.organization_id.clone(),
        role: Role::Employee,
    }
}

#[test]
fn employee_crud_with_task_counts() {
    let fixture = setup("crud@acme.test");
    let employees = EmployeeService::new(fixture.pool.clone());
    let tasks = TaskService::new(fixture.pool.clone());

    let created = employees
        .create_employee(&fixture.admin, employee_input("Riley Moss", "riley@acme.test"))
        .expect("create employee");
    assert!(created.is_active);

    // Required fields are enforced.
    assert!(matches!(
        employees.create_employee(
            &fixture.admin,
            EmployeeCreateInput {
                role: "  ".into(),
                ..employee_input("No Role", "norole@acme.test")
            }
        ),
        Err(AppError::Validation { .. })
    ));

    // Short portal passwords are rejected, not silently dropped.
    assert!(matches!(
        employees.create_employee(
            &fixture.admin,
            EmployeeCreateInput {
                password: Some("short".into()),
                ..employee_input("Pat Short", "pat@acme.test")
            }
        ),
        Err(AppError::Validation { .. })
    ));

    tasks
        .create_task(
            &fixture.admin,
            TaskCreateInput {
                title: "Ship reports".into(),
                employee_id: Some(created.id.clone()),
                ..Default::default()
            },
        )
        .expect("create task");

    let listed = employees.list_employees(&fixture.admin).expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].active_tasks, 1);
    assert_eq!(listed[0].completed_tasks, 0);

    let updated = employees
        .update_employee(
            &fixture.admin,
            &created.id,
            EmployeeUpdateInput {
                department: Some("Platform".into()),
                skills: Some(vec!["SQL".into(), "Docker".into()]),
                ..Default::default()
            },
        )
        .expect("update");
    assert_eq!(updated.department, "Platform");
    assert_eq!(updated.skills, vec!["SQL".to_string(), "Docker".to_string()]);

    let fetched = employees
        .get_employee(&fixture.admin, &created.id)
        .expect("get");
    assert_eq!(fetched.employee.department, "Platform");
}

#[test]
fn deleting_an_employee_detaches_their_tasks() {
    let fixture = setup("detach@acme.test");
    let employees = EmployeeService::new(fixture.pool.clone());
    let tasks = TaskService::new(fixture.pool.clone());

    let employee = employees
        .create_employee(&fixture.admin, employee_input("Drew Lake", "drew@acme.test"))
        .expect("create employee");
    let task = tasks
        .create_task(
            &fixture.admin,
            TaskCreateInput {
                title: "Orphaned work".into(),
                employee_id: Some(employee.id.clone()),
                ..Default::default()
            },
        )
        .expect("create task");

    employees
        .delete_employee(&fixture.admin, &employee.id)
        .expect("delete employee");

    let survivor = tasks.get_task(&fixture.admin, &task.id).expect("get task");
    assert!(survivor.task.employee_id.is_none());
    assert!(survivor.employee_name.is_none());

    assert!(matches!(
        employees.delete_employee(&fixture.admin, &employee.id),
        Err(AppError::NotFound)
    ));
}

#[test]
fn status_transitions_maintain_completed_at() {
    let fixture = setup("status@acme.test");
    let tasks = TaskService::new(fixture.pool.clone());

    let task = tasks
        .create_task(
            &fixture.admin,
            TaskCreateInput {
                title: "Close the books".into(),
                due_at: Some(Utc::now() + Duration::days(2)),
                ..Default::default()
            },
        )
        .expect("create task");
    assert_eq!(task.status, TaskStatus::Assigned);
    assert!(task.completed_at.is_none());

    let done = tasks
        .set_status(
            &fixture.admin,
            &task.id,
            TaskStatusUpdate {
                status: TaskStatus::Completed,
                proof_ref: Some("0xproof".into()),
            },
        )
        .expect("complete");
    assert_eq!(done.status, TaskStatus::Completed);
    assert!(done.completed_at.is_some());
    assert_eq!(done.proof_ref.as_deref(), Some("0xproof"));

    // Back-transition clears the completion timestamp again.
    let reopened = tasks
        .set_status(
            &fixture.admin,
            &task.id,
            TaskStatusUpdate {
                status: TaskStatus::InProgress,
                proof_ref: None,
            },
        )
        .expect("reopen");
    assert_eq!(reopened.status, TaskStatus::InProgress);
    assert!(reopened.completed_at.is_none());
    assert!(reopened.proof_ref.is_none());
}

#[test]
fn employees_only_see_and_touch_their_own_tasks() {
    let fixture = setup("scope@acme.test");
    let employees = EmployeeService::new(fixture.pool.clone());
    let tasks = TaskService::new(fixture.pool.clone());

    let mine = employees
        .create_employee(&fixture.admin, employee_input("Mia Chen", "mia@acme.test"))
        .expect("create employee");
    let other = employees
        .create_employee(&fixture.admin, employee_input("Ola Ray", "ola@acme.test"))
        .expect("create other");

    let my_task = tasks
        .create_task(
            &fixture.admin,
            TaskCreateInput {
                title: "Mine".into(),
                employee_id: Some(mine.id.clone()),
                ..Default::default()
            },
        )
        .expect("create my task");
    let other_task = tasks
        .create_task(
            &fixture.admin,
            TaskCreateInput {
                title: "Not mine".into(),
                employee_id: Some(other.id.clone()),
                ..Default::default()
            },
        )
        .expect("create other task");

    let me = employee_principal(&fixture, &mine.id);

    let visible = tasks
        .list_tasks(&me, TaskFilter::default())
        .expect("list as employee");
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].task.id, my_task.id);

    // The admin-only assignee filter cannot widen an employee's scope.
    let filtered = tasks
        .list_tasks(
            &me,
            TaskFilter {
                status: None,
                employee_id: Some(other.id.clone()),
            },
        )
        .expect("list with foreign filter");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].task.id, my_task.id);

    // Someone else's task is simply not found under my scope.
    assert!(matches!(
        tasks.get_task(&me, &other_task.id),
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        tasks.set_status(
            &me,
            &other_task.id,
            TaskStatusUpdate {
                status: TaskStatus::InProgress,
                proof_ref: None,
            }
        ),
        Err(AppError::NotFound)
    ));

    // Employees may move their own task's status.
    let progressed = tasks
        .set_status(
            &me,
            &my_task.id,
            TaskStatusUpdate {
                status: TaskStatus::InProgress,
                proof_ref: None,
            },
        )
        .expect("progress own task");
    assert_eq!(progressed.status, TaskStatus::InProgress);

    // Everything else is off limits for employee principals.
    assert!(matches!(
        tasks.create_task(
            &me,
            TaskCreateInput {
                title: "Sneaky".into(),
                ..Default::default()
            }
        ),
        Err(AppError::Forbidden { .. })
    ));
    assert!(matches!(
        tasks.update_task(
            &me,
            &my_task.id,
            TaskUpdateInput {
                title: Some("Renamed".into()),
                ..Default::default()
            }
        ),
        Err(AppError::Forbidden { .. })
    ));
    assert!(matches!(
        tasks.delete_task(&me, &my_task.id),
        Err(AppError::Forbidden { .. })
    ));
    assert!(matches!(
        employees.list_employees(&me),
        Err(AppError::Forbidden { .. })
    ));
}

#[test]
fn cross_tenant_access_is_structurally_impossible() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("tenants.sqlite")).expect("db pool");
    let auth = AuthService::new(pool.clone());
    let tasks = TaskService::new(pool.clone());

    let (_, session_a) = auth
        .register_organization(OrganizationRegisterInput {
            name: "Tenant A".into(),
            email: "a@tenants.test".into(),
            password: "password-a".into(),
            industry: None,
        })
        .expect("register a");
    let admin_a = auth.verify(&session_a.token).expect("verify a");

    let (_, session_b) = auth
        .register_organization(OrganizationRegisterInput {
            name: "Tenant B".into(),
            email: "b@tenants.test".into(),
            password: "password-b".into(),
            industry: None,
        })
        .expect("register b");
    let admin_b = auth.verify(&session_b.token).expect("verify b");

    let secret = tasks
        .create_task(
            &admin_a,
            TaskCreateInput {
                title: "Tenant A internals".into(),
                ..Default::default()
            },
        )
        .expect("create in a");

    // Tenant B cannot see, edit or delete tenant A's task even with its id.
    assert!(matches!(
        tasks.get_task(&admin_b, &secret.id),
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        tasks.update_task(
            &admin_b,
            &secret.id,
            TaskUpdateInput {
                title: Some("Hijacked".into()),
                ..Default::default()
            }
        ),
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        tasks.delete_task(&admin_b, &secret.id),
        Err(AppError::NotFound)
    ));
    assert!(tasks
        .list_tasks(&admin_b, TaskFilter::default())
        .expect("list b")
        .is_empty());
}

#[test]
fn task_listing_filters_by_status_and_assignee() {
    let fixture = setup("filters@acme.test");
    let employees = EmployeeService::new(fixture.pool.clone());
    let tasks = TaskService::new(fixture.pool.clone());

    let worker = employees
        .create_employee(&fixture.admin, employee_input("Kay Wren", "kay@acme.test"))
        .expect("create employee");

    let assigned = tasks
        .create_task(
            &fixture.admin,
            TaskCreateInput {
                title: "Assigned work".into(),
                employee_id: Some(worker.id.clone()),
                ..Default::default()
            },
        )
        .expect("task one");
    let unassigned = tasks
        .create_task(
            &fixture.admin,
            TaskCreateInput {
                title: "Backlog item".into(),
                ..Default::default()
            },
        )
        .expect("task two");
    tasks
        .set_status(
            &fixture.admin,
            &unassigned.id,
            TaskStatusUpdate {
                status: TaskStatus::Completed,
                proof_ref: None,
            },
        )
        .expect("complete");

    let completed_only = tasks
        .list_tasks(
            &fixture.admin,
            TaskFilter {
                status: Some(TaskStatus::Completed),
                employee_id: None,
            },
        )
        .expect("status filter");
    assert_eq!(completed_only.len(), 1);
    assert_eq!(completed_only[0].task.id, unassigned.id);

    let for_worker = tasks
        .list_tasks(
            &fixture.admin,
            TaskFilter {
                status: None,
                employee_id: Some(worker.id.clone()),
            },
        )
        .expect("assignee filter");
    assert_eq!(for_worker.len(), 1);
    assert_eq!(for_worker[0].task.id, assigned.id);
    assert_eq!(for_worker[0].employee_name.as_deref(), Some("Kay Wren"));
}

#[test]
fn assignee_must_belong_to_the_organization() {
    let fixture = setup("assignee@acme.test");
    let tasks = TaskService::new(fixture.pool.clone());

    assert!(matches!(
        tasks.create_task(
            &fixture.admin,
            TaskCreateInput {
                title: "Ghost assignment".into(),
                employee_id: Some("no-such-employee".into()),
                ..Default::default()
            }
        ),
        Err(AppError::Validation { .. })
    ));
}

#[test]
fn dashboard_overview_aggregates_the_organization() {
    let fixture = setup("dashboard@acme.test");
    let employees = EmployeeService::new(fixture.pool.clone());
    let tasks = TaskService::new(fixture.pool.clone());
    let dashboard = DashboardService::new(fixture.pool.clone());

    let engineer = employees
        .create_employee(&fixture.admin, employee_input("Ana Volt", "ana@acme.test"))
        .expect("engineer");
    let designer = employees
        .create_employee(
            &fixture.admin,
            EmployeeCreateInput {
                role: "Designer".into(),
                department: "Product".into(),
                ..employee_input("Ben Ash", "ben@acme.test")
            },
        )
        .expect("designer");
    employees
        .update_employee(
            &fixture.admin,
            &designer.id,
            EmployeeUpdateInput {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .expect("deactivate designer");

    let done = tasks
        .create_task(
            &fixture.admin,
            TaskCreateInput {
                title: "Finished".into(),
                employee_id: Some(engineer.id.clone()),
                ..Default::default()
            },
        )
        .expect("task");
    tasks
        .set_status(
            &fixture.admin,
            &done.id,
            TaskStatusUpdate {
                status: TaskStatus::Completed,
                proof_ref: None,
            },
        )
        .expect("complete");
    tasks
        .create_task(
            &fixture.admin,
            TaskCreateInput {
                title: "Overdue".into(),
                employee_id: Some(engineer.id.clone()),
                due_at: Some(Utc::now() - Duration::days(1)),
                ..Default::default()
            },
        )
        .expect("overdue task");

    let overview = dashboard.overview(&fixture.admin).expect("overview");
    assert_eq!(overview.employees.total, 2);
    assert_eq!(overview.employees.active, 1);
    assert_eq!(overview.employees.inactive, 1);
    assert_eq!(overview.tasks.total, 2);
    assert_eq!(overview.tasks.completed, 1);
    assert_eq!(overview.tasks.assigned, 1);
    assert_eq!(overview.tasks.overdue, 1);

    // Only active employees rank; Ana completed 1 of 2.
    assert_eq!(overview.top_employees.len(), 1);
    assert_eq!(overview.top_employees[0].name, "Ana Volt");
    assert_eq!(overview.top_employees[0].completion_percent, 50);

    assert_eq!(overview.recent_tasks.len(), 2);
    assert_eq!(overview.departments.len(), 1);
    assert_eq!(overview.departments[0].department, "Engineering");

    // The dashboard is an admin surface.
    let me = employee_principal(&fixture, &engineer.id);
    assert!(matches!(
        dashboard.overview(&me),
        Err(AppError::Forbidden { .. })
    ));
}
