use tracing::debug;

use crate::db::repositories::employee_repository::EmployeeRepository;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::insight::{EmployeeSkillGap, SkillGap};
use crate::models::session::Principal;

/// Expected skills per role. Roles outside the catalog expect nothing.
const ROLE_SKILLS: &[(&str, &[&str])] = &[
    (
        "Software Engineer",
        &["JavaScript", "Git", "SQL", "REST APIs", "Testing"],
    ),
    (
        "Senior Engineer",
        &[
            "JavaScript",
            "Git",
            "SQL",
            "REST APIs",
            "Testing",
            "System Design",
            "Code Review",
        ],
    ),
    (
        "Team Lead",
        &[
            "JavaScript",
            "Git",
            "System Design",
            "Code Review",
            "Project Management",
            "Communication",
        ],
    ),
    (
        "Manager",
        &[
            "Project Management",
            "Communication",
            "Leadership",
            "Budgeting",
            "Reporting",
        ],
    ),
    (
        "Designer",
        &["Figma", "UI/UX", "Prototyping", "CSS", "User Research"],
    ),
    (
        "Analyst",
        &["SQL", "Excel", "Data Visualization", "Reporting", "Python"],
    ),
    (
        "HR Manager",
        &[
            "Recruitment",
            "Onboarding",
            "Compliance",
            "Communication",
            "HRIS",
        ],
    ),
    (
        "Sales Rep",
        &[
            "CRM",
            "Communication",
            "Negotiation",
            "Product Knowledge",
            "Lead Generation",
        ],
    ),
    (
        "DevOps Engineer",
        &[
            "Docker",
            "Kubernetes",
            "CI/CD",
            "Linux",
            "Cloud (AWS/GCP/Azure)",
            "Monitoring",
        ],
    ),
    (
        "Data Scientist",
        &[
            "Python",
            "Machine Learning",
            "SQL",
            "Statistics",
            "Data Visualization",
            "TensorFlow",
        ],
    ),
];

pub fn expected_skills(role: &str) -> &'static [&'static str] {
    ROLE_SKILLS
        .iter()
        .find(|(name, _)| *name == role)
        .map(|(_, skills)| *skills)
        .unwrap_or(&[])
}

/// Lowercases and trims declared skill labels for matching.
pub(crate) fn normalize_declared(skills: &[String]) -> Vec<String> {
    skills
        .iter()
        .map(|skill| skill.to_lowercase().trim().to_string())
        .collect()
}

/// Bidirectional substring match: a requirement counts as covered when any
/// declared skill contains it or is contained by it. Both sides must already
/// be lowercased; the asymmetry ("js" matches "JavaScript" and vice versa)
/// is intentional.
pub(crate) fn matches_any(declared_lower: &[String], required_lower: &str) -> bool {
    declared_lower
        .iter()
        .any(|skill| skill.contains(required_lower) || required_lower.contains(skill.as_str()))
}

/// Compares declared skills against the role's expected list. An empty
/// expected list means full coverage by convention.
pub fn detect_skill_gap(role: &str, skills: &[String]) -> SkillGap {
    let required = expected_skills(role);
    if required.is_empty() {
        return SkillGap {
            required: Vec::new(),
            missing: Vec::new(),
            has: skills.to_vec(),
            coverage_percent: 100,
        };
    }

    let declared = normalize_declared(skills);
    let missing: Vec<String> = required
        .iter()
        .filter(|req| !matches_any(&declared, &req.to_lowercase()))
        .map(|req| req.to_string())
        .collect();

    let coverage_percent = (((required.len() - missing.len()) as f64 / required.len() as f64)
        * 100.0)
        .round() as i64;

    SkillGap {
        required: required.iter().map(|req| req.to_string()).collect(),
        missing,
        has: skills.to_vec(),
        coverage_percent,
    }
}

pub struct SkillGapService {
    db: DbPool,
}

impl SkillGapService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// One gap row per employee of the caller's organization, ordered by
    /// name.
    pub fn gaps_for_organization(
        &self,
        principal: &Principal,
    ) -> AppResult<Vec<EmployeeSkillGap>> {
        principal.require_admin()?;

        let conn = self.db.get_connection()?;
        let employees =
            EmployeeRepository::list_by_organization_by_name(&conn, &principal.organization_id)?;

        let mut rows = Vec::with_capacity(employees.len());
        for employee in employees {
            let employee = employee.into_record()?;
            let gap = detect_skill_gap(&employee.role, &employee.skills);
            rows.push(EmployeeSkillGap { employee, gap });
        }

        debug!(
            target: "app::scoring",
            organization_id = %principal.organization_id,
            employees = rows.len(),
            "skill gap report computed"
        );
        Ok(rows)
    }
}
