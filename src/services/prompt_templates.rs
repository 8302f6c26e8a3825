use crate::models::insight::{EmployeeScore, EmployeeSkillGap, Recommendation};

const PRODUCTIVITY_SAMPLE: usize = 10;
const SKILL_GAP_SAMPLE: usize = 10;
const ASSIGNMENT_SAMPLE: usize = 3;

const STYLE_FOOTER: &str =
    "Keep it professional but conversational. No markdown formatting, just plain text.";

pub fn team_productivity_prompt(rows: &[EmployeeScore]) -> String {
    let summary = rows
        .iter()
        .take(PRODUCTIVITY_SAMPLE)
        .map(|row| {
            format!(
                "{} ({}): score={}, grade={}, completed={}/{}, overdue={}",
                row.employee.name,
                row.employee.role,
                row.result.score,
                row.result.grade.as_str(),
                row.result.stats.completed,
                row.result.stats.total,
                row.result.stats.overdue,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an HR analytics assistant. Based on these employee productivity scores, \
         write a brief team performance summary (3-4 sentences). Be specific, mention names, \
         and give one actionable recommendation.\n\nEmployee Data:\n{summary}\n\n{STYLE_FOOTER}"
    )
}

pub fn skill_gap_prompt(rows: &[EmployeeSkillGap]) -> String {
    let summary = rows
        .iter()
        .take(SKILL_GAP_SAMPLE)
        .map(|row| {
            format!(
                "{} ({}): has=[{}], missing=[{}], coverage={}%",
                row.employee.name,
                row.employee.role,
                row.gap.has.join(", "),
                row.gap.missing.join(", "),
                row.gap.coverage_percent,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an HR analytics assistant. Based on these skill gap results, write a brief \
         summary (3-4 sentences). Highlight the biggest gaps, suggest training priorities, and \
         mention which employees need the most attention.\n\nSkill Data:\n{summary}\n\n{STYLE_FOOTER}"
    )
}

pub fn assignment_prompt(title: &str, recommendations: &[Recommendation]) -> String {
    let top = recommendations
        .iter()
        .take(ASSIGNMENT_SAMPLE)
        .map(|rec| {
            let matched = if rec.matched_skills.is_empty() {
                "none".to_string()
            } else {
                rec.matched_skills.join(", ")
            };
            format!(
                "{} ({}): score={}, skills matched={}, active tasks={}",
                rec.employee.name, rec.employee.role, rec.total_score, matched, rec.active_tasks,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an HR analytics assistant. A new task \"{title}\" needs to be assigned. \
         Based on the ranking below, explain in 2-3 sentences why the top candidate is the \
         best fit and any concerns about the others.\n\nTop Candidates:\n{top}\n\n{STYLE_FOOTER}"
    )
}
