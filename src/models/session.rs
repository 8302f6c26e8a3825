use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            other => Err(AppError::validation(format!(
                "role must be admin or employee (got {other:?})"
            ))),
        }
    }
}

/// A verified caller. Both ids are always present: for admins the principal
/// id is the organization id itself, for employees it is their employee id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub principal_id: String,
    pub organization_id: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("admin access required"))
        }
    }

    /// The scoping predicate every task query runs under: admins see the
    /// whole organization, employees only rows assigned to them.
    pub fn task_scope(&self) -> TaskScope {
        TaskScope {
            organization_id: self.organization_id.clone(),
            employee_id: match self.role {
                Role::Admin => None,
                Role::Employee => Some(self.principal_id.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskScope {
    pub organization_id: String,
    pub employee_id: Option<String>,
}

/// Opaque server-side session handle returned by login operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
