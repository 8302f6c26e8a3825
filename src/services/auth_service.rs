use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info};

use crate::db::repositories::employee_repository::EmployeeRepository;
use crate::db::repositories::organization_repository::{
    OrganizationRepository, OrganizationRow,
};
use crate::db::repositories::parse_datetime;
use crate::db::repositories::session_repository::{SessionRepository, SessionRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::employee::EmployeeRecord;
use crate::models::organization::{OrganizationRecord, OrganizationRegisterInput};
use crate::models::session::{Principal, Role, SessionToken};
use crate::utils::password;

const SESSION_TTL_DAYS: i64 = 7;
const TOKEN_BYTES: usize = 32;

/// Registration, login and session verification for both tiers. Sessions are
/// opaque random tokens stored server-side, so logout is a hard revocation
/// and verification needs no signature handling.
#[derive(Clone)]
pub struct AuthService {
    db: DbPool,
}

impl AuthService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn register_organization(
        &self,
        input: OrganizationRegisterInput,
    ) -> AppResult<(OrganizationRecord, SessionToken)> {
        let name = required_field(&input.name, "name")?;
        let email = required_field(&input.email, "email")?;
        if input.password.is_empty() {
            return Err(AppError::validation("password is required"));
        }

        let conn = self.db.get_connection()?;
        if OrganizationRepository::find_by_email(&conn, &email)?.is_some() {
            return Err(AppError::conflict("that email is already registered"));
        }

        let row = OrganizationRow {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
            password_hash: password::hash_password(&input.password),
            industry: input.industry,
            created_at: Utc::now().to_rfc3339(),
        };
        OrganizationRepository::insert(&conn, &row)?;
        info!(target: "app::auth", organization_id = %row.id, "organization registered");

        let session = self.open_session(&conn, Role::Admin, &row.id, &row.id)?;
        Ok((row.into_record()?, session))
    }

    pub fn login(&self, email: &str, login_password: &str) -> AppResult<(OrganizationRecord, SessionToken)> {
        let conn = self.db.get_connection()?;
        let row = OrganizationRepository::find_by_email(&conn, email)?
            .ok_or_else(AppError::unauthorized)?;
        if !password::verify_password(login_password, &row.password_hash) {
            return Err(AppError::unauthorized());
        }

        let session = self.open_session(&conn, Role::Admin, &row.id, &row.id)?;
        info!(target: "app::auth", organization_id = %row.id, "admin logged in");
        Ok((row.into_record()?, session))
    }

    /// Portal login. Only active employees with a stored credential can
    /// authenticate.
    pub fn login_employee(
        &self,
        email: &str,
        login_password: &str,
    ) -> AppResult<(EmployeeRecord, SessionToken)> {
        let conn = self.db.get_connection()?;
        let row = EmployeeRepository::find_active_by_email(&conn, email)?
            .ok_or_else(AppError::unauthorized)?;
        let stored = row.password_hash.clone().ok_or_else(AppError::unauthorized)?;
        if !password::verify_password(login_password, &stored) {
            return Err(AppError::unauthorized());
        }

        let session =
            self.open_session(&conn, Role::Employee, &row.id, &row.organization_id)?;
        info!(target: "app::auth", employee_id = %row.id, "employee logged in");
        Ok((row.into_record()?, session))
    }

    /// Resolves a token to a Principal. Unknown, corrupt and expired tokens
    /// all come back Unauthorized; expired rows are dropped on the way.
    pub fn verify(&self, token: &str) -> AppResult<Principal> {
        let conn = self.db.get_connection()?;
        let row = SessionRepository::find_by_token(&conn, token)?
            .ok_or_else(AppError::unauthorized)?;

        let expires_at = match parse_datetime(&row.expires_at) {
            Ok(value) => value,
            Err(_) => {
                SessionRepository::delete_by_token(&conn, token)?;
                return Err(AppError::unauthorized());
            }
        };
        if expires_at < Utc::now() {
            SessionRepository::delete_by_token(&conn, token)?;
            debug!(target: "app::auth", "expired session dropped");
            return Err(AppError::unauthorized());
        }

        Ok(Principal {
            principal_id: row.principal_id,
            organization_id: row.organization_id,
            role: Role::parse(&row.role).map_err(|_| AppError::unauthorized())?,
        })
    }

    /// Session-refresh lookup for admin sessions, backing a "who am I"
    /// surface.
    pub fn organization_profile(&self, principal: &Principal) -> AppResult<OrganizationRecord> {
        principal.require_admin()?;
        let conn = self.db.get_connection()?;
        OrganizationRepository::find_by_id(&conn, &principal.organization_id)?
            .ok_or_else(AppError::unauthorized)?
            .into_record()
    }

    /// Employee counterpart. A deactivated or deleted account invalidates
    /// the session even if its token has not expired yet.
    pub fn employee_profile(&self, principal: &Principal) -> AppResult<EmployeeRecord> {
        if principal.role != Role::Employee {
            return Err(AppError::forbidden("employee session required"));
        }
        let conn = self.db.get_connection()?;
        let row = EmployeeRepository::find_by_id(
            &conn,
            &principal.organization_id,
            &principal.principal_id,
        )?
        .ok_or_else(AppError::unauthorized)?;
        if !row.is_active {
            return Err(AppError::unauthorized());
        }
        row.into_record()
    }

    /// Hard revocation; unknown tokens are a no-op so logout is idempotent.
    pub fn logout(&self, token: &str) -> AppResult<()> {
        let conn = self.db.get_connection()?;
        let removed = SessionRepository::delete_by_token(&conn, token)?;
        debug!(target: "app::auth", removed, "logout");
        Ok(())
    }

    /// Drops all expired sessions; returns how many were removed.
    pub fn purge_expired_sessions(&self) -> AppResult<usize> {
        let conn = self.db.get_connection()?;
        SessionRepository::purge_expired(&conn, &Utc::now().to_rfc3339())
    }

    fn open_session(
        &self,
        conn: &rusqlite::Connection,
        role: Role,
        principal_id: &str,
        organization_id: &str,
    ) -> AppResult<SessionToken> {
        let mut raw = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut raw);
        let token = Base64.encode(raw);

        let now = Utc::now();
        let expires_at = now + Duration::days(SESSION_TTL_DAYS);
        SessionRepository::insert(
            conn,
            &SessionRow {
                token: token.clone(),
                role: role.as_str().to_string(),
                principal_id: principal_id.to_string(),
                organization_id: organization_id.to_string(),
                created_at: now.to_rfc3339(),
                expires_at: expires_at.to_rfc3339(),
            },
        )?;

        Ok(SessionToken { token, expires_at })
    }
}

fn required_field(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
