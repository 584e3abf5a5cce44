use sqlx::SqlitePool;

use crate::error::BookingError;
use crate::models::User;

/// Partial flag update; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserFlags {
    pub settings: Option<bool>,
    pub authorisation: Option<bool>,
    pub analytics: Option<bool>,
}

/// User-access administration. Every operation is authorised by the
/// `authorisation` flag on the caller's own row; there is no other
/// privilege model.
#[derive(Debug, Clone)]
pub struct UserAdmin {
    db: SqlitePool,
}

impl UserAdmin {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(&self, caller_uid: &str) -> Result<Vec<User>, BookingError> {
        self.require_authorised(caller_uid).await?;
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY email")
            .fetch_all(&self.db)
            .await
            .map_err(BookingError::from_db)
    }

    /// Create (or re-register) an account. New accounts start with every
    /// access flag off; an authorised admin grants them afterwards.
    pub async fn create(
        &self,
        caller_uid: &str,
        uid: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<User, BookingError> {
        self.require_authorised(caller_uid).await?;
        let email = email.trim();
        if uid.trim().is_empty() {
            return Err(BookingError::Validation("User id is required.".into()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(BookingError::Validation(
                "A valid email address is required.".into(),
            ));
        }
        sqlx::query_as::<_, User>(
            "INSERT INTO users (uid, email, name) VALUES (?, ?, ?)
             ON CONFLICT(uid) DO UPDATE SET email = excluded.email, name = excluded.name
             RETURNING *",
        )
        .bind(uid.trim())
        .bind(email)
        .bind(name)
        .fetch_one(&self.db)
        .await
        .map_err(BookingError::from_db)
    }

    pub async fn set_flags(
        &self,
        caller_uid: &str,
        uid: &str,
        flags: UserFlags,
    ) -> Result<User, BookingError> {
        self.require_authorised(caller_uid).await?;
        let current = self.get(uid).await?;
        sqlx::query_as::<_, User>(
            "UPDATE users SET settings = ?, authorisation = ?, analytics = ?
             WHERE uid = ? RETURNING *",
        )
        .bind(flags.settings.unwrap_or(current.settings))
        .bind(flags.authorisation.unwrap_or(current.authorisation))
        .bind(flags.analytics.unwrap_or(current.analytics))
        .bind(uid)
        .fetch_one(&self.db)
        .await
        .map_err(BookingError::from_db)
    }

    pub async fn delete(&self, caller_uid: &str, uid: &str) -> Result<(), BookingError> {
        self.require_authorised(caller_uid).await?;
        let result = sqlx::query("DELETE FROM users WHERE uid = ?")
            .bind(uid)
            .execute(&self.db)
            .await
            .map_err(BookingError::from_db)?;
        if result.rows_affected() == 0 {
            return Err(BookingError::NotFound);
        }
        Ok(())
    }

    async fn get(&self, uid: &str) -> Result<User, BookingError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE uid = ?")
            .bind(uid)
            .fetch_optional(&self.db)
            .await
            .map_err(BookingError::from_db)?
            .ok_or(BookingError::NotFound)
    }

    async fn require_authorised(&self, caller_uid: &str) -> Result<(), BookingError> {
        let authorised: Option<(bool,)> =
            sqlx::query_as("SELECT authorisation FROM users WHERE uid = ?")
                .bind(caller_uid)
                .fetch_optional(&self.db)
                .await
                .map_err(BookingError::from_db)?;
        match authorised {
            Some((true,)) => Ok(()),
            _ => Err(BookingError::Unauthorised),
        }
    }
}
