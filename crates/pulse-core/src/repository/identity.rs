use crate::error::CoreError;
use crate::models::Identity;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use tracing::{debug, info};

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl super::IdentityRepository for SqliteRepository {
    async fn verify_identity(&self, email: &str) -> Result<Option<Identity>, CoreError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }
        let identity: Option<Identity> =
            sqlx::query_as("SELECT email, name, role FROM users WHERE email = $1")
                .bind(&email)
                .fetch_optional(self.pool())
                .await?;
        debug!(%email, found = identity.is_some(), "verify_identity");
        Ok(identity)
    }

    async fn register_user(&self, caller: Option<&Identity>, user: Identity) -> Result<Identity, CoreError> {
        let email = normalize_email(&user.email);
        if !email.contains('@') {
            return Err(CoreError::Validation(format!("'{}' is not an email address", user.email)));
        }
        let name = user.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::validation("user name is required"));
        }

        let mut tx = self.pool().begin().await?;
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        // The first user bootstraps the store; after that only admins register.
        if existing > 0 && !caller.map_or(false, Identity::is_admin) {
            return Err(CoreError::denied("only admins can register users"));
        }

        let identity = Identity { email, name, role: user.role };
        sqlx::query("INSERT INTO users (email, name, role) VALUES ($1, $2, $3)")
            .bind(&identity.email)
            .bind(&identity.name)
            .bind(identity.role)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    CoreError::Validation(format!("user {} already exists", identity.email))
                }
                other => CoreError::Database(other),
            })?;
        tx.commit().await?;

        info!(email = %identity.email, role = %identity.role, "user registered");
        Ok(identity)
    }
}
