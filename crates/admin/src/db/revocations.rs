//! Session revocation for banned and deleted admin accounts.
//!
//! Sessions are opaque rows in `admin.session`, so instead of finding and
//! deleting them, the ban records a cut-off time. Every authenticated request
//! compares it with the session's sign-in time.

use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::RepositoryError;

/// Where session cut-offs are kept.
pub trait SessionRevocations: Send + Sync {
    /// End every session of `user_id` that exists right now.
    fn revoke(&self, user_id: Uuid) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Whether a session of `user_id` started at `signed_in_at` was ended.
    fn is_revoked(
        &self,
        user_id: Uuid,
        signed_in_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

pub struct RevokedAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RevokedAdminRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl SessionRevocations for RevokedAdminRepository<'_> {
    async fn revoke(&self, user_id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO admin.revoked_admins (user_id, revoked_at)
            VALUES ($1, now())
            ON CONFLICT (user_id) DO UPDATE SET revoked_at = excluded.revoked_at
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    async fn is_revoked(
        &self,
        user_id: Uuid,
        signed_in_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let revoked: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM admin.revoked_admins
                WHERE user_id = $1 AND revoked_at >= $2
            )
            ",
        )
        .bind(user_id)
        .bind(signed_in_at)
        .fetch_one(self.pool)
        .await?;
        Ok(revoked)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory cut-offs; `fail` makes every call return an error.
    #[derive(Default)]
    pub(crate) struct FakeRevocations {
        pub revoked: Mutex<HashMap<Uuid, DateTime<Utc>>>,
        pub fail: bool,
    }

    impl FakeRevocations {
        fn check(&self) -> Result<(), RepositoryError> {
            if self.fail {
                return Err(RepositoryError::DataCorruption("offline".to_string()));
            }
            Ok(())
        }
    }

    impl SessionRevocations for FakeRevocations {
        async fn revoke(&self, user_id: Uuid) -> Result<(), RepositoryError> {
            self.check()?;
            self.revoked.lock().unwrap().insert(user_id, Utc::now());
            Ok(())
        }

        async fn is_revoked(
            &self,
            user_id: Uuid,
            signed_in_at: DateTime<Utc>,
        ) -> Result<bool, RepositoryError> {
            self.check()?;
            Ok(self
                .revoked
                .lock()
                .unwrap()
                .get(&user_id)
                .is_some_and(|at| *at >= signed_in_at))
        }
    }

    #[tokio::test]
    async fn test_revocation_only_ends_earlier_sessions() {
        let revocations = FakeRevocations::default();
        let id = Uuid::new_v4();
        let before = Utc::now() - chrono::Duration::hours(1);

        assert!(!revocations.is_revoked(id, before).await.unwrap());
        revocations.revoke(id).await.unwrap();
        assert!(revocations.is_revoked(id, before).await.unwrap());

        let after = Utc::now() + chrono::Duration::seconds(1);
        assert!(!revocations.is_revoked(id, after).await.unwrap());
    }
}
