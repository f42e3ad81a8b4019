use chrono::Utc;
use sqlx::SqliteConnection;
use std::sync::Arc;
use tracing::info;

use crate::storage::DbConnection;
use super::errors::LedgerError;
use shared::{ChatAccount, User};

/// Idempotent provisioning of user and chat-account records.
///
/// Both operations look the record up first and create it only on the
/// distinguished "not found" outcome; any other store failure propagates.
/// Calling either repeatedly with the same id performs no write after the
/// first successful creation.
#[derive(Clone)]
pub struct RegistrationService {
    db: Arc<DbConnection>,
}

impl RegistrationService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    /// Ensure a user record exists for the external account id.
    pub async fn ensure_user(&self, user_id: i64) -> Result<User, LedgerError> {
        let mut tx = self.db.begin().await?;
        match Self::ensure_user_in(&mut *tx, user_id).await {
            Ok(user) => {
                tx.commit().await?;
                Ok(user)
            }
            Err(err) => {
                DbConnection::rollback(tx).await;
                Err(err)
            }
        }
    }

    /// Ensure a chat account exists for the group, provisioning the owning
    /// user first: a join event may be the first time the user is seen.
    pub async fn ensure_chat_account(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<ChatAccount, LedgerError> {
        let mut tx = self.db.begin().await?;
        if let Err(err) = Self::ensure_user_in(&mut *tx, user_id).await {
            DbConnection::rollback(tx).await;
            return Err(err);
        }
        match Self::ensure_chat_in(&mut *tx, group_id, user_id).await {
            Ok(chat) => {
                tx.commit().await?;
                Ok(chat)
            }
            Err(err) => {
                DbConnection::rollback(tx).await;
                Err(err)
            }
        }
    }

    /// Provision a user inside an already-open unit of work.
    pub(crate) async fn ensure_user_in(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<User, LedgerError> {
        if let Some(user) = DbConnection::find_user(conn, user_id).await? {
            return Ok(user);
        }

        let user = DbConnection::insert_user(conn, user_id, &Utc::now().to_rfc3339()).await?;
        info!("registered user {}", user.user_id);
        Ok(user)
    }

    /// Provision a chat account inside an already-open unit of work,
    /// creating it with a zero balance when the group is unseen.
    pub(crate) async fn ensure_chat_in(
        conn: &mut SqliteConnection,
        group_id: i64,
        user_id: i64,
    ) -> Result<ChatAccount, LedgerError> {
        if let Some(chat) = DbConnection::find_chat_account(conn, group_id).await? {
            return Ok(chat);
        }

        let chat =
            DbConnection::insert_chat_account(conn, group_id, user_id, &Utc::now().to_rfc3339())
                .await?;
        info!("registered chat account for group {} (owner {})", group_id, user_id);
        Ok(chat)
    }
}
