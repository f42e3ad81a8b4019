use anyhow::Result;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::sync::Arc;
use tracing::error;

use shared::{ChatAccount, User};

/// DbConnection manages database operations
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        // SQLite allows a single writer; one connection keeps units of work
        // serialized at the store, which is the per-group ordering guarantee.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Generate a unique database name for tests
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                group_id INTEGER NOT NULL UNIQUE,
                user_id INTEGER NOT NULL,
                balance REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Index for listing a user's chats
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_chat_accounts_user_id
            ON chat_accounts(user_id);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get the underlying SQLite pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a unit of work
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Roll back a unit of work; a rollback failure is logged and must not
    /// mask the error that caused the abort.
    pub async fn rollback(tx: Transaction<'static, Sqlite>) {
        if let Err(err) = tx.rollback().await {
            error!("rollback failed: {err}");
        }
    }

    /// Look up a user by external id; `Ok(None)` is the distinguished
    /// "not found" outcome.
    pub async fn find_user(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query("SELECT id, user_id, created_at FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.map(|r| user_from_row(&r)))
    }

    /// Insert a user row
    pub async fn insert_user(
        conn: &mut SqliteConnection,
        user_id: i64,
        created_at: &str,
    ) -> Result<User, sqlx::Error> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (user_id, created_at)
            VALUES (?, ?)
            RETURNING id, user_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(created_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(user_from_row(&row))
    }

    /// Look up a chat account by group id; `Ok(None)` is the distinguished
    /// "not found" outcome.
    pub async fn find_chat_account(
        conn: &mut SqliteConnection,
        group_id: i64,
    ) -> Result<Option<ChatAccount>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, group_id, user_id, balance, created_at
            FROM chat_accounts
            WHERE group_id = ?
            "#,
        )
        .bind(group_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(|r| chat_from_row(&r)))
    }

    /// Insert a chat account row with a zero balance
    pub async fn insert_chat_account(
        conn: &mut SqliteConnection,
        group_id: i64,
        user_id: i64,
        created_at: &str,
    ) -> Result<ChatAccount, sqlx::Error> {
        let row = sqlx::query(
            r#"
            INSERT INTO chat_accounts (group_id, user_id, balance, created_at)
            VALUES (?, ?, 0, ?)
            RETURNING id, group_id, user_id, balance, created_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(created_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(chat_from_row(&row))
    }

    /// Apply a delta to a group's balance as an atomic in-place update and
    /// return the new balance. Never read-then-overwrite: concurrent deltas
    /// against the same group must all survive.
    pub async fn add_to_balance(
        conn: &mut SqliteConnection,
        group_id: i64,
        delta: f64,
    ) -> Result<f64, sqlx::Error> {
        let row = sqlx::query(
            r#"
            UPDATE chat_accounts
            SET balance = balance + ?
            WHERE group_id = ?
            RETURNING balance
            "#,
        )
        .bind(delta)
        .bind(group_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(row.get("balance"))
    }

    /// Read a chat account outside any unit of work
    pub async fn get_chat_account(&self, group_id: i64) -> Result<Option<ChatAccount>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, group_id, user_id, balance, created_at
            FROM chat_accounts
            WHERE group_id = ?
            "#,
        )
        .bind(group_id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.map(|r| chat_from_row(&r)))
    }

    /// List a user's chat accounts in insertion order
    pub async fn list_chats_for_user(&self, user_id: i64) -> Result<Vec<ChatAccount>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, group_id, user_id, balance, created_at
            FROM chat_accounts
            WHERE user_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.iter().map(chat_from_row).collect())
    }
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
    }
}

fn chat_from_row(row: &SqliteRow) -> ChatAccount {
    ChatAccount {
        id: row.get("id"),
        group_id: row.get("group_id"),
        user_id: row.get("user_id"),
        balance: row.get("balance"),
        created_at: row.get("created_at"),
    }
}
