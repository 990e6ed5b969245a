//! Postgres-backed store.
//!
//! Usernames are the `users` primary key, so registration races are settled
//! by the unique constraint (SQLSTATE 23505). Message parties reference
//! `users`, so posting to an unknown user fails the foreign key (23503).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use messagely_auth::{Credential, CredentialStore, MessageAccessor, NewCredential, StoreError};
use messagely_core::{
    Message, MessageDetail, MessageId, MessageSummary, Profile, ReadReceipt, UserDetail,
    UserProfile, Username,
};

use crate::directory::{MessageBoard, NewMessage, UserDirectory};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        username      TEXT PRIMARY KEY,
        password      TEXT NOT NULL,
        first_name    TEXT NOT NULL,
        last_name     TEXT NOT NULL,
        phone         TEXT NOT NULL,
        join_at       TIMESTAMPTZ NOT NULL,
        last_login_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id            UUID PRIMARY KEY,
        from_username TEXT NOT NULL REFERENCES users (username),
        to_username   TEXT NOT NULL REFERENCES users (username),
        body          TEXT NOT NULL,
        sent_at       TIMESTAMPTZ NOT NULL,
        read_at       TIMESTAMPTZ
    )
    "#,
];

pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Install the schema if it is not there yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        tracing::info!("postgres schema ready");
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => StoreError::Duplicate,
            Some("23503") => StoreError::NotFound,
            _ => StoreError::Backend(format!(
                "database error in {operation}: {}",
                db_err.message()
            )),
        },
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}

fn decode_err(operation: &str, err: impl core::fmt::Display) -> StoreError {
    StoreError::Backend(format!("failed to decode row in {operation}: {err}"))
}

fn username_at(row: &PgRow, column: &str, operation: &str) -> Result<Username, StoreError> {
    let raw: String = row.try_get(column).map_err(|e| decode_err(operation, e))?;
    Username::parse(raw).map_err(|e| decode_err(operation, e))
}

/// Reads a profile whose columns share `prefix` (e.g. `f_username`).
fn profile_at(row: &PgRow, prefix: &str, operation: &str) -> Result<UserProfile, StoreError> {
    let text = |column: &str| -> Result<String, StoreError> {
        row.try_get::<String, _>(format!("{prefix}{column}").as_str())
            .map_err(|e| decode_err(operation, e))
    };
    Ok(UserProfile {
        username: username_at(row, &format!("{prefix}username"), operation)?,
        first_name: text("first_name")?,
        last_name: text("last_name")?,
        phone: text("phone")?,
    })
}

fn credential_from_row(row: &PgRow) -> Result<Credential, StoreError> {
    let op = "credential";
    let text = |column: &str| -> Result<String, StoreError> {
        row.try_get::<String, _>(column).map_err(|e| decode_err(op, e))
    };
    Ok(Credential {
        username: username_at(row, "username", op)?,
        password_hash: text("password")?,
        profile: Profile {
            first_name: text("first_name")?,
            last_name: text("last_name")?,
            phone: text("phone")?,
        },
        joined_at: row.try_get("join_at").map_err(|e| decode_err(op, e))?,
        last_login_at: row.try_get("last_login_at").map_err(|e| decode_err(op, e))?,
    })
}

fn message_from_row(row: &PgRow) -> Result<Message, StoreError> {
    let op = "message";
    let id: uuid::Uuid = row.try_get("id").map_err(|e| decode_err(op, e))?;
    Ok(Message {
        id: MessageId::from_uuid(id),
        from_username: username_at(row, "from_username", op)?,
        to_username: username_at(row, "to_username", op)?,
        body: row.try_get("body").map_err(|e| decode_err(op, e))?,
        sent_at: row.try_get("sent_at").map_err(|e| decode_err(op, e))?,
        read_at: row.try_get("read_at").map_err(|e| decode_err(op, e))?,
    })
}

const CREDENTIAL_COLUMNS: &str =
    "username, password, first_name, last_name, phone, join_at, last_login_at";

#[async_trait]
impl CredentialStore for PostgresStore {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_username", e))?;

        row.as_ref().map(credential_from_row).transpose()
    }

    async fn insert(&self, credential: NewCredential) -> Result<Credential, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, password, first_name, last_name, phone, join_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CREDENTIAL_COLUMNS}
            "#
        ))
        .bind(credential.username.as_str())
        .bind(&credential.password_hash)
        .bind(&credential.profile.first_name)
        .bind(&credential.profile.last_name)
        .bind(&credential.profile.phone)
        .bind(credential.joined_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        credential_from_row(&row)
    }

    async fn touch_last_login(&self, username: &Username) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET last_login_at = now() WHERE username = $1")
            .bind(username.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("touch_last_login", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl MessageAccessor for PostgresStore {
    async fn fetch_by_id(&self, id: MessageId) -> Result<Message, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, from_username, to_username, body, sent_at, read_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_message", e))?
        .ok_or(StoreError::NotFound)?;

        message_from_row(&row)
    }
}

#[async_trait]
impl UserDirectory for PostgresStore {
    async fn all(&self) -> Result<Vec<UserProfile>, StoreError> {
        let rows = sqlx::query(
            "SELECT username, first_name, last_name, phone FROM users ORDER BY username",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;

        rows.iter().map(|row| profile_at(row, "", "list_users")).collect()
    }

    async fn get(&self, username: &Username) -> Result<UserDetail, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_user", e))?
        .ok_or(StoreError::NotFound)?;

        Ok(credential_from_row(&row)?.to_detail())
    }

    async fn messages_from(
        &self,
        username: &Username,
    ) -> Result<Vec<MessageSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.body, m.sent_at, m.read_at,
                   t.username AS t_username, t.first_name AS t_first_name,
                   t.last_name AS t_last_name, t.phone AS t_phone
            FROM messages AS m
            JOIN users AS t ON m.to_username = t.username
            WHERE m.from_username = $1
            ORDER BY m.sent_at, m.id
            "#,
        )
        .bind(username.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("messages_from", e))?;

        rows.iter()
            .map(|row| -> Result<MessageSummary, StoreError> {
                let (id, body, sent_at, read_at) = summary_columns(row, "messages_from")?;
                Ok(MessageSummary {
                    id,
                    body,
                    sent_at,
                    read_at,
                    from_user: None,
                    to_user: Some(profile_at(row, "t_", "messages_from")?),
                })
            })
            .collect()
    }

    async fn messages_to(&self, username: &Username) -> Result<Vec<MessageSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.body, m.sent_at, m.read_at,
                   f.username AS f_username, f.first_name AS f_first_name,
                   f.last_name AS f_last_name, f.phone AS f_phone
            FROM messages AS m
            JOIN users AS f ON m.from_username = f.username
            WHERE m.to_username = $1
            ORDER BY m.sent_at, m.id
            "#,
        )
        .bind(username.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("messages_to", e))?;

        rows.iter()
            .map(|row| -> Result<MessageSummary, StoreError> {
                let (id, body, sent_at, read_at) = summary_columns(row, "messages_to")?;
                Ok(MessageSummary {
                    id,
                    body,
                    sent_at,
                    read_at,
                    from_user: Some(profile_at(row, "f_", "messages_to")?),
                    to_user: None,
                })
            })
            .collect()
    }
}

type SummaryColumns = (MessageId, String, DateTime<Utc>, Option<DateTime<Utc>>);

fn summary_columns(row: &PgRow, op: &str) -> Result<SummaryColumns, StoreError> {
    let id: uuid::Uuid = row.try_get("id").map_err(|e| decode_err(op, e))?;
    Ok((
        MessageId::from_uuid(id),
        row.try_get("body").map_err(|e| decode_err(op, e))?,
        row.try_get("sent_at").map_err(|e| decode_err(op, e))?,
        row.try_get("read_at").map_err(|e| decode_err(op, e))?,
    ))
}

#[async_trait]
impl MessageBoard for PostgresStore {
    async fn create(&self, message: NewMessage) -> Result<Message, StoreError> {
        let id = MessageId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO messages (id, from_username, to_username, body, sent_at)
            VALUES ($1, $2, $3, $4, now())
            RETURNING id, from_username, to_username, body, sent_at, read_at
            "#,
        )
        .bind(*id.as_uuid())
        .bind(message.from_username.as_str())
        .bind(message.to_username.as_str())
        .bind(&message.body)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_message", e))?;

        message_from_row(&row)
    }

    async fn detail(&self, id: MessageId) -> Result<MessageDetail, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT m.id, m.body, m.sent_at, m.read_at,
                   f.username AS f_username, f.first_name AS f_first_name,
                   f.last_name AS f_last_name, f.phone AS f_phone,
                   t.username AS t_username, t.first_name AS t_first_name,
                   t.last_name AS t_last_name, t.phone AS t_phone
            FROM messages AS m
            JOIN users AS f ON m.from_username = f.username
            JOIN users AS t ON m.to_username = t.username
            WHERE m.id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("message_detail", e))?
        .ok_or(StoreError::NotFound)?;

        let (id, body, sent_at, read_at) = summary_columns(&row, "message_detail")?;
        Ok(MessageDetail {
            id,
            body,
            sent_at,
            read_at,
            from_user: profile_at(&row, "f_", "message_detail")?,
            to_user: profile_at(&row, "t_", "message_detail")?,
        })
    }

    async fn mark_read(&self, id: MessageId) -> Result<ReadReceipt, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE messages
            SET read_at = COALESCE(read_at, now())
            WHERE id = $1
            RETURNING id, read_at
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("mark_read", e))?
        .ok_or(StoreError::NotFound)?;

        Ok(ReadReceipt {
            id,
            read_at: row.try_get("read_at").map_err(|e| decode_err("mark_read", e))?,
        })
    }
}
