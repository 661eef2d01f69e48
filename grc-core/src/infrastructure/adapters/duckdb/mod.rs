// grc-core/src/infrastructure/adapters/duckdb/mod.rs

mod repositories;
mod schema;
mod stored;

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::{Config, Connection, params_from_iter};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::DomainError;
use crate::domain::notification::Notification;
use crate::error::GrcError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::notifier::Notifier;

use stored::Stored;

/// Every repository port plus the in-app notification inbox, over one DuckDB connection.
#[derive(Clone)]
pub struct DuckDbStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbStore {
    /// Opens (or creates) the database and applies the schema.
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        info!(path = db_path, "DuckDB store ready");
        Ok(store)
    }

    /// Idempotent: every statement is `CREATE TABLE IF NOT EXISTS`.
    pub fn migrate(&self) -> Result<(), InfrastructureError> {
        let conn = self.lock()?;
        conn.execute_batch(schema::SCHEMA)
            .map_err(|e| InfrastructureError::Database(DatabaseError::DuckDB(e)))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::Poisoned)
    }

    fn insert<T: Stored>(&self, item: &T) -> Result<(), GrcError> {
        let conn = self.lock()?;
        insert_row(&conn, item)
    }

    fn update<T: Stored>(&self, item: &T) -> Result<(), GrcError> {
        let conn = self.lock()?;
        update_row(&conn, item)
    }

    fn get<T: Stored>(&self, id: Uuid) -> Result<Option<T>, GrcError> {
        let tombstone = if T::SOFT_DELETE {
            " AND deleted_at IS NULL"
        } else {
            ""
        };
        let sql = format!("SELECT body FROM {} WHERE id = ?{}", T::TABLE, tombstone);
        let conn = self.lock()?;
        Ok(select_bodies(&conn, &sql, &[text(id)])?.into_iter().next())
    }

    fn select<T: Stored>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>, GrcError> {
        let conn = self.lock()?;
        select_bodies(&conn, sql, params)
    }

    fn count(&self, sql: &str, params: &[Value]) -> Result<u64, GrcError> {
        let conn = self.lock()?;
        count_rows(&conn, sql, params)
    }

    /// Inbox of a user, newest first.
    #[instrument(skip(self))]
    pub fn notifications_for(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>, GrcError> {
        let filter = if unread_only { " AND is_read = false" } else { "" };
        let sql = format!(
            "SELECT body FROM notifications WHERE user_id = ?{} ORDER BY created_at DESC",
            filter
        );
        self.select(&sql, &[text(user_id)])
    }

    pub fn mark_notification_read(&self, id: Uuid) -> Result<(), GrcError> {
        let mut notification: Notification = self
            .get(id)?
            .ok_or_else(|| DomainError::not_found("Notification", id))?;
        notification.read = true;
        self.update(&notification)
    }
}

/// In-app delivery: the notification lands in the recipient's inbox table.
#[async_trait]
impl Notifier for DuckDbStore {
    async fn notify(&self, notification: &Notification) -> Result<(), GrcError> {
        debug!(user = %notification.user_id, title = %notification.title, "Storing notification");
        self.insert(notification)
    }
}

pub(crate) fn text(value: impl ToString) -> Value {
    Value::Text(value.to_string())
}

fn insert_row<T: Stored>(conn: &Connection, item: &T) -> Result<(), GrcError> {
    let columns = item.columns();
    let mut names = vec!["id"];
    names.extend(columns.iter().map(|(name, _)| *name));
    names.push("body");

    let mut values = vec![text(item.id())];
    values.extend(columns.into_iter().map(|(_, value)| value));
    values.push(Value::Text(serde_json::to_string(item)?));

    let placeholders = vec!["?"; names.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        names.join(", "),
        placeholders
    );
    conn.execute(&sql, params_from_iter(values.iter()))
        .map_err(DatabaseError::DuckDB)?;
    Ok(())
}

fn update_row<T: Stored>(conn: &Connection, item: &T) -> Result<(), GrcError> {
    let columns = item.columns();
    let mut assignments: Vec<String> = columns
        .iter()
        .map(|(name, _)| format!("{} = ?", name))
        .collect();
    assignments.push("body = ?".to_string());

    let mut values: Vec<Value> = columns.into_iter().map(|(_, value)| value).collect();
    values.push(Value::Text(serde_json::to_string(item)?));
    values.push(text(item.id()));

    let sql = format!("UPDATE {} SET {} WHERE id = ?", T::TABLE, assignments.join(", "));
    let changed = conn
        .execute(&sql, params_from_iter(values.iter()))
        .map_err(DatabaseError::DuckDB)?;
    if changed == 0 {
        return Err(DomainError::not_found(T::ENTITY, item.id()).into());
    }
    Ok(())
}

fn select_bodies<T: Stored>(conn: &Connection, sql: &str, params: &[Value]) -> Result<Vec<T>, GrcError> {
    let mut stmt = conn.prepare(sql).map_err(DatabaseError::DuckDB)?;
    let bodies = stmt
        .query_map(params_from_iter(params.iter()), |row| row.get::<_, String>(0))
        .map_err(DatabaseError::DuckDB)?
        .collect::<Result<Vec<String>, _>>()
        .map_err(DatabaseError::DuckDB)?;

    bodies
        .iter()
        .map(|body| {
            serde_json::from_str(body).map_err(|e| {
                GrcError::from(DatabaseError::CorruptRow {
                    table: T::TABLE,
                    reason: e.to_string(),
                })
            })
        })
        .collect()
}

fn count_rows(conn: &Connection, sql: &str, params: &[Value]) -> Result<u64, GrcError> {
    let n: i64 = conn
        .query_row(sql, params_from_iter(params.iter()), |row| row.get(0))
        .map_err(DatabaseError::DuckDB)?;
    Ok(n.max(0) as u64)
}
