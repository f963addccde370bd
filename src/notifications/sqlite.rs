//! SQLite-backed notification queue.
//!
//! Pending requests live in the `pending_notifications` table until the reminder
//! daemon pops them with [`SqliteNotificationCenter::take_due`]. Delivery is owned by
//! the daemon itself, so authorization is always granted.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::debug;
use sqlite::{Connection, State};
use std::path::Path;
use tokio::sync::Mutex;

use super::{AuthorizationStatus, NotificationCenter, NotificationRequest};
use crate::core::{AuthorizationError, SchedulingError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS pending_notifications (
        identifier TEXT PRIMARY KEY,
        trigger_at TEXT NOT NULL,
        title TEXT NOT NULL,
        body TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_pending_notifications_trigger
        ON pending_notifications(trigger_at);
";

pub struct SqliteNotificationCenter {
    connection: Mutex<Connection>,
}

impl SqliteNotificationCenter {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SchedulingError> {
        let connection = sqlite::open(path)?;
        connection.execute(SCHEMA)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Remove and return every request due at or before `now`, oldest first
    pub async fn take_due(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<NotificationRequest>, SchedulingError> {
        let connection = self.connection.lock().await;
        take_due_sync(&connection, now)
    }
}

fn take_due_sync(
    connection: &Connection,
    now: NaiveDateTime,
) -> Result<Vec<NotificationRequest>, SchedulingError> {
    let cutoff = now.format(TIMESTAMP_FORMAT).to_string();
    let mut due = Vec::new();

    {
        let mut statement = connection.prepare(
            "SELECT identifier, trigger_at, title, body FROM pending_notifications
             WHERE trigger_at <= ? ORDER BY trigger_at ASC",
        )?;
        statement.bind((1, cutoff.as_str()))?;

        while statement.next()? == State::Row {
            let trigger_raw = statement.read::<String, _>(1)?;
            let trigger_at = NaiveDateTime::parse_from_str(&trigger_raw, TIMESTAMP_FORMAT)
                .map_err(|e| SchedulingError::Unavailable(format!("bad trigger time: {e}")))?;
            due.push(NotificationRequest {
                identifier: statement.read::<String, _>(0)?,
                trigger_at,
                title: statement.read::<String, _>(2)?,
                body: statement.read::<String, _>(3)?,
            });
        }
    }

    let mut delete =
        connection.prepare("DELETE FROM pending_notifications WHERE trigger_at <= ?")?;
    delete.bind((1, cutoff.as_str()))?;
    while delete.next()? != State::Done {}

    Ok(due)
}

fn pending_sync(connection: &Connection) -> Result<Vec<String>, SchedulingError> {
    let mut statement = connection.prepare("SELECT identifier FROM pending_notifications")?;
    let mut identifiers = Vec::new();
    while statement.next()? == State::Row {
        identifiers.push(statement.read::<String, _>(0)?);
    }
    Ok(identifiers)
}

fn schedule_sync(
    connection: &Connection,
    request: &NotificationRequest,
) -> Result<(), SchedulingError> {
    let trigger_at = request.trigger_at.format(TIMESTAMP_FORMAT).to_string();
    let mut statement = connection.prepare(
        "INSERT OR REPLACE INTO pending_notifications (identifier, trigger_at, title, body)
         VALUES (?, ?, ?, ?)",
    )?;
    statement.bind((1, request.identifier.as_str()))?;
    statement.bind((2, trigger_at.as_str()))?;
    statement.bind((3, request.title.as_str()))?;
    statement.bind((4, request.body.as_str()))?;
    while statement.next()? != State::Done {}
    Ok(())
}

fn cancel_sync(connection: &Connection, identifiers: &[String]) -> Result<(), SchedulingError> {
    let mut statement =
        connection.prepare("DELETE FROM pending_notifications WHERE identifier = ?")?;
    for identifier in identifiers {
        statement.reset()?;
        statement.bind((1, identifier.as_str()))?;
        while statement.next()? != State::Done {}
    }
    Ok(())
}

#[async_trait]
impl NotificationCenter for SqliteNotificationCenter {
    async fn request_authorization(&self) -> Result<bool, AuthorizationError> {
        Ok(true)
    }

    async fn authorization_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::Authorized
    }

    async fn pending_requests(&self) -> Result<Vec<String>, SchedulingError> {
        let connection = self.connection.lock().await;
        pending_sync(&connection)
    }

    async fn schedule(&self, request: NotificationRequest) -> Result<(), SchedulingError> {
        let connection = self.connection.lock().await;
        schedule_sync(&connection, &request)?;
        debug!(
            "Queued notification {} for {}",
            request.identifier, request.trigger_at
        );
        Ok(())
    }

    async fn cancel(&self, identifiers: &[String]) -> Result<(), SchedulingError> {
        if identifiers.is_empty() {
            return Ok(());
        }
        let connection = self.connection.lock().await;
        cancel_sync(&connection, identifiers)
    }
}
