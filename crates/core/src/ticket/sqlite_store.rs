//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::{parse_timestamp, PublicIdGenerator, Ticket, TicketError, TicketStore};
use crate::config::PublicIdConfig;

const TICKET_COLUMNS: &str = "ticket_id, public_ticket_id, title, description, category, department, assignee, created_by, status, priority, response_due, due_date, created_at, updated_at";

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
    public_ids: PublicIdGenerator,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path, public_id: PublicIdConfig) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::with_connection(conn, public_id)
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory(public_id: PublicIdConfig) -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::with_connection(conn, public_id)
    }

    fn with_connection(conn: Connection, public_id: PublicIdConfig) -> Result<Self, TicketError> {
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            public_ids: PublicIdGenerator::new(public_id)?,
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                ticket_id INTEGER PRIMARY KEY AUTOINCREMENT,
                public_ticket_id TEXT,
                title TEXT,
                description TEXT,
                category TEXT,
                department TEXT,
                assignee TEXT,
                created_by TEXT,
                status TEXT,
                priority TEXT,
                response_due TEXT,
                due_date TEXT,
                created_at TEXT,
                updated_at TEXT
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_tickets_public_id ON tickets(public_ticket_id);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TicketError> {
        self.conn
            .lock()
            .map_err(|_| TicketError::Database("connection lock poisoned".to_string()))
    }

    fn generate_public_id(&self, conn: &Connection) -> Result<String, TicketError> {
        let stem = self.public_ids.stem();

        let mut stmt = conn
            .prepare(
                "SELECT public_ticket_id FROM tickets WHERE substr(public_ticket_id, 1, length(?1)) = ?1",
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let existing = stmt
            .query_map(params![stem], |row| row.get::<_, String>(0))
            .map_err(|e| TicketError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(self
            .public_ids
            .next_from(existing.iter().map(String::as_str)))
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let timestamp = |idx: usize| -> rusqlite::Result<Option<DateTime<Utc>>> {
            Ok(row
                .get::<_, Option<String>>(idx)?
                .as_deref()
                .and_then(parse_timestamp))
        };

        Ok(Ticket {
            ticket_id: row.get(0)?,
            public_ticket_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            category: row.get(4)?,
            department: row.get(5)?,
            assignee: row.get(6)?,
            created_by: row.get(7)?,
            status: row.get(8)?,
            priority: row.get(9)?,
            response_due: timestamp(10)?,
            due_date: timestamp(11)?,
            created_at: timestamp(12)?,
            updated_at: timestamp(13)?,
        })
    }
}

fn to_text(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|dt| dt.to_rfc3339())
}

impl TicketStore for SqliteTicketStore {
    fn list_all(&self) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.lock()?;

        let sql = format!("SELECT {} FROM tickets ORDER BY ticket_id", TICKET_COLUMNS);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            let ticket = row_result.map_err(|e| TicketError::Database(e.to_string()))?;
            tickets.push(ticket);
        }

        Ok(tickets)
    }

    fn insert(&self, mut ticket: Ticket) -> Result<Ticket, TicketError> {
        let conn = self.lock()?;

        if ticket.needs_public_id() {
            ticket.public_ticket_id = Some(self.generate_public_id(&conn)?);
        }

        let now = Utc::now();
        ticket.created_at = ticket.created_at.or(Some(now));
        ticket.updated_at = ticket.updated_at.or(Some(now));

        conn.execute(
            "INSERT INTO tickets (public_ticket_id, title, description, category, department, assignee, created_by, status, priority, response_due, due_date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                ticket.public_ticket_id,
                ticket.title,
                ticket.description,
                ticket.category,
                ticket.department,
                ticket.assignee,
                ticket.created_by,
                ticket.status,
                ticket.priority,
                to_text(ticket.response_due),
                to_text(ticket.due_date),
                to_text(ticket.created_at),
                to_text(ticket.updated_at),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        ticket.ticket_id = conn.last_insert_rowid();
        debug!(
            ticket_id = ticket.ticket_id,
            public_ticket_id = ?ticket.public_ticket_id,
            "Inserted ticket"
        );

        Ok(ticket)
    }

    fn update(&self, mut ticket: Ticket) -> Result<Ticket, TicketError> {
        if ticket.ticket_id <= 0 {
            return Err(TicketError::InvalidId(ticket.ticket_id));
        }

        let conn = self.lock()?;

        ticket.updated_at = ticket.updated_at.or_else(|| Some(Utc::now()));

        // A blank or absent public id keeps the stored one
        let stored_public_id = conn
            .query_row(
                "UPDATE tickets SET public_ticket_id = COALESCE(NULLIF(TRIM(?), ''), public_ticket_id), title = ?, description = ?, category = ?, department = ?, assignee = ?, created_by = ?, status = ?, priority = ?, response_due = ?, due_date = ?, updated_at = ? WHERE ticket_id = ? RETURNING public_ticket_id",
                params![
                    ticket.public_ticket_id,
                    ticket.title,
                    ticket.description,
                    ticket.category,
                    ticket.department,
                    ticket.assignee,
                    ticket.created_by,
                    ticket.status,
                    ticket.priority,
                    to_text(ticket.response_due),
                    to_text(ticket.due_date),
                    to_text(ticket.updated_at),
                    ticket.ticket_id,
                ],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        match stored_public_id {
            Some(public_id) => ticket.public_ticket_id = public_id,
            None => warn!(ticket_id = ticket.ticket_id, "Update matched no ticket"),
        }

        Ok(ticket)
    }

    fn delete(&self, ticket_id: i64) -> Result<usize, TicketError> {
        let conn = self.lock()?;

        let removed = conn
            .execute("DELETE FROM tickets WHERE ticket_id = ?", params![ticket_id])
            .map_err(|e| TicketError::Database(e.to_string()))?;

        if removed == 0 {
            debug!(ticket_id, "Delete matched no ticket");
        }

        Ok(removed)
    }

    fn count(&self) -> Result<usize, TicketError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))?;
        Ok(count as usize)
    }

    fn next_public_id(&self) -> Result<String, TicketError> {
        let conn = self.lock()?;
        self.generate_public_id(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn create_test_store() -> SqliteTicketStore {
        SqliteTicketStore::in_memory(PublicIdConfig::default()).unwrap()
    }

    fn create_test_ticket(title: &str) -> Ticket {
        Ticket {
            title: Some(title.to_string()),
            description: Some("Cannot reach the shared drive".to_string()),
            category: Some("Network".to_string()),
            department: Some("Finance".to_string()),
            created_by: Some("alice".to_string()),
            status: Some("Open".to_string()),
            priority: Some("High".to_string()),
            ..Ticket::default()
        }
    }

    #[test]
    fn test_insert_assigns_ids_and_timestamps() {
        let store = create_test_store();

        let ticket = store.insert(create_test_ticket("Drive offline")).unwrap();

        assert!(ticket.ticket_id > 0);
        assert_eq!(ticket.public_ticket_id.as_deref(), Some("NET-1001"));
        assert!(ticket.created_at.is_some());
        assert!(ticket.updated_at.is_some());
        assert_eq!(ticket.title.as_deref(), Some("Drive offline"));
    }

    #[test]
    fn test_insert_ignores_caller_ticket_id() {
        let store = create_test_store();

        let mut request = create_test_ticket("Drive offline");
        request.ticket_id = 999;
        let ticket = store.insert(request).unwrap();

        assert_eq!(ticket.ticket_id, 1);
    }

    #[test]
    fn test_insert_ids_unique_and_positive() {
        let store = create_test_store();

        let ids: HashSet<i64> = (0..10)
            .map(|i| store.insert(create_test_ticket(&format!("t{}", i))).unwrap().ticket_id)
            .collect();

        assert_eq!(ids.len(), 10);
        assert!(ids.iter().all(|id| *id > 0));
    }

    #[test]
    fn test_sequential_public_ids_increase() {
        let store = create_test_store();

        let public_ids: Vec<String> = (0..3)
            .map(|_| {
                store
                    .insert(create_test_ticket("x"))
                    .unwrap()
                    .public_ticket_id
                    .unwrap()
            })
            .collect();

        assert_eq!(public_ids, vec!["NET-1001", "NET-1002", "NET-1003"]);
    }

    #[test]
    fn test_caller_public_id_is_kept_and_continues_sequence() {
        let store = create_test_store();

        let mut request = create_test_ticket("Imported");
        request.public_ticket_id = Some("NET-2000".to_string());
        let imported = store.insert(request).unwrap();
        assert_eq!(imported.public_ticket_id.as_deref(), Some("NET-2000"));

        let next = store.insert(create_test_ticket("New")).unwrap();
        assert_eq!(next.public_ticket_id.as_deref(), Some("NET-2001"));
        assert_eq!(store.next_public_id().unwrap(), "NET-2002");
    }

    #[test]
    fn test_duplicate_public_id_is_database_error() {
        let store = create_test_store();

        let mut first = create_test_ticket("a");
        first.public_ticket_id = Some("NET-1001".to_string());
        store.insert(first.clone()).unwrap();

        let result = store.insert(first);
        assert!(matches!(result, Err(TicketError::Database(_))));
    }

    #[test]
    fn test_insert_keeps_supplied_timestamps() {
        let store = create_test_store();
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let mut request = create_test_ticket("Old");
        request.created_at = Some(created);
        request.due_date = Some(created);
        let ticket = store.insert(request).unwrap();

        let stored = store.list_all().unwrap().remove(0);
        assert_eq!(stored.created_at, Some(created));
        assert_eq!(stored.due_date, Some(created));
        assert_eq!(stored.ticket_id, ticket.ticket_id);
    }

    #[test]
    fn test_list_all_orders_by_id() {
        let store = create_test_store();
        for title in ["first", "second", "third"] {
            store.insert(create_test_ticket(title)).unwrap();
        }

        let tickets = store.list_all().unwrap();
        let ids: Vec<i64> = tickets.iter().map(|t| t.ticket_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(tickets[0].title.as_deref(), Some("first"));
    }

    #[test]
    fn test_update_overwrites_fields_but_not_created_at() {
        let store = create_test_store();
        let inserted = store.insert(create_test_ticket("Drive offline")).unwrap();

        let mut change = inserted.clone();
        change.status = Some("Closed".to_string());
        change.assignee = None;
        change.created_at = None;
        change.updated_at = None;
        let updated = store.update(change).unwrap();
        assert!(updated.updated_at.is_some());

        let stored = store.list_all().unwrap().remove(0);
        assert_eq!(stored.status.as_deref(), Some("Closed"));
        assert_eq!(stored.assignee, None);
        assert_eq!(stored.created_at, inserted.created_at);
    }

    #[test]
    fn test_update_requires_positive_id() {
        let store = create_test_store();
        let result = store.update(create_test_ticket("no id"));
        assert!(matches!(result, Err(TicketError::InvalidId(0))));
    }

    #[test]
    fn test_update_nonexistent_ticket_succeeds() {
        let store = create_test_store();

        let mut ghost = create_test_ticket("ghost");
        ghost.ticket_id = 42;
        let result = store.update(ghost).unwrap();

        assert_eq!(result.ticket_id, 42);
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_update_with_blank_public_id_keeps_stored_one() {
        let store = create_test_store();
        let first = store.insert(create_test_ticket("first")).unwrap();
        let second = store.insert(create_test_ticket("second")).unwrap();

        for (inserted, blank) in [(&first, Some("")), (&second, Some("  "))] {
            let mut change = inserted.clone();
            change.public_ticket_id = blank.map(str::to_string);
            change.status = Some("Closed".to_string());
            let updated = store.update(change).unwrap();
            assert_eq!(updated.public_ticket_id, inserted.public_ticket_id);
        }

        let mut absent = first.clone();
        absent.public_ticket_id = None;
        store.update(absent).unwrap();

        let stored = store.list_all().unwrap();
        assert_eq!(stored[0].public_ticket_id.as_deref(), Some("NET-1001"));
        assert_eq!(stored[1].public_ticket_id.as_deref(), Some("NET-1002"));
        assert_eq!(stored[1].status.as_deref(), Some("Closed"));
    }

    #[test]
    fn test_update_can_replace_public_id() {
        let store = create_test_store();
        let inserted = store.insert(create_test_ticket("rename")).unwrap();

        let mut change = inserted.clone();
        change.public_ticket_id = Some("NET-3000".to_string());
        store.update(change).unwrap();

        let stored = store.list_all().unwrap().remove(0);
        assert_eq!(stored.public_ticket_id.as_deref(), Some("NET-3000"));
        assert_eq!(store.next_public_id().unwrap(), "NET-3001");
    }

    #[test]
    fn test_count_tracks_inserts_and_deletes() {
        let store = create_test_store();
        assert_eq!(store.count().unwrap(), 0);

        let ticket = store.insert(create_test_ticket("a")).unwrap();
        store.insert(create_test_ticket("b")).unwrap();
        assert_eq!(store.count().unwrap(), 2);

        store.delete(ticket.ticket_id).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_delete_ticket() {
        let store = create_test_store();
        let ticket = store.insert(create_test_ticket("bye")).unwrap();

        assert_eq!(store.delete(ticket.ticket_id).unwrap(), 1);
        assert!(store.list_all().unwrap().is_empty());
        assert_eq!(store.delete(ticket.ticket_id).unwrap(), 0);
    }

    #[test]
    fn test_custom_public_id_scheme() {
        let store = SqliteTicketStore::in_memory(PublicIdConfig {
            prefix: "OPS".to_string(),
            separator: "_".to_string(),
            start_number: 1,
        })
        .unwrap();

        // "_" is a LIKE wildcard; the prefix test must stay literal
        let mut lookalike = create_test_ticket("lookalike");
        lookalike.public_ticket_id = Some("OPSx50".to_string());
        store.insert(lookalike).unwrap();

        let ticket = store.insert(create_test_ticket("x")).unwrap();
        assert_eq!(ticket.public_ticket_id.as_deref(), Some("OPS_1"));
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("tickets.db");

        let ticket_id = {
            let store = SqliteTicketStore::new(&db_path, PublicIdConfig::default()).unwrap();
            store.insert(create_test_ticket("persist")).unwrap().ticket_id
        };

        assert!(db_path.exists());

        let reopened = SqliteTicketStore::new(&db_path, PublicIdConfig::default()).unwrap();
        let tickets = reopened.list_all().unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].ticket_id, ticket_id);
        assert_eq!(reopened.next_public_id().unwrap(), "NET-1002");
    }
}
