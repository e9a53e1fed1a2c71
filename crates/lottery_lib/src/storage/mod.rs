use rusqlite::{Connection, Result as SqlResult};
use std::fs::create_dir_all;
use std::path::Path;
use std::time::Duration;

pub mod outbox;
pub mod participants;
pub mod payments;
pub mod rounds;
pub mod schema;
pub mod winners;

pub use schema::create_tables;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Open the lottery database, creating the file and schema if needed.
pub fn open(path: &str, busy_timeout_ms: u64) -> SqlResult<Connection> {
    if let Some(parent) = Path::new(path).parent() {
        let _ = create_dir_all(parent);
    }
    let conn = connect(path, busy_timeout_ms)?;
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    create_tables(&conn)?;
    Ok(conn)
}

/// Per-operation connection to a database `open` has already bootstrapped.
pub fn connect(path: &str, busy_timeout_ms: u64) -> SqlResult<Connection> {
    let conn = Connection::open(path)?;
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(conn)
}

pub fn open_in_memory() -> SqlResult<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", true)?;
    create_tables(&conn)?;
    Ok(conn)
}
