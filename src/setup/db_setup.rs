use crate::DbPool;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

fn prepare_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    // Writers queue on the database lock instead of failing with SQLITE_BUSY.
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

/// Connection pool over the blog database file. Every pooled connection enforces foreign keys
/// and waits up to five seconds for a locked database.
pub fn init_pool(db_path: &Path) -> Result<DbPool, SetupError> {
    let manager = SqliteConnectionManager::file(db_path).with_init(prepare_connection);
    let pool = Pool::builder().build(manager)?;
    let mut conn = pool.get()?;
    setup_blog_db(&mut conn)?;
    Ok(pool)
}

/// A single-connection in-memory pool, used by tests and throwaway runs.
pub fn init_memory_pool() -> Result<DbPool, SetupError> {
    let manager = SqliteConnectionManager::memory().with_init(prepare_connection);
    let pool = Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .build(manager)?;
    let mut conn = pool.get()?;
    setup_blog_db(&mut conn)?;
    Ok(pool)
}

/// Creates the schema if it does not exist yet. Safe to run on every start.
pub fn setup_blog_db(conn: &mut Connection) -> Result<(), SetupError> {
    let tx = conn.transaction()?;
    log::debug!("Creating 'users' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'reader' CHECK(role IN ('admin', 'reader')),
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    log::debug!("Creating 'posts' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            subtitle TEXT NOT NULL,
            date TEXT NOT NULL,
            body TEXT NOT NULL,
            img_url TEXT NOT NULL,
            author_id INTEGER NOT NULL,
            FOREIGN KEY (author_id) REFERENCES users(id)
        )",
        [],
    )?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_posts_date ON posts (date DESC, id)", [])?;

    log::debug!("Creating 'comments' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            post_id INTEGER NOT NULL,
            author_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
            FOREIGN KEY (author_id) REFERENCES users(id)
        )",
        [],
    )?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_comments_post ON comments (post_id, id)", [])?;

    tx.commit()?;
    Ok(())
}
