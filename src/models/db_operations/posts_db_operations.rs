use crate::models::{Post, PostDraft};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Item not found in database: {0}")]
    NotFound(String),
}

const POST_SELECT: &str = "SELECT p.id, p.title, p.subtitle, p.date, p.body, p.img_url, p.author_id, u.name
     FROM posts p JOIN users u ON u.id = p.author_id";

fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        subtitle: row.get(2)?,
        date: row.get(3)?,
        body: row.get(4)?,
        img_url: row.get(5)?,
        author_id: row.get(6)?,
        author_name: row.get(7)?,
    })
}

pub fn create_post(conn: &Connection, draft: &PostDraft, author_id: i64) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO posts (title, subtitle, date, body, img_url, author_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![draft.title, draft.subtitle, draft.date, draft.body, draft.img_url, author_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_post(conn: &Connection, post_id: i64) -> Result<Post, DbError> {
    conn.query_row(&format!("{} WHERE p.id = ?1", POST_SELECT), [post_id], post_from_row)
        .optional()?
        .ok_or_else(|| DbError::NotFound(format!("post {}", post_id)))
}

pub fn post_exists(conn: &Connection, post_id: i64) -> Result<bool, DbError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
        [post_id],
        |row| row.get(0),
    )?)
}

/// All posts, newest date first. Posts sharing a date keep insertion order.
pub fn read_all_posts(conn: &Connection) -> Result<Vec<Post>, DbError> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY p.date DESC, p.id ASC", POST_SELECT))?;
    let rows = stmt.query_map([], post_from_row)?;

    let mut posts = Vec::new();
    for post in rows {
        posts.push(post?);
    }
    Ok(posts)
}

/// Overwrites every editable field in one statement; the editor becomes the author.
pub fn update_post(conn: &Connection, post_id: i64, draft: &PostDraft, author_id: i64) -> Result<(), DbError> {
    let updated = conn.execute(
        "UPDATE posts SET title = ?1, subtitle = ?2, date = ?3, body = ?4, img_url = ?5, author_id = ?6 WHERE id = ?7",
        params![draft.title, draft.subtitle, draft.date, draft.body, draft.img_url, author_id, post_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("post {}", post_id)));
    }
    Ok(())
}

/// Deletes a post together with its comment thread.
pub fn delete_post(conn: &mut Connection, post_id: i64) -> Result<(), DbError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM comments WHERE post_id = ?1", [post_id])?;
    let deleted = tx.execute("DELETE FROM posts WHERE id = ?1", [post_id])?;
    if deleted == 0 {
        // Dropping the transaction rolls it back.
        return Err(DbError::NotFound(format!("post {}", post_id)));
    }
    tx.commit()?;
    Ok(())
}
