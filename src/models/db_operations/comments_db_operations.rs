use crate::helper::avatar_helpers;
use crate::models::db_operations::posts_db_operations::{self, DbError};
use crate::models::Comment;
use chrono::Utc;
use rusqlite::{params, Connection};

pub fn create_comment(conn: &Connection, post_id: i64, author_id: i64, text: &str) -> Result<i64, DbError> {
    if !posts_db_operations::post_exists(conn, post_id)? {
        return Err(DbError::NotFound(format!("post {}", post_id)));
    }
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO comments (text, post_id, author_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![text, post_id, author_id, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The thread under a post, oldest comment first, each with its author's Gravatar.
pub fn read_comments_for_post(conn: &Connection, post_id: i64) -> Result<Vec<Comment>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.text, c.post_id, c.author_id, u.name, u.email, c.created_at
         FROM comments c JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1 ORDER BY c.id ASC",
    )?;
    let rows = stmt.query_map([post_id], |row| {
        Ok(Comment {
            id: row.get(0)?,
            text: row.get(1)?,
            post_id: row.get(2)?,
            author_id: row.get(3)?,
            author_name: row.get(4)?,
            author_avatar_url: avatar_helpers::gravatar_url(&row.get::<_, String>(5)?),
            created_at: row.get(6)?,
        })
    })?;

    let mut comments = Vec::new();
    for comment in rows {
        comments.push(comment?);
    }
    Ok(comments)
}
