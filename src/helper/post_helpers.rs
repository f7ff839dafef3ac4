use crate::models::db_operations::comments_db_operations;
use crate::models::db_operations::posts_db_operations::{self, DbError};
use crate::models::{Comment, Post, PostDraft};
use crate::DbPool;

pub fn fetch_all_posts(pool: &DbPool) -> Result<Vec<Post>, DbError> {
    let conn = pool.get()?;
    posts_db_operations::read_all_posts(&conn)
}

pub fn fetch_post(pool: &DbPool, post_id: i64) -> Result<Post, DbError> {
    let conn = pool.get()?;
    posts_db_operations::read_post(&conn, post_id)
}

/// A post and its comment thread, read over one connection.
pub fn fetch_post_with_comments(pool: &DbPool, post_id: i64) -> Result<(Post, Vec<Comment>), DbError> {
    let conn = pool.get()?;
    let post = posts_db_operations::read_post(&conn, post_id)?;
    let comments = comments_db_operations::read_comments_for_post(&conn, post_id)?;
    Ok((post, comments))
}

pub fn ensure_post_exists(pool: &DbPool, post_id: i64) -> Result<(), DbError> {
    let conn = pool.get()?;
    if posts_db_operations::post_exists(&conn, post_id)? {
        Ok(())
    } else {
        Err(DbError::NotFound(format!("post {}", post_id)))
    }
}

pub fn add_comment(pool: &DbPool, post_id: i64, author_id: i64, text: &str) -> Result<i64, DbError> {
    let conn = pool.get()?;
    comments_db_operations::create_comment(&conn, post_id, author_id, text)
}

pub fn create_post(pool: &DbPool, draft: &PostDraft, author_id: i64) -> Result<i64, DbError> {
    let conn = pool.get()?;
    posts_db_operations::create_post(&conn, draft, author_id)
}

pub fn update_post(pool: &DbPool, post_id: i64, draft: &PostDraft, editor_id: i64) -> Result<(), DbError> {
    let conn = pool.get()?;
    posts_db_operations::update_post(&conn, post_id, draft, editor_id)
}

pub fn delete_post(pool: &DbPool, post_id: i64) -> Result<(), DbError> {
    let mut conn = pool.get()?;
    posts_db_operations::delete_post(&mut conn, post_id)
}
