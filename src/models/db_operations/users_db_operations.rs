use crate::models::{Role, User};
use bcrypt::{hash, verify, BcryptError};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Error as RusqliteError, Result as RusqliteResult, Row};

const USER_COLUMNS: &str = "id, email, name, role, created_at";

/// Outcome of checking an email/password pair against the stored hash.
#[derive(Debug)]
pub enum CredentialCheck {
    Verified(User),
    UnknownEmail,
    WrongPassword,
}

fn bcrypt_to_rusqlite_error(e: BcryptError) -> RusqliteError {
    RusqliteError::ToSqlConversionFailure(Box::new(e))
}

fn user_from_row(row: &Row) -> RusqliteResult<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Emails are compared case-insensitively, so they are stored trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn create_user(
    conn: &Connection,
    email: &str,
    name: &str,
    password: &str,
    role: Role,
    cost: u32,
) -> Result<i64, RusqliteError> {
    let hashed_password = hash(password, cost).map_err(bcrypt_to_rusqlite_error)?;
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO users (email, password_hash, name, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![normalize_email(email), hashed_password, name, role, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// True when the error is a UNIQUE/constraint failure, e.g. a duplicate email.
pub fn is_unique_violation(err: &RusqliteError) -> bool {
    matches!(err, RusqliteError::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation)
}

pub fn count_users(conn: &Connection) -> RusqliteResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}

pub fn email_exists(conn: &Connection, email: &str) -> RusqliteResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        [normalize_email(email)],
        |row| row.get(0),
    )
}

pub fn read_user_by_email(conn: &Connection, email: &str) -> RusqliteResult<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
        [normalize_email(email)],
        user_from_row,
    )
    .optional()
}

pub fn read_user_by_id(conn: &Connection, user_id: i64) -> RusqliteResult<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        [user_id],
        user_from_row,
    )
    .optional()
}

pub fn read_users_by_role(conn: &Connection, role: Role) -> Result<Vec<User>, RusqliteError> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM users WHERE role = ?1 ORDER BY id", USER_COLUMNS))?;
    let user_iter = stmt.query_map(params![role], user_from_row)?;

    let mut users = Vec::new();
    for user in user_iter {
        users.push(user?);
    }
    Ok(users)
}

pub fn verify_credentials(
    conn: &Connection,
    email: &str,
    password: &str,
) -> Result<CredentialCheck, RusqliteError> {
    let res: Option<(User, String)> = conn
        .query_row(
            &format!("SELECT {}, password_hash FROM users WHERE email = ?1", USER_COLUMNS),
            [normalize_email(email)],
            |row| Ok((user_from_row(row)?, row.get(5)?)),
        )
        .optional()?;

    match res {
        None => Ok(CredentialCheck::UnknownEmail),
        // A malformed stored hash is treated as a mismatch.
        Some((user, hash)) if verify(password, &hash).unwrap_or(false) => Ok(CredentialCheck::Verified(user)),
        Some(_) => Ok(CredentialCheck::WrongPassword),
    }
}

pub fn update_password(conn: &Connection, email: &str, new_password: &str, cost: u32) -> Result<usize, RusqliteError> {
    let hashed_password = hash(new_password, cost).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE email = ?2",
        params![hashed_password, normalize_email(email)],
    )
}

pub fn update_role(conn: &Connection, email: &str, role: Role) -> Result<usize, RusqliteError> {
    conn.execute(
        "UPDATE users SET role = ?1 WHERE email = ?2",
        params![role, normalize_email(email)],
    )
}
