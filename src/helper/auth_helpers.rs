use crate::helper::form_helpers::NewAccount;
use crate::models::db_operations::users_db_operations::{self, CredentialCheck};
use crate::models::{Role, User};
use crate::DbPool;
use rusqlite::TransactionBehavior;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("You've already signed up with that email, log in instead!")]
    DuplicateEmail,
    #[error("That email does not exist, please try again.")]
    NoSuchUser,
    #[error("Password incorrect, please try again.")]
    WrongPassword,
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl AuthError {
    /// Errors the visitor caused and can fix; the message is safe to show.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, AuthError::DuplicateEmail | AuthError::NoSuchUser | AuthError::WrongPassword)
    }
}

/// Creates the account. The first account on an empty database becomes the administrator.
///
/// The duplicate check, the role decision and the insert share one IMMEDIATE transaction.
pub fn register_user(pool: &DbPool, account: &NewAccount, cost: u32) -> Result<User, AuthError> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if users_db_operations::email_exists(&tx, &account.email)? {
        return Err(AuthError::DuplicateEmail);
    }

    let role = Role::for_new_account(users_db_operations::count_users(&tx)?);
    let user_id = users_db_operations::create_user(&tx, &account.email, &account.name, &account.password, role, cost)
        .map_err(|e| {
            if users_db_operations::is_unique_violation(&e) { AuthError::DuplicateEmail } else { AuthError::Database(e) }
        })?;
    let user = users_db_operations::read_user_by_id(&tx, user_id)?
        .ok_or(AuthError::Database(rusqlite::Error::QueryReturnedNoRows))?;
    tx.commit()?;

    if role == Role::Admin {
        log::info!("First account '{}' registered as administrator.", account.email);
    }
    Ok(user)
}

pub fn login_user(pool: &DbPool, email: &str, password: &str) -> Result<User, AuthError> {
    let conn = pool.get()?;
    match users_db_operations::verify_credentials(&conn, email, password)? {
        CredentialCheck::Verified(user) => Ok(user),
        CredentialCheck::UnknownEmail => Err(AuthError::NoSuchUser),
        CredentialCheck::WrongPassword => {
            log::warn!("Failed login attempt for '{}'.", email);
            Err(AuthError::WrongPassword)
        }
    }
}
