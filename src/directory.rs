//! User directory: account creation and credential verification.
//!
//! Thin by design. The issue core treats this as an opaque service; the only
//! contract is that credentials are stored as digests and never round-trip
//! in cleartext.

use crate::error::{Result, TicketsError};
use crate::model::User;
use crate::storage::SqliteStore;
use crate::validation;
use sha2::{Digest, Sha256};

/// Create an account.
///
/// The password is stored as a salted SHA-256 digest, salted with the email
/// so equal passwords under different accounts produce different digests.
///
/// # Errors
///
/// Validation errors for a malformed email or short password; `Uniqueness`
/// when the email is already registered.
pub fn register_user(store: &mut SqliteStore, email: &str, password: &str) -> Result<User> {
    validation::validate_email(email)?;
    validation::validate_password(password)?;

    let user = store.insert_user(email, &hash_password(email, password))?;
    tracing::info!(user_id = user.id, "user registered");
    Ok(user)
}

/// Verify credentials and return the account.
///
/// # Errors
///
/// `InvalidCredentials` for both an unknown email and a wrong password, so
/// callers cannot probe which accounts exist.
pub fn login_user(store: &SqliteStore, email: &str, password: &str) -> Result<User> {
    let Some(user) = store.get_user_by_email(email)? else {
        return Err(TicketsError::InvalidCredentials);
    };

    if user.password_hash != hash_password(email, password) {
        return Err(TicketsError::InvalidCredentials);
    }

    Ok(user)
}

fn hash_password(email: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update([0]);
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
