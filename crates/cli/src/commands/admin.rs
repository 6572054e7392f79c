//! Admin account helpers.
//!
//! # Usage
//!
//! ```bash
//! # Prompt for the password on stdin
//! atiga admin hash-password
//!
//! # Or pass it directly
//! atiga admin hash-password --password 'correct horse battery staple'
//! ```
//!
//! Put the printed PHC string in `ADMIN_PASSWORD_HASH`.

use std::io::BufRead;

use atiga_storefront::services::auth::{self, AuthError};
use thiserror::Error;

/// Errors from admin helpers.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Failed to read password: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Hash a password with Argon2id and print the result.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or the password is too weak.
pub fn hash_password(password: Option<String>) -> Result<(), AdminError> {
    let password = match password {
        Some(p) => p,
        None => {
            tracing::info!("Enter the admin password, then press Enter:");
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let hash = auth::hash_password(&password)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{hash}");
    }

    Ok(())
}
