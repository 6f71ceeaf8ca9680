/// Password hashing module using Argon2id
///
/// Account passwords are stored as PHC strings produced by Argon2id. The
/// parameters follow the OWASP baseline for Argon2id (19 MiB, 2 passes,
/// 1 lane), which keeps registration and login fast enough to run on every
/// request thread while staying memory-hard.
///
/// # Example
///
/// ```
/// use bugboard_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse battery")?;
///
/// assert!(verify_password("correct horse battery", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Memory cost in KiB
const M_COST: u32 = 19 * 1024;
/// Number of passes
const T_COST: u32 = 2;
/// Degree of parallelism
const P_COST: u32 = 1;

/// Minimum accepted password length in characters
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password with Argon2id and a fresh random salt
///
/// Output is a PHC string, e.g.
/// ```text
/// $argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(M_COST)
        .t_cost(T_COST)
        .p_cost(P_COST)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// Parameters are read from the hash itself, so hashes made with older
/// settings keep verifying.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if `hash` is not a PHC string, and
/// `PasswordError::VerifyError` for any other failure besides a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Validates a new account password
///
/// Rules:
/// - at least 8 characters
/// - not entirely numeric
/// - must not contain the user name (case-insensitive)
///
/// # Example
///
/// ```
/// use bugboard_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("mountain-lake", "chondosha").is_ok());
/// assert!(validate_password_strength("12345678901", "chondosha").is_err());
/// assert!(validate_password_strength("chondosha!!", "chondosha").is_err());
/// ```
pub fn validate_password_strength(password: &str, user_name: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_CHARS
        ));
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err("This password is entirely numeric.".to_string());
    }

    let user_name = user_name.trim().to_lowercase();
    if !user_name.is_empty() && password.to_lowercase().contains(&user_name) {
        return Err("The password is too similar to the username.".to_string());
    }

    Ok(())
}
