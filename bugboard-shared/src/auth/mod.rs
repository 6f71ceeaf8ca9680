/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and validation
/// - [`jwt`]: JWT access/refresh token generation and validation
/// - [`middleware`]: Axum middleware and extractors for the acting user
/// - [`authorization`]: Membership, creator and author checks
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::auth::password::{hash_password, verify_password};
/// use bugboard_shared::auth::jwt::{create_token, Claims, TokenType};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new("chondosha", TokenType::Access);
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
