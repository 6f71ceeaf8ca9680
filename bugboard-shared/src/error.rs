/// Common error types for core operations
///
/// Every guarded operation in the shared crate returns `CoreResult`. The
/// variants follow the failure classes the HTTP boundary distinguishes:
///
/// - `Validation`: malformed input, nothing was written
/// - `PermissionDenied`: the actor may not perform the mutation, nothing was written
/// - `LastMember`: the membership invariant rejected the change, nothing was written
/// - `Unauthenticated`: a mutation was attempted without an actor
/// - `NotFound`: the referenced entity does not exist
/// - `Database`: the store failed
use serde::Serialize;

/// Result alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Why a permission check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionDenied {
    /// Actor is not in the entity's membership set
    NotMember,

    /// Actor did not create the entity
    NotCreator,

    /// Actor did not write the comment
    NotAuthor,
}

impl std::fmt::Display for PermissionDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            PermissionDenied::NotMember => "actor is not a member",
            PermissionDenied::NotCreator => "actor is not the creator",
            PermissionDenied::NotAuthor => "actor is not the author",
        };
        f.write_str(reason)
    }
}

/// Kinds of entities the store holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Project,
    Issue,
    Comment,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Project => "project",
            EntityKind::Issue => "issue",
            EntityKind::Comment => "comment",
        }
    }
}

/// Error type for core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input failed validation
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Guard rejected the actor
    #[error("Permission denied: {0}")]
    PermissionDenied(PermissionDenied),

    /// Removing the user would leave the entity without members
    #[error("Cannot remove the last member")]
    LastMember,

    /// No actor on a mutating request
    #[error("Authentication required")]
    Unauthenticated,

    /// Referenced entity does not exist
    #[error("{} {id} not found", .kind.as_str())]
    NotFound { kind: EntityKind, id: String },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CoreError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        CoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// True for the failures the boundary answers with a silent redirect
    pub fn is_silent_rejection(&self) -> bool {
        matches!(
            self,
            CoreError::PermissionDenied(_) | CoreError::LastMember
        )
    }
}

/// Checks that a required text field is present and within bounds
///
/// Blank (whitespace-only) input counts as missing. Returns the trimmed value.
pub fn require_text(field: &str, value: &str, max_chars: Option<usize>) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(field, "This field is required"));
    }
    if let Some(max) = max_chars {
        if trimmed.chars().count() > max {
            return Err(CoreError::validation(
                field,
                format!("Ensure this value has at most {} characters", max),
            ));
        }
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_trims_and_bounds() {
        assert_eq!(require_text("title", "  Bug  ", Some(64)).unwrap(), "Bug");
        assert!(matches!(
            require_text("title", "   ", Some(64)),
            Err(CoreError::Validation { .. })
        ));
        assert!(require_text("title", &"x".repeat(65), Some(64)).is_err());
        assert!(require_text("summary", &"x".repeat(5000), None).is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::not_found(EntityKind::Issue, 7);
        assert_eq!(err.to_string(), "issue 7 not found");

        let err = CoreError::PermissionDenied(PermissionDenied::NotCreator);
        assert!(err.to_string().contains("not the creator"));
        assert!(err.is_silent_rejection());
        assert!(CoreError::LastMember.is_silent_rejection());
        assert!(!CoreError::Unauthenticated.is_silent_rejection());
    }
}
