//! Secret manager reference parsing.
//!
//! A binding's secret reference identifies a secret in the external
//! secret manager in one of two forms:
//!
//! ```text
//! mysecret                      organization level secret
//! user/myusername/mysecret      user level secret
//! ```
//!
//! Either form may carry a single leading slash. The fully qualified
//! name in the secret manager is the form above preceded by
//! `openhorizon/<org>`; the organization is always implied by the
//! deployment context, so a fully qualified reference is rejected even
//! when it is otherwise well formed.

use std::fmt;

use super::error::BindingError;

/// Namespace segment the secret manager prepends to every secret. A
/// caller-supplied reference must never start with it.
const QUALIFIED_PREFIX: &str = "openhorizon";

/// Path segment introducing a user level reference.
const USER_PREFIX: &str = "user";

/// A parsed secret manager reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VaultSecretRef {
    /// Owning user for a user level secret; `None` for an organization
    /// level secret.
    pub user: Option<String>,
    /// The secret name, which may itself contain slashes.
    pub name: String,
}

impl VaultSecretRef {
    /// Renders the canonical non-qualified reference form. Parsing the
    /// result yields this value back.
    #[must_use]
    pub fn canonical(&self) -> String {
        match &self.user {
            Some(user) => format!("{USER_PREFIX}/{user}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for VaultSecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// Parses a secret manager reference into its owning user and secret
/// name.
///
/// # Errors
///
/// Returns [`BindingError::EmptyReference`] for an empty input and
/// [`BindingError::InvalidReferenceFormat`] for a fully qualified
/// reference or a form that matches neither accepted shape.
pub fn parse_vault_secret_name(reference: &str) -> Result<VaultSecretRef, BindingError> {
    if reference.is_empty() {
        return Err(BindingError::EmptyReference);
    }

    let invalid = || BindingError::InvalidReferenceFormat {
        reference: reference.to_string(),
    };

    let parts: Vec<&str> = reference.split('/').collect();

    if parts[0] == QUALIFIED_PREFIX {
        return Err(invalid());
    }

    if parts[0] != USER_PREFIX && !parts[0].is_empty() {
        // Organization level, no leading slash. Slashes inside the
        // name are allowed.
        return Ok(VaultSecretRef {
            user: None,
            name: reference.to_string(),
        });
    }

    if parts[0].is_empty() && parts.len() >= 2 && parts[1] != USER_PREFIX {
        // Organization level with a single leading slash removed.
        let name = parts[1..].join("/");
        if name.is_empty() {
            return Err(invalid());
        }
        return Ok(VaultSecretRef { user: None, name });
    }

    if parts[0] == USER_PREFIX && parts.len() >= 3 {
        let (user, name) = (parts[1], parts[2..].join("/"));
        if user.is_empty() || name.is_empty() {
            return Err(invalid());
        }
        return Ok(VaultSecretRef {
            user: Some(user.to_string()),
            name,
        });
    }

    if parts[0].is_empty() && parts.len() >= 4 && parts[1] == USER_PREFIX {
        let (user, name) = (parts[2], parts[3..].join("/"));
        if user.is_empty() || name.is_empty() {
            return Err(invalid());
        }
        return Ok(VaultSecretRef {
            user: Some(user.to_string()),
            name,
        });
    }

    Err(invalid())
}
