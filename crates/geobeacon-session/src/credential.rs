//! Account credentials read from the roster.
//!
//! The password half of a credential is wrapped in [`Secret`], which never
//! prints its contents. The only way to read it is [`Secret::expose`], and
//! the only caller of that is the login request.

use std::fmt;

/// A password that refuses to be formatted.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw secret. Pass it straight to the login call and
    /// nowhere else.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// One roster entry: who to log in as and with what password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCredential {
    identity: String,
    secret: Secret,
}

impl AccountCredential {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: Secret::new(secret),
        }
    }

    /// The login name, e.g. `alice` or `@alice:example.org`.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }
}
