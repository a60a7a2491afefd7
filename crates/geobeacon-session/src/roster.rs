//! The account roster: the ordered list of accounts to simulate.
//!
//! File format, one account per line:
//!
//! ```text
//! # comment
//! alice hunter2
//! @bob:example.org correct-horse
//! ```
//!
//! Fields are separated by any whitespace. Blank lines and `#` comments are
//! skipped and don't take up a position, so the N-th account line always
//! gets index N-1 no matter how the file is laid out.

use std::path::Path;
use std::sync::Arc;

use crate::{AccountCredential, SessionError};

/// Ordered, read-only list of accounts. Position in the roster is the
/// account's playback index.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    accounts: Arc<[AccountCredential]>,
}

impl Roster {
    pub fn new(accounts: Vec<AccountCredential>) -> Self {
        Self {
            accounts: accounts.into(),
        }
    }

    /// Parses roster text.
    ///
    /// # Errors
    /// [`SessionError::InvalidRoster`] with the 1-based line number of the
    /// first line that isn't exactly `identity secret`.
    pub fn parse(text: &str) -> Result<Self, SessionError> {
        let mut accounts = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next(), fields.next()) {
                (Some(identity), Some(secret), None) => {
                    accounts.push(AccountCredential::new(identity, secret));
                }
                _ => return Err(SessionError::InvalidRoster { line: number + 1 }),
            }
        }
        Ok(Self::new(accounts))
    }

    /// Reads and parses a roster file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::RosterIo {
            path: path.to_path_buf(),
            source,
        })?;
        let roster = Self::parse(&text)?;
        tracing::info!(path = %path.display(), accounts = roster.len(), "roster loaded");
        Ok(roster)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AccountCredential> {
        self.accounts.get(index)
    }

    /// Accounts paired with their playback index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &AccountCredential)> {
        self.accounts.iter().enumerate()
    }
}
