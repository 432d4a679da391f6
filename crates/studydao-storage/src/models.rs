// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A session row as read back from a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    pub notes: String,
    pub duration: u64,
    pub timestamp: String,
    /// SHA-256 of the notes, hex. Only stores that compute it return it.
    #[serde(default)]
    pub notes_digest: Option<String>,
}

/// Hex SHA-256 of the notes text, kept next to the row for integrity checks.
pub fn notes_digest(notes: &str) -> String {
    hex::encode(Sha256::digest(notes.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_sha256_hex() {
        assert_eq!(
            notes_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(notes_digest("abc").len(), 64);
        assert_ne!(notes_digest("abc"), notes_digest("abd"));
    }
}
