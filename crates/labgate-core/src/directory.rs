//! The static credential directory.
//!
//! The directory is a fixed, process-lifetime mapping from username to
//! password, role, and display name. It is configuration, not a database:
//! there are no create/update/delete operations, and it is never persisted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Access level attached to a directory entry.
///
/// Serialized as the lowercase strings `"admin"` / `"member"`, which is also
/// how the role travels in the persisted session record. Anything else in a
/// stored record fails to parse and the record is treated as corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    /// Human-readable label for status lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

/// One user's directory record. The password is compared byte-for-byte at
/// login and never leaves this struct.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub password: String,
    pub role: Role,
    pub display_name: String,
}

/// Immutable username -> entry map supplied to the session store at startup.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    users: HashMap<String, DirectoryEntry>,
}

impl Directory {
    /// Build a directory from (username, entry) pairs. Duplicate usernames
    /// keep the last entry.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, DirectoryEntry)>,
    {
        Self {
            users: entries.into_iter().collect(),
        }
    }

    /// The built-in demo fixture: two plaintext accounts.
    pub fn demo() -> Self {
        Self::new([
            (
                "admin".to_string(),
                DirectoryEntry {
                    password: "admin2024".to_string(),
                    role: Role::Admin,
                    display_name: "管理员".to_string(),
                },
            ),
            (
                "member".to_string(),
                DirectoryEntry {
                    password: "member2024".to_string(),
                    role: Role::Member,
                    display_name: "实验室成员".to_string(),
                },
            ),
        ])
    }

    pub fn get(&self, username: &str) -> Option<&DirectoryEntry> {
        self.users.get(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Check a credential pair. Exact string comparison, no normalization.
    /// Returns the entry on a match so the caller can copy role and display
    /// name without touching the password again.
    pub fn verify(&self, username: &str, password: &str) -> Option<&DirectoryEntry> {
        self.users
            .get(username)
            .filter(|entry| entry.password == password)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_directory_entries() {
        let dir = Directory::demo();
        assert_eq!(dir.len(), 2);

        let admin = dir.get("admin").unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.display_name, "管理员");

        let member = dir.get("member").unwrap();
        assert_eq!(member.role, Role::Member);
        assert_eq!(member.display_name, "实验室成员");
    }

    #[test]
    fn test_verify_exact_match() {
        let dir = Directory::demo();
        assert!(dir.verify("admin", "admin2024").is_some());
        assert!(dir.verify("member", "member2024").is_some());
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let dir = Directory::demo();
        assert!(dir.verify("admin", "admin2025").is_none());
        // No trimming or case folding
        assert!(dir.verify("admin", "ADMIN2024").is_none());
        assert!(dir.verify("admin", " admin2024").is_none());
        assert!(dir.verify("admin", "").is_none());
    }

    #[test]
    fn test_verify_rejects_unknown_username() {
        let dir = Directory::demo();
        assert!(dir.verify("ghost", "anything").is_none());
        assert!(!dir.contains("ghost"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::Member).unwrap(), "\"member\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"admin\"").unwrap(),
            Role::Admin
        );
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }
}
