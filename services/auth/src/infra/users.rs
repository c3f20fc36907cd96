use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::domain::repository::UserDirectory;

/// Accepted shapes of `allowed-users.json`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AllowedUsersFile {
    /// `["a@example.com", ...]`
    List(Vec<String>),
    /// `{"a@example.com": "Ana", ...}`
    Named(HashMap<String, String>),
}

/// Allow-list of users permitted to sign in, keyed by lower-cased email.
#[derive(Debug, Clone, Default)]
pub struct AllowedUsers {
    users: HashMap<String, Option<String>>,
}

impl AllowedUsers {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read allowed users from {}", path.display()))?;
        let users = Self::from_json(&raw)
            .with_context(|| format!("failed to parse allowed users in {}", path.display()))?;
        tracing::info!(count = users.len(), path = %path.display(), "allowed users loaded");
        Ok(users)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let file: AllowedUsersFile = serde_json::from_str(raw)?;
        let users = match file {
            AllowedUsersFile::List(emails) => emails
                .into_iter()
                .map(|email| (email.trim().to_lowercase(), None))
                .collect(),
            AllowedUsersFile::Named(named) => named
                .into_iter()
                .map(|(email, name)| {
                    let name = Some(name.trim().to_owned()).filter(|n| !n.is_empty());
                    (email.trim().to_lowercase(), name)
                })
                .collect(),
        };
        Ok(Self { users })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectory for AllowedUsers {
    fn is_allowed(&self, email: &str) -> bool {
        self.users.contains_key(email)
    }

    fn display_name(&self, email: &str) -> Option<String> {
        self.users.get(email).cloned().flatten()
    }
}
