// Credential table domain model
use std::collections::HashMap;

/// Fixed username -> password lookup, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    entries: HashMap<String, String>,
}

impl CredentialTable {
    /// Later duplicates replace earlier ones
    pub fn from_pairs<I, U, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(username, password)| (username.into(), password.into()))
            .collect();
        Self { entries }
    }

    pub fn password_for(&self, username: &str) -> Option<&str> {
        self.entries.get(username).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
