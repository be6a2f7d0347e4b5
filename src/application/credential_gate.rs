// Credential gate - Login check against the injected credential table
use crate::domain::credentials::CredentialTable;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Deliberately silent on which of username or password was wrong
    #[error("invalid credentials")]
    InvalidCredentials,
}

#[derive(Debug, Clone)]
pub struct CredentialGate {
    credentials: CredentialTable,
}

impl CredentialGate {
    pub fn new(credentials: CredentialTable) -> Self {
        Self { credentials }
    }

    /// Exact match after trimming surrounding whitespace from both inputs
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.credentials
            .password_for(username.trim())
            .is_some_and(|expected| expected == password.trim())
    }

    pub fn verify(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if self.authenticate(username, password) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    pub fn user_count(&self) -> usize {
        self.credentials.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> CredentialGate {
        CredentialGate::new(CredentialTable::from_pairs([
            ("admin", "admin123"),
            ("Operation1", "op1123"),
        ]))
    }

    #[test]
    fn test_authenticate_trims_input() {
        assert!(gate().authenticate(" admin ", " admin123 "));
        assert!(gate().authenticate("admin\t", "\nadmin123"));
    }

    #[test]
    fn test_authenticate_rejects_wrong_password() {
        assert!(!gate().authenticate("admin", "wrong"));
        assert!(!gate().authenticate("admin", ""));
    }

    #[test]
    fn test_authenticate_rejects_unknown_user() {
        assert!(!gate().authenticate("nobody", "admin123"));
        assert!(!gate().authenticate("", ""));
    }

    #[test]
    fn test_authenticate_is_case_sensitive() {
        assert!(!gate().authenticate("ADMIN", "admin123"));
        assert!(!gate().authenticate("operation1", "op1123"));
        assert!(!gate().authenticate("Operation1", "OP1123"));
    }

    #[test]
    fn test_verify_hides_which_field_failed() {
        let unknown_user = gate().verify("nobody", "admin123").unwrap_err();
        let wrong_password = gate().verify("admin", "nope").unwrap_err();
        assert_eq!(unknown_user, wrong_password);
        assert_eq!(unknown_user.to_string(), "invalid credentials");
        assert_eq!(gate().verify("Operation1", "op1123"), Ok(()));
    }

    #[test]
    fn test_empty_table_rejects_everyone() {
        let gate = CredentialGate::new(CredentialTable::default());
        assert!(!gate.authenticate("admin", "admin123"));
        assert_eq!(gate.user_count(), 0);
    }
}
