use async_trait::async_trait;

use crate::database::StoreError;

/// Default password minimum length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Outcome of a password change attempt. A refusal is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    pub success: bool,
    pub reason: Option<String>,
}

impl PasswordChange {
    pub fn changed() -> Self {
        Self { success: true, reason: None }
    }

    pub fn refused(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
        }
    }
}

#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Verify `current`, enforce the policy and atomically replace the stored hash
    async fn change_password(
        &self,
        user_id: i64,
        current: &str,
        new: &str,
    ) -> Result<PasswordChange, StoreError>;
}

/// Result of checking a change against the stored hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordCheck {
    Accepted { new_hash: String },
    Refused(String),
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub bcrypt_cost: u32,
}

impl PasswordPolicy {
    pub fn new(bcrypt_cost: u32) -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            bcrypt_cost,
        }
    }

    pub fn length_error(&self) -> String {
        format!("New password must be at least {} characters", self.min_length)
    }

    pub fn meets_length(&self, password: &str) -> bool {
        password.chars().count() >= self.min_length
    }

    pub fn hash(&self, password: &str) -> Result<String, bcrypt::BcryptError> {
        bcrypt::hash(password, self.bcrypt_cost)
    }

    /// Verify and hash synchronously; bcrypt is CPU-bound, prefer `evaluate_blocking`
    pub fn evaluate(
        &self,
        stored_hash: &str,
        current: &str,
        new: &str,
    ) -> Result<PasswordCheck, bcrypt::BcryptError> {
        if !bcrypt::verify(current, stored_hash)? {
            return Ok(PasswordCheck::Refused("Current password is incorrect".to_string()));
        }
        if !self.meets_length(new) {
            return Ok(PasswordCheck::Refused(self.length_error()));
        }
        if current == new {
            return Ok(PasswordCheck::Refused(
                "New password must be different from the current password".to_string(),
            ));
        }
        Ok(PasswordCheck::Accepted {
            new_hash: self.hash(new)?,
        })
    }

    /// Run `evaluate` on the blocking pool
    pub async fn evaluate_blocking(
        self,
        stored_hash: String,
        current: String,
        new: String,
    ) -> Result<PasswordCheck, StoreError> {
        tokio::task::spawn_blocking(move || self.evaluate(&stored_hash, &current, &new))
            .await
            .map_err(|e| StoreError::Backend(format!("password worker failed: {}", e)))?
            .map_err(|e| StoreError::Backend(format!("bcrypt error: {}", e)))
    }
}
