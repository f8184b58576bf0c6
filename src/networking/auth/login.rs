/// Bound state of the login prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Credential field; cleared after every submission
    pub password: String,
    /// Last failure, shown inline under the field
    pub error: Option<String>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            error: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.password.is_empty() {
            return Err("Password cannot be empty".to_string());
        }
        Ok(())
    }

    /// Take the submitted credential, leaving the field empty
    pub fn take_password(&mut self) -> String {
        std::mem::take(&mut self.password)
    }

    pub fn reject(&mut self, message: impl Into<String>) {
        self.password.clear();
        self.error = Some(message.into());
    }
}
