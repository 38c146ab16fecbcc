// File: src/validation.rs
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// At most one error per field, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: Option<String>) {
        if let Some(message) = message {
            self.errors.push(FieldError { field, message });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn required_min(value: &str, label: &str, min: usize) -> Option<String> {
    if value.is_empty() {
        Some(format!("{} is required", label))
    } else if value.chars().count() < min {
        Some(format!("{} must be at least {} characters", label, min))
    } else {
        None
    }
}

fn is_username(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `local@domain.tld`, no whitespace, one `@`.
fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels
            .iter()
            .all(|l| !l.is_empty() && !l.starts_with('-') && !l.ends_with('-'))
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.push("username", required_min(&self.username, "Username", 3));
        errors.push("password", required_min(&self.password, "Password", 4));
        errors.into_result()
    }
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.push("first_name", required_min(&self.first_name, "First name", 2));
        errors.push("last_name", required_min(&self.last_name, "Last name", 2));

        let username = required_min(&self.username, "Username", 3).or_else(|| {
            (!is_username(&self.username))
                .then(|| "Username can only contain letters, numbers, and underscores".to_string())
        });
        errors.push("username", username);

        let email = if self.email.is_empty() {
            Some("Email is required".to_string())
        } else if !is_email(&self.email) {
            Some("Please enter a valid email".to_string())
        } else {
            None
        };
        errors.push("email", email);

        errors.push("password", required_min(&self.password, "Password", 6));

        let confirm = if self.confirm_password.is_empty() {
            Some("Please confirm your password".to_string())
        } else if self.confirm_password != self.password {
            Some("Passwords must match".to_string())
        } else {
            None
        };
        errors.push("confirm_password", confirm);
        errors.into_result()
    }
}
