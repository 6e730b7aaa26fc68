use derive_more::Display;

/// Broad class of a failed resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed input, nothing was looked up.
    Validation,
    NotFound,
    /// Well-formed input refused by attendance rules.
    PolicyRejection,
    /// Store or runtime failure.
    Fault,
}

#[derive(Debug, Display)]
pub enum ResolveError {
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "no employee linked to code {}", _0)]
    UnknownCode(u64),

    #[display(fmt = "employee {} not found", _0)]
    EmployeeNotFound(u64),

    #[display(fmt = "site {} not found", _0)]
    InvalidSite(u64),

    #[display(fmt = "employee {} is inactive", _0)]
    Inactive(u64),

    #[display(fmt = "exit attempted {} min after entry", elapsed_minutes)]
    TooSoon { elapsed_minutes: i64 },

    #[display(fmt = "attendance store failure: {:#}", _0)]
    Fault(anyhow::Error),
}

impl ResolveError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ResolveError::Validation(_) => ErrorClass::Validation,
            ResolveError::UnknownCode(_)
            | ResolveError::EmployeeNotFound(_)
            | ResolveError::InvalidSite(_) => ErrorClass::NotFound,
            ResolveError::Inactive(_) | ResolveError::TooSoon { .. } => ErrorClass::PolicyRejection,
            ResolveError::Fault(_) => ErrorClass::Fault,
        }
    }

    /// Message shown on the kiosk screen.
    pub fn user_message(&self) -> String {
        match self {
            ResolveError::Validation(msg) => msg.clone(),
            ResolveError::UnknownCode(code) => {
                format!("No employee is linked to the code {code}")
            }
            ResolveError::EmployeeNotFound(_) => "Employee not found".to_string(),
            ResolveError::InvalidSite(_) => "The selected site does not exist".to_string(),
            ResolveError::Inactive(_) => {
                "The employee is inactive and cannot register attendance".to_string()
            }
            ResolveError::TooSoon { .. } => {
                "Minimum time between entry and exit not met".to_string()
            }
            ResolveError::Fault(_) => {
                "An unexpected problem occurred. Contact support".to_string()
            }
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<anyhow::Error> for ResolveError {
    fn from(err: anyhow::Error) -> Self {
        ResolveError::Fault(err)
    }
}
