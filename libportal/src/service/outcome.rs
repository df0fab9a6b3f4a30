//! Uniform result of a service operation

use serde::Serialize;

/// What the view layer gets back from every orchestrated operation
///
/// Services never return `Err`: failures are folded into `error` after the
/// matching failure action has been dispatched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T, message: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    /// Unsuccessful, with nothing to report (e.g. no stored session)
    pub fn nothing() -> Self {
        Self {
            success: false,
            data: None,
            error: None,
            message: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            message: self.message,
        }
    }

    /// `Ok(data)` on success, `Err(error)` otherwise
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data, self.error) {
            (true, Some(data), _) => Ok(data),
            (_, _, Some(error)) => Err(error),
            _ => Err("Operation failed".to_string()),
        }
    }
}
