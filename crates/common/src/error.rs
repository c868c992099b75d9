use serde::Serialize;

/// Closed classification shared by every error in the system.
///
/// Callers branch on the kind rather than on error text; the HTTP layer maps
/// each kind to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Bad input, rejected before any persistence or publish.
    Validation,
    /// Unknown identifier.
    NotFound,
    /// Insufficient stock or duplicate registration.
    Conflict,
    /// Storage or broker unavailable.
    Infrastructure,
}

impl ErrorKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
