//! The `{success, data | error}` result handed back by hook operations.

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Result of a hook operation. Failures carry only the error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success { data: T },
    Failure { error: String },
}

impl<T> Outcome<T> {
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Outcome::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Success { data } => Some(data),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { error } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Outcome::Success { data } => Ok(data),
            Outcome::Failure { error } => Err(error),
        }
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("Outcome", 2)?;
        match self {
            Outcome::Success { data } => {
                out.serialize_field("success", &true)?;
                out.serialize_field("data", data)?;
            }
            Outcome::Failure { error } => {
                out.serialize_field("success", &false)?;
                out.serialize_field("error", error)?;
            }
        }
        out.end()
    }
}
