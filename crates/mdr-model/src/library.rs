//! Libraries partition content (e.g. "Sponsor", "CDISC") and decide whether
//! items inside them may be created or changed.

use serde::{Deserialize, Serialize};

use crate::MdrError;

/// A named library with an editability flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    pub is_editable: bool,
}

impl Library {
    /// Resolves editability through a lookup.
    ///
    /// A lookup returning `None` means the library is unknown, which is a
    /// business rule failure rather than "not editable".
    pub fn from_input_values<F>(name: &str, is_editable: F) -> Result<Self, MdrError>
    where
        F: FnOnce(&str) -> Option<bool>,
    {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(MdrError::invalid_value("Library", "name", name));
        }
        match is_editable(trimmed) {
            Some(is_editable) => Ok(Self {
                name: trimmed.to_string(),
                is_editable,
            }),
            None => Err(MdrError::business_logic(format!(
                "Can't infer if library: {trimmed} is editable, because the library is unknown."
            ))),
        }
    }

    pub fn from_repository_values(name: impl Into<String>, is_editable: bool) -> Self {
        Self {
            name: name.into(),
            is_editable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_input_values_uses_lookup() {
        let library = Library::from_input_values("Sponsor", |_| Some(true)).unwrap();
        assert_eq!(library.name, "Sponsor");
        assert!(library.is_editable);

        let library = Library::from_input_values(" CDISC ", |name| {
            assert_eq!(name, "CDISC");
            Some(false)
        })
        .unwrap();
        assert!(!library.is_editable);
    }

    #[test]
    fn unknown_library_is_business_logic_error() {
        let err = Library::from_input_values("Nowhere", |_| None).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("Nowhere"));
    }

    #[test]
    fn blank_name_is_validation_error() {
        let err = Library::from_input_values("  ", |_| Some(true)).unwrap_err();
        assert_eq!(err.status_code(), 422);
    }
}
