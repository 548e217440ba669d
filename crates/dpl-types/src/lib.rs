/// Errors that can occur when creating validated identifier types.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The input was empty or contained only whitespace
    #[error("identifier cannot be empty")]
    Empty,
}

/// A procedure identifier that guarantees non-empty content.
///
/// Procedure records are keyed by a caller-chosen identifier that must be
/// unique within one tooth's ledger. Re-submitting an existing identifier is
/// an update of that record, so an empty or whitespace-only identifier would
/// make upsert semantics ambiguous and is rejected at construction.
///
/// The input is trimmed of leading and trailing whitespace; no other
/// canonicalisation is applied (identifiers are compared verbatim).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcedureId(String);

impl ProcedureId {
    /// Creates a new `ProcedureId` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the
    /// trimmed result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(ProcedureId)` if the trimmed input is non-empty,
    /// or `Err(IdError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, IdError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProcedureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ProcedureId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for ProcedureId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ProcedureId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ProcedureId::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let id = ProcedureId::new("  p-17  ").expect("valid id");
        assert_eq!(id.as_str(), "p-17");
        assert_eq!(id.to_string(), "p-17");
    }

    #[test]
    fn rejects_empty_and_whitespace_only() {
        assert!(matches!(ProcedureId::new(""), Err(IdError::Empty)));
        assert!(matches!(ProcedureId::new("   "), Err(IdError::Empty)));
        assert!(matches!(ProcedureId::new("\t\n"), Err(IdError::Empty)));
    }

    #[test]
    fn identifiers_compare_verbatim_after_trim() {
        let a = ProcedureId::new("P1").expect("valid id");
        let b = ProcedureId::new(" P1").expect("valid id");
        let c = ProcedureId::new("p1").expect("valid id");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
