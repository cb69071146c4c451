use thiserror::Error;

/// A single rule violation, located by its path in the input document
/// (e.g. `topic_areas[1].skills[0].sub_skills[3].reference_links[0]`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required field missing or of the wrong JSON type.
    #[error("SchemaError at {path}: {rule}")]
    Schema { path: String, rule: String },

    /// Malformed percentage weight or reference link.
    #[error("FormatError at {path}: {rule}")]
    Format { path: String, rule: String },

    /// Mismatched parent reference or duplicate entry at one nesting level.
    #[error("IntegrityError at {path}: {rule}")]
    Integrity { path: String, rule: String },
}

impl ValidationError {
    pub fn schema(path: impl Into<String>, rule: impl Into<String>) -> Self {
        Self::Schema { path: path.into(), rule: rule.into() }
    }

    pub fn format(path: impl Into<String>, rule: impl Into<String>) -> Self {
        Self::Format { path: path.into(), rule: rule.into() }
    }

    pub fn integrity(path: impl Into<String>, rule: impl Into<String>) -> Self {
        Self::Integrity { path: path.into(), rule: rule.into() }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Schema { path, .. } | Self::Format { path, .. } | Self::Integrity { path, .. } => {
                path
            }
        }
    }

    pub fn rule(&self) -> &str {
        match self {
            Self::Schema { rule, .. } | Self::Format { rule, .. } | Self::Integrity { rule, .. } => {
                rule
            }
        }
    }
}

/// Every violation found in one document. Validation never stops at the
/// first error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed with {} error(s)", .errors.len())]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// One `  - <error>` line per violation, for the console.
    pub fn lines(&self) -> String {
        self.errors.iter().map(|e| format!("  - {}\n", e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_every_error() {
        let report = ValidationReport {
            errors: vec![
                ValidationError::schema("metadata.exam_code", "required string field is missing"),
                ValidationError::format("topic_areas[0].percentage_weight", "bad weight"),
            ],
        };
        assert_eq!(report.to_string(), "validation failed with 2 error(s)");
        assert_eq!(
            report.lines(),
            concat!(
                "  - SchemaError at metadata.exam_code: required string field is missing\n",
                "  - FormatError at topic_areas[0].percentage_weight: bad weight\n",
            )
        );
    }

    #[test]
    fn accessors() {
        let e = ValidationError::integrity("change_log[2]", "duplicate");
        assert_eq!(e.path(), "change_log[2]");
        assert_eq!(e.rule(), "duplicate");
    }
}
