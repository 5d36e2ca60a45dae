//! Form error types
//!
//! Error codes:
//! - FORM_INVALID_DEFINITION (FATAL)
//! - FORM_INVALID_FUNCTION (FATAL)
//! - FORM_INVALID_CONFIG (FATAL)
//! - FORM_AUTOFILL_ORDER (FATAL)
//! - FORM_DUPLICATE_FIELD (REJECT, logged only)
//! - FORM_UNKNOWN_FIELD (REJECT)
//!
//! FATAL errors abort form construction; no engine exists afterwards.
//! REJECT errors refuse one request and leave the engine usable.

use std::fmt;

use crate::functions::FunctionError;

/// Severity levels for form errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request rejected, engine unaffected
    Reject,
    /// Form cannot be built
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Form-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormErrorCode {
    /// Malformed or structurally invalid form definition
    FormInvalidDefinition,
    /// A function expression could not be resolved
    FormInvalidFunction,
    /// Engine configuration is invalid
    FormInvalidConfig,
    /// An autofill reads a field that is not declared before it
    FormAutofillOrder,
    /// Two fields share an id
    FormDuplicateField,
    /// No field with the requested id
    FormUnknownField,
}

impl FormErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            FormErrorCode::FormInvalidDefinition => "FORM_INVALID_DEFINITION",
            FormErrorCode::FormInvalidFunction => "FORM_INVALID_FUNCTION",
            FormErrorCode::FormInvalidConfig => "FORM_INVALID_CONFIG",
            FormErrorCode::FormAutofillOrder => "FORM_AUTOFILL_ORDER",
            FormErrorCode::FormDuplicateField => "FORM_DUPLICATE_FIELD",
            FormErrorCode::FormUnknownField => "FORM_UNKNOWN_FIELD",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            FormErrorCode::FormDuplicateField | FormErrorCode::FormUnknownField => {
                Severity::Reject
            }
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for FormErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Form error type with full context
#[derive(Debug)]
pub struct FormError {
    /// Error code
    code: FormErrorCode,
    /// Human-readable message
    message: String,
    /// Field or group id if applicable
    subject: Option<String>,
}

impl FormError {
    /// Create an error for a malformed definition file or document
    pub fn invalid_definition(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: FormErrorCode::FormInvalidDefinition,
            message: format!("Invalid form definition '{}': {}", source.into(), reason.into()),
            subject: None,
        }
    }

    /// Create an error for a function that failed to resolve
    pub fn invalid_function(
        subject: impl Into<String>,
        role: &str,
        cause: &FunctionError,
    ) -> Self {
        let subject = subject.into();
        Self {
            code: FormErrorCode::FormInvalidFunction,
            message: format!("Invalid {} function for '{}': {}", role, subject, cause),
            subject: Some(subject),
        }
    }

    /// Create an error for an invalid engine configuration
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self {
            code: FormErrorCode::FormInvalidConfig,
            message: format!("Invalid engine configuration: {}", reason.into()),
            subject: None,
        }
    }

    /// Create an error for an autofill that reads a later-declared field
    pub fn autofill_order(field: impl Into<String>, parameter: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: FormErrorCode::FormAutofillOrder,
            message: format!(
                "Autofill of '{}' reads '{}', which is not declared before it",
                field,
                parameter.into()
            ),
            subject: Some(field),
        }
    }

    /// Create a duplicate field id error
    pub fn duplicate_field(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            code: FormErrorCode::FormDuplicateField,
            message: format!("Field id '{}' is declared more than once", id),
            subject: Some(id),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            code: FormErrorCode::FormUnknownField,
            message: format!("Field '{}' not found", id),
            subject: Some(id),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> FormErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the field or group id if applicable
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns whether this error aborts form construction
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for FormError {}

/// Result type for form operations
pub type FormResult<T> = Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(FormErrorCode::FormInvalidDefinition.code(), "FORM_INVALID_DEFINITION");
        assert_eq!(FormErrorCode::FormAutofillOrder.code(), "FORM_AUTOFILL_ORDER");
        assert_eq!(FormErrorCode::FormUnknownField.code(), "FORM_UNKNOWN_FIELD");
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(FormErrorCode::FormInvalidFunction.severity(), Severity::Fatal);
        assert_eq!(FormErrorCode::FormUnknownField.severity(), Severity::Reject);
        assert!(FormError::invalid_config("x").is_fatal());
        assert!(!FormError::duplicate_field("Name").is_fatal());
    }

    #[test]
    fn test_display_includes_code_and_subject() {
        let err = FormError::invalid_function(
            "Email",
            "plausi",
            &FunctionError::InvalidPattern {
                pattern: "(".into(),
                reason: "unclosed group".into(),
            },
        );
        let display = err.to_string();
        assert!(display.contains("FORM_INVALID_FUNCTION"));
        assert!(display.contains("Email"));
        assert_eq!(err.subject(), Some("Email"));
    }
}
