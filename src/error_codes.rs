use std::fmt;

use anyhow::Error;
use serde::Serialize;
use serde_json::Value;

pub const DISPLAY_CONFIG_INVALID: &str = "DISPLAY_CONFIG_INVALID";
pub const SURFACE_ALLOCATION_FAILED: &str = "SURFACE_ALLOCATION_FAILED";
pub const SCENE_INVALID: &str = "SCENE_INVALID";

/// Process exit status for failures without a [`CodedError`].
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodedErrorKind {
    /// The caller handed over something unusable.
    Config,
    /// A backing surface could not be created.
    Resource,
}

impl CodedErrorKind {
    /// Exit status the CLI reports for this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Config => 2,
            Self::Resource => 3,
        }
    }
}

/// An error with a stable machine-readable code.
#[derive(Debug, Clone)]
pub struct CodedError {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
    pub kind: CodedErrorKind,
}

impl CodedError {
    pub fn config(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind: CodedErrorKind::Config,
        }
    }

    pub fn resource(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind: CodedErrorKind::Resource,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            ok: false,
            error: ErrorEnvelopeBody {
                code: self.code.to_owned(),
                kind: self.kind,
                message: self.message.clone(),
                details: self.details.clone(),
            },
        }
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CodedError {}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: ErrorEnvelopeBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelopeBody {
    pub code: String,
    pub kind: CodedErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// First [`CodedError`] anywhere in the chain, context layers included.
pub fn find_coded_error(error: &Error) -> Option<&CodedError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CodedError>())
}

pub fn exit_code_for(error: &Error) -> i32 {
    find_coded_error(error).map_or(EXIT_FAILURE, |coded| coded.kind.exit_code())
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use serde_json::json;

    use super::{
        exit_code_for, find_coded_error, CodedError, CodedErrorKind, DISPLAY_CONFIG_INVALID,
        EXIT_FAILURE, SURFACE_ALLOCATION_FAILED,
    };

    #[test]
    fn coded_error_survives_context_layers() {
        let result: anyhow::Result<()> = Err(CodedError::config(
            DISPLAY_CONFIG_INVALID,
            "cell_width must be greater than zero",
        )
        .into());
        let error = result.context("creating display").unwrap_err();

        let coded = find_coded_error(&error).expect("coded error in chain");
        assert_eq!(coded.code, DISPLAY_CONFIG_INVALID);
        assert_eq!(coded.kind, CodedErrorKind::Config);
    }

    #[test]
    fn envelope_serializes_details_only_when_present() {
        let bare = serde_json::to_value(CodedError::config("X", "bad").envelope()).unwrap();
        assert_eq!(
            bare,
            json!({ "ok": false, "error": { "code": "X", "kind": "config", "message": "bad" } })
        );

        let detailed = CodedError::config("X", "bad")
            .with_details(json!({ "field": "world_width" }))
            .envelope();
        let value = serde_json::to_value(detailed).unwrap();
        assert_eq!(value["error"]["details"]["field"], "world_width");
    }

    #[test]
    fn exit_codes_follow_the_error_kind() {
        let config = anyhow::Error::from(CodedError::config(DISPLAY_CONFIG_INVALID, "zero width"));
        let resource = anyhow::Error::from(CodedError::resource(SURFACE_ALLOCATION_FAILED, "too big"))
            .context("creating display");
        let plain = anyhow::anyhow!("disk full");

        assert_eq!(exit_code_for(&config), 2);
        assert_eq!(exit_code_for(&resource), 3);
        assert_eq!(exit_code_for(&plain), EXIT_FAILURE);
    }
}
