use std::fmt;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

use crate::error::{ErrorKind, ProviderError};

const TRANSIENT_CODES: &[&str] = &[
    "ResourceConflictException",
    "TooManyRequestsException",
    "ThrottlingException",
    "Throttling",
    "ProvisionedThroughputExceededException",
    "ConflictException",
    "ResourceInUseException",
];

const ALREADY_EXISTS_CODES: &[&str] = &["BucketAlreadyOwnedByYou"];

const NOT_FOUND_CODES: &[&str] = &[
    "ResourceNotFoundException",
    "NoSuchBucket",
    "NotFound",
    "NotFoundException",
    "NoSuchKey",
];

/// Maps a provider error code to its meaning for `operation`.
pub fn classify(operation: &str, code: &str) -> ErrorKind {
    match (operation, code) {
        ("AddPermission" | "CreateFunction", "ResourceConflictException")
        | ("CreateTable", "ResourceInUseException") => return ErrorKind::AlreadyExists,
        _ => {}
    }

    if TRANSIENT_CODES.contains(&code) {
        ErrorKind::TransientConflict
    } else if ALREADY_EXISTS_CODES.contains(&code) {
        ErrorKind::AlreadyExists
    } else if NOT_FOUND_CODES.contains(&code) {
        ErrorKind::NotFound
    } else {
        ErrorKind::Other
    }
}

/// Converts any SDK error into a classified [`ProviderError`].
pub fn from_sdk<E, R>(operation: &str, error: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    let code = error.code().unwrap_or("Unknown").to_string();
    let message = format!("{operation}: {}", DisplayErrorContext(&error));
    ProviderError::new(classify(operation, &code), code, message)
}

/// A request the SDK refused to build, or a response missing a field we need.
pub fn malformed(operation: &str, detail: impl fmt::Display) -> ProviderError {
    ProviderError::new(ErrorKind::Other, "Malformed", format!("{operation}: {detail}"))
}

/// Some generated fields are plain `&str`, others `Option<&str>`.
pub trait OptionalText {
    fn text(self) -> Option<String>;
}

impl OptionalText for &str {
    fn text(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl OptionalText for Option<&str> {
    fn text(self) -> Option<String> {
        self.map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_depend_on_the_operation() {
        assert_eq!(
            classify("UpdateFunctionCode", "ResourceConflictException"),
            ErrorKind::TransientConflict
        );
        assert_eq!(
            classify("AddPermission", "ResourceConflictException"),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            classify("CreateFunction", "ResourceConflictException"),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            classify("CreateTable", "ResourceInUseException"),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            classify("DeleteTable", "ResourceInUseException"),
            ErrorKind::TransientConflict
        );
    }

    #[test]
    fn common_codes_have_a_fixed_kind() {
        assert_eq!(
            classify("CreateBucket", "BucketAlreadyOwnedByYou"),
            ErrorKind::AlreadyExists
        );
        assert_eq!(classify("HeadBucket", "NotFound"), ErrorKind::NotFound);
        assert_eq!(classify("DeleteBucket", "NoSuchBucket"), ErrorKind::NotFound);
        assert_eq!(
            classify("CreateTopic", "ThrottlingException"),
            ErrorKind::TransientConflict
        );
        assert_eq!(classify("CreateBucket", "AccessDenied"), ErrorKind::Other);
        assert_eq!(classify("GetStage", "Unknown"), ErrorKind::Other);
    }

    #[test]
    fn optional_text_accepts_both_field_shapes() {
        assert_eq!("abc".text().as_deref(), Some("abc"));
        assert_eq!(Some("abc").text().as_deref(), Some("abc"));
        assert_eq!(None::<&str>.text(), None);
    }
}
