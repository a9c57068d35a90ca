use thiserror::Error;

/// Errors surfaced by camera, display and recording operations.
///
/// None of these are retried internally; the caller decides whether to let
/// the user re-initiate the action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebcamError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available: {0}")]
    DeviceUnavailable(String),

    #[error("camera has not been started")]
    NotStarted,

    #[error("not recording")]
    NotRecording,

    #[error("already recording")]
    AlreadyRecording,

    #[error("no supported recording format")]
    UnsupportedFormat,

    #[error("recording produced no data")]
    EmptyRecording,

    #[error("no camera connected")]
    NoActiveCamera,

    #[error("no active recording")]
    NoActiveRecording,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),
}
