//! Camera permission checks.
//!
//! Desktop platforms gate camera access differently (macOS TCC prompts,
//! Windows privacy toggles, Linux device node permissions); all of them
//! surface as a failure to open the device, so the check opens and
//! immediately closes a stream.

use webcam_core::{request_permission, MediaDevices, WebcamError};

/// Check whether any camera can be opened.
///
/// Returns `Ok(false)` when access is denied. Other failures (no camera,
/// device busy) are returned as errors.
pub fn check_camera_permission(devices: &dyn MediaDevices) -> Result<bool, WebcamError> {
    match request_permission(devices) {
        Ok(()) => Ok(true),
        Err(WebcamError::PermissionDenied) => Ok(false),
        Err(e) => {
            log::warn!("Unexpected error checking camera permission: {}", e);
            Err(e)
        }
    }
}

/// Classify a backend error message from opening a device.
pub fn classify_open_error(message: &str) -> WebcamError {
    let lower = message.to_ascii_lowercase();
    let denied = ["permission", "denied", "not authorized", "unauthorized", "authorization"]
        .iter()
        .any(|needle| lower.contains(needle));
    if denied {
        WebcamError::PermissionDenied
    } else {
        WebcamError::DeviceUnavailable(message.to_string())
    }
}
