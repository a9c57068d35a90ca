pub mod handle;

use std::sync::Arc;

use crate::models::device::MediaStreamConstraints;
use crate::models::error::WebcamError;
use crate::traits::media_devices::MediaDevices;

use handle::{CameraHandle, SharedCamera};

/// One camera per video input, in host order.
pub fn enumerate_cameras(devices: &Arc<dyn MediaDevices>) -> Result<Vec<SharedCamera>, WebcamError> {
    let cameras: Vec<SharedCamera> = devices
        .enumerate_devices()?
        .iter()
        .filter(|info| info.is_video_input())
        .map(|info| CameraHandle::new(info, Arc::clone(devices)).into_shared())
        .collect();

    log::info!("Found {} camera(s)", cameras.len());
    Ok(cameras)
}

/// Briefly open any camera so the host asks the user for access.
///
/// Hosts typically withhold device labels until this has succeeded once.
pub fn request_permission(devices: &dyn MediaDevices) -> Result<(), WebcamError> {
    let stream = devices.get_user_media(&MediaStreamConstraints::video_only(None))?;
    stream.stop_tracks();
    log::debug!("Camera permission granted");
    Ok(())
}
