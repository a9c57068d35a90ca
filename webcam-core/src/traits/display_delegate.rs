use crate::models::state::RecordingState;
use crate::storage::download::DownloadReceipt;

/// Event delegate for display notifications.
///
/// Called synchronously from the thread driving the `DisplaySurface`.
pub trait DisplayDelegate: Send + Sync {
    fn on_camera_connected(&self, device_id: &str);

    fn on_camera_disconnected(&self, device_id: &str);

    fn on_recording_state_changed(&self, state: RecordingState);

    /// Called after a save action was triggered.
    fn on_download_started(&self, receipt: &DownloadReceipt);
}
