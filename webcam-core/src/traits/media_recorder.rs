use std::sync::Arc;
use std::time::Duration;

use crate::models::error::WebcamError;
use crate::traits::media_devices::StreamHandle;

/// Callback invoked with each encoded segment, in capture order.
///
/// May fire on a sink-owned thread.
pub type SegmentCallback = Arc<dyn Fn(Vec<u8>) + Send + Sync + 'static>;

/// Continuous encoder turning a live stream into container segments.
pub trait MediaRecorder: Send {
    /// Container MIME type being produced.
    fn mime_type(&self) -> &str;

    /// Begin capture, delivering a segment every `timeslice`.
    fn start(&mut self, timeslice: Duration) -> Result<(), WebcamError>;

    /// Finish capture.
    ///
    /// The trailing segment must have been handed to the callback before
    /// this returns.
    fn stop(&mut self) -> Result<(), WebcamError>;
}

/// Host recording capability.
pub trait RecorderBackend: Send + Sync {
    fn is_type_supported(&self, mime_type: &str) -> bool;

    fn create_recorder(
        &self,
        stream: StreamHandle,
        mime_type: &str,
        on_data: SegmentCallback,
    ) -> Result<Box<dyn MediaRecorder>, WebcamError>;
}
