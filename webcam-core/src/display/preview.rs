use crate::models::error::WebcamError;
use crate::traits::media_devices::StreamHandle;
use crate::traits::surfaces::PreviewSurface;

/// Upper bound on the derived height; extreme aspect ratios would otherwise
/// size the still canvas in gigabytes.
pub const MAX_DISPLAY_HEIGHT: u32 = 16_384;

/// Preview with a fixed display width whose height follows the bound
/// stream's aspect ratio.
///
/// Until a frame is available the height is zero.
pub struct HeadlessPreview {
    display_width: u32,
    source: Option<StreamHandle>,
    playing: bool,
}

impl HeadlessPreview {
    pub fn new(display_width: u32) -> Self {
        Self {
            display_width,
            source: None,
            playing: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl PreviewSurface for HeadlessPreview {
    fn set_source(&mut self, stream: Option<StreamHandle>) {
        self.source = stream;
        self.playing = false;
    }

    fn source(&self) -> Option<&StreamHandle> {
        self.source.as_ref()
    }

    fn play(&mut self) -> Result<(), WebcamError> {
        let stream = self
            .source
            .as_ref()
            .ok_or_else(|| WebcamError::ConfigurationFailed("no stream bound to preview".into()))?;
        if !stream.is_active() {
            return Err(WebcamError::DeviceUnavailable(format!("stream {} has ended", stream.id())));
        }
        self.playing = true;
        Ok(())
    }

    fn client_size(&self) -> (u32, u32) {
        let Some(frame) = self.current_frame() else {
            return (self.display_width, 0);
        };
        if frame.width() == 0 {
            return (self.display_width, 0);
        }
        let height = (self.display_width as u64 * frame.height() as u64 + frame.width() as u64 / 2)
            / frame.width() as u64;
        let height = u32::try_from(height).unwrap_or(u32::MAX).min(MAX_DISPLAY_HEIGHT);
        (self.display_width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::device::{MediaStreamConstraints, VideoFrame};
    use crate::test_support::FakeDevices;
    use crate::traits::media_devices::MediaDevices;

    #[test]
    fn height_follows_aspect_ratio() {
        let devices = FakeDevices::with_cameras(&[("cam-1", "Front")]);
        let stream = devices.get_user_media(&MediaStreamConstraints::video_only(Some("cam-1"))).unwrap();

        let mut preview = HeadlessPreview::new(640);
        preview.set_source(Some(stream));
        preview.play().unwrap();

        // 320x240 source
        assert_eq!(preview.client_size(), (640, 480));
        assert!(preview.is_playing());
    }

    #[test]
    fn extreme_aspect_ratio_is_clamped() {
        let devices = FakeDevices::with_cameras(&[("cam-1", "Front")]);
        let stream = devices.get_user_media(&MediaStreamConstraints::video_only(Some("cam-1"))).unwrap();
        devices.opened()[0].set_frame(Some(VideoFrame::solid(1, 4000, [0, 0, 0])));

        let mut preview = HeadlessPreview::new(640);
        preview.set_source(Some(stream));

        assert_eq!(preview.client_size(), (640, MAX_DISPLAY_HEIGHT));
    }

    #[test]
    fn unbound_preview_has_no_height() {
        let mut preview = HeadlessPreview::new(640);
        assert_eq!(preview.client_size(), (640, 0));
        assert!(preview.play().is_err());
    }

    #[test]
    fn ended_stream_cannot_play() {
        let devices = FakeDevices::with_cameras(&[("cam-1", "Front")]);
        let stream = devices.get_user_media(&MediaStreamConstraints::video_only(Some("cam-1"))).unwrap();
        stream.stop_tracks();

        let mut preview = HeadlessPreview::new(640);
        preview.set_source(Some(stream));
        assert!(matches!(preview.play(), Err(WebcamError::DeviceUnavailable(_))));
    }
}
