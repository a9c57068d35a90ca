use crate::models::device::VideoFrame;
use crate::models::error::WebcamError;
use crate::traits::media_devices::StreamHandle;

/// On-screen element that plays a live stream.
pub trait PreviewSurface: Send {
    /// Bind a stream, or clear the binding with `None`.
    fn set_source(&mut self, stream: Option<StreamHandle>);

    fn source(&self) -> Option<&StreamHandle>;

    /// Start playback of the bound stream.
    fn play(&mut self) -> Result<(), WebcamError>;

    /// Displayed width and height in pixels.
    fn client_size(&self) -> (u32, u32);

    /// Frame currently shown.
    fn current_frame(&self) -> Option<VideoFrame> {
        self.source().and_then(|stream| stream.current_frame())
    }
}

/// Offscreen drawable buffer used to snapshot frames.
pub trait RasterSurface: Send {
    /// Resize and clear the buffer.
    fn resize(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    /// Draw `frame` scaled into the rectangle `(0, 0, width, height)`.
    fn draw_frame(&mut self, frame: &VideoFrame, width: u32, height: u32) -> Result<(), WebcamError>;

    /// Encode the whole buffer as JPEG.
    fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, WebcamError>;
}
