pub mod display_delegate;
pub mod file_saver;
pub mod media_devices;
pub mod media_recorder;
pub mod surfaces;
