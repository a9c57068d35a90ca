pub mod directory_saver;
pub mod download;
pub mod object_url;
