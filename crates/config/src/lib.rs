// Configuration loading

pub mod settings;

pub use settings::{Settings, settings_file_path};
