//! Configuration management for tcpsweep.

mod settings;

pub use settings::{default_settings_file, AppSettings};
