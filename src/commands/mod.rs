//! Application command handlers for vmemo.
//!
//! # Commands
//! - `record`: record a voice memo and upload it (default command)
//! - `replay`: play back a stored recording
//! - `config`: open the configuration file in the user's preferred editor
//! - `list_devices`: list available audio input devices
//! - `logs`: display recent log entries

pub mod config;
pub mod list_devices;
pub mod logs;
pub mod record;
pub mod replay;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use record::handle_record;
pub use replay::handle_replay;
