//! Configuration management for vmemo.
//!
//! Application configuration lives in a TOML file in the user's config
//! directory (`~/.config/vmemo/vmemo.toml`).

pub mod file;

pub use file::{config_path, AudioConfig, UploadConfig, VmemoConfig};
