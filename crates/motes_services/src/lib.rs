//! Motes Services Layer
//!
//! Host-side plumbing around the kernel: preset files on disk.

pub mod preset;

pub use preset::{Preset, PresetError};
