//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `desktop`: Terminal simulator devices (requires `std` feature)
//! - `esp32`: ESP32 DevKit with RC522 reader, relay, buzzer and DHT11
//!   (requires `esp32` feature)

pub mod grid;
pub mod mock;

#[cfg(feature = "std")]
pub mod desktop;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use grid::CharGrid;
pub use mock::*;

#[cfg(feature = "esp32")]
pub use esp32::*;
