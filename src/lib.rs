//! framegrab: key-triggered frame buffer screenshots
//!
//! This library provides an app state that plugs into a game engine's render
//! pipeline, reads the frame buffer back when Print Screen is pressed and
//! hands the pixels to a handler, by default writing numbered PNG files.
//! The engine is reached only through the traits in [`host`]; a headless
//! implementation of those traits is included for tests and tooling.

pub mod capture;
pub mod config;
pub mod error;
pub mod host;
pub mod model;
pub mod util;
