//! Hardware-independent core library for tiltrack
//!
//! This crate contains all platform-agnostic logic for the two tiltrack
//! screens: the bubble level driven by accelerometer samples, and the GPS
//! distance tracker driven by location fixes. It covers tilt math and level
//! classification, the level-reached feedback trigger, distance accumulation,
//! conflating sensor feeds and the presentation state holders.
//!
//! Rendering, navigation and the concrete sensor/audio/vibration platform
//! bindings live outside this crate and plug in through the traits in
//! [`sensors`] and [`feedback`].
//!
//! It is `#![no_std]` so it compiles on both mobile/embedded targets and
//! desktop hosts (for the simulator and tests).

#![no_std]

pub mod app_state;
pub mod config;
pub mod feedback;
pub mod level;
pub mod sensors;
pub mod tracking;
