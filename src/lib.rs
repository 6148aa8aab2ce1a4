//! reprise: a terminal music player built around a small playback session.
//!
//! The [`catalog`] turns selected files into tracks, the [`session`] owns the
//! playlist and its transport rules, and [`audio`] plays whatever the session
//! loads. The TUI and MPRIS front ends live in [`ui`], [`app`] and
//! [`mpris`]; [`runtime`] wires everything together.

pub mod app;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod error;
pub mod mpris;
pub mod runtime;
pub mod session;
pub mod ui;
