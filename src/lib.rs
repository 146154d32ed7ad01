//! zirnevis - Persian subtitle translation
//!
//! Parses SRT and VTT subtitles into cues, translates each cue into Persian
//! with a Gemini model using neighbouring lines as context, and writes the
//! result back in the source format.

pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod subtitle;
pub mod translate;
pub mod workflow;
