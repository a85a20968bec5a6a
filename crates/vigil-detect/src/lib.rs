/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Motion and crowd detection over the compressed representation of a JPEG
//! video stream.
//!
//! Successive frames are compared without ever decoding them to pixels:
//! each frame's quantized luminance DCT coefficients are extracted with
//! [`vigil_jpeg`] and the per-block sum of absolute coefficient differences
//! against the previous frame, corrected for the stream's quality factor,
//! forms a change map. Blocks whose change magnitude reaches the configured
//! sensitivity threshold count as detected.
//!
//! The entry point is [`MotionDetector`]: feed it one complete JPEG per
//! frame, subscribe to the listeners you care about and optionally let
//! [`MotionDetector::start_auto_sensitivity`] learn a threshold from a few
//! seconds of observed motion.
//!
//! ```no_run
//! use vigil_detect::{DetectorOptions, MotionDetector};
//!
//! let options = DetectorOptions::new().set_sensitivity(200);
//! let mut detector = MotionDetector::new_with_options(options);
//!
//! detector.on_area(|percent| {
//!     if percent > 10.0 {
//!         println!("movement over {percent:.1}% of the frame");
//!     }
//! });
//!
//! for frame in frames() {
//!     detector.process_frame(&frame, None);
//! }
//! # fn frames() -> Vec<Vec<u8>> { vec![] }
//! ```
//!
//! A detector owns its buffers and is single-threaded; to watch several
//! streams, give each stream its own instance.

#![warn(
    clippy::correctness,
    clippy::perf,
    clippy::pedantic,
    clippy::inline_always,
    clippy::panic
)]
#![allow(
    clippy::needless_return,
    clippy::similar_names,
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

pub use crate::detector::MotionDetector;
pub use crate::options::DetectorOptions;

mod auto_sensitivity;
mod detector;
mod diff;
mod frame_store;
mod options;
