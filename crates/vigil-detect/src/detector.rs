/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The detector facade.
//!
//! Binds the frame store, the difference engine and the auto-sensitivity
//! calibration together and fans results out to the registered listeners.
//! Everything runs synchronously inside [`MotionDetector::process_frame`]:
//! listeners fire in a fixed order (image, change info, area percentage,
//! auto sensitivity) and must return before the next frame goes in.
//!
//! The sensitivity exposed to hosts is inverted from the threshold used
//! internally: a user value of 256 means "most sensitive" and maps to the
//! internal threshold 1, the default user value 1 maps to 256 which no
//! byte-sized change magnitude reaches.

use log::trace;

use crate::auto_sensitivity::{AutoSensitivity, CalibrationStatus};
use crate::diff::diff_frames;
use crate::frame_store::FrameStore;
use crate::options::DetectorOptions;

type ImageListener = Box<dyn FnMut(Option<&[u8]>, Option<&[u8]>)>;
type DetectInfoListener = Box<dyn FnMut(Option<&[u8]>, &[u8], u16, Option<&[u8]>)>;
type AreaListener = Box<dyn FnMut(f32)>;
type AutoSensitivityListener = Box<dyn FnMut(u16)>;

/// Compressed-domain motion detector over a single JPEG stream.
///
/// See the [crate docs](crate) for an overview and an example.
pub struct MotionDetector {
    store: FrameStore,
    auto: AutoSensitivity,
    /// Internal threshold on block change magnitudes, 1..=256.
    threshold: u16,
    detected_area_threshold: f32,
    detected_blocks: usize,
    max_block_diff: i32,
    on_image: Option<ImageListener>,
    on_detect_info: Option<DetectInfoListener>,
    on_area: Option<AreaListener>,
    on_auto_sensitivity: Option<AutoSensitivityListener>
}

impl Default for MotionDetector {
    fn default() -> MotionDetector {
        MotionDetector::new()
    }
}

impl MotionDetector {
    /// Create a detector with default options.
    #[must_use]
    pub fn new() -> MotionDetector {
        MotionDetector::new_with_options(DetectorOptions::default())
    }

    /// Create a detector with explicit options.
    #[must_use]
    pub fn new_with_options(options: DetectorOptions) -> MotionDetector {
        MotionDetector {
            store: FrameStore::new(),
            auto: AutoSensitivity::new(),
            threshold: 257 - options.sensitivity().clamp(1, 256),
            detected_area_threshold: options.detected_area_threshold(),
            detected_blocks: 0,
            max_block_diff: -1,
            on_image: None,
            on_detect_info: None,
            on_area: None,
            on_auto_sensitivity: None
        }
    }

    /// Feed one complete JPEG frame into the detector.
    ///
    /// `original` is an opaque companion blob (say, the frame before an
    /// overlay was rendered) that is handed through to the listeners
    /// untouched.
    ///
    /// Returns whether the frame was compared against the previous one.
    /// The first frame, a frame that fails to parse and a frame whose
    /// geometry or quality factor differs from the previous one all return
    /// false; listeners still fire with empty results.
    pub fn process_frame(&mut self, jpeg: &[u8], original: Option<&[u8]>) -> bool {
        let parsed = self.store.ingest(jpeg);

        let stats = {
            let (current, previous, change_map) = self.store.parts();

            diff_frames(current, previous, change_map, self.threshold)
        };

        let compared = stats.is_some();

        match &stats {
            Some(stats) => {
                self.detected_blocks = stats.detected_blocks;
                self.max_block_diff = stats.max_block_diff;
            }
            None => {
                self.detected_blocks = 0;
                self.max_block_diff = -1;
            }
        }

        trace!(
            "frame processed: parsed={parsed} compared={compared} detected={} max={}",
            self.detected_blocks,
            self.max_block_diff
        );

        // listeners observe the frame in a fixed order
        let image = if parsed { Some(jpeg) } else { None };
        let companion = if parsed { original } else { None };

        if let Some(listener) = &mut self.on_image {
            listener(image, companion);
        }

        if let Some(listener) = &mut self.on_detect_info {
            listener(image, self.store.change_map(), self.threshold, companion);
        }

        let block_count = self.store.change_map().len();
        let area = if compared && block_count > 0 {
            100.0 * self.detected_blocks as f32 / block_count as f32
        } else {
            0.0
        };

        if let Some(listener) = &mut self.on_area {
            listener(area);
        }

        if compared {
            self.auto.record_max(self.max_block_diff);

            match self.auto.poll() {
                CalibrationStatus::Ready(threshold) => {
                    // report the recommendation on the user-facing scale
                    if let Some(listener) = &mut self.on_auto_sensitivity {
                        listener(257 - threshold);
                    }
                }
                CalibrationStatus::TimedOut => {
                    if let Some(listener) = &mut self.on_auto_sensitivity {
                        listener(0);
                    }
                }
                CalibrationStatus::Idle | CalibrationStatus::Sampling => {}
            }
        }

        compared
    }

    /// Begin learning a sensitivity from the next seconds of frames.
    ///
    /// Returns false when a calibration run is already active. The outcome
    /// arrives through the auto-sensitivity listener: a user-facing value
    /// in 1..=256 on success, 0 when the run timed out.
    pub fn start_auto_sensitivity(&mut self) -> bool {
        self.auto.start()
    }

    /// User-facing sensitivity in 1..=256, higher detects smaller changes.
    #[must_use]
    pub fn sensitivity(&self) -> u16 {
        257 - self.threshold
    }

    /// Set the user-facing sensitivity, clamped to 1..=256.
    pub fn set_sensitivity(&mut self, sensitivity: u16) {
        self.threshold = 257 - sensitivity.clamp(1, 256);
    }

    /// Detected-area threshold in percent, carried for the host.
    #[must_use]
    pub fn detected_area_threshold(&self) -> f32 {
        self.detected_area_threshold
    }

    /// Store a detected-area threshold in percent.
    pub fn set_detected_area_threshold(&mut self, percent: f32) {
        self.detected_area_threshold = percent;
    }

    /// Detected block count of the most recent comparison.
    #[must_use]
    pub fn detected_blocks(&self) -> usize {
        self.detected_blocks
    }

    /// Largest block change magnitude of the most recent comparison,
    /// -1 when the frames were not comparable.
    #[must_use]
    pub fn max_block_diff(&self) -> i32 {
        self.max_block_diff
    }

    /// The change map of the most recent comparison, one magnitude per
    /// 8x8 block in raster order. Empty until a frame parsed.
    #[must_use]
    pub fn change_map(&self) -> &[u8] {
        self.store.change_map()
    }

    /// Register the full-image listener, called per frame with the frame's
    /// bytes and the companion blob (both absent when the parse failed).
    pub fn on_image(&mut self, listener: impl FnMut(Option<&[u8]>, Option<&[u8]>) + 'static) {
        self.on_image = Some(Box::new(listener));
    }

    /// Register the change-info listener, called per frame with the frame
    /// bytes, the change map, the internal threshold and the companion
    /// blob.
    pub fn on_detect_info(
        &mut self, listener: impl FnMut(Option<&[u8]>, &[u8], u16, Option<&[u8]>) + 'static
    ) {
        self.on_detect_info = Some(Box::new(listener));
    }

    /// Register the detected-area listener, called per frame with the
    /// percentage of blocks at or above the threshold (0.0..=100.0).
    pub fn on_area(&mut self, listener: impl FnMut(f32) + 'static) {
        self.on_area = Some(Box::new(listener));
    }

    /// Register the auto-sensitivity listener; fires only when a
    /// calibration run concludes.
    pub fn on_auto_sensitivity(&mut self, listener: impl FnMut(u16) + 'static) {
        self.on_auto_sensitivity = Some(Box::new(listener));
    }
}
