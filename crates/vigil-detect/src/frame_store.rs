/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Storage for the two most recent frames and the shared change map.
//!
//! Two long-lived slots alternate between "current" and "previous" as
//! frames arrive, so a frame is parsed exactly once and compared twice.
//! Coefficient vectors are owned by the slots and refilled in place, which
//! keeps steady-state frame processing free of large allocations.

use log::warn;
use vigil_jpeg::{CoeffDecoder, FrameInfo};

/// One frame slot: the parse outcome, its geometry and its coefficients.
pub(crate) struct FrameSlot {
    /// Whether the slot holds a successfully parsed frame.
    pub(crate) parsed: bool,
    pub(crate) info: FrameInfo,
    /// Luminance coefficients, `blocks_x * blocks_y * 64` entries when
    /// `parsed` is set. Kept allocated across frames.
    pub(crate) coefficients: Vec<i16>
}

impl FrameSlot {
    fn new() -> FrameSlot {
        FrameSlot {
            parsed: false,
            info: FrameInfo::default(),
            coefficients: Vec::new()
        }
    }
}

/// Ping-pong store for the current and previous frame plus the change map
/// buffer shared with the difference engine.
pub(crate) struct FrameStore {
    slots: [FrameSlot; 2],
    current: usize,
    change_map: Vec<u8>,
    /// Set once the first frame fixed the block geometry. The change map is
    /// never resized afterwards, frames of a different size simply fail the
    /// difference step.
    size_checked: bool
}

impl FrameStore {
    pub(crate) fn new() -> FrameStore {
        FrameStore {
            slots: [FrameSlot::new(), FrameSlot::new()],
            current: 0,
            change_map: Vec::new(),
            size_checked: false
        }
    }

    /// Parse `jpeg` into the next slot, making it the current frame.
    ///
    /// Returns whether the parse succeeded. On failure the slot is marked
    /// invalid but keeps its buffers; the previous frame is untouched
    /// either way.
    pub(crate) fn ingest(&mut self, jpeg: &[u8]) -> bool {
        self.current ^= 1;

        let slot = &mut self.slots[self.current];

        slot.parsed = false;

        let mut decoder = CoeffDecoder::new(jpeg);

        if let Err(error) = decoder.decode_into(&mut slot.coefficients) {
            warn!("frame rejected: {error:?}");
            return false;
        }

        let info = match decoder.info() {
            Some(info) => info,
            None => return false
        };

        slot.info = info;
        slot.parsed = true;

        if !self.size_checked {
            self.change_map = vec![0; info.blocks_x * info.blocks_y];
            self.size_checked = true;
        }

        true
    }

    /// Current frame, previous frame and the change map, for the
    /// difference engine.
    pub(crate) fn parts(&mut self) -> (&FrameSlot, &FrameSlot, &mut [u8]) {
        (
            &self.slots[self.current],
            &self.slots[self.current ^ 1],
            &mut self.change_map
        )
    }

    pub(crate) fn change_map(&self) -> &[u8] {
        &self.change_map
    }
}
