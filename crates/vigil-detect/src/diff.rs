/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The interframe difference engine.
//!
//! For every 8x8 block the engine sums the absolute differences of the 64
//! quantized coefficients between the current and previous frame. Because
//! the coefficients are still quantized, the raw sum scales inversely with
//! the quantization step: a high quality factor leaves small steps and
//! inflates the sums. The quality correction below rescales the sums so a
//! given amount of scene change produces a comparable magnitude at any Q,
//! and the result is clamped to a byte per block.

use log::warn;

use crate::frame_store::FrameSlot;

/// Outcome of a successful difference pass.
pub(crate) struct DiffStats {
    /// Blocks whose change magnitude reached the threshold.
    pub(crate) detected_blocks: usize,
    /// Largest change magnitude of the frame pair, -1 before any block is
    /// visited.
    pub(crate) max_block_diff: i32
}

/// Quality dependent rescaling of a raw difference sum, applied as
/// `(sum * adjust) >> shift`.
pub(crate) fn quality_correction(q_factor: u8) -> (u32, u32) {
    if q_factor <= 68 {
        (1, 0)
    } else if q_factor < 97 {
        (u32::from(100 - q_factor), 5)
    } else {
        (u32::from(112 - q_factor), 7)
    }
}

/// Compare two frames block by block, writing magnitudes into `change_map`.
///
/// The map is cleared first in every case. `None` is returned without
/// further effect when the pair is not comparable: either frame failed to
/// parse, geometry or quality factor differ, the map has the wrong size or
/// the threshold is zero.
pub(crate) fn diff_frames(
    current: &FrameSlot, previous: &FrameSlot, change_map: &mut [u8], threshold: u16
) -> Option<DiffStats> {
    change_map.fill(0);

    if !current.parsed || !previous.parsed {
        return None;
    }

    let blocks_x = current.info.blocks_x;
    let blocks_y = current.info.blocks_y;

    if blocks_x == 0 || blocks_y == 0 {
        return None;
    }

    if (blocks_x, blocks_y) != (previous.info.blocks_x, previous.info.blocks_y) {
        warn!(
            "frame geometry changed from {}x{} to {}x{} blocks, not comparable",
            previous.info.blocks_x, previous.info.blocks_y, blocks_x, blocks_y
        );
        return None;
    }

    if current.info.q_factor != previous.info.q_factor {
        warn!(
            "quality factor changed from {} to {}, not comparable",
            previous.info.q_factor, current.info.q_factor
        );
        return None;
    }

    if change_map.len() != blocks_x * blocks_y {
        warn!("change map holds {} blocks, frame has {}", change_map.len(), blocks_x * blocks_y);
        return None;
    }

    if threshold == 0 {
        return None;
    }

    let (adjust, shift) = quality_correction(current.info.q_factor);

    let mut stats = DiffStats {
        detected_blocks: 0,
        max_block_diff: -1
    };

    for ((out, cur_block), prev_block) in change_map
        .iter_mut()
        .zip(current.coefficients.chunks_exact(64))
        .zip(previous.coefficients.chunks_exact(64))
    {
        let sum: u32 = cur_block
            .iter()
            .zip(prev_block.iter())
            .map(|(a, b)| u32::from(a.abs_diff(*b)))
            .sum();

        let magnitude = ((sum * adjust) >> shift).min(255);

        *out = magnitude as u8;

        if magnitude >= u32::from(threshold) {
            stats.detected_blocks += 1;
        }

        // ties update too, the latest equally-large block wins
        if magnitude as i32 >= stats.max_block_diff {
            stats.max_block_diff = magnitude as i32;
        }
    }

    Some(stats)
}

#[cfg(test)]
mod tests {
    use vigil_jpeg::FrameInfo;

    use super::{diff_frames, quality_correction};
    use crate::frame_store::FrameSlot;

    fn slot(blocks_x: usize, blocks_y: usize, q_factor: u8, coefficients: Vec<i16>) -> FrameSlot {
        FrameSlot {
            parsed: true,
            info: FrameInfo {
                width: (blocks_x * 8) as u16,
                height: (blocks_y * 8) as u16,
                components: 1,
                blocks_x,
                blocks_y,
                q_factor
            },
            coefficients
        }
    }

    #[test]
    fn correction_bands() {
        assert_eq!(quality_correction(1), (1, 0));
        assert_eq!(quality_correction(68), (1, 0));
        assert_eq!(quality_correction(69), (31, 5));
        assert_eq!(quality_correction(80), (20, 5));
        assert_eq!(quality_correction(96), (4, 5));
        assert_eq!(quality_correction(97), (15, 7));
        assert_eq!(quality_correction(100), (12, 7));
    }

    #[test]
    fn identical_frames_have_zero_map() {
        let a = slot(2, 1, 50, vec![3; 128]);
        let b = slot(2, 1, 50, vec![3; 128]);
        let mut map = vec![0xAA_u8; 2];

        let stats = diff_frames(&a, &b, &mut map, 10).unwrap();

        assert_eq!(map, [0, 0]);
        assert_eq!(stats.detected_blocks, 0);
        assert_eq!(stats.max_block_diff, 0);
    }

    #[test]
    fn magnitude_is_clamped() {
        let mut changed = vec![0_i16; 64];
        changed[1] = 300;
        let a = slot(1, 1, 50, changed);
        let b = slot(1, 1, 50, vec![0; 64]);
        let mut map = vec![0_u8; 1];

        let stats = diff_frames(&a, &b, &mut map, 10).unwrap();

        assert_eq!(map[0], 255);
        assert_eq!(stats.detected_blocks, 1);
        assert_eq!(stats.max_block_diff, 255);
    }

    #[test]
    fn quality_mismatch_fails_and_clears() {
        let a = slot(1, 1, 50, vec![0; 64]);
        let b = slot(1, 1, 80, vec![0; 64]);
        let mut map = vec![0x55_u8; 1];

        assert!(diff_frames(&a, &b, &mut map, 10).is_none());
        assert_eq!(map, [0]);
    }

    #[test]
    fn geometry_mismatch_fails() {
        let a = slot(2, 1, 50, vec![0; 128]);
        let b = slot(1, 1, 50, vec![0; 64]);
        let mut map = vec![0_u8; 2];

        assert!(diff_frames(&a, &b, &mut map, 10).is_none());
    }

    #[test]
    fn unparsed_frame_fails() {
        let a = slot(1, 1, 50, vec![0; 64]);
        let mut b = slot(1, 1, 50, vec![0; 64]);
        b.parsed = false;
        let mut map = vec![0_u8; 1];

        assert!(diff_frames(&a, &b, &mut map, 10).is_none());
    }
}
