/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Quality factor recovery from quantization tables.
//!
//! Encoders derive their quantization tables by scaling the example
//! luminance table of ITU-T T.81 Annex K with a quality factor Q in
//! 1..=100. Inverting that scaling gives a single small integer that
//! summarizes how aggressively a frame was quantized, which downstream
//! change detection needs in order to weigh coefficient differences
//! consistently across frames.
//!
//! Recovery runs the scaling forward for every candidate Q and keeps the
//! candidate whose table is closest (by sum of absolute differences) to the
//! parsed one. That is insensitive to how the encoder rounded and is exact
//! for tables produced by the formula below. Two frames carrying the same
//! table always recover the same Q, which is the property the difference
//! engine relies on.

/// The example luminance quantization table of ITU-T T.81 Annex K,
/// in natural (row major) order.
#[rustfmt::skip]
pub(crate) const ANNEX_K_LUMA_QT: [i32; 64] = [
    16,  11,  10,  16,  24,  40,  51,  61,
    12,  12,  14,  19,  26,  58,  60,  55,
    14,  13,  16,  24,  40,  57,  69,  56,
    14,  17,  22,  29,  51,  87,  80,  62,
    18,  22,  37,  56,  68, 109, 103,  77,
    24,  35,  55,  64,  81, 104, 113,  92,
    49,  64,  78,  87, 103, 121, 120, 101,
    72,  92,  95,  98, 112, 100, 103,  99
];

/// The Annex K luminance table scaled for a quality factor, in natural
/// (row major) order.
///
/// `q_factor` is clamped to 1..=100. For Q >= 50 each entry becomes
/// `max(base * (100 - Q) / 50, 1)`, below 50 it becomes
/// `min(base * 50 / Q, 255)`, matching the common encoder convention.
#[must_use]
pub fn luma_quantization_table(q_factor: u8) -> [u8; 64] {
    let q = i32::from(q_factor.clamp(1, 100));
    let mut table = [0_u8; 64];

    for (out, base) in table.iter_mut().zip(ANNEX_K_LUMA_QT.iter()) {
        let scaled = if q >= 50 {
            (base * (100 - q) / 50).max(1)
        } else {
            (base * 50 / q).min(255)
        };

        *out = scaled as u8;
    }

    table
}

/// Recover the quality factor of a parsed luminance table, natural order.
///
/// Returns the Q in 1..=100 whose scaled Annex K table is nearest to
/// `table`; ties resolve to the smaller Q and exact matches short-circuit.
pub(crate) fn estimate_q_factor(table: &[i32; 64]) -> u8 {
    let mut best_q = 1;
    let mut best_distance = u32::MAX;

    for q in 1..=100 {
        let candidate = luma_quantization_table(q);
        let distance: u32 = candidate
            .iter()
            .zip(table.iter())
            .map(|(a, b)| i32::from(*a).abs_diff(*b))
            .sum();

        if distance == 0 {
            return q;
        }

        if distance < best_distance {
            best_distance = distance;
            best_q = q;
        }
    }

    best_q
}
