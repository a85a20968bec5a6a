/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Test support: a minimal baseline JPEG encoder.
//!
//! Integration tests need JPEG files whose quantized luminance coefficients
//! are known exactly, so instead of committing fixtures this crate builds
//! them. The encoder emits a single interleaved baseline scan with
//! deliberately simple Huffman tables:
//!
//! - the DC table holds the twelve difference categories as four bit codes
//!   whose code value equals the category,
//! - the AC table holds all 162 legal run/size symbols as eight bit codes
//!   whose code value equals the symbol's index.
//!
//! Both are valid canonical tables, so a conforming decoder handles them
//! like any other, and encoding needs no lookup at all. Byte stuffing,
//! 1-bit fill padding and the marker layout follow the standard.

#![allow(clippy::cast_possible_truncation)]

use vigil_jpeg::luma_quantization_table;

/// Zig-zag scan order, `zig_zag[i] = natural[ZIGZAG_NATURAL[i]]`.
#[rustfmt::skip]
const ZIGZAG_NATURAL: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63
];

/// AC code value of the end-of-block symbol.
const AC_EOB: u16 = 160;

/// AC code value of the zero-run-length symbol.
const AC_ZRL: u16 = 161;

/// Component layouts the builder can emit.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Sampling {
    /// One component, 1x1.
    Gray,
    /// Y/Cb/Cr, luma 1x1.
    Ycbcr444,
    /// Y/Cb/Cr, luma 2x1.
    Ycbcr422,
    /// Y/Cb/Cr, luma 1x2.
    Ycbcr440,
    /// Y/Cb/Cr, luma 2x2.
    Ycbcr420
}

impl Sampling {
    /// Luminance (horizontal, vertical) sampling factors.
    pub fn factors(self) -> (usize, usize) {
        match self {
            Sampling::Gray | Sampling::Ycbcr444 => (1, 1),
            Sampling::Ycbcr422 => (2, 1),
            Sampling::Ycbcr440 => (1, 2),
            Sampling::Ycbcr420 => (2, 2)
        }
    }

    fn components(self) -> usize {
        if self == Sampling::Gray {
            1
        } else {
            3
        }
    }
}

/// Builds baseline JPEG files around caller-supplied luminance
/// coefficients.
///
/// Coefficient blocks are given in raster order, each block holding its 64
/// quantized values in zig-zag scan order; chrominance blocks (when the
/// layout has them) are emitted all zero.
pub struct JpegBuilder {
    width: u16,
    height: u16,
    q_factor: u8,
    sampling: Sampling,
    restart_interval: Option<u16>,
    omit_eoi: bool
}

impl JpegBuilder {
    /// A grayscale builder with quality factor 50.
    pub fn new(width: u16, height: u16) -> JpegBuilder {
        JpegBuilder {
            width,
            height,
            q_factor: 50,
            sampling: Sampling::Gray,
            restart_interval: None,
            omit_eoi: false
        }
    }

    #[must_use]
    pub fn q_factor(mut self, q_factor: u8) -> JpegBuilder {
        self.q_factor = q_factor;
        self
    }

    #[must_use]
    pub fn sampling(mut self, sampling: Sampling) -> JpegBuilder {
        self.sampling = sampling;
        self
    }

    /// Emit a DRI segment declaring `interval`.
    #[must_use]
    pub fn restart_interval(mut self, interval: u16) -> JpegBuilder {
        self.restart_interval = Some(interval);
        self
    }

    /// Drop the closing EOI marker, producing a truncated file.
    #[must_use]
    pub fn omit_eoi(mut self) -> JpegBuilder {
        self.omit_eoi = true;
        self
    }

    /// Luminance blocks per row for the configured geometry.
    pub fn blocks_x(&self) -> usize {
        let (h_samp, _) = self.sampling.factors();
        let width = usize::from(self.width);

        if h_samp == 1 {
            (width + 7) / 8
        } else {
            2 * ((width + 15) / 16)
        }
    }

    /// Luminance block rows for the configured geometry.
    pub fn blocks_y(&self) -> usize {
        let (_, v_samp) = self.sampling.factors();
        let height = usize::from(self.height);

        if v_samp == 1 {
            (height + 7) / 8
        } else {
            2 * ((height + 15) / 16)
        }
    }

    /// An all-zero coefficient grid matching the geometry.
    pub fn zero_blocks(&self) -> Vec<[i16; 64]> {
        vec![[0; 64]; self.blocks_x() * self.blocks_y()]
    }

    /// Assemble the JPEG file.
    ///
    /// # Panics
    /// If the block count does not match the geometry or a coefficient is
    /// outside the encodable range (DC differences 11 bits, AC values
    /// 10 bits).
    pub fn build(&self, luma_blocks: &[[i16; 64]]) -> Vec<u8> {
        let (h_samp, v_samp) = self.sampling.factors();
        let blocks_x = self.blocks_x();
        let blocks_y = self.blocks_y();

        assert_eq!(
            luma_blocks.len(),
            blocks_x * blocks_y,
            "expected {}x{} luminance blocks",
            blocks_x,
            blocks_y
        );

        let mut out = vec![0xFF, 0xD8];

        self.push_app0(&mut out);
        self.push_dqt(&mut out);

        if let Some(interval) = self.restart_interval {
            push_segment(&mut out, 0xDD, &interval.to_be_bytes());
        }

        self.push_sof(&mut out);
        push_dht(&mut out);
        self.push_sos(&mut out);

        // the entropy-coded scan, MCU by MCU
        let mut writer = BitWriter::new();
        let mut luma_pred = 0_i32;
        let mut cb_pred = 0_i32;
        let mut cr_pred = 0_i32;
        let zero_block = [0_i16; 64];

        for mcu_y in 0..blocks_y / v_samp {
            for mcu_x in 0..blocks_x / h_samp {
                for v in 0..v_samp {
                    for h in 0..h_samp {
                        let index = (mcu_y * v_samp + v) * blocks_x + (mcu_x * h_samp + h);

                        encode_block(&mut writer, &luma_blocks[index], &mut luma_pred);
                    }
                }

                if self.sampling != Sampling::Gray {
                    encode_block(&mut writer, &zero_block, &mut cb_pred);
                    encode_block(&mut writer, &zero_block, &mut cr_pred);
                }
            }
        }

        writer.finish();
        out.extend_from_slice(&writer.bytes);

        if !self.omit_eoi {
            out.extend_from_slice(&[0xFF, 0xD9]);
        }

        out
    }

    fn push_app0(&self, out: &mut Vec<u8>) {
        let payload = [
            b'J', b'F', b'I', b'F', 0, // identifier
            1, 1, // version
            0, // aspect ratio units
            0, 1, 0, 1, // pixel aspect ratio
            0, 0 // no thumbnail
        ];

        push_segment(out, 0xE0, &payload);
    }

    fn push_dqt(&self, out: &mut Vec<u8>) {
        let natural = luma_quantization_table(self.q_factor);
        let mut payload = [0_u8; 65];

        // information byte zero: 8 bit precision, table slot 0
        for (zigzag_position, value) in payload[1..].iter_mut().enumerate() {
            *value = natural[ZIGZAG_NATURAL[zigzag_position]];
        }

        push_segment(out, 0xDB, &payload);
    }

    fn push_sof(&self, out: &mut Vec<u8>) {
        let (h_samp, v_samp) = self.sampling.factors();
        let samp_byte = ((h_samp as u8) << 4) | v_samp as u8;
        let mut payload = vec![8]; // bit precision

        payload.extend_from_slice(&self.height.to_be_bytes());
        payload.extend_from_slice(&self.width.to_be_bytes());
        payload.push(self.sampling.components() as u8);
        payload.extend_from_slice(&[1, samp_byte, 0]);

        if self.sampling != Sampling::Gray {
            payload.extend_from_slice(&[2, 0x11, 0]);
            payload.extend_from_slice(&[3, 0x11, 0]);
        }

        push_segment(out, 0xC0, &payload);
    }

    fn push_sos(&self, out: &mut Vec<u8>) {
        let components = self.sampling.components();
        let mut payload = vec![components as u8];

        for id in 1..=components as u8 {
            // every component selects DC table 0 and AC table 0
            payload.extend_from_slice(&[id, 0x00]);
        }

        // spectral selection 0..63, no successive approximation
        payload.extend_from_slice(&[0, 63, 0]);

        push_segment(out, 0xDA, &payload);
    }
}

/// Append a `0xFF`-prefixed, length-prefixed marker segment.
fn push_segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&((payload.len() as u16 + 2).to_be_bytes()));
    out.extend_from_slice(payload);
}

/// Append the two fixed Huffman tables.
fn push_dht(out: &mut Vec<u8>) {
    // DC: twelve categories, all four bit codes, code value == category
    let mut payload = vec![0x00]; // class 0, slot 0
    let mut counts = [0_u8; 16];

    counts[3] = 12;
    payload.extend_from_slice(&counts);
    payload.extend(0..=11_u8);
    push_segment(out, 0xC4, &payload);

    // AC: all 162 legal run/size symbols, all eight bit codes, code value
    // == symbol index (run * 10 + size - 1, then EOB, then ZRL)
    let mut payload = vec![0x10]; // class 1, slot 0
    let mut counts = [0_u8; 16];

    counts[7] = 162;
    payload.extend_from_slice(&counts);

    for run in 0..16_u8 {
        for size in 1..=10_u8 {
            payload.push((run << 4) | size);
        }
    }

    payload.push(0x00); // EOB
    payload.push(0xF0); // ZRL
    push_segment(out, 0xC4, &payload);
}

/// Huffman-encode one block given in zig-zag order.
fn encode_block(writer: &mut BitWriter, block: &[i16; 64], dc_pred: &mut i32) {
    let dc = i32::from(block[0]);
    let diff = dc - *dc_pred;

    *dc_pred = dc;

    let (category, bits) = magnitude_bits(diff);

    assert!(category <= 11, "DC difference {diff} is out of range");
    writer.put_bits(u16::from(category), 4);

    if category > 0 {
        writer.put_bits(bits, category);
    }

    let mut run = 0_u8;

    for value in &block[1..] {
        let value = i32::from(*value);

        if value == 0 {
            run += 1;
            continue;
        }

        while run > 15 {
            writer.put_bits(AC_ZRL, 8);
            run -= 16;
        }

        let (size, bits) = magnitude_bits(value);

        assert!((1..=10).contains(&size), "AC coefficient {value} is out of range");
        writer.put_bits(u16::from(run) * 10 + u16::from(size) - 1, 8);
        writer.put_bits(bits, size);
        run = 0;
    }

    if run > 0 {
        writer.put_bits(AC_EOB, 8);
    }
}

/// Category and magnitude bits of a coefficient, per the JPEG convention
/// where a cleared top bit encodes the negative range.
fn magnitude_bits(value: i32) -> (u8, u16) {
    if value == 0 {
        return (0, 0);
    }

    let magnitude = value.unsigned_abs();
    let category = (32 - magnitude.leading_zeros()) as u8;
    let mask = (1_u32 << category) - 1;
    let bits = if value < 0 {
        (value + mask as i32) as u32 & mask
    } else {
        value as u32 & mask
    };

    (category, bits as u16)
}

/// MSB-first bit assembler with `0xFF 0x00` byte stuffing.
struct BitWriter {
    bytes: Vec<u8>,
    buffer: u32,
    count: u8
}

impl BitWriter {
    fn new() -> BitWriter {
        BitWriter {
            bytes: Vec::new(),
            buffer: 0,
            count: 0
        }
    }

    fn put_bits(&mut self, value: u16, count: u8) {
        debug_assert!(count <= 16 && u32::from(value) < (1 << count));

        self.buffer = (self.buffer << count) | u32::from(value);
        self.count += count;

        while self.count >= 8 {
            let byte = (self.buffer >> (self.count - 8)) as u8;

            self.bytes.push(byte);

            if byte == 0xFF {
                self.bytes.push(0x00);
            }

            self.count -= 8;
        }

        self.buffer &= (1 << self.count) - 1;
    }

    /// Pad the final partial byte with 1 bits.
    fn finish(&mut self) {
        let partial = self.count % 8;

        if partial > 0 {
            let pad = 8 - partial;

            self.put_bits((1 << pad) - 1, pad);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{magnitude_bits, BitWriter, JpegBuilder, Sampling};

    #[test]
    fn magnitude_encoding_matches_the_jpeg_convention() {
        assert_eq!(magnitude_bits(0), (0, 0));
        assert_eq!(magnitude_bits(1), (1, 1));
        assert_eq!(magnitude_bits(-1), (1, 0));
        assert_eq!(magnitude_bits(10), (4, 10));
        assert_eq!(magnitude_bits(-10), (4, 5));
        assert_eq!(magnitude_bits(2047), (11, 2047));
        assert_eq!(magnitude_bits(-2047), (11, 0));
    }

    #[test]
    fn writer_stuffs_ff_bytes() {
        let mut writer = BitWriter::new();

        writer.put_bits(0xFF, 8);
        writer.put_bits(0x12, 8);
        writer.finish();

        assert_eq!(writer.bytes, [0xFF, 0x00, 0x12]);
    }

    #[test]
    fn writer_pads_with_ones() {
        let mut writer = BitWriter::new();

        writer.put_bits(0b101, 3);
        writer.finish();

        assert_eq!(writer.bytes, [0b1011_1111]);
    }

    #[test]
    fn geometry_follows_the_sampling_factors() {
        let gray = JpegBuilder::new(20, 20);
        assert_eq!((gray.blocks_x(), gray.blocks_y()), (3, 3));

        let sub = JpegBuilder::new(20, 20).sampling(Sampling::Ycbcr420);
        assert_eq!((sub.blocks_x(), sub.blocks_y()), (4, 4));
    }
}
