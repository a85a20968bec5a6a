/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! JPEG marker byte definitions, ITU-T T.81 Table B.1.

/// Markers that can appear in a JPEG stream.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
#[allow(clippy::upper_case_acronyms)]
pub(crate) enum Marker {
    /// Start of image
    SOI,
    /// End of image
    EOI,
    /// Temporary private use in arithmetic coding
    TEM,
    /// Comment
    COM,
    /// Define Huffman tables
    DHT,
    /// Define quantization tables
    DQT,
    /// Define restart interval
    DRI,
    /// Start of scan
    SOS,
    /// Define number of lines
    DNL,
    /// Define arithmetic coding conditioning
    DAC,
    /// Define hierarchical progression
    DHP,
    /// Expand reference components
    EXP,
    /// Application segments, 0xE0..=0xEF
    APP(u8),
    /// Start of frame, the argument distinguishes the coding scheme.
    /// `SOF(0)` is baseline DCT, the only one the decoder accepts.
    SOF(u8),
    /// Restart markers, 0xD0..=0xD7
    RST(u8)
}

impl Marker {
    /// Map a byte following `0xFF` to a marker.
    ///
    /// Returns `None` for `0x00` (a stuffed byte, not a marker), `0xFF`
    /// (a fill byte) and the reserved range below `0xC0`.
    pub(crate) fn from_u8(byte: u8) -> Option<Marker> {
        use Marker::{APP, COM, DAC, DHP, DHT, DNL, DQT, DRI, EOI, EXP, RST, SOF, SOI, SOS, TEM};

        match byte {
            0x01 => Some(TEM),
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => Some(SOF(byte - 0xC0)),
            0xC4 => Some(DHT),
            0xCC => Some(DAC),
            0xD0..=0xD7 => Some(RST(byte - 0xD0)),
            0xD8 => Some(SOI),
            0xD9 => Some(EOI),
            0xDA => Some(SOS),
            0xDB => Some(DQT),
            0xDC => Some(DNL),
            0xDD => Some(DRI),
            0xDE => Some(DHP),
            0xDF => Some(EXP),
            0xE0..=0xEF => Some(APP(byte - 0xE0)),
            0xFE => Some(COM),
            _ => None
        }
    }
}
