/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Decoding errors
//!
//! This module represents the errors the decoder can raise while pulling
//! coefficients out of a JPEG stream.

use std::fmt;
use std::io;

/// Errors that may occur while parsing a JPEG stream.
pub enum DecodeErrors {
    /// A catch-all condition with a formatted message
    Format(String),
    /// A catch-all condition with a static message
    FormatStatic(&'static str),
    /// The first two bytes of the image are not `0xFF 0xD8`
    IllegalMagicBytes(u16),
    /// The entropy-coded segment is not terminated by an EOI marker
    NoEndOfImage,
    /// A marker that may not appear before the scan data was found in the
    /// header section
    UnexpectedMarker(u8),
    /// Problems with the DHT segments or the Huffman coded stream
    HuffmanDecode(String),
    /// Problems with the DQT segment
    DqtError(String),
    /// Problems with the SOF segment
    SofError(String),
    /// Problems with the SOS segment
    SosError(String),
    /// An image dimension exceeds the configured limit
    LargeDimensions(usize),
    /// The image width or height is zero
    ZeroError,
    /// The stream ended while more bytes were expected
    ExhaustedData,
    /// The image uses a JPEG feature this decoder does not implement
    Unsupported(UnsupportedSchemes)
}

impl From<io::Error> for DecodeErrors {
    fn from(_: io::Error) -> DecodeErrors {
        // the only reads performed are against an in-memory cursor, the
        // sole io failure is running off the end of it
        DecodeErrors::ExhaustedData
    }
}

impl fmt::Debug for DecodeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            Self::Format(reason) => write!(f, "{reason}"),
            Self::FormatStatic(reason) => write!(f, "{reason}"),
            Self::IllegalMagicBytes(bytes) => {
                write!(f, "Not a JPEG file, magic bytes are {bytes:#06x}")
            }
            Self::NoEndOfImage => write!(f, "No end of image marker after the scan data"),
            Self::UnexpectedMarker(marker) => {
                write!(f, "Marker 0xFF{marker:02X} is not allowed before the scan data")
            }
            Self::HuffmanDecode(reason) => write!(f, "Error decoding huffman values: {reason}"),
            Self::DqtError(reason) => write!(f, "Error parsing DQT segment: {reason}"),
            Self::SofError(reason) => write!(f, "Error parsing SOF segment: {reason}"),
            Self::SosError(reason) => write!(f, "Error parsing SOS segment: {reason}"),
            Self::LargeDimensions(dimension) => {
                write!(f, "Image dimension {dimension} is larger than the configured limit")
            }
            Self::ZeroError => write!(f, "Image width or height is zero"),
            Self::ExhaustedData => write!(f, "Premature end of data"),
            Self::Unsupported(scheme) => write!(f, "Unsupported feature: {scheme:?}")
        }
    }
}

impl fmt::Display for DecodeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for DecodeErrors {}

/// JPEG compression schemes the decoder recognizes but does not implement.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum UnsupportedSchemes {
    /// SOF_1 Extended sequential DCT, Huffman coding
    ExtendedSequentialDctHuffman,
    /// SOF_2 Progressive DCT, Huffman coding
    ProgressiveDctHuffman,
    /// SOF_3 Lossless (sequential), Huffman coding
    LosslessHuffman,
    /// SOF_9 Extended sequential DCT, arithmetic coding
    ExtendedSequentialDctArithmetic,
    /// SOF_10 Progressive DCT, arithmetic coding
    ProgressiveDctArithmetic,
    /// SOF_11 Lossless (sequential), arithmetic coding
    LosslessArithmetic,
    /// A DRI segment declared a nonzero restart interval
    RestartIntervals
}

impl UnsupportedSchemes {
    #[must_use]
    /// Create an unsupported scheme from the lower nibble of an SOF marker.
    ///
    /// `int` is expected to be `marker_byte - 0xC0`, i.e `1` for SOF_1.
    pub fn from_int(int: u8) -> Option<UnsupportedSchemes> {
        match int {
            1 => Some(Self::ExtendedSequentialDctHuffman),
            2 => Some(Self::ProgressiveDctHuffman),
            3 => Some(Self::LosslessHuffman),
            9 => Some(Self::ExtendedSequentialDctArithmetic),
            10 => Some(Self::ProgressiveDctArithmetic),
            11 => Some(Self::LosslessArithmetic),
            _ => None
        }
    }
}
