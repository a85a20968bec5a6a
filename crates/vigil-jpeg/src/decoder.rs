/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Main decoder logic.

use std::io::{Cursor, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};
use log::{trace, warn};

use crate::components::Component;
use crate::errors::{DecodeErrors, UnsupportedSchemes};
use crate::headers::{parse_dqt, parse_dri, parse_huffman, parse_sos, parse_start_of_frame};
use crate::huffman::HuffmanTable;
use crate::marker::Marker;
use crate::misc::DCT_BLOCK;
use crate::options::DecoderOptions;

/// Huffman table slots a baseline scan may reference.
pub(crate) const HUFFMAN_TABLES: usize = 2;

/// Quantization table slots.
pub(crate) const QUANT_TABLES: usize = 4;

/// Maximum components in a frame, Y or Y/Cb/Cr.
pub(crate) const MAX_COMPONENTS: usize = 3;

/// Geometry and quantization summary of a parsed frame.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub struct FrameInfo {
    /// Width of the image in pixels.
    pub width: u16,
    /// Height of the image in pixels.
    pub height: u16,
    /// Number of components, 1 or 3.
    pub components: u8,
    /// 8x8 luminance blocks per row.
    pub blocks_x: usize,
    /// 8x8 luminance block rows.
    pub blocks_y: usize,
    /// Quality factor recovered from the luminance quantization table,
    /// 1..=100.
    pub q_factor: u8
}

/// A coefficient decoder instance over one JPEG byte buffer.
///
/// The decoder is transactional: feed it a complete JPEG file, get back the
/// luminance coefficient array and a [`FrameInfo`] describing it. It keeps
/// no pixels and performs no dequantization.
pub struct CoeffDecoder<'a> {
    /// Byte stream over the input, used for the marker section.
    pub(crate) stream: Cursor<&'a [u8]>,
    pub(crate) options: DecoderOptions,
    pub(crate) info: FrameInfo,
    /// Components declared by SOF, annotated by SOS.
    pub(crate) components: Vec<Component>,
    /// DC Huffman tables keyed by their DHT slot.
    pub(crate) dc_huffman_tables: [Option<HuffmanTable>; HUFFMAN_TABLES],
    /// AC Huffman tables keyed by their DHT slot.
    pub(crate) ac_huffman_tables: [Option<HuffmanTable>; HUFFMAN_TABLES],
    /// Quantization tables in natural order, keyed by their DQT slot.
    pub(crate) qt_tables: [Option<[i32; 64]>; QUANT_TABLES],
    /// Scan position -> index into `components`.
    pub(crate) scan_order: [usize; MAX_COMPONENTS],
    /// Luminance horizontal sampling factor, 1 or 2.
    pub(crate) h_samp: usize,
    /// Luminance vertical sampling factor, 1 or 2.
    pub(crate) v_samp: usize,
    /// Restart interval from DRI. Anything nonzero fails the parse, the
    /// field only exists so the rejected value can be reported.
    pub(crate) restart_interval: usize,
    pub(crate) seen_sof: bool,
    pub(crate) headers_decoded: bool,
    /// Byte offset where the entropy-coded segment begins, set by SOS.
    pub(crate) scan_start: usize
}

impl<'a> CoeffDecoder<'a> {
    /// Create a new decoder over a buffer holding a complete JPEG file.
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new(data: &'a [u8]) -> CoeffDecoder<'a> {
        CoeffDecoder::new_with_options(DecoderOptions::default(), data)
    }

    /// Create a new decoder with explicit options.
    #[must_use]
    pub fn new_with_options(options: DecoderOptions, data: &'a [u8]) -> CoeffDecoder<'a> {
        CoeffDecoder {
            stream: Cursor::new(data),
            options,
            info: FrameInfo::default(),
            components: vec![],
            dc_huffman_tables: [None, None],
            ac_huffman_tables: [None, None],
            qt_tables: [None, None, None, None],
            scan_order: [0; MAX_COMPONENTS],
            h_samp: 1,
            v_samp: 1,
            restart_interval: 0,
            seen_sof: false,
            headers_decoded: false,
            scan_start: 0
        }
    }

    /// Decode the luminance coefficients into a fresh vector.
    ///
    /// The vector holds `blocks_x * blocks_y * 64` values, each block in
    /// zig-zag scan order, blocks in raster order.
    ///
    /// # Errors
    /// See [`DecodeErrors`] for the conditions that fail a parse.
    pub fn decode(&mut self) -> Result<Vec<i16>, DecodeErrors> {
        let mut coefficients = Vec::new();

        self.decode_into(&mut coefficients)?;

        Ok(coefficients)
    }

    /// Decode the luminance coefficients into a caller supplied vector.
    ///
    /// The vector is cleared and refilled; reusing one across frames of the
    /// same geometry avoids reallocating the coefficient storage.
    ///
    /// # Errors
    /// See [`DecodeErrors`] for the conditions that fail a parse.
    pub fn decode_into(&mut self, coefficients: &mut Vec<i16>) -> Result<(), DecodeErrors> {
        self.decode_headers_internal()?;
        self.decode_scan_into(coefficients)
    }

    /// Parse everything up to and including the SOS header without touching
    /// the entropy-coded data.
    ///
    /// After this call [`info`](Self::info) reports the frame geometry and
    /// quality factor.
    ///
    /// # Errors
    /// See [`DecodeErrors`] for the conditions that fail a parse.
    pub fn decode_headers(&mut self) -> Result<(), DecodeErrors> {
        self.decode_headers_internal()
    }

    /// Returns the frame information, present once headers were
    /// successfully decoded.
    #[must_use]
    pub fn info(&self) -> Option<FrameInfo> {
        if !self.headers_decoded {
            return None;
        }

        Some(self.info)
    }

    /// Width of the image, valid after header decoding.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.info.width
    }

    /// Height of the image, valid after header decoding.
    #[must_use]
    pub fn height(&self) -> u16 {
        self.info.height
    }

    fn decode_headers_internal(&mut self) -> Result<(), DecodeErrors> {
        if self.headers_decoded {
            trace!("Headers already decoded");
            return Ok(());
        }
        // first two bytes must be the SOI marker
        let magic_bytes = self.stream.read_u16::<BigEndian>()?;

        if magic_bytes != 0xFFD8 {
            return Err(DecodeErrors::IllegalMagicBytes(magic_bytes));
        }

        loop {
            let byte = self.stream.read_u8()?;

            if byte != 0xFF {
                return Err(DecodeErrors::Format(format!(
                    "Expected a marker, got stray byte {byte:#04x}"
                )));
            }
            // a marker may be preceded by any number of 0xFF fill bytes
            let mut marker_byte = self.stream.read_u8()?;

            while marker_byte == 0xFF {
                marker_byte = self.stream.read_u8()?;
            }

            match Marker::from_u8(marker_byte) {
                Some(marker) => {
                    self.parse_marker_inner(marker, marker_byte)?;

                    if marker == Marker::SOS {
                        self.headers_decoded = true;
                        return Ok(());
                    }
                }
                None => {
                    warn!("Marker 0xFF{:X} not known", marker_byte);
                    self.skip_marker_segment()?;
                }
            }
        }
    }

    pub(crate) fn parse_marker_inner(
        &mut self, marker: Marker, marker_byte: u8
    ) -> Result<(), DecodeErrors> {
        match marker {
            Marker::SOF(0) => {
                trace!("Image encoding scheme = baseline DCT");
                parse_start_of_frame(self)?;
            }
            // encoding schemes we know of but do not implement
            Marker::SOF(version) => {
                return match UnsupportedSchemes::from_int(version) {
                    Some(scheme) => Err(DecodeErrors::Unsupported(scheme)),
                    None => Err(DecodeErrors::Format(format!(
                        "Unsupported start of frame marker 0xFF{:02X}",
                        0xC0 + version
                    )))
                };
            }
            Marker::DQT => {
                parse_dqt(self)?;
            }
            Marker::DHT => {
                parse_huffman(self)?;
            }
            Marker::DRI => {
                parse_dri(self)?;
            }
            Marker::SOS => {
                parse_sos(self)?;
                // what follows is the entropy-coded data
            }
            Marker::SOI | Marker::EOI | Marker::TEM | Marker::RST(_) => {
                return Err(DecodeErrors::UnexpectedMarker(marker_byte));
            }
            Marker::DAC => {
                return Err(DecodeErrors::FormatStatic(
                    "Arithmetic coding conditioning is not supported, cannot continue"
                ));
            }
            Marker::DNL | Marker::DHP | Marker::EXP => {
                return Err(DecodeErrors::Format(format!(
                    "Parsing of the following header `{marker:?}` is not supported, cannot continue"
                )));
            }
            Marker::APP(_) | Marker::COM => {
                trace!("Skipping `{:?}` segment", marker);
                self.skip_marker_segment()?;
            }
        }

        Ok(())
    }

    /// Step over a length-prefixed segment the decoder has no use for.
    fn skip_marker_segment(&mut self) -> Result<(), DecodeErrors> {
        let length = self.stream.read_u16::<BigEndian>()?;

        if length < 2 {
            return Err(DecodeErrors::Format(format!(
                "Found a marker with invalid length : {length}"
            )));
        }

        self.stream.seek(SeekFrom::Current(i64::from(length - 2)))?;

        Ok(())
    }

    /// Confirm every scan component has the Huffman tables it selected.
    pub(crate) fn check_tables(&self) -> Result<(), DecodeErrors> {
        for component in &self.components {
            if self.dc_huffman_tables[component.dc_huff_table].is_none() {
                return Err(DecodeErrors::HuffmanDecode(format!(
                    "No DC table for component id {}",
                    component.id
                )));
            }

            if self.ac_huffman_tables[component.ac_huff_table].is_none() {
                return Err(DecodeErrors::HuffmanDecode(format!(
                    "No AC table for component id {}",
                    component.id
                )));
            }
        }

        Ok(())
    }

    /// Expected length of the coefficient output for this frame.
    pub(crate) fn output_len(&self) -> usize {
        self.info.blocks_x * self.info.blocks_y * DCT_BLOCK
    }
}
