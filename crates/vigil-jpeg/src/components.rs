/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Per-component state shared between the frame header and the scan.

use crate::errors::DecodeErrors;

/// One image component as declared by the SOF segment, later annotated by
/// the SOS segment with its entropy table selectors.
pub(crate) struct Component {
    /// Component identifier from the frame header, unique per image.
    pub id: u8,
    /// Horizontal sampling factor, upper nibble of the sampling byte.
    pub horizontal_sample: usize,
    /// Vertical sampling factor, lower nibble of the sampling byte.
    pub vertical_sample: usize,
    /// Quantization table slot this component references.
    pub quantization_table: usize,
    /// DC Huffman table selector, set while parsing SOS.
    pub dc_huff_table: usize,
    /// AC Huffman table selector, set while parsing SOS.
    pub ac_huff_table: usize,
    /// DC predictor carried across this component's blocks.
    pub dc_pred: i32
}

impl Component {
    /// Build a component from its 3 byte SOF record
    /// `(id, sampling factors, quantization table)`.
    pub(crate) fn from_sof(record: [u8; 3], position: u8) -> Result<Component, DecodeErrors> {
        let id = record[0];
        let horizontal_sample = usize::from(record[1] >> 4);
        let vertical_sample = usize::from(record[1] & 0x0F);
        let quantization_table = usize::from(record[2]);

        if horizontal_sample == 0 || horizontal_sample > 4 {
            return Err(DecodeErrors::SofError(format!(
                "Bad horizontal sampling factor {horizontal_sample} for component {position}, expected 1..=4"
            )));
        }

        if vertical_sample == 0 || vertical_sample > 4 {
            return Err(DecodeErrors::SofError(format!(
                "Bad vertical sampling factor {vertical_sample} for component {position}, expected 1..=4"
            )));
        }

        if quantization_table > 3 {
            return Err(DecodeErrors::SofError(format!(
                "Bad quantization table slot {quantization_table} for component {position}, expected 0..=3"
            )));
        }

        Ok(Component {
            id,
            horizontal_sample,
            vertical_sample,
            quantization_table,
            dc_huff_table: 0,
            ac_huff_table: 0,
            dc_pred: 0
        })
    }
}
