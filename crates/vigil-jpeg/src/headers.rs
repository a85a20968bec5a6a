/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Decode JPEG markers/segments
//!
//! This file deals with decoding header information in a jpeg file

use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};
use log::trace;

use crate::components::Component;
use crate::decoder::{CoeffDecoder, HUFFMAN_TABLES, QUANT_TABLES};
use crate::errors::{DecodeErrors, UnsupportedSchemes};
use crate::huffman::HuffmanTable;
use crate::misc::UN_ZIGZAG;
use crate::quality::estimate_q_factor;

/// **B.2.4.2 Huffman table-specification syntax**
pub(crate) fn parse_huffman(decoder: &mut CoeffDecoder) -> Result<(), DecodeErrors> {
    // Read the length of the Huffman table
    let mut dht_length = i32::from(
        decoder
            .stream
            .read_u16::<BigEndian>()?
            .checked_sub(2)
            .ok_or(DecodeErrors::FormatStatic("Invalid Huffman length in image"))?
    );

    while dht_length > 16 {
        // HT information
        let ht_info = decoder.stream.read_u8()?;
        // third bit indicates whether the huffman encoding is DC or AC type
        let dc_or_ac = (ht_info >> 4) & 0xF;
        // position of this table
        let index = usize::from(ht_info & 0xF);

        if dc_or_ac > 1 {
            return Err(DecodeErrors::HuffmanDecode(format!(
                "Invalid DHT table class {dc_or_ac}, should be 0 or 1"
            )));
        }

        if index >= HUFFMAN_TABLES {
            return Err(DecodeErrors::HuffmanDecode(format!(
                "Invalid DHT table slot {index}, expected 0 or 1"
            )));
        }

        // read the number of symbols per code length
        let mut counts = [0_u8; 16];

        decoder.stream.read_exact(&mut counts)?;

        dht_length -= 1 + 16;

        let symbols_sum: i32 = counts.iter().map(|count| i32::from(*count)).sum();

        // The sum of the number of symbols cannot be greater than 256
        if symbols_sum == 0 || symbols_sum > 256 {
            return Err(DecodeErrors::FormatStatic(
                "Encountered Huffman table with bogus symbol count in DHT"
            ));
        }

        if symbols_sum > dht_length {
            return Err(DecodeErrors::HuffmanDecode(format!(
                "Excessive Huffman table of length {symbols_sum} found when header length is {dht_length}"
            )));
        }

        dht_length -= symbols_sum;

        // A table containing symbols in increasing code length
        let mut symbols = [0_u8; 256];

        decoder
            .stream
            .read_exact(&mut symbols[..symbols_sum as usize])?;

        trace!(
            "Read {} huffman table to slot {index}",
            if dc_or_ac == 0 { "DC" } else { "AC" }
        );

        // store
        let table = HuffmanTable::new(&counts, &symbols)?;

        if dc_or_ac == 0 {
            decoder.dc_huffman_tables[index] = Some(table);
        } else {
            decoder.ac_huffman_tables[index] = Some(table);
        }
    }

    if dht_length > 0 {
        return Err(DecodeErrors::FormatStatic("Bogus Huffman table definition"));
    }

    Ok(())
}

/// **B.2.4.1 Quantization table-specification syntax**
#[allow(clippy::needless_range_loop)]
pub(crate) fn parse_dqt(img: &mut CoeffDecoder) -> Result<(), DecodeErrors> {
    // read length
    let mut qt_length = img
        .stream
        .read_u16::<BigEndian>()?
        .checked_sub(2)
        .ok_or(DecodeErrors::FormatStatic(
            "Invalid DQT length. Length should be greater than 2"
        ))?;

    // A single DQT header may have multiple QT's
    while qt_length > 0 {
        let qt_info = img.stream.read_u8()?;
        // 0 = 8 bit otherwise 16 bit dqt
        let precision = usize::from(qt_info >> 4);
        // last 4 bits give us position
        let table_position = usize::from(qt_info & 0x0F);
        let precision_value = 64 * (precision + 1);

        if (precision_value + 1) as u16 > qt_length {
            return Err(DecodeErrors::DqtError(format!("Invalid QT table bytes left :{}. Too small to construct a valid qt table which should be {} long", qt_length, precision_value + 1)));
        }

        let dct_table = match precision {
            0 => {
                let mut qt_values = [0_u8; 64];

                img.stream.read_exact(&mut qt_values)?;

                // carry out un zig-zag here
                un_zig_zag(&qt_values)
            }
            1 => {
                // 16 bit quantization tables
                let mut qt_values = [0_u16; 64];

                for i in 0..64 {
                    qt_values[i] = img.stream.read_u16::<BigEndian>()?;
                }

                un_zig_zag(&qt_values)
            }
            _ => {
                return Err(DecodeErrors::DqtError(format!(
                    "Expected QT precision value of either 0 or 1, found {precision}"
                )));
            }
        };

        qt_length -= (precision_value as u16) + 1 /*QT BIT*/;

        if table_position >= QUANT_TABLES {
            return Err(DecodeErrors::DqtError(format!(
                "Too large table position for QT :{table_position}, expected between 0 and 3"
            )));
        }

        trace!("Assigning qt table {table_position} with precision {precision}");
        img.qt_tables[table_position] = Some(dct_table);
    }

    return Ok(());
}

/// Section:`B.2.2 Frame header syntax`
pub(crate) fn parse_start_of_frame(img: &mut CoeffDecoder) -> Result<(), DecodeErrors> {
    if img.seen_sof {
        return Err(DecodeErrors::SofError(
            "Two Start of Frame Markers".to_string()
        ));
    }

    // Get length of the frame header
    let length = img.stream.read_u16::<BigEndian>()?;
    // usually 8, but can be 12 and 16, we currently support only 8
    let dt_precision = img.stream.read_u8()?;

    if dt_precision != 8 {
        return Err(DecodeErrors::SofError(format!(
            "The library can only parse 8-bit images, the image has {dt_precision} bits of precision"
        )));
    }

    let img_height = img.stream.read_u16::<BigEndian>()?;
    let img_width = img.stream.read_u16::<BigEndian>()?;

    trace!("Image width  :{}", img_width);
    trace!("Image height :{}", img_height);

    // Check image width or height is zero
    if img_width == 0 || img_height == 0 {
        return Err(DecodeErrors::ZeroError);
    }

    if usize::from(img_width) > img.options.max_width() {
        return Err(DecodeErrors::LargeDimensions(usize::from(img_width)));
    }

    if usize::from(img_height) > img.options.max_height() {
        return Err(DecodeErrors::LargeDimensions(usize::from(img_height)));
    }

    // Number of components for the image.
    let num_components = img.stream.read_u8()?;

    if num_components != 1 && num_components != 3 {
        return Err(DecodeErrors::SofError(format!(
            "Expected 1 or 3 image components, found {num_components}"
        )));
    }

    let expected = 8 + 3 * u16::from(num_components);

    // length should be equal to num components
    if length != expected {
        return Err(DecodeErrors::SofError(format!(
            "Length of start of frame differs from expected {expected},value is {length}"
        )));
    }

    trace!("Image components : {}", num_components);

    let mut components = Vec::with_capacity(usize::from(num_components));
    let mut record = [0; 3];

    for position in 0..num_components {
        // read 3 bytes for each component
        img.stream.read_exact(&mut record)?;

        let component = Component::from_sof(record, position)?;

        // component ids must be distinguishable
        if components
            .iter()
            .any(|other: &Component| other.id == component.id)
        {
            return Err(DecodeErrors::SofError(format!(
                "Duplicate component id {} in start of frame",
                component.id
            )));
        }

        components.push(component);
    }

    img.info.width = img_width;
    img.info.height = img_height;
    img.info.components = num_components;
    img.components = components;
    img.seen_sof = true;

    Ok(())
}

/// Parse a start of scan data
pub(crate) fn parse_sos(image: &mut CoeffDecoder) -> Result<(), DecodeErrors> {
    if !image.seen_sof {
        return Err(DecodeErrors::SosError(
            "Start of scan before start of frame".to_string()
        ));
    }

    // Scan header length
    let ls = image.stream.read_u16::<BigEndian>()?;
    // Number of image components in scan
    let ns = image.stream.read_u8()?;

    // a single interleaved scan must cover every frame component
    if usize::from(ns) != image.components.len() {
        return Err(DecodeErrors::SosError(format!(
            "Expected a scan over {} components, scan has {ns}",
            image.components.len()
        )));
    }

    let expected = 6 + 2 * u16::from(ns);

    if ls != expected {
        return Err(DecodeErrors::SosError(format!(
            "Bad SOS length {ls},corrupt jpeg"
        )));
    }

    for scan_position in 0..usize::from(ns) {
        let id = image.stream.read_u8()?;
        // top 4 bits contain dc huffman destination table
        // lower four bits contain ac huffman destination table
        let selectors = image.stream.read_u8()?;

        let component_index = image
            .components
            .iter()
            .position(|component| component.id == id)
            .ok_or_else(|| {
                DecodeErrors::SosError(format!("Invalid component id {id} in scan header"))
            })?;

        let dc_table = usize::from((selectors >> 4) & 0xF);
        let ac_table = usize::from(selectors & 0xF);

        if dc_table >= HUFFMAN_TABLES || ac_table >= HUFFMAN_TABLES {
            return Err(DecodeErrors::SosError(format!(
                "Huffman table selectors {dc_table}/{ac_table} out of range for component {id}, expected 0 or 1"
            )));
        }

        let component = &mut image.components[component_index];

        component.dc_huff_table = dc_table;
        component.ac_huff_table = ac_table;
        image.scan_order[scan_position] = component_index;

        trace!("Assigned huffman tables {dc_table}/{ac_table} to component id {id}");
    }

    // start of spectral selection, end of spectral selection and the
    // successive approximation byte; baseline fixes them to 0/63/0 and we
    // only consume them
    let _spec_start = image.stream.read_u8()?;
    let _spec_end = image.stream.read_u8()?;
    let _approximation = image.stream.read_u8()?;

    finish_scan_setup(image, usize::from(ns))?;

    image.scan_start = image.stream.position() as usize;

    Ok(())
}

/// Derive the frame geometry and quality factor once the scan header is in.
fn finish_scan_setup(image: &mut CoeffDecoder, scan_len: usize) -> Result<(), DecodeErrors> {
    // the leading scan component is the luminance, its sampling factors fix
    // the MCU geometry
    let luma = &image.components[image.scan_order[0]];
    let (h_samp, v_samp) = (luma.horizontal_sample, luma.vertical_sample);

    if h_samp > 2 || v_samp > 2 {
        return Err(DecodeErrors::SosError(format!(
            "Unsupported luminance sampling factors {h_samp}x{v_samp}, expected 1x1, 2x1, 1x2 or 2x2"
        )));
    }

    for scan_position in 1..scan_len {
        let chroma = &image.components[image.scan_order[scan_position]];

        if chroma.horizontal_sample != 1 || chroma.vertical_sample != 1 {
            return Err(DecodeErrors::SosError(format!(
                "Unsupported sampling factors {}x{} for component id {}, expected 1x1",
                chroma.horizontal_sample, chroma.vertical_sample, chroma.id
            )));
        }
    }

    let width = usize::from(image.info.width);
    let height = usize::from(image.info.height);

    // sub-sampled axes round to whole MCUs of two blocks
    image.info.blocks_x = if h_samp == 1 {
        (width + 7) / 8
    } else {
        2 * ((width + 15) / 16)
    };
    image.info.blocks_y = if v_samp == 1 {
        (height + 7) / 8
    } else {
        2 * ((height + 15) / 16)
    };
    image.h_samp = h_samp;
    image.v_samp = v_samp;

    let qt_slot = image.components[image.scan_order[0]].quantization_table;
    let luma_qt = image.qt_tables[qt_slot]
        .as_ref()
        .ok_or(DecodeErrors::FormatStatic(
            "No quantization table for the luminance component"
        ))?;

    image.info.q_factor = estimate_q_factor(luma_qt);

    trace!(
        "Frame setup: {}x{} blocks, sampling {h_samp}x{v_samp}, Q={}",
        image.info.blocks_x,
        image.info.blocks_y,
        image.info.q_factor
    );

    Ok(())
}

/// **B.2.4.4 Restart interval definition syntax**
///
/// The interval is recorded but restart markers are not implemented, any
/// nonzero interval fails the parse.
pub(crate) fn parse_dri(decoder: &mut CoeffDecoder) -> Result<(), DecodeErrors> {
    trace!("DRI marker present");

    if decoder.stream.read_u16::<BigEndian>()? != 4 {
        return Err(DecodeErrors::FormatStatic("Bad DRI length, corrupt JPEG"));
    }

    decoder.restart_interval = usize::from(decoder.stream.read_u16::<BigEndian>()?);

    if decoder.restart_interval != 0 {
        return Err(DecodeErrors::Unsupported(
            UnsupportedSchemes::RestartIntervals
        ));
    }

    Ok(())
}

/// Small utility function to un zig-zag quantization tables
fn un_zig_zag<T>(a: &[T]) -> [i32; 64]
where
    T: Copy,
    i32: From<T>
{
    let mut output = [0_i32; 64];

    for i in 0..64 {
        output[UN_ZIGZAG[i]] = i32::from(a[i]);
    }

    output
}
