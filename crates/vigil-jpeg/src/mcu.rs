/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The entropy-coded scan decoder.
//!
//! Walks the single interleaved scan MCU by MCU, writing luminance blocks
//! into the output array and draining chrominance blocks from the bit
//! stream without keeping them.

use log::trace;

use crate::bitstream::BitReader;
use crate::decoder::CoeffDecoder;
use crate::errors::DecodeErrors;
use crate::huffman::HuffmanTable;
use crate::misc::DCT_BLOCK;

impl<'a> CoeffDecoder<'a> {
    /// Decode the scan into `coefficients`, then require the EOI marker.
    pub(crate) fn decode_scan_into(
        &mut self, coefficients: &mut Vec<i16>
    ) -> Result<(), DecodeErrors> {
        self.check_tables()?;

        let data = *self.stream.get_ref();
        let scan_data = data
            .get(self.scan_start..)
            .ok_or(DecodeErrors::ExhaustedData)?;

        let (blocks_x, blocks_y) = (self.info.blocks_x, self.info.blocks_y);
        let (h_samp, v_samp) = (self.h_samp, self.v_samp);
        let mcu_count_x = blocks_x / h_samp;
        let mcu_count_y = blocks_y / v_samp;
        let sub_blocks = h_samp * v_samp;

        trace!("Decoding {mcu_count_x}x{mcu_count_y} MCUs of {h_samp}x{v_samp} luminance blocks");

        coefficients.clear();
        coefficients.resize(self.output_len(), 0);

        // Start offsets of each luminance block of the first MCU. Walking
        // them right by `h_samp` blocks per MCU and down one extra block
        // row per MCU row when vertically sampled lays the blocks out in
        // raster order.
        let mut offsets = [0_usize; 4];

        for v in 0..v_samp {
            for h in 0..h_samp {
                offsets[v * h_samp + h] = (v * blocks_x + h) * DCT_BLOCK;
            }
        }

        for component in &mut self.components {
            component.dc_pred = 0;
        }

        let mut stream = BitReader::new(scan_data);
        let scan_len = self.components.len();

        for _ in 0..mcu_count_y {
            for _ in 0..mcu_count_x {
                for scan_position in 0..scan_len {
                    let component_index = self.scan_order[scan_position];
                    let component = &mut self.components[component_index];

                    let dc_table = self.dc_huffman_tables[component.dc_huff_table]
                        .as_ref()
                        .ok_or(DecodeErrors::FormatStatic("DC table not found"))?;
                    let ac_table = self.ac_huffman_tables[component.ac_huff_table]
                        .as_ref()
                        .ok_or(DecodeErrors::FormatStatic("AC table not found"))?;

                    if scan_position == 0 {
                        // luminance, keep the coefficients
                        for offset in offsets.iter().take(sub_blocks) {
                            decode_block(
                                &mut stream,
                                dc_table,
                                ac_table,
                                &mut coefficients[*offset..*offset + DCT_BLOCK],
                                &mut component.dc_pred
                            )?;
                        }
                    } else {
                        // chrominance, consume the bits and move on
                        discard_block(&mut stream, dc_table, ac_table, &mut component.dc_pred)?;
                    }
                }

                for offset in offsets.iter_mut().take(sub_blocks) {
                    *offset += h_samp * DCT_BLOCK;
                }
            }

            if v_samp == 2 {
                // the second block row of this MCU row is already filled
                for offset in offsets.iter_mut().take(sub_blocks) {
                    *offset += blocks_x * DCT_BLOCK;
                }
            }
        }

        // fill bits pad the last entropy byte, after them the stream must
        // close with an EOI marker
        let marker_offset = stream.align();
        let trailer = &scan_data[marker_offset.min(scan_data.len())..];

        let mut fill = 0;

        while trailer.get(fill) == Some(&0xFF) {
            fill += 1;
        }

        if fill == 0 || trailer.get(fill) != Some(&0xD9) {
            return Err(DecodeErrors::NoEndOfImage);
        }

        trace!("Finished decoding scan");

        Ok(())
    }
}

/// Decode one 8x8 block into `block` (zig-zag order) and update the
/// component's DC predictor.
fn decode_block(
    stream: &mut BitReader, dc_table: &HuffmanTable, ac_table: &HuffmanTable, block: &mut [i16],
    dc_pred: &mut i32
) -> Result<(), DecodeErrors> {
    // DC difference category, then its magnitude bits
    let category = stream.decode_symbol(dc_table)?;

    if category > 11 {
        return Err(DecodeErrors::HuffmanDecode(format!(
            "Invalid DC coefficient category {category}, expected 0..=11"
        )));
    }

    if category != 0 {
        *dc_pred += stream.receive_extend(category)?;
    }

    block[0] = *dc_pred as i16;

    // AC coefficients occupy zig-zag positions 1..=63
    let mut position = 1;

    while position < 64 {
        let symbol = stream.decode_symbol(ac_table)?;
        let zero_run = usize::from(symbol >> 4);
        let magnitude = symbol & 0x0F;

        if magnitude != 0 {
            if magnitude > 10 {
                return Err(DecodeErrors::HuffmanDecode(format!(
                    "Invalid AC coefficient category {magnitude}, expected 0..=10"
                )));
            }

            position += zero_run;

            if position >= 64 {
                return Err(DecodeErrors::HuffmanDecode(
                    "Zero run-length overflows the coefficient block".to_string()
                ));
            }

            block[position] = stream.receive_extend(magnitude)? as i16;
            position += 1;
        } else if zero_run == 15 {
            // ZRL, sixteen zero coefficients
            position += 16;
        } else {
            // end of block
            break;
        }
    }

    Ok(())
}

/// Entropy-decode one 8x8 block, discarding its coefficients.
///
/// Identical bit consumption to [`decode_block`]; the DC predictor is still
/// tracked since later blocks of the component difference against it.
fn discard_block(
    stream: &mut BitReader, dc_table: &HuffmanTable, ac_table: &HuffmanTable, dc_pred: &mut i32
) -> Result<(), DecodeErrors> {
    let category = stream.decode_symbol(dc_table)?;

    if category > 11 {
        return Err(DecodeErrors::HuffmanDecode(format!(
            "Invalid DC coefficient category {category}, expected 0..=11"
        )));
    }

    if category != 0 {
        *dc_pred += stream.receive_extend(category)?;
    }

    let mut position = 1;

    while position < 64 {
        let symbol = stream.decode_symbol(ac_table)?;
        let zero_run = usize::from(symbol >> 4);
        let magnitude = symbol & 0x0F;

        if magnitude != 0 {
            if magnitude > 10 {
                return Err(DecodeErrors::HuffmanDecode(format!(
                    "Invalid AC coefficient category {magnitude}, expected 0..=10"
                )));
            }

            position += zero_run;

            if position >= 64 {
                return Err(DecodeErrors::HuffmanDecode(
                    "Zero run-length overflows the coefficient block".to_string()
                ));
            }

            let _ = stream.receive_extend(magnitude)?;
            position += 1;
        } else if zero_run == 15 {
            position += 16;
        } else {
            break;
        }
    }

    Ok(())
}
