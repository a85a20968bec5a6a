/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Huffman decode tables built from DHT segments.
//!
//! A DHT segment carries the canonical description of a table: how many
//! codes exist of each length 1..=16 and the symbol each code stands for.
//! Decoding uses a single flat lookup: the table's widest code length is
//! peeked from the bit stream and indexes straight into `lookup`, which maps
//! every possible window to the symbol whose code prefixes it. Shorter codes
//! simply own `2^(max - len)` consecutive windows.
//!
//! The lookup is rebuilt whenever a DHT redefines a table slot and is at
//! most `1 << 16` entries.

use crate::errors::DecodeErrors;

/// Longest Huffman code length permitted by the standard.
const MAX_CODE_LENGTH: usize = 16;

/// A Huffman table in decodable form.
pub(crate) struct HuffmanTable {
    /// Maps a `max_code_length` bit window to a symbol index, or
    /// `UNMAPPED` where no code matches.
    pub(crate) lookup: Vec<u8>,
    /// Canonical code length of each symbol index.
    pub(crate) code_lengths: [u8; 256],
    /// Symbol value of each symbol index.
    pub(crate) symbols: [u8; 256],
    /// Length of the longest code in this table, 1..=16.
    pub(crate) max_code_length: u8,
    /// Largest valid symbol index.
    pub(crate) index_max: usize
}

/// Lookup entries no code resolves to.
///
/// With a full 256-symbol table every window is mapped and the largest valid
/// index is also 0xFF, which is why decoding compares against `index_max`
/// rather than this constant.
const UNMAPPED: u8 = 0xFF;

impl HuffmanTable {
    /// Build a decode table from the `(Li, Vij)` description of a DHT
    /// segment: `counts[l]` codes of length `l + 1` and their symbols in
    /// code order.
    pub(crate) fn new(counts: &[u8; 16], symbols: &[u8; 256]) -> Result<HuffmanTable, DecodeErrors> {
        let total: usize = counts.iter().map(|count| usize::from(*count)).sum();

        if total == 0 || total > 256 {
            return Err(DecodeErrors::HuffmanDecode(format!(
                "Invalid number of symbols {total} in a huffman table, expected 1..=256"
            )));
        }

        let mut code_lengths = [0_u8; 256];
        let mut codes = [0_u16; 256];

        // assign canonical codes, counting up within a length and doubling
        // when moving to the next length (ITU-T T.81 figure C.2)
        let mut code: u32 = 0;
        let mut index = 0;

        for length in 1..=MAX_CODE_LENGTH {
            for _ in 0..counts[length - 1] {
                if code >= (1 << length) {
                    return Err(DecodeErrors::HuffmanDecode(
                        "Canonical code length counts oversubscribe the code space".to_string()
                    ));
                }
                code_lengths[index] = length as u8;
                codes[index] = code as u16;
                code += 1;
                index += 1;
            }
            code <<= 1;
        }

        let max_code_length = (1..=MAX_CODE_LENGTH)
            .rev()
            .find(|length| counts[length - 1] > 0)
            .unwrap_or(0);

        if max_code_length == 0 {
            // cannot happen with total > 0, kept for symmetry with the
            // oversubscription check
            return Err(DecodeErrors::HuffmanDecode(
                "Huffman table defines no code lengths".to_string()
            ));
        }

        let mut lookup = vec![UNMAPPED; 1 << max_code_length];

        for i in 0..total {
            let length = usize::from(code_lengths[i]);
            let span = 1 << (max_code_length - length);
            let base = (usize::from(codes[i])) << (max_code_length - length);

            lookup[base..base + span].fill(i as u8);
        }

        Ok(HuffmanTable {
            lookup,
            code_lengths,
            symbols: *symbols,
            max_code_length: max_code_length as u8,
            index_max: total - 1
        })
    }
}
