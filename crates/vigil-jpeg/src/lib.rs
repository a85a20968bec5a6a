/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! This crate provides a decoder for the entropy-coded layer of baseline
//! ITU-T T.81 (JPEG-1) images.
//!
//! Unlike a full JPEG decoder it never produces pixels: no dequantization,
//! no IDCT and no color conversion are performed. What it extracts is the
//! array of *quantized luminance DCT coefficients*, one 64-entry block per
//! 8x8 luminance tile, exactly as they sit in the Huffman coded scan.
//! Chrominance blocks are entropy-decoded (the bit stream is serial, they
//! cannot be skipped) but their coefficients are discarded.
//!
//! That coefficient array is the natural input for compressed-domain
//! analysis, e.g. measuring interframe change between two video frames
//! without paying for a full decode of either.
//!
//! # Usage
//!
//! ```no_run
//! use vigil_jpeg::CoeffDecoder;
//!
//! let data = std::fs::read("frame.jpg").unwrap();
//! let mut decoder = CoeffDecoder::new(&data);
//! let coefficients = decoder.decode().unwrap();
//! let info = decoder.info().unwrap();
//!
//! assert_eq!(coefficients.len(), info.blocks_x * info.blocks_y * 64);
//! println!("{}x{}, Q={}", info.width, info.height, info.q_factor);
//! ```
//!
//! # Supported images
//!
//! Baseline DCT, Huffman coded, single scan, 8-bit precision, grayscale or
//! YCbCr with 4:4:4, 4:2:2, 4:4:0 or 4:2:0 chroma sampling. Progressive
//! images, arithmetic coding and restart intervals are rejected with
//! [`DecodeErrors::Unsupported`](errors::DecodeErrors).

#![warn(
    clippy::correctness,
    clippy::perf,
    clippy::pedantic,
    clippy::inline_always,
    clippy::panic
)]
#![allow(
    clippy::needless_return,
    clippy::similar_names,
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation
)]

pub use crate::decoder::{CoeffDecoder, FrameInfo};
pub use crate::options::DecoderOptions;
pub use crate::quality::luma_quantization_table;

mod bitstream;
mod components;
mod decoder;
pub mod errors;
mod headers;
mod huffman;
mod marker;
mod mcu;
mod misc;
mod options;
mod quality;
