/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Decoder options

/// Upper bound on either image dimension accepted by default.
///
/// This is also the hard limit of the frame geometry model, dimensions can
/// only be configured downwards from it.
pub(crate) const MAX_DIMENSION: usize = 32767;

/// Options shared by all decoding entry points.
#[derive(Debug, Copy, Clone)]
pub struct DecoderOptions {
    max_width: usize,
    max_height: usize
}

impl Default for DecoderOptions {
    fn default() -> DecoderOptions {
        DecoderOptions {
            max_width: MAX_DIMENSION,
            max_height: MAX_DIMENSION
        }
    }
}

impl DecoderOptions {
    /// Create options with the default limits.
    #[must_use]
    pub fn new() -> DecoderOptions {
        DecoderOptions::default()
    }

    /// Maximum image width the decoder will accept.
    #[must_use]
    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// Maximum image height the decoder will accept.
    #[must_use]
    pub fn max_height(&self) -> usize {
        self.max_height
    }

    /// Set the maximum accepted width, capped at 32767.
    #[must_use]
    pub fn set_max_width(mut self, width: usize) -> DecoderOptions {
        self.max_width = width.min(MAX_DIMENSION);
        self
    }

    /// Set the maximum accepted height, capped at 32767.
    #[must_use]
    pub fn set_max_height(mut self, height: usize) -> DecoderOptions {
        self.max_height = height.min(MAX_DIMENSION);
        self
    }
}
