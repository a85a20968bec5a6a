/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Miscellaneous stuff

/// Undo the zig-zag scan ordering, `natural[UN_ZIGZAG[i]] = zig_zag[i]`.
///
/// Coefficient blocks are left in zig-zag order by the decoder, this is only
/// needed to put quantization tables back into natural (row major) order.
#[rustfmt::skip]
pub(crate) const UN_ZIGZAG: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63
];

/// Number of coefficients in one 8x8 block.
pub(crate) const DCT_BLOCK: usize = 64;
