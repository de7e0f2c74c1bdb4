// SPDX-FileCopyrightText: © 2025 TTKB, LLC
// SPDX-License-Identifier: BSD-3-CLAUSE
use crate::Error;

/// Generated table of irreducible degree-15 polynomials over GF(2),
/// packed as little-endian `u16` values with bit 15 always set. The
/// channel number is the index into this table.
const CHANNEL_DATA: &[u8] = include_bytes!("channels.bin");

pub const CHANNEL_COUNT: u16 = (CHANNEL_DATA.len() / 2) as u16;

/// Resolve a channel number to its polynomial.
pub fn channel_polynomial(channel: u16) -> Result<u16, Error> {
    let i = usize::from(channel) * 2;
    if i + 2 > CHANNEL_DATA.len() {
        return Err(Error::UnknownChannel(channel));
    }
    Ok(u16::from_le_bytes([CHANNEL_DATA[i], CHANNEL_DATA[i + 1]]))
}

/// Degree of a channel polynomial: `floor(log2(p))`. 15 for every valid
/// channel.
pub fn channel_degree(polynomial: u16) -> u32 {
    15 - polynomial.leading_zeros()
}
