//! CRC-32 as used by Ogg page framing.
//!
//! This is *not* the usual reflected zlib/PNG CRC-32: Ogg uses the
//! polynomial 0x04C11DB7 directly, with no input/output reflection and a
//! zero initial state (RFC 3533 §6). Grounded on
//! `other_examples/f04e1d3b_hasenbanck-ogg-bitstream__src-writer.rs.rs`,
//! which factors this out of the page writer into its own `crc32` module
//! the same way this crate does.

const POLY: u32 = 0x04c1_1db7;

fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 { (crc << 1) ^ POLY } else { crc << 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Lazily-built, direct (unreflected) CRC-32 table for the Ogg variant.
fn table() -> &'static [u32; 256] {
    static TABLE: std::sync::OnceLock<[u32; 256]> = std::sync::OnceLock::new();
    TABLE.get_or_init(build_table)
}

/// Computes the Ogg-variant CRC-32 over `data`, starting from `crc`.
///
/// Callers checksum a full page with the page's own CRC field zeroed,
/// then write the result back into that field.
#[must_use]
pub fn update(crc: u32, data: &[u8]) -> u32 {
    let table = table();
    let mut crc = crc;
    for &byte in data {
        let idx = (((crc >> 24) ^ u32::from(byte)) & 0xff) as usize;
        crc = (crc << 8) ^ table[idx];
    }
    crc
}

/// Computes the Ogg-variant CRC-32 over `data` from a zero initial state.
#[must_use]
pub fn checksum(data: &[u8]) -> u32 {
    update(0, data)
}
