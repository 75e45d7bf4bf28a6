
//! Names inside map items are not stored as byte strings but packed
//! into a fixed number of big-endian `i32`s, four chars per integer,
//! each byte shifted by 128. Layer and group names use 3 integers,
//! envelope names use 8. The final byte is always forced to zero, so a
//! 3-integer name holds at most 11 chars and an 8-integer name at most 31.

use smallvec::SmallVec;

/// A packed name, ready to be embedded in an item payload.
pub type NameInts = SmallVec<[i32; 8]>;

/// Number of integers a group, layer or image name occupies.
pub const LAYER_NAME_INTS: usize = 3;

/// Number of integers an envelope name occupies.
pub const ENVELOPE_NAME_INTS: usize = 8;

/// Pack a name into the specified number of integers.
/// Overlong names are truncated, missing bytes are padded.
pub fn string_to_ints(text: &str, int_count: usize) -> NameInts {
    let bytes = text.as_bytes();
    let mut ints = NameInts::with_capacity(int_count);

    for int_index in 0 .. int_count {
        let mut packed: u32 = 0;

        for byte_index in int_index * 4 .. int_index * 4 + 4 {
            let byte = bytes.get(byte_index).copied().unwrap_or(0);
            packed = (packed << 8) | u32::from(byte.wrapping_add(128));
        }

        ints.push(packed as i32);
    }

    // the terminating zero is unconditional
    if let Some(last) = ints.last_mut() {
        *last = (*last as u32 & 0xffff_ff00) as i32;
    }

    ints
}

/// Unpack a name from its integers, stopping at the first zero byte.
pub fn ints_to_string(ints: &[i32]) -> String {
    let mut bytes = Vec::with_capacity(ints.len() * 4);

    'unpack: for &packed in ints {
        for shift in &[24, 16, 8, 0] {
            let byte = ((packed as u32 >> shift) & 0xff) as u8;
            let byte = byte.wrapping_sub(128);
            if byte == 0 { break 'unpack; }
            bytes.push(byte);
        }
    }

    decode_text(&bytes)
}

/// Unpack a name, treating the empty name as no name at all.
pub fn ints_to_name(ints: &[i32]) -> Option<String> {
    Some(ints_to_string(ints)).filter(|name| !name.is_empty())
}

/// The characters cp1252 places where latin-1 has control codes.
/// Positions cp1252 leaves undefined decode as the replacement character.
const CP1252_80_9F: [char; 32] = [
    '\u{20ac}', '\u{fffd}', '\u{201a}', '\u{0192}', '\u{201e}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02c6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{fffd}', '\u{017d}', '\u{fffd}',
    '\u{fffd}', '\u{2018}', '\u{2019}', '\u{201c}', '\u{201d}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02dc}', '\u{2122}', '\u{0161}', '\u{203a}', '\u{0153}', '\u{fffd}', '\u{017e}', '\u{0178}',
];

/// Decode text bytes as UTF-8 where possible,
/// falling back to cp1252 for legacy maps.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => bytes.iter().map(|&byte| match byte {
            0x80 ..= 0x9f => CP1252_80_9F[usize::from(byte - 0x80)],
            other => char::from(other),
        }).collect(),
    }
}

/// The bytes of a blob up to, but not including, its first zero byte.
pub fn bytes_until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&byte| byte == 0) {
        Some(nul) => &bytes[.. nul],
        None => bytes,
    }
}

/// Append a name to a blob as a zero-terminated byte string.
pub fn write_nul_terminated(bytes: &[u8], blob: &mut Vec<u8>) {
    blob.extend_from_slice(bytes);
    blob.push(0);
}
