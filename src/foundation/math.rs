/// SplitMix64 finalizer. Cheap, stateless noise for synthetic frames.
pub(crate) fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Round to nearest and saturate into a byte.
pub(crate) fn round_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// `sum / n` rounded half up. `n` must be non-zero.
pub(crate) fn div_round(sum: u64, n: u64) -> u8 {
    ((sum + n / 2) / n).min(255) as u8
}

/// Integer luma, `0.299 R + 0.587 G + 0.114 B`, rounded.
pub(crate) fn luma(b: u8, g: u8, r: u8) -> u8 {
    let y = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    ((y + 500) / 1000) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
