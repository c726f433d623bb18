//! Character-class bitmasks used to prune subtrees during search.
//!
//! Every byte of the tracked alphabet owns one bit of a `u64`:
//!
//! | bytes   | bits   |
//! |---------|--------|
//! | `0`-`9` | 0-9    |
//! | `A`-`Z` | 10-35  |
//! | `a`-`z` | 36-61  |
//! | `.`     | 62     |
//! | `-`     | 63     |
//!
//! Other bytes set no bit. A node mask therefore never claims a class that
//! is absent below it, which makes `mask & required != required` a safe
//! reason to skip a subtree.

/// Bits 10-35, the upper-case letters.
const UPPER_BITS: u64 = 0x0000_000F_FFFF_FC00;
/// Bits 36-61, the lower-case letters.
const LOWER_BITS: u64 = 0x3FFF_FFF0_0000_0000;
/// Distance between an upper-case letter's bit and its lower-case twin.
const CASE_SHIFT: u32 = 26;

#[inline]
pub(crate) fn class_bit(b: u8) -> u64 {
    match b {
        b'0'..=b'9' => 1 << (b - b'0'),
        b'A'..=b'Z' => 1 << (b - b'A' + 10),
        b'a'..=b'z' => 1 << (b - b'a' + 36),
        b'.' => 1 << 62,
        b'-' => 1 << 63,
        _ => 0,
    }
}

/// Union of the class bits of every byte in `bytes`.
pub(crate) fn class_mask(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |mask, &b| mask | class_bit(b))
}

/// Folds letter bits so that a mask containing `A` also claims `a` and
/// vice versa.
#[inline]
pub(crate) fn case_insensitive_mask(mut mask: u64) -> u64 {
    mask |= (mask & UPPER_BITS) << CASE_SHIFT;
    mask |= (mask & LOWER_BITS) >> CASE_SHIFT;
    mask
}

/// Whether a subtree summarised by `node_mask` may contain every class in
/// `required`.
#[inline]
pub(crate) fn may_contain(node_mask: u64, required: u64, case_insensitive: bool) -> bool {
    let cmp = if case_insensitive {
        case_insensitive_mask(node_mask)
    } else {
        node_mask
    };
    cmp & required == required
}

#[inline]
pub(crate) fn bytes_match(a: u8, b: u8, case_insensitive: bool) -> bool {
    if case_insensitive {
        a.eq_ignore_ascii_case(&b)
    } else {
        a == b
    }
}
