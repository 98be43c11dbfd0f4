//! Bit-field packing utilities
//!
//! Single-word helpers ([`pack`], [`unpack`]) and their array generalization
//! ([`set_bit_field`], [`get_bit_field`]) where a field addressed by a global
//! bit offset may straddle two adjacent `u32` words.

/// Round `value` up to a multiple of `align` (power of two)
#[inline]
pub const fn aligned_size(value: u32, align: u32) -> u32 {
    (value + align - 1) & !(align - 1)
}

/// Mask with the low `width` bits set (`width` in `0..=32`)
#[inline]
pub const fn low_mask(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// Place the low `width` bits of `value` at `offset` within one word.
///
/// The caller guarantees `offset + width <= 32`.
#[inline]
pub const fn pack(value: u32, width: u32, offset: u32) -> u32 {
    (value & low_mask(width)) << offset
}

/// Extract `width` bits starting at `offset` from one word
#[inline]
pub const fn unpack(value: u32, width: u32, offset: u32) -> u32 {
    (value >> offset) & low_mask(width)
}

/// OR a `width`-bit field into `words` at global bit `offset`.
///
/// A field crossing the last word of the slice loses its high bits.
pub fn set_bit_field(words: &mut [u32], width: u32, offset: u32, value: u32) {
    debug_assert!(width > 0 && width <= 32, "invalid field width {width}");

    let idx = (offset / 32) as usize;
    let shift_lo = offset % 32;
    debug_assert!(idx < words.len(), "bit offset {offset} past end of buffer");

    let value = value & low_mask(width);
    let only_lo = shift_lo + width <= 32;

    words[idx] |= value << shift_lo;

    if !only_lo && idx + 1 < words.len() {
        let size_lo = 32 - shift_lo;
        words[idx + 1] |= value >> size_lo;
    }
}

/// Read a `width`-bit field from `words` at global bit `offset`.
///
/// A missing next word reads as zero.
pub fn get_bit_field(words: &[u32], width: u32, offset: u32) -> u32 {
    debug_assert!(width > 0 && width <= 32, "invalid field width {width}");

    let idx = (offset / 32) as usize;
    let shift_lo = offset % 32;

    let raw_lo = words[idx];
    let raw_hi = words.get(idx + 1).copied().unwrap_or(0);

    let only_lo = shift_lo + width <= 32;
    let size_lo = if only_lo { width } else { 32 - shift_lo };
    let size_hi = if only_lo { 0 } else { shift_lo + width - 32 };

    let ret_lo = (raw_lo >> shift_lo) & low_mask(size_lo);
    if size_hi == 0 {
        return ret_lo;
    }
    let ret_hi = (raw_hi & low_mask(size_hi)) << size_lo;

    ret_lo | ret_hi
}

/// Index of the most significant set bit. Undefined for zero.
#[inline]
pub const fn find_msb(value: u32) -> u32 {
    debug_assert!(value != 0, "find_msb(0) is undefined");
    31 - value.leading_zeros()
}

/// Number of bits needed to store `value` (at least one)
#[inline]
pub const fn bit_width(value: u32) -> u32 {
    find_msb(value | 1) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_single_word() {
        let word = pack(0x5, 3, 4) | pack(0xAB, 8, 24);
        assert_eq!(unpack(word, 3, 4), 0x5);
        assert_eq!(unpack(word, 8, 24), 0xAB);
        // Value wider than field is truncated
        assert_eq!(pack(0xFF, 4, 0), 0xF);
        assert_eq!(pack(0xDEAD_BEEF, 32, 0), 0xDEAD_BEEF);
        assert_eq!(unpack(0xDEAD_BEEF, 32, 0), 0xDEAD_BEEF);
    }

    #[test]
    fn test_bit_field_cross_word() {
        let mut words = [0u32; 2];
        set_bit_field(&mut words, 12, 26, 0xABC);
        // Low 6 bits land at the top of word 0, remaining 6 in word 1
        assert_eq!(words[0] >> 26, 0xABC & 0x3F);
        assert_eq!(words[1], 0xABC >> 6);
        assert_eq!(get_bit_field(&words, 12, 26), 0xABC);
    }

    #[test]
    fn test_bit_field_roundtrip_all_widths() {
        // xorshift keeps the sequence deterministic without extra deps
        let mut state = 0x1234_5678u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };

        for width in 1..=32u32 {
            for offset in [0, 1, 7, 31, 32, 33, 63 - width.min(31), 64 + 17] {
                let mut words = [0u32; 4];
                let value = next() & low_mask(width);
                set_bit_field(&mut words, width, offset, value);
                assert_eq!(
                    get_bit_field(&words, width, offset),
                    value,
                    "width {width} offset {offset}"
                );
            }
        }
    }

    #[test]
    fn test_bit_field_adjacent_fields() {
        let mut words = [0u32; 3];
        let fields = [(5u32, 0x1Fu32), (9, 0x155), (32, 0xCAFE_F00D), (7, 0x3), (13, 0x1ABC)];
        let mut offset = 0;
        for (width, value) in fields {
            set_bit_field(&mut words, width, offset, value);
            offset += width;
        }
        let mut offset = 0;
        for (width, value) in fields {
            assert_eq!(get_bit_field(&words, width, offset), value);
            offset += width;
        }
    }

    #[test]
    fn test_bit_field_truncates_past_end() {
        let mut words = [0u32; 1];
        set_bit_field(&mut words, 8, 28, 0xFF);
        assert_eq!(words[0], 0xF000_0000);
        // Missing high word reads back as zero
        assert_eq!(get_bit_field(&words, 8, 28), 0x0F);
    }

    #[test]
    fn test_find_msb() {
        assert_eq!(find_msb(1), 0);
        assert_eq!(find_msb(2), 1);
        assert_eq!(find_msb(3), 1);
        assert_eq!(find_msb(0x8000_0000), 31);
        assert_eq!(find_msb(u32::MAX), 31);
        assert_eq!(bit_width(0), 1);
        assert_eq!(bit_width(255), 8);
        assert_eq!(bit_width(256), 9);
    }

    #[test]
    fn test_aligned_size() {
        assert_eq!(aligned_size(0, 4), 0);
        assert_eq!(aligned_size(1, 4), 4);
        assert_eq!(aligned_size(8, 4), 8);
        assert_eq!(aligned_size(33, 32), 64);
    }
}
