use once_cell::sync::Lazy;
use rand::{prelude::SliceRandom, Rng};

static INTERESTING_NUMBERS_U8: &[u8] = &[
    u8::MIN,
    1,
    u8::MAX,
    i8::MAX as u8,
    (i8::MAX as u8) + 1,
    0x10,
    0x20,
    0x40,
];

static INTERESTING_NUMBERS_U16: &[u16] = &[
    u16::MIN,
    1,
    u16::MAX,
    i16::MAX as u16,
    (i16::MAX as u16) + 1,
    u8::MAX as u16,
    (u8::MAX as u16) + 1,
];

static INTERESTING_NUMBERS_U32: &[u32] = &[
    u32::MIN,
    1,
    u32::MAX,
    i32::MAX as u32,
    (i32::MAX as u32) + 1,
    u16::MAX as u32,
    (u16::MAX as u32) + 1,
];

static INTERESTING_NUMBERS_U64: &[u64] = &[
    u64::MIN,
    1,
    u64::MAX,
    i64::MAX as u64,
    (i64::MAX as u64) + 1,
    u32::MAX as u64,
    (u32::MAX as u64) + 1,
];

/// Powers of two around common integer widths, and their neighbours.
static INTERESTING_TEXTUAL_NUMBERS: Lazy<Vec<i128>> = Lazy::new(|| {
    let mut out = Vec::new();
    for shift in [1u32, 7, 8, 15, 16, 31, 32, 63, 64, 127] {
        let x = 1i128.wrapping_shl(shift);
        out.push(x);
        out.push(x.wrapping_sub(1));
        out.push(x.wrapping_add(1));
    }
    out
});

macro_rules! interesting_of_width {
    ($name:ident, $ty:ty, $table:ident) => {
        pub(crate) fn $name(rng: &mut impl Rng) -> $ty {
            *$table.choose(rng).unwrap_or(&0)
        }
    };
}

interesting_of_width!(interesting_u8, u8, INTERESTING_NUMBERS_U8);
interesting_of_width!(interesting_u16, u16, INTERESTING_NUMBERS_U16);
interesting_of_width!(interesting_u32, u32, INTERESTING_NUMBERS_U32);
interesting_of_width!(interesting_u64, u64, INTERESTING_NUMBERS_U64);

pub(crate) fn interesting_textual_number(rng: &mut impl Rng) -> i128 {
    *INTERESTING_TEXTUAL_NUMBERS.choose(rng).unwrap_or(&0)
}
