use once_cell::sync::Lazy;
use rand::{prelude::SliceRandom, Rng};

use super::Outcome;
use crate::random::rand_delta;

/// Byte sequences that tend to upset UTF-8 handling: direction overrides,
/// invisible characters, byte order marks, lone surrogates and characters that
/// expand under normalization.
static FUNNY_UNICODE: Lazy<Vec<Vec<u8>>> = Lazy::new(|| {
    let mut out: Vec<Vec<u8>> = [
        "\u{202E}",  // right to left override
        "\u{202D}",  // left to right override
        "\u{180E}",  // mongolian vowel separator
        "\u{2060}",  // word joiner
        "\u{FEFE}",  // reserved
        "\u{FFFF}",  // not a character
        "\u{0FED}",  // unassigned
        "\u{F8FF}",  // private use
        "\u{FF0F}",  // full width solidus
        "\u{1D7D6}", // mathematical bold digit eight
        "\u{00DF}",  // IDNA deviant
        "\u{FDFD}",  // expands 11x under NFKC
        "\u{0390}",  // expands 3x under NFD
        "\u{1F82}",  // expands 4x under NFD
        "\u{FB2C}",  // expands 3x under NFC
        "\u{1D160}", // expands 3x under NFC
    ]
    .iter()
    .map(|s| s.as_bytes().to_vec())
    .collect();

    let raw: &[&[u8]] = &[
        &[0xed, 0xba, 0xad],       // U+DEAD low surrogate
        &[0xed, 0xaa, 0xad],       // U+DAAD high surrogate
        &[0xf4, 0x8f, 0xbf, 0xbe], // past U+10FFFF
        &[0xef, 0xbf, 0xbf],
        &[0xf0, 0x90, 0x80, 0x80],
        &[0xef, 0xbb, 0xbf], // utf-8 bom
        &[0xfe, 0xff],       // utf-16 be bom
        &[0xff, 0xfe],       // utf-16 le bom
        &[0, 0, 0xff, 0xff],
        &[0xff, 0xff, 0, 0],
        &[43, 47, 118, 56], // utf-7 boms
        &[43, 47, 118, 57],
        &[43, 47, 118, 43],
        &[43, 47, 118, 47],
        &[247, 100, 76],
        &[221, 115, 102, 115],
        &[14, 254, 255],
        &[251, 238, 40],
        &[251, 238, 40, 255],
        &[132, 49, 149, 51],
    ];
    out.extend(raw.iter().map(|bytes| bytes.to_vec()));

    // whitespace, joiners and other oddly-behaving code points
    let ranges: &[(u32, u32)] = &[
        (0x0009, 0x000d),
        (0x00a0, 0x00a0),
        (0x1680, 0x1680),
        (0x2000, 0x200a),
        (0x200c, 0x200f),
        (0x2028, 0x2029),
        (0x202a, 0x202f),
        (0x205f, 0x205f),
        (0x2065, 0x2069),
        (0x3000, 0x3000),
        (0x0345, 0x0345),
        (0x034f, 0x034f),
        (0x02b0, 0x02b8),
        (0x02d0, 0x02d1),
        (0x115f, 0x1160),
        (0x3164, 0x3164),
        (0xfdd0, 0xfdd0),
        (0xff70, 0xff70),
        (0xffa0, 0xffa0),
        (0x0e40, 0x0e44),
        (0xe0001, 0xe0001),
        (0xe0020, 0xe007f),
        (0x1f4a9, 0x1f4a9),
    ];
    for &(lo, hi) in ranges {
        out.extend(
            (lo..=hi)
                .filter_map(char::from_u32)
                .map(|c| c.to_string().into_bytes()),
        );
    }

    out
});

/// Assuming the chosen byte is 6-bit ASCII, encodes it as an overlong two-byte
/// sequence.
pub(super) fn utf8_widen(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let delta = rand_delta(rng);
    if data.is_empty() {
        return Outcome::unchanged(delta);
    }

    let index = rng.gen_range(0..data.len());
    let byte = data[index];
    if byte != byte & 0b11_1111 {
        return Outcome::unchanged(delta);
    }

    let mut new_data = Vec::with_capacity(data.len() + 1);
    new_data.extend_from_slice(&data[..index]);
    new_data.push(0b1100_0000);
    new_data.push(byte | 0b1000_0000);
    new_data.extend_from_slice(&data[index + 1..]);

    Outcome::changed(new_data, delta)
}

pub(super) fn utf8_insert(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let delta = rand_delta(rng);
    let index = rng.gen_range(0..=data.len());
    let Some(funny) = FUNNY_UNICODE.choose(rng) else {
        return Outcome::unchanged(delta);
    };

    let mut new_data = Vec::with_capacity(data.len() + funny.len());
    new_data.extend_from_slice(&data[..index]);
    new_data.extend_from_slice(funny);
    new_data.extend_from_slice(&data[index..]);

    Outcome::changed(new_data, delta)
}
