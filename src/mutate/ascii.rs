use std::ops::Range;

use rand::{prelude::SliceRandom, Rng};

use super::Outcome;
use crate::random::{rand_below, rand_delta_up};

/// Shortest run of text bytes that is treated as a string.
const MIN_TEXT_RUN: usize = 6;

/// Strings that tend to upset string handling: format directives, shell
/// metacharacters and escapes.
#[rustfmt::skip]
const SILLY_STRINGS: &[&[u8]] = &[
    b"%n", b"%n", b"%s", b"%d", b"%p", b"%#x",
    b"\\00", b"aaaa%d%n",
    b"`xcalc`", b";xcalc", b"$(xcalc)", b"!xcalc", b"\"xcalc", b"'xcalc",
    b"\\x00", b"\\r\\n", b"\\r", b"\\n", b"\\x0a", b"\\x0d",
    b"NaN", b"+inf",
    b"$PATH",
    b"$!!", b"!!", b"&#000;", b"\\u0000",
    b"$&", b"$+", b"$`", b"$'", b"$1",
];

/// Newline counts near common buffer size boundaries.
const NEWLINE_COUNTS: &[usize] = &[127, 128, 255, 256, 16383, 16384, 32767, 32768, 65535, 65536];

fn is_text(byte: u8) -> bool {
    matches!(byte, b'\t' | b'\n' | b'\r' | 0x20..=0x7e)
}

/// Runs of at least [`MIN_TEXT_RUN`] text bytes.
fn text_runs(data: &[u8]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for (index, &byte) in data.iter().enumerate() {
        if !is_text(byte) {
            if index - start >= MIN_TEXT_RUN {
                runs.push(start..index);
            }
            start = index + 1;
        }
    }
    if data.len() - start >= MIN_TEXT_RUN {
        runs.push(start..data.len());
    }

    runs
}

/// Index of the quote closing the string opened at `open`, skipping
/// backslash escapes.
fn closing_quote(data: &[u8], open: usize, end: usize) -> Option<usize> {
    let quote = data[open];
    let mut index = open + 1;
    while index < end {
        match data[index] {
            b'\\' => index += 2,
            byte if byte == quote => return Some(index),
            _ => index += 1,
        }
    }

    None
}

/// Splits a text run into plain pieces and the bodies of quoted strings.
/// Quote characters themselves are never part of a piece.
fn pieces(data: &[u8], run: Range<usize>) -> Vec<Range<usize>> {
    let mut pieces = Vec::new();
    let mut plain = run.start;
    let mut index = run.start;
    while index < run.end {
        let quoted = matches!(data[index], b'"' | b'\'')
            .then(|| closing_quote(data, index, run.end))
            .flatten();
        match quoted {
            Some(close) => {
                if plain < index {
                    pieces.push(plain..index);
                }
                pieces.push(index + 1..close);
                index = close + 1;
                plain = index;
            }
            None => index += 1,
        }
    }
    if plain < run.end {
        pieces.push(plain..run.end);
    }

    pieces
}

/// Between 1 and 19 silly strings glued together.
fn badness(rng: &mut impl Rng) -> Vec<u8> {
    let count = rng.gen_range(1..20);
    let mut out = Vec::new();
    for _ in 0..count {
        if let Some(silly) = SILLY_STRINGS.choose(rng) {
            out.extend_from_slice(silly);
        }
    }

    out
}

/// `ab`: finds the text in a block and inserts silly strings into it,
/// replaces the rest of a string with them, or inserts a run of newlines.
/// Blocks that do not start with text are left alone.
pub(super) fn ascii_bad(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let runs = text_runs(data);
    if runs.first().map_or(true, |run| run.start != 0) {
        return Outcome::unchanged(-1);
    }

    let candidates: Vec<Range<usize>> = runs
        .into_iter()
        .flat_map(|run| pieces(data, run))
        .collect();
    let Some(piece) = candidates.choose(rng).cloned() else {
        return Outcome::unchanged(-1);
    };

    let at = piece.start + rand_below(rng, piece.len());
    let mut out = Vec::with_capacity(data.len() + 64);
    out.extend_from_slice(&data[..at]);
    match rng.gen_range(0..3) {
        0 => {
            out.extend(badness(rng));
            out.extend_from_slice(&data[at..]);
        }
        1 => {
            out.extend(badness(rng));
            out.extend_from_slice(&data[piece.end..]);
        }
        _ => {
            let pick = rng.gen_range(0..=NEWLINE_COUNTS.len());
            let count = match NEWLINE_COUNTS.get(pick) {
                Some(&count) => count,
                None => rng.gen_range(1..1024),
            };
            out.resize(out.len() + count, b'\n');
            out.extend_from_slice(&data[at..]);
        }
    }

    Outcome::changed(out, rand_delta_up(rng))
}
