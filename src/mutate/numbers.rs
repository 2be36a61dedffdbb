use paste::paste;
use rand::{prelude::SliceRandom, Rng};

use super::Outcome;
use crate::dictionary::{
    interesting_textual_number, interesting_u16, interesting_u32, interesting_u64, interesting_u8,
};
use crate::random::{is_binarish, rand_below, rand_delta, rand_log};

/// Byte ranges of every run of ASCII digits in `data`.
fn digit_runs(data: &[u8]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;

    for (index, byte) in data.iter().enumerate() {
        match (byte.is_ascii_digit(), start) {
            (true, None) => start = Some(index),
            (false, Some(s)) => {
                runs.push((s, index));
                start = None;
            }
            _ => {}
        }
    }

    if let Some(s) = start {
        runs.push((s, data.len()));
    }

    runs
}

/// Parses a run of ASCII digits. Values wider than 128 bits wrap.
fn parse_digits(digits: &[u8]) -> i128 {
    digits.iter().fold(0i128, |acc, &d| {
        acc.wrapping_mul(10).wrapping_add(i128::from(d - b'0'))
    })
}

fn mutate_num(rng: &mut impl Rng, num: i128) -> i128 {
    match rand_below(rng, 12) {
        0 => num.wrapping_add(1),
        1 => num.wrapping_sub(1),
        2 => 0,
        3 => 1,
        4..=6 => interesting_textual_number(rng),
        7 => interesting_textual_number(rng).wrapping_add(num),
        8 => interesting_textual_number(rng).wrapping_sub(num),
        9 => num.wrapping_neg(),
        _ => {
            let bits = rng.gen_range(1..129);
            let n = rand_log(rng, bits) as i128;
            if rng.gen() {
                num.wrapping_sub(n)
            } else {
                num.wrapping_add(n)
            }
        }
    }
}

/// Finds a textual number and replaces it with a nearby or boundary value.
pub(super) fn num(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let runs = digit_runs(data);
    let Some(&(start, end)) = runs.choose(rng) else {
        // textual data with fewer numbers, occasionally back off
        let delta = if rand_below(rng, 10) == 0 { -1 } else { 0 };
        return Outcome::unchanged(delta);
    };

    let new_num = mutate_num(rng, parse_digits(&data[start..end])).to_string();

    let mut new_data = Vec::with_capacity(data.len() + new_num.len());
    new_data.extend_from_slice(&data[..start]);
    new_data.extend_from_slice(new_num.as_bytes());
    new_data.extend_from_slice(&data[end..]);

    let delta = if is_binarish(data) { -1 } else { 2 };
    Outcome::changed(new_data, delta)
}

macro_rules! word_mutators {
    ($($ty:ident),*) => {
        paste! {
            $(
            /// Replaces the word with a boundary value, or nudges it by up to 16,
            /// in a randomly chosen byte order.
            fn [<mutate_word_ $ty>](rng: &mut impl Rng, word: &mut [u8]) {
                let Ok(bytes) = <[u8; std::mem::size_of::<$ty>()]>::try_from(&word[..]) else {
                    return;
                };

                let big_endian: bool = rng.gen();
                let value = if big_endian {
                    <$ty>::from_be_bytes(bytes)
                } else {
                    <$ty>::from_le_bytes(bytes)
                };

                let value = if rng.gen() {
                    [<interesting_ $ty>](rng)
                } else {
                    let add: $ty = rng.gen_range(0..33);
                    value.wrapping_add(add).wrapping_sub(16)
                };

                let new_bytes = if big_endian {
                    value.to_be_bytes()
                } else {
                    value.to_le_bytes()
                };
                word.copy_from_slice(&new_bytes);
            }
            )*
        }
    };
}

word_mutators!(u8, u16, u32, u64);

/// Treats a random 1, 2, 4 or 8 byte window as an integer and changes it.
pub(super) fn word(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    if data.is_empty() {
        return Outcome::unchanged(-1);
    }

    let widths: Vec<usize> = [1, 2, 4, 8]
        .into_iter()
        .filter(|&width| width <= data.len())
        .collect();
    let width = widths.choose(rng).copied().unwrap_or(1);
    let offset = rng.gen_range(0..=data.len() - width);

    let mut new_data = data.to_vec();
    let window = &mut new_data[offset..offset + width];
    match width {
        1 => mutate_word_u8(rng, window),
        2 => mutate_word_u16(rng, window),
        4 => mutate_word_u32(rng, window),
        _ => mutate_word_u64(rng, window),
    }

    let delta = if is_binarish(data) { 1 } else { rand_delta(rng) };
    Outcome::changed(new_data, delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn finds_digit_runs() {
        assert_eq!(digit_runs(b"0001\n3"), vec![(0, 4), (5, 6)]);
        assert_eq!(digit_runs(b"abc"), vec![]);
        assert_eq!(digit_runs(b"x12y345"), vec![(1, 3), (4, 7)]);
    }

    #[test]
    fn parses_digits() {
        assert_eq!(parse_digits(b"0001"), 1);
        assert_eq!(parse_digits(b"321"), 321);
    }

    #[test]
    fn num_changes_only_a_number() {
        let data = b"1 2 3 4 5 6 7 8 9 10 11 12\n";
        let mut rng = StdRng::seed_from_u64(1674713045);
        for _ in 0..20 {
            let outcome = num(&mut rng, data);
            assert_eq!(outcome.delta, 2);
            let out = outcome.data.expect("data has numbers");
            assert!(out.ends_with(b"\n"));
            assert!(out
                .iter()
                .all(|b| b.is_ascii_digit() || *b == b' ' || *b == b'-' || *b == b'\n'));
        }
    }

    #[test]
    fn num_on_binary_data_backs_off() {
        let data = [255, 32, 129, 50, 49, 32, 51, 10];
        let mut rng = StdRng::seed_from_u64(1674713045);
        assert_eq!(num(&mut rng, &data).delta, -1);
    }

    #[test]
    fn num_without_numbers_is_unchanged() {
        let mut rng = StdRng::seed_from_u64(2);
        assert!(num(&mut rng, b"no digits here").data.is_none());
    }

    #[test]
    fn word_keeps_the_length() {
        let mut rng = StdRng::seed_from_u64(99);
        for len in 1..20 {
            let data = vec![0x41u8; len];
            let out = word(&mut rng, &data).data.expect("word was changed");
            assert_eq!(out.len(), len);
        }
        assert!(word(&mut rng, b"").data.is_none());
    }
}
