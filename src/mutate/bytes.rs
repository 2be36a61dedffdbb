use rand::{prelude::SliceRandom, Rng};

use super::Outcome;
use crate::random::{rand_delta, rand_log};

/// Largest exponent used when choosing how many times a byte is repeated.
const MAX_REPEAT_LIMIT: usize = 0x20000;

pub(super) fn byte_drop(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let delta = rand_delta(rng);
    if data.is_empty() {
        return Outcome::unchanged(delta);
    }

    let mut new_data = data.to_vec();
    new_data.remove(rng.gen_range(0..data.len()));

    Outcome::changed(new_data, delta)
}

pub(super) fn byte_flip(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let delta = rand_delta(rng);
    if data.is_empty() {
        return Outcome::unchanged(delta);
    }

    let mut new_data = data.to_vec();
    let bit = 1u8 << rng.gen_range(0..8);
    let index = rng.gen_range(0..data.len());
    new_data[index] ^= bit;

    Outcome::changed(new_data, delta)
}

pub(super) fn byte_insert(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let delta = rand_delta(rng);
    let mut new_data = Vec::with_capacity(data.len() + 1);
    new_data.extend_from_slice(data);
    let byte: u8 = rng.gen();
    new_data.insert(rng.gen_range(0..=data.len()), byte);

    Outcome::changed(new_data, delta)
}

/// Doubles a limit while a coin keeps landing heads, then picks below it
fn repeat_len(rng: &mut impl Rng) -> usize {
    let mut limit = 0b10;
    while rng.gen() && limit != MAX_REPEAT_LIMIT {
        limit <<= 1;
    }

    rng.gen_range(0..limit)
}

pub(super) fn byte_repeat(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let delta = rand_delta(rng);
    if data.is_empty() {
        return Outcome::unchanged(delta);
    }

    let count = repeat_len(rng).max(1);
    let index = rng.gen_range(0..data.len());

    let mut new_data = Vec::with_capacity(data.len() + count);
    new_data.extend_from_slice(&data[..index]);
    new_data.extend(std::iter::repeat(data[index]).take(count));
    new_data.extend_from_slice(&data[index..]);

    Outcome::changed(new_data, delta)
}

pub(super) fn byte_perm(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let delta = rand_delta(rng);
    if data.len() < 2 {
        return Outcome::unchanged(delta);
    }

    let mut new_data = data.to_vec();
    let start = rng.gen_range(0..data.len());
    let end = std::cmp::min(start + rng.gen_range(2..20), data.len());
    new_data[start..end].shuffle(rng);

    Outcome::changed(new_data, delta)
}

pub(super) fn byte_inc(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let delta = rand_delta(rng);
    if data.is_empty() {
        return Outcome::unchanged(delta);
    }

    let mut new_data = data.to_vec();
    let index = rng.gen_range(0..data.len());
    new_data[index] = new_data[index].wrapping_add(1);

    Outcome::changed(new_data, delta)
}

pub(super) fn byte_dec(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let delta = rand_delta(rng);
    if data.is_empty() {
        return Outcome::unchanged(delta);
    }

    let mut new_data = data.to_vec();
    let index = rng.gen_range(0..data.len());
    new_data[index] = new_data[index].wrapping_sub(1);

    Outcome::changed(new_data, delta)
}

pub(super) fn byte_random(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let delta = rand_delta(rng);
    if data.is_empty() {
        return Outcome::unchanged(delta);
    }

    let mut new_data = data.to_vec();
    let byte: u8 = rng.gen();
    let index = rng.gen_range(0..data.len());
    new_data[index] = byte;

    Outcome::changed(new_data, delta)
}

pub(super) fn seq_repeat(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    if data.len() < 2 {
        return Outcome::unchanged(0);
    }

    let start = rng.gen_range(0..data.len() - 1);
    let end = rng.gen_range(start + 1..data.len());
    // at most 2^9 extra copies
    let count = rand_log(rng, 10).max(2);
    let stutter = &data[start..end];

    let mut new_data = Vec::with_capacity(data.len() + stutter.len() * count);
    new_data.extend_from_slice(&data[..start]);
    for _ in 0..count {
        new_data.extend_from_slice(stutter);
    }
    new_data.extend_from_slice(&data[end..]);

    Outcome::changed(new_data, rand_delta(rng))
}

pub(super) fn seq_del(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let delta = rand_delta(rng);
    if data.len() < 2 {
        return Outcome::unchanged(delta);
    }

    let start = rng.gen_range(0..data.len() - 1);
    let end = rng.gen_range(start + 1..=data.len());

    let mut new_data = Vec::with_capacity(data.len() - (end - start));
    new_data.extend_from_slice(&data[..start]);
    new_data.extend_from_slice(&data[end..]);

    Outcome::changed(new_data, delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1674713045)
    }

    #[test]
    fn drop_removes_exactly_one_byte() {
        let data = b"ABCDEFG";
        let out = byte_drop(&mut rng(), data).data.expect("byte was dropped");
        assert_eq!(out.len(), data.len() - 1);

        assert!(byte_drop(&mut rng(), b"").data.is_none());
    }

    #[test]
    fn flip_changes_a_single_bit() {
        let out = byte_flip(&mut rng(), &[0x41]).data.expect("bit was flipped");
        assert_eq!(out.len(), 1);
        assert_eq!((out[0] ^ 0x41).count_ones(), 1);
    }

    #[test]
    fn insert_works_on_empty_data() {
        let out = byte_insert(&mut rng(), b"").data.expect("byte was inserted");
        assert_eq!(out.len(), 1);

        let out = byte_insert(&mut rng(), b"ABCDEFG").data.expect("byte was inserted");
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn inc_and_dec_wrap_one_byte() {
        let out = byte_inc(&mut rng(), &[0xff]).data.expect("byte was incremented");
        assert_eq!(out, vec![0x00]);

        let out = byte_dec(&mut rng(), &[0x00]).data.expect("byte was decremented");
        assert_eq!(out, vec![0xff]);
    }

    #[test]
    fn repeat_grows_data() {
        let data = b"AAAAAAAA";
        let out = byte_repeat(&mut rng(), data).data.expect("byte was repeated");
        assert!(out.len() > data.len());
        assert!(out.iter().all(|&b| b == b'A'));
    }

    #[test]
    fn perm_keeps_the_same_bytes() {
        let data = b"ABCDEFGHI";
        let mut out = byte_perm(&mut rng(), data).data.expect("bytes were permuted");
        assert_eq!(out.len(), data.len());
        out.sort_unstable();
        assert_eq!(out, data.to_vec());
    }

    #[test]
    fn random_keeps_the_length() {
        let out = byte_random(&mut rng(), b"AAAAAAAA").data.expect("byte was replaced");
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn sequence_repeat_and_delete() {
        let data = b"ABCDEFGHIJ";
        let out = seq_repeat(&mut rng(), data).data.expect("sequence was repeated");
        assert!(out.len() > data.len());

        let out = seq_del(&mut rng(), data).data.expect("sequence was deleted");
        assert!(out.len() < data.len());

        assert!(seq_repeat(&mut rng(), b"A").data.is_none());
        assert!(seq_del(&mut rng(), b"A").data.is_none());
    }
}
