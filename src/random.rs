use rand::Rng;

/// Uniform value in `[0, n)`. Returns 0 when `n` is 0 instead of panicking.
pub(crate) fn rand_below(rng: &mut impl Rng, n: usize) -> usize {
    if n == 0 {
        return 0;
    }

    rng.gen_range(0..n)
}

/// Value with a roughly logarithmic distribution: first pick a bit width in
/// `[0, n)`, then a number with exactly that many significant bits.
pub(crate) fn rand_log(rng: &mut impl Rng, n: usize) -> usize {
    let bits = rand_below(rng, n.min(usize::BITS as usize));
    if bits == 0 {
        return 0;
    }

    let hi = 1usize << (bits - 1);
    rand_below(rng, hi) | hi
}

/// Returns true with probability `numerator / denominator`.
pub(crate) fn rand_occurs(rng: &mut impl Rng, numerator: usize, denominator: usize) -> bool {
    if denominator == 0 {
        return false;
    }

    rng.gen_range(0..denominator) < numerator
}

/// Unbiased score delta.
pub(crate) fn rand_delta(rng: &mut impl Rng) -> isize {
    if rng.gen() {
        1
    } else {
        -1
    }
}

/// Score delta with a slight positive bias.
pub(crate) fn rand_delta_up(rng: &mut impl Rng) -> isize {
    if rng.gen_range(0..20) <= 11 {
        1
    } else {
        -1
    }
}

/// Heuristic check used by the text-oriented mutators: data "looks binary" if
/// a NUL or a high-bit byte shows up within the first 8 ASCII bytes.
pub(crate) fn is_binarish(data: &[u8]) -> bool {
    for (seen_ascii, &byte) in data.iter().enumerate() {
        if seen_ascii == 8 {
            return false;
        }

        if byte == 0 || byte & 0x80 != 0 {
            return true;
        }
    }

    false
}
