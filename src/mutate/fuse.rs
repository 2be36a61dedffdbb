use rand::{prelude::SliceRandom, Rng};

use super::Outcome;
use crate::random::{rand_below, rand_delta_up};

/// Upper bound on the work spent narrowing down jump points.
const SEARCH_FUEL: usize = 100_000;
/// Inverse probability of stopping the search early at each step.
const SEARCH_STOP_IP: usize = 8;

/// Starting positions in `a` and `b`. When fusing a block with itself, the
/// positions are split randomly between the two sides so that the jump lands
/// somewhere else.
fn initial_positions(rng: &mut impl Rng, a: &[u8], b: &[u8]) -> (Vec<usize>, Vec<usize>) {
    if a != b {
        return ((0..a.len()).collect(), (0..b.len()).collect());
    }

    let mut from = Vec::new();
    let mut to = Vec::new();
    for index in 0..a.len() {
        if rng.gen() {
            from.push(index);
        } else {
            to.push(index);
        }
    }

    (from, to)
}

fn any_position_pair(rng: &mut impl Rng, from: &[usize], to: &[usize]) -> Option<(usize, usize)> {
    Some((*from.choose(rng)?, *to.choose(rng)?))
}

/// Positions whose byte at `depth` also occurs at `depth` in `other`.
fn shared_next_byte(data: &[u8], positions: &[usize], depth: usize, present: &[bool; 256]) -> Vec<usize> {
    positions
        .iter()
        .copied()
        .filter(|&p| data.get(p + depth).map_or(false, |&b| present[b as usize]))
        .collect()
}

fn bytes_at(data: &[u8], positions: &[usize], depth: usize) -> [bool; 256] {
    let mut present = [false; 256];
    for &p in positions {
        if let Some(&b) = data.get(p + depth) {
            present[b as usize] = true;
        }
    }
    present
}

/// Looks for a position in `a` and one in `b` that share a common context,
/// narrowing the candidates one byte at a time.
fn find_jump_points(rng: &mut impl Rng, a: &[u8], b: &[u8]) -> Option<(usize, usize)> {
    let (mut from, mut to) = initial_positions(rng, a, b);
    if from.is_empty() || to.is_empty() {
        return Some((rand_below(rng, a.len()), rand_below(rng, b.len())));
    }

    let mut fuel = SEARCH_FUEL;
    let mut depth = 0;
    loop {
        if fuel == 0 || rand_below(rng, SEARCH_STOP_IP) == 0 {
            return any_position_pair(rng, &from, &to);
        }

        let next_from = shared_next_byte(a, &from, depth, &bytes_at(b, &to, depth));
        let next_to = shared_next_byte(b, &to, depth, &bytes_at(a, &from, depth));
        if next_from.is_empty() || next_to.is_empty() {
            return any_position_pair(rng, &from, &to);
        }

        fuel = fuel.saturating_sub(next_from.len() + next_to.len());
        from = next_from;
        to = next_to;
        depth += 1;
    }
}

/// Keeps `a` up to a jump point and continues with `b` from a similar point.
fn fuse(rng: &mut impl Rng, a: &[u8], b: &[u8]) -> Vec<u8> {
    if a.is_empty() || b.is_empty() {
        return a.to_vec();
    }

    match find_jump_points(rng, a, b) {
        Some((from, to)) => {
            let mut out = Vec::with_capacity(from + b.len() - to);
            out.extend_from_slice(&a[..from]);
            out.extend_from_slice(&b[to..]);
            out
        }
        None => a.to_vec(),
    }
}

pub(super) fn fuse_this(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let new_data = fuse(rng, data, data);
    Outcome::changed(new_data, rand_delta_up(rng))
}

pub(super) fn fuse_next(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let (head, tail) = data.split_at(data.len() / 2);
    let head_then_data = fuse(rng, head, data);
    let new_data = fuse(rng, &head_then_data, tail);
    Outcome::changed(new_data, rand_delta_up(rng))
}

pub(super) fn fuse_old(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    let (head, tail) = data.split_at(data.len() / 2);
    let mut new_data = fuse(rng, head, tail);
    new_data.extend(fuse(rng, tail, head));
    Outcome::changed(new_data, rand_delta_up(rng))
}
