use rand::{prelude::SliceRandom, Rng};

use super::Outcome;
use crate::random::{is_binarish, rand_below, rand_log};

/// Splits a block into lines, keeping the terminating newline on each line.
/// A trailing fragment without a newline is kept as the final line.
fn split_lines(data: &[u8]) -> Vec<&[u8]> {
    data.split_inclusive(|&b| b == b'\n').collect()
}

/// Lines of the block, or `None` when the block is empty or looks binary.
fn try_lines(data: &[u8]) -> Option<Vec<&[u8]>> {
    let lines = split_lines(data);
    let first = lines.first()?;
    if is_binarish(first) {
        return None;
    }

    Some(lines)
}

/// Applies a list operation to the lines of `data`.
fn with_lines<R: Rng>(
    rng: &mut R,
    data: &[u8],
    op: impl FnOnce(&mut R, &mut Vec<&[u8]>),
) -> Outcome {
    match try_lines(data) {
        Some(mut lines) => {
            op(rng, &mut lines);
            Outcome::changed(lines.concat(), 1)
        }
        None => Outcome::unchanged(-1),
    }
}

fn list_del<T>(rng: &mut impl Rng, list: &mut Vec<T>) {
    if list.len() < 2 {
        return;
    }

    list.remove(rand_below(rng, list.len()));
}

fn list_del_seq<T>(rng: &mut impl Rng, list: &mut Vec<T>) {
    if list.len() < 2 {
        return;
    }

    let start = rand_below(rng, list.len() - 1);
    let end = rng.gen_range(start + 1..list.len());
    list.drain(start..end);
}

fn list_dup<T: Clone>(rng: &mut impl Rng, list: &mut Vec<T>) {
    if list.is_empty() {
        return;
    }

    let index = rand_below(rng, list.len());
    let item = list[index].clone();
    list.insert(index + 1, item);
}

fn list_clone<T: Clone>(rng: &mut impl Rng, list: &mut Vec<T>) {
    if list.is_empty() {
        return;
    }

    let from = rand_below(rng, list.len());
    // closeby: within a few lines of the copied one
    let offset = rand_below(rng, 5);
    let to = if rng.gen() {
        from.saturating_sub(offset)
    } else {
        std::cmp::min(from + offset + 1, list.len())
    };
    let item = list[from].clone();
    list.insert(to, item);
}

fn list_repeat<T: Clone>(rng: &mut impl Rng, list: &mut Vec<T>) {
    if list.is_empty() {
        return;
    }

    let index = rand_below(rng, list.len());
    let count = rand_log(rng, 10).max(2);
    let item = list[index].clone();
    list.splice(index..index, std::iter::repeat(item).take(count));
}

fn list_swap<T>(rng: &mut impl Rng, list: &mut Vec<T>) {
    if list.len() < 2 {
        return;
    }

    let index = rand_below(rng, list.len() - 1);
    list.swap(index, index + 1);
}

fn list_perm<T>(rng: &mut impl Rng, list: &mut Vec<T>) {
    if list.len() < 3 {
        return;
    }

    let from = rand_below(rng, list.len() - 2);
    let count = rand_log(rng, 10).clamp(2, list.len() - from);
    list[from..from + count].shuffle(rng);
}

fn list_ins<T: Clone>(rng: &mut impl Rng, list: &mut Vec<T>) {
    if list.is_empty() {
        return;
    }

    let from = rand_below(rng, list.len());
    let to = rand_below(rng, list.len() + 1);
    let item = list[from].clone();
    list.insert(to, item);
}

fn list_replace<T: Clone>(rng: &mut impl Rng, list: &mut Vec<T>) {
    if list.len() < 2 {
        return;
    }

    let from = rand_below(rng, list.len());
    let to = rand_below(rng, list.len());
    list[to] = list[from].clone();
}

pub(super) fn line_del(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_lines(rng, data, |rng, lines| list_del(rng, lines))
}

pub(super) fn line_del_seq(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_lines(rng, data, |rng, lines| list_del_seq(rng, lines))
}

pub(super) fn line_dup(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_lines(rng, data, |rng, lines| list_dup(rng, lines))
}

pub(super) fn line_clone(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_lines(rng, data, |rng, lines| list_clone(rng, lines))
}

pub(super) fn line_repeat(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_lines(rng, data, |rng, lines| list_repeat(rng, lines))
}

pub(super) fn line_swap(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_lines(rng, data, |rng, lines| list_swap(rng, lines))
}

pub(super) fn line_perm(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_lines(rng, data, |rng, lines| list_perm(rng, lines))
}

pub(super) fn line_ins(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_lines(rng, data, |rng, lines| list_ins(rng, lines))
}

pub(super) fn line_replace(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_lines(rng, data, |rng, lines| list_replace(rng, lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const TEXT: &[u8] =
        b"ABCDE\nKLMNOPQRSTUV\nZYX\nfeklafnewlka\nkelwflknewfw\n123214324\nhello world\n";

    fn newlines(data: &[u8]) -> usize {
        data.iter().filter(|&&b| b == b'\n').count()
    }

    #[test]
    fn split_keeps_trailing_fragment() {
        assert_eq!(split_lines(b"a\nb\nc"), vec![&b"a\n"[..], &b"b\n"[..], &b"c"[..]]);
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn binary_blocks_are_rejected() {
        let mut rng = StdRng::seed_from_u64(1674713045);
        let mut binary = b"ABCDEFGHIJ\nKLNOPQRSTUV\nZYX\n".to_vec();
        binary.insert(5, 0xfe);
        let outcome = line_del(&mut rng, &binary);
        assert!(outcome.data.is_none());
        assert_eq!(outcome.delta, -1);

        let outcome = line_del(&mut rng, TEXT);
        assert_eq!(outcome.delta, 1);
        assert_eq!(newlines(&outcome.data.expect("text has lines")), newlines(TEXT) - 1);
    }

    #[test]
    fn dup_adds_one_line() {
        let mut rng = StdRng::seed_from_u64(9);
        let out = line_dup(&mut rng, TEXT).data.expect("text has lines");
        assert_eq!(newlines(&out), newlines(TEXT) + 1);
    }

    #[test]
    fn swap_and_perm_keep_every_line() {
        let mut rng = StdRng::seed_from_u64(21);
        for out in [
            line_swap(&mut rng, TEXT).data,
            line_perm(&mut rng, TEXT).data,
        ] {
            let out = out.expect("text has lines");
            let mut before = split_lines(TEXT);
            let mut after = split_lines(&out);
            before.sort();
            after.sort();
            assert_eq!(before, after);
        }
    }

    #[test]
    fn repeat_and_clone_grow() {
        let mut rng = StdRng::seed_from_u64(5);
        let out = line_repeat(&mut rng, TEXT).data.expect("text has lines");
        assert!(newlines(&out) >= newlines(TEXT) + 2);

        let out = line_clone(&mut rng, TEXT).data.expect("text has lines");
        assert_eq!(newlines(&out), newlines(TEXT) + 1);

        let out = line_ins(&mut rng, TEXT).data.expect("text has lines");
        assert_eq!(newlines(&out), newlines(TEXT) + 1);
    }

    #[test]
    fn delete_sequence_and_replace() {
        let mut rng = StdRng::seed_from_u64(17);
        let out = line_del_seq(&mut rng, TEXT).data.expect("text has lines");
        assert!(newlines(&out) < newlines(TEXT));

        let out = line_replace(&mut rng, TEXT).data.expect("text has lines");
        assert_eq!(newlines(&out), newlines(TEXT));
    }
}
