use rand::{prelude::SliceRandom, Rng};

use super::Outcome;
use crate::random::{is_binarish, rand_log};

/// Groups nested deeper than this are left as plain bytes.
const MAX_DEPTH: usize = 256;

/// Closing byte for every byte that opens a group. Quotes close themselves.
fn closer(byte: u8) -> Option<u8> {
    match byte {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'<' => Some(b'>'),
        b'{' => Some(b'}'),
        b'"' => Some(b'"'),
        b'\'' => Some(b'\''),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node<'a> {
    Bytes(&'a [u8]),
    /// `close` is `None` when the input ended before the group was closed.
    Group {
        open: u8,
        close: Option<u8>,
        children: Vec<Node<'a>>,
    },
}

/// Path from the top level to a node, one child index per level.
type Path = Vec<usize>;

fn push_bytes<'a>(nodes: &mut Vec<Node<'a>>, bytes: &'a [u8]) {
    if !bytes.is_empty() {
        nodes.push(Node::Bytes(bytes));
    }
}

fn innermost<'s, 'a>(
    root: &'s mut Vec<Node<'a>>,
    open: &'s mut [(u8, Vec<Node<'a>>)],
) -> &'s mut Vec<Node<'a>> {
    match open.last_mut() {
        Some((_, children)) => children,
        None => root,
    }
}

/// Parses `data` into a forest of bracket and quote groups. Writing the forest
/// back with [`unparse`] gives `data` again.
fn parse(data: &[u8]) -> Vec<Node<'_>> {
    let mut root = Vec::new();
    let mut open: Vec<(u8, Vec<Node<'_>>)> = Vec::new();
    let mut start = 0;

    for (index, &byte) in data.iter().enumerate() {
        let closes_group = open
            .last()
            .map_or(false, |&(opener, _)| closer(opener) == Some(byte));

        if closes_group {
            push_bytes(innermost(&mut root, &mut open), &data[start..index]);
            if let Some((opener, children)) = open.pop() {
                innermost(&mut root, &mut open).push(Node::Group {
                    open: opener,
                    close: Some(byte),
                    children,
                });
            }
            start = index + 1;
        } else if closer(byte).is_some() && open.len() < MAX_DEPTH {
            push_bytes(innermost(&mut root, &mut open), &data[start..index]);
            open.push((byte, Vec::new()));
            start = index + 1;
        }
    }
    push_bytes(innermost(&mut root, &mut open), &data[start..]);

    while let Some((opener, children)) = open.pop() {
        innermost(&mut root, &mut open).push(Node::Group {
            open: opener,
            close: None,
            children,
        });
    }

    root
}

fn unparse(nodes: &[Node<'_>], out: &mut Vec<u8>) {
    for node in nodes {
        match node {
            Node::Bytes(bytes) => out.extend_from_slice(bytes),
            Node::Group {
                open,
                close,
                children,
            } => {
                out.push(*open);
                unparse(children, out);
                out.extend(close.iter());
            }
        }
    }
}

/// Paths of every closed group, parents before their children.
fn group_paths(nodes: &[Node<'_>], prefix: &mut Path, paths: &mut Vec<Path>) {
    for (index, node) in nodes.iter().enumerate() {
        if let Node::Group {
            close, children, ..
        } = node
        {
            prefix.push(index);
            if close.is_some() {
                paths.push(prefix.clone());
            }
            group_paths(children, prefix, paths);
            prefix.pop();
        }
    }
}

fn descend<'t, 'a>(node: &'t Node<'a>, path: &[usize]) -> Option<&'t Node<'a>> {
    match path.split_first() {
        None => Some(node),
        Some((&first, rest)) => match node {
            Node::Group { children, .. } => descend(children.get(first)?, rest),
            Node::Bytes(_) => None,
        },
    }
}

fn descend_mut<'t, 'a>(node: &'t mut Node<'a>, path: &[usize]) -> Option<&'t mut Node<'a>> {
    match path.split_first() {
        None => Some(node),
        Some((&first, rest)) => match node {
            Node::Group { children, .. } => descend_mut(children.get_mut(first)?, rest),
            Node::Bytes(_) => None,
        },
    }
}

fn get<'t, 'a>(nodes: &'t [Node<'a>], path: &[usize]) -> Option<&'t Node<'a>> {
    let (&first, rest) = path.split_first()?;
    descend(nodes.get(first)?, rest)
}

fn get_mut<'t, 'a>(nodes: &'t mut [Node<'a>], path: &[usize]) -> Option<&'t mut Node<'a>> {
    let (&first, rest) = path.split_first()?;
    descend_mut(nodes.get_mut(first)?, rest)
}

/// The list holding the node at `path`, and the node's index in it.
fn siblings_mut<'t, 'a>(
    nodes: &'t mut Vec<Node<'a>>,
    path: &[usize],
) -> Option<(&'t mut Vec<Node<'a>>, usize)> {
    let (&index, parent) = path.split_last()?;
    if parent.is_empty() {
        return Some((nodes, index));
    }

    match get_mut(nodes, parent)? {
        Node::Group { children, .. } => Some((children, index)),
        Node::Bytes(_) => None,
    }
}

fn is_nested(a: &[usize], b: &[usize]) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Parses `data`, lets `op` rewrite the forest and writes it back. Binary
/// looking data and forests `op` cannot work on are left alone.
fn with_tree<R: Rng>(
    rng: &mut R,
    data: &[u8],
    op: impl FnOnce(&mut R, &mut Vec<Node<'_>>, Vec<Path>) -> Option<()>,
) -> Outcome {
    if data.is_empty() || is_binarish(data) {
        return Outcome::unchanged(-1);
    }

    let mut nodes = parse(data);
    let mut paths = Vec::new();
    group_paths(&nodes, &mut Vec::new(), &mut paths);

    match op(rng, &mut nodes, paths) {
        Some(()) => {
            let mut out = Vec::with_capacity(data.len());
            unparse(&nodes, &mut out);
            Outcome::changed(out, 1)
        }
        None => Outcome::unchanged(-1),
    }
}

/// `td`: removes a group.
pub(super) fn tree_del(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_tree(rng, data, |rng, nodes, paths| {
        let path = paths.choose(rng)?;
        let (siblings, index) = siblings_mut(nodes, path)?;
        siblings.remove(index);
        Some(())
    })
}

/// `tr2`: puts a copy of a group right after it.
pub(super) fn tree_dup(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_tree(rng, data, |rng, nodes, paths| {
        let path = paths.choose(rng)?;
        let (siblings, index) = siblings_mut(nodes, path)?;
        let copy = siblings.get(index)?.clone();
        siblings.insert(index + 1, copy);
        Some(())
    })
}

/// `ts1`: overwrites one group with a copy of another.
pub(super) fn tree_swap_one(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_tree(rng, data, |rng, nodes, paths| {
        let mut picked = paths.choose_multiple(rng, 2);
        let (from, to) = (picked.next()?, picked.next()?);
        let copy = get(nodes, from)?.clone();
        *get_mut(nodes, to)? = copy;
        Some(())
    })
}

/// `ts2`: swaps two groups where neither contains the other.
pub(super) fn tree_swap_two(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_tree(rng, data, |rng, nodes, mut paths| {
        paths.shuffle(rng);
        let (a, b) = paths.iter().enumerate().find_map(|(i, a)| {
            paths[i + 1..]
                .iter()
                .find(|b| !is_nested(a, b))
                .map(|b| (a, b))
        })?;

        let node_a = get(nodes, a)?.clone();
        let node_b = get(nodes, b)?.clone();
        *get_mut(nodes, a)? = node_b;
        *get_mut(nodes, b)? = node_a;
        Some(())
    })
}

/// `tr`: repeats the path from a group down to one of its inner groups a
/// random number of times, nesting each copy in the previous one.
pub(super) fn tree_stutter(rng: &mut impl Rng, data: &[u8]) -> Outcome {
    with_tree(rng, data, |rng, nodes, mut paths| {
        paths.shuffle(rng);
        let (outer, inner) = paths.iter().find_map(|inner| {
            paths
                .iter()
                .find(|outer| outer.len() < inner.len() && inner.starts_with(outer))
                .map(|outer| (outer, inner))
        })?;

        let suffix = &inner[outer.len()..];
        let reps = rand_log(rng, 10).clamp(1, MAX_DEPTH / suffix.len());
        let template = get(nodes, outer)?.clone();
        let mut nested = template.clone();
        for _ in 0..reps {
            let mut copy = template.clone();
            *descend_mut(&mut copy, suffix)? = nested;
            nested = copy;
        }

        *get_mut(nodes, outer)? = nested;
        Some(())
    })
}
