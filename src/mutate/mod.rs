/// String mutations that target text embedded in a block
mod ascii;
/// Byte and byte sequence mutations
mod bytes;
/// Jumps between similar positions of one or two blocks
mod fuse;
/// Line oriented mutations
mod lines;
/// Mutator registry and weighted mutator selection
pub(crate) mod mutations;
/// Textual and binary number mutations
mod numbers;
/// Mutations of nested bracket and quote structure
mod tree;
/// UTF-8 mutations
mod unicode;

pub use self::mutations::{MutationStrategy, Mutations, Mutator, DEFAULT_MUTATIONS};
pub(crate) use self::mutations::parse_item;

/// What a single mutator produced for a block. `delta` is fed back into the
/// mutator's score.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub data: Option<Vec<u8>>,
    pub delta: isize,
}

impl Outcome {
    pub(crate) fn changed(data: Vec<u8>, delta: isize) -> Self {
        Outcome {
            data: Some(data),
            delta,
        }
    }

    pub(crate) fn unchanged(delta: isize) -> Self {
        Outcome { data: None, delta }
    }
}
