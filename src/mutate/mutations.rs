use std::{collections::BTreeMap, fmt};

use log::debug;
use rand::Rng;

use super::{ascii, bytes, fuse, lines, numbers, tree, unicode, Outcome};
use crate::error::{Error, Result};
use crate::random::rand_below;

/// Mutators used when the selection is `default`.
pub const DEFAULT_MUTATIONS: &str =
    "ft=2,fo=2,fn,num=5,w=2,ld,lds,lr2,li,ls,lp,lr,sr,sd,bd,bf,bi,br,bp,bei,bed,ber,uw,ui=2,ab";

const MAX_SCORE: usize = 10;
const MIN_SCORE: usize = 2;
/// Largest priority a selection can give. Larger values are clamped.
pub(crate) const MAX_PRIORITY: usize = 1 << 16;

/// Represents a single mutator. Any newly added variants must also be added to
/// [`MutationStrategy::ALL`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MutationStrategy {
    ByteDrop,
    ByteFlip,
    ByteInsert,
    ByteRepeat,
    BytePerm,
    ByteInc,
    ByteDec,
    ByteRandom,
    SeqRepeat,
    SeqDel,
    LineDel,
    LineDelSeq,
    LineDup,
    LineClone,
    LineRepeat,
    LineSwap,
    LinePerm,
    LineIns,
    LineReplace,
    TreeDel,
    TreeDup,
    TreeSwapOne,
    TreeSwapTwo,
    TreeStutter,
    AsciiBad,
    TextualNumber,
    Word,
    Utf8Widen,
    Utf8Insert,
    FuseThis,
    FuseNext,
    FuseOld,
    Nop,
}

impl MutationStrategy {
    pub const ALL: &'static [MutationStrategy] = &[
        MutationStrategy::ByteDrop,
        MutationStrategy::ByteFlip,
        MutationStrategy::ByteInsert,
        MutationStrategy::ByteRepeat,
        MutationStrategy::BytePerm,
        MutationStrategy::ByteInc,
        MutationStrategy::ByteDec,
        MutationStrategy::ByteRandom,
        MutationStrategy::SeqRepeat,
        MutationStrategy::SeqDel,
        MutationStrategy::LineDel,
        MutationStrategy::LineDelSeq,
        MutationStrategy::LineDup,
        MutationStrategy::LineClone,
        MutationStrategy::LineRepeat,
        MutationStrategy::LineSwap,
        MutationStrategy::LinePerm,
        MutationStrategy::LineIns,
        MutationStrategy::LineReplace,
        MutationStrategy::TreeDel,
        MutationStrategy::TreeDup,
        MutationStrategy::TreeSwapOne,
        MutationStrategy::TreeSwapTwo,
        MutationStrategy::TreeStutter,
        MutationStrategy::AsciiBad,
        MutationStrategy::TextualNumber,
        MutationStrategy::Word,
        MutationStrategy::Utf8Widen,
        MutationStrategy::Utf8Insert,
        MutationStrategy::FuseThis,
        MutationStrategy::FuseNext,
        MutationStrategy::FuseOld,
        MutationStrategy::Nop,
    ];

    /// Short name used in selection strings
    pub fn id(self) -> &'static str {
        use MutationStrategy::*;
        match self {
            ByteDrop => "bd",
            ByteFlip => "bf",
            ByteInsert => "bi",
            ByteRepeat => "br",
            BytePerm => "bp",
            ByteInc => "bei",
            ByteDec => "bed",
            ByteRandom => "ber",
            SeqRepeat => "sr",
            SeqDel => "sd",
            LineDel => "ld",
            LineDelSeq => "lds",
            LineDup => "lr2",
            LineClone => "li",
            LineRepeat => "lr",
            LineSwap => "ls",
            LinePerm => "lp",
            LineIns => "lis",
            LineReplace => "lrs",
            TreeDel => "td",
            TreeDup => "tr2",
            TreeSwapOne => "ts1",
            TreeSwapTwo => "ts2",
            TreeStutter => "tr",
            AsciiBad => "ab",
            TextualNumber => "num",
            Word => "w",
            Utf8Widen => "uw",
            Utf8Insert => "ui",
            FuseThis => "ft",
            FuseNext => "fn",
            FuseOld => "fo",
            Nop => "nop",
        }
    }

    pub fn info(self) -> &'static str {
        use MutationStrategy::*;
        match self {
            ByteDrop => "drop a byte",
            ByteFlip => "flip one bit",
            ByteInsert => "insert a random byte",
            ByteRepeat => "repeat a byte",
            BytePerm => "permute some bytes",
            ByteInc => "increment a byte by one",
            ByteDec => "decrement a byte by one",
            ByteRandom => "swap a byte with a random one",
            SeqRepeat => "repeat a sequence of bytes",
            SeqDel => "delete a sequence of bytes",
            LineDel => "delete a line",
            LineDelSeq => "delete many lines",
            LineDup => "duplicate a line",
            LineClone => "copy a line closeby",
            LineRepeat => "repeat a line",
            LineSwap => "swap two lines",
            LinePerm => "swap order of lines",
            LineIns => "insert a line from elsewhere",
            LineReplace => "replace a line with one from elsewhere",
            TreeDel => "delete a node",
            TreeDup => "duplicate a node",
            TreeSwapOne => "swap one node with another one",
            TreeSwapTwo => "swap two nodes pairwise",
            TreeStutter => "repeat a path of the parse tree",
            AsciiBad => "enhance silly issues in ASCII string data handling",
            TextualNumber => "modify a textual number",
            Word => "overwrite an n-byte word with a boundary value or nudge it",
            Utf8Widen => "make a code point too wide",
            Utf8Insert => "insert funny unicode",
            FuseThis => "jump to a similar position in block",
            FuseNext => "likely clone data between similar positions",
            FuseOld => "fuse previously seen data elsewhere",
            Nop => "do nothing",
        }
    }

    /// Looks up a mutator by its id. `word` is accepted for `w`.
    pub fn from_id(id: &str) -> Option<MutationStrategy> {
        if id == "word" {
            return Some(MutationStrategy::Word);
        }

        MutationStrategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.id() == id)
    }

    pub(crate) fn mutate<R: Rng>(self, rng: &mut R, data: &[u8]) -> Outcome {
        use MutationStrategy::*;
        match self {
            ByteDrop => bytes::byte_drop(rng, data),
            ByteFlip => bytes::byte_flip(rng, data),
            ByteInsert => bytes::byte_insert(rng, data),
            ByteRepeat => bytes::byte_repeat(rng, data),
            BytePerm => bytes::byte_perm(rng, data),
            ByteInc => bytes::byte_inc(rng, data),
            ByteDec => bytes::byte_dec(rng, data),
            ByteRandom => bytes::byte_random(rng, data),
            SeqRepeat => bytes::seq_repeat(rng, data),
            SeqDel => bytes::seq_del(rng, data),
            LineDel => lines::line_del(rng, data),
            LineDelSeq => lines::line_del_seq(rng, data),
            LineDup => lines::line_dup(rng, data),
            LineClone => lines::line_clone(rng, data),
            LineRepeat => lines::line_repeat(rng, data),
            LineSwap => lines::line_swap(rng, data),
            LinePerm => lines::line_perm(rng, data),
            LineIns => lines::line_ins(rng, data),
            LineReplace => lines::line_replace(rng, data),
            TreeDel => tree::tree_del(rng, data),
            TreeDup => tree::tree_dup(rng, data),
            TreeSwapOne => tree::tree_swap_one(rng, data),
            TreeSwapTwo => tree::tree_swap_two(rng, data),
            TreeStutter => tree::tree_stutter(rng, data),
            AsciiBad => ascii::ascii_bad(rng, data),
            TextualNumber => numbers::num(rng, data),
            Word => numbers::word(rng, data),
            Utf8Widen => unicode::utf8_widen(rng, data),
            Utf8Insert => unicode::utf8_insert(rng, data),
            FuseThis => fuse::fuse_this(rng, data),
            FuseNext => fuse::fuse_next(rng, data),
            FuseOld => fuse::fuse_old(rng, data),
            Nop => Outcome::unchanged(0),
        }
    }
}

impl fmt::Display for MutationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A selected mutator. `priority` comes from the selection string, `score` is
/// learned while mutating and stays within `[MIN_SCORE, MAX_SCORE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutator {
    pub strategy: MutationStrategy,
    pub priority: usize,
    pub score: usize,
}

impl Mutator {
    fn adjust_score(&mut self, delta: isize) {
        let score = self.score as isize + delta;
        self.score = score.clamp(MIN_SCORE as isize, MAX_SCORE as isize) as usize;
    }
}

/// The set of selected mutators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutations {
    selected: BTreeMap<MutationStrategy, Mutator>,
}

impl Mutations {
    /// Parses a selection such as `num=5,bd,bf=2`, or the word `default`.
    /// A missing or zero priority means 1, priorities above [`MAX_PRIORITY`]
    /// are clamped.
    pub fn parse(selection: &str) -> Result<Mutations> {
        let selection = selection.trim();
        if selection == "default" {
            return Mutations::parse(DEFAULT_MUTATIONS);
        }

        let mut selected = BTreeMap::new();
        for item in selection.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (id, priority) = parse_item(item)?;
            let strategy = MutationStrategy::from_id(id)
                .ok_or_else(|| Error::UnknownMutator(id.to_string()))?;
            selected.insert(
                strategy,
                Mutator {
                    strategy,
                    priority,
                    score: MAX_SCORE,
                },
            );
        }

        if selected.is_empty() {
            return Err(Error::EmptySelection);
        }

        Ok(Mutations { selected })
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn get(&self, strategy: MutationStrategy) -> Option<&Mutator> {
        self.selected.get(&strategy)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mutator> {
        self.selected.values()
    }

    /// Gives every selected mutator a fresh random score.
    pub(crate) fn randomize(&mut self, rng: &mut impl Rng) {
        for mutator in self.selected.values_mut() {
            mutator.score = rand_below(rng, MAX_SCORE).max(MIN_SCORE);
        }
    }

    /// Mutators in the order they should be tried. Each one draws a weight in
    /// `[0, priority * score)`, heaviest first.
    fn weighted_order(&self, rng: &mut impl Rng) -> Vec<MutationStrategy> {
        let mut weighted: Vec<(usize, MutationStrategy)> = self
            .selected
            .values()
            .map(|m| (rand_below(rng, m.priority.saturating_mul(m.score)), m.strategy))
            .collect();
        weighted.sort_by(|a, b| b.0.cmp(&a.0));

        weighted.into_iter().map(|(_, strategy)| strategy).collect()
    }

    /// Runs mutators on `data` until one of them changes it. The result is
    /// capped at `limit` bytes. Returns `None` if no mutator changed the data.
    pub(crate) fn mutate<R: Rng>(&mut self, rng: &mut R, data: &[u8], limit: usize) -> Option<Vec<u8>> {
        for strategy in self.weighted_order(rng) {
            let Outcome { data: new_data, delta } = strategy.mutate(rng, data);
            if let Some(mutator) = self.selected.get_mut(&strategy) {
                mutator.adjust_score(delta);
            }

            match new_data {
                Some(mut new_data) => {
                    new_data.truncate(limit);
                    if new_data != data {
                        debug!("{} mutated {} bytes into {}", strategy, data.len(), new_data.len());
                        return Some(new_data);
                    }
                    debug!("{} produced identical data", strategy);
                }
                None => debug!("{} did not apply", strategy),
            }
        }

        None
    }
}

/// Splits `id=priority` (or a bare `id`) and clamps the priority to
/// `[1, MAX_PRIORITY]`.
pub(crate) fn parse_item(item: &str) -> Result<(&str, usize)> {
    let Some((id, value)) = item.split_once('=') else {
        return Ok((item, 1));
    };

    let id = id.trim();
    let value = value.trim();
    let priority = value.parse::<usize>().map_err(|_| Error::InvalidPriority {
        id: id.to_string(),
        value: value.to_string(),
    })?;

    Ok((id, priority.clamp(1, MAX_PRIORITY)))
}

impl fmt::Display for Mutations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for mutator in self.selected.values() {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{}={}", mutator.strategy, mutator.priority)?;
        }

        Ok(())
    }
}
