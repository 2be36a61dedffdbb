use std::fmt;

use log::debug;
use rand::Rng;

use crate::error::{Error, Result};
use crate::mutate::{parse_item, Mutations};
use crate::random::{rand_below, rand_occurs};

/// Patterns used when the selection is `default`.
pub const DEFAULT_PATTERNS: &str = "od,nd=2,bu";

/// Probability of applying another round of mutations, as a fraction.
const REMUTATE_PROBABILITY: (usize, usize) = (4, 5);
/// Initial inverse probability of mutating a block.
const INITIAL_IP: usize = 24;
const MIN_BLOCK_SIZE: usize = 256;
const MAX_BLOCK_SIZE: usize = 4096;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PatternType {
    OnceDec,
    ManyDec,
    Burst,
}

impl PatternType {
    pub const ALL: &'static [PatternType] =
        &[PatternType::OnceDec, PatternType::ManyDec, PatternType::Burst];

    pub fn id(self) -> &'static str {
        match self {
            PatternType::OnceDec => "od",
            PatternType::ManyDec => "nd",
            PatternType::Burst => "bu",
        }
    }

    pub fn info(self) -> &'static str {
        match self {
            PatternType::OnceDec => "mutate once",
            PatternType::ManyDec => "mutate possibly many times",
            PatternType::Burst => "make several mutations closeby once",
        }
    }

    pub fn from_id(id: &str) -> Option<PatternType> {
        PatternType::ALL.iter().copied().find(|p| p.id() == id)
    }

    fn apply<R: Rng>(self, rng: &mut R, blocks: &mut [Vec<u8>], mutations: &mut Mutations, limit: usize) {
        mutate_once(rng, blocks, mutations, limit);
        match self {
            PatternType::OnceDec => {}
            PatternType::ManyDec => {
                let (num, den) = REMUTATE_PROBABILITY;
                while rand_occurs(rng, num, den) {
                    mutate_blocks(rng, blocks, mutations, limit);
                }
            }
            PatternType::Burst => {
                let (num, den) = REMUTATE_PROBABILITY;
                let mut rounds = 1;
                while rounds < 2 || rand_occurs(rng, num, den) {
                    mutate_blocks(rng, blocks, mutations, limit);
                    rounds += 1;
                }
            }
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub pattern_type: PatternType,
    pub priority: usize,
}

/// The set of selected patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patterns {
    selected: Vec<Pattern>,
}

impl Patterns {
    /// Parses a selection such as `od,nd=2`, or the word `default`.
    pub fn parse(selection: &str) -> Result<Patterns> {
        let selection = selection.trim();
        if selection == "default" {
            return Patterns::parse(DEFAULT_PATTERNS);
        }

        let mut selected: Vec<Pattern> = Vec::new();
        for item in selection.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (id, priority) = parse_item(item)?;
            let pattern_type =
                PatternType::from_id(id).ok_or_else(|| Error::UnknownPattern(id.to_string()))?;
            let pattern = Pattern {
                pattern_type,
                priority,
            };
            match selected.iter_mut().find(|p| p.pattern_type == pattern_type) {
                Some(existing) => *existing = pattern,
                None => selected.push(pattern),
            }
        }

        if selected.is_empty() {
            return Err(Error::EmptySelection);
        }

        // highest priority first
        selected.sort_by(|a, b| b.priority.cmp(&a.priority));

        Ok(Patterns { selected })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.selected.iter()
    }

    pub fn get(&self, pattern_type: PatternType) -> Option<&Pattern> {
        self.selected.iter().find(|p| p.pattern_type == pattern_type)
    }

    /// Picks a pattern with probability proportional to its priority.
    fn choose(&self, rng: &mut impl Rng) -> PatternType {
        let total = self
            .selected
            .iter()
            .fold(0usize, |total, p| total.saturating_add(p.priority));
        let mut n = rand_below(rng, total);
        for pattern in &self.selected {
            if n < pattern.priority {
                return pattern.pattern_type;
            }
            n -= pattern.priority;
        }

        self.selected
            .last()
            .map_or(PatternType::OnceDec, |p| p.pattern_type)
    }

    /// Splits `data` into blocks, applies a randomly chosen pattern and joins
    /// the blocks back together.
    pub(crate) fn apply<R: Rng>(
        &self,
        rng: &mut R,
        data: &[u8],
        mutations: &mut Mutations,
        limit: usize,
    ) -> Vec<u8> {
        let pattern = self.choose(rng);
        let mut blocks = split_blocks(rng, data);
        debug!("pattern {} over {} block(s)", pattern, blocks.len());

        pattern.apply(rng, &mut blocks, mutations, limit);
        blocks.concat()
    }
}

impl fmt::Display for Patterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for pattern in &self.selected {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{}={}", pattern.pattern_type, pattern.priority)?;
        }

        Ok(())
    }
}

/// Cuts `data` into blocks of random size. Empty data is a single empty block.
fn split_blocks(rng: &mut impl Rng, data: &[u8]) -> Vec<Vec<u8>> {
    if data.is_empty() {
        return vec![Vec::new()];
    }

    let mut blocks = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        let size = rng.gen_range(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).min(rest.len());
        let (block, tail) = rest.split_at(size);
        blocks.push(block.to_vec());
        rest = tail;
    }

    blocks
}

/// Mutates blocks with a probability that drops after every mutation. The
/// last block is always mutated.
fn mutate_once<R: Rng>(rng: &mut R, blocks: &mut [Vec<u8>], mutations: &mut Mutations, limit: usize) {
    let mut ip = rand_below(rng, INITIAL_IP);
    let last = blocks.len().saturating_sub(1);
    for (index, block) in blocks.iter_mut().enumerate() {
        if rand_below(rng, ip) == 0 || index == last {
            if let Some(new_block) = mutations.mutate(rng, block, limit) {
                *block = new_block;
                ip += 1;
            }
        }
    }
}

/// Like [`mutate_once`], without forcing a mutation of the last block.
fn mutate_blocks<R: Rng>(rng: &mut R, blocks: &mut [Vec<u8>], mutations: &mut Mutations, limit: usize) {
    let mut ip = rand_below(rng, INITIAL_IP);
    for block in blocks.iter_mut() {
        if rand_below(rng, ip) == 0 {
            if let Some(new_block) = mutations.mutate(rng, block, limit) {
                *block = new_block;
                ip += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutate::mutations::MAX_PRIORITY;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn parse_default_and_lists() {
        let patterns = Patterns::parse("default").expect("default parses");
        assert_eq!(patterns.to_string(), "nd=2,od=1,bu=1");

        let patterns = Patterns::parse("bu=0").expect("single pattern parses");
        assert_eq!(patterns.get(PatternType::Burst).map(|p| p.priority), Some(1));
        assert!(patterns.get(PatternType::OnceDec).is_none());

        assert!(matches!(Patterns::parse("od,xx"), Err(Error::UnknownPattern(id)) if id == "xx"));
        assert!(matches!(Patterns::parse(""), Err(Error::EmptySelection)));
        assert!(matches!(Patterns::parse("nd=-1"), Err(Error::InvalidPriority { .. })));
    }

    #[test]
    fn huge_priorities_still_choose() {
        let patterns = Patterns::parse("od=18446744073709551615,nd=18446744073709551615")
            .expect("parses");
        assert!(patterns.iter().all(|p| p.priority == MAX_PRIORITY));

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_ne!(patterns.choose(&mut rng), PatternType::Burst);
        }
    }

    #[test]
    fn choose_only_picks_selected() {
        let patterns = Patterns::parse("bu").expect("parses");
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            assert_eq!(patterns.choose(&mut rng), PatternType::Burst);
        }
    }

    #[test]
    fn blocks_cover_the_input() {
        let mut rng = StdRng::seed_from_u64(12);
        let data: Vec<u8> = (0..10_000u32).map(|i| i as u8).collect();
        let blocks = split_blocks(&mut rng, &data);
        assert!(blocks.len() >= 3);
        assert!(blocks[..blocks.len() - 1]
            .iter()
            .all(|b| (MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&b.len())));
        assert_eq!(blocks.concat(), data);

        assert_eq!(split_blocks(&mut rng, b""), vec![Vec::<u8>::new()]);
    }

    #[test]
    fn once_always_touches_the_last_block() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut mutations = Mutations::parse("bi").expect("parses");
        let patterns = Patterns::parse("od").expect("parses");
        let out = patterns.apply(&mut rng, b"abc", &mut mutations, 64);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn empty_input_gets_bytes() {
        let mut rng = StdRng::seed_from_u64(14);
        let mut mutations = Mutations::parse("default").expect("parses");
        let patterns = Patterns::parse("od").expect("parses");
        let out = patterns.apply(&mut rng, b"", &mut mutations, 64);
        assert!(!out.is_empty());
    }
}
