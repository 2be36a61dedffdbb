use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::mutate::{MutationStrategy, Mutations};
use crate::options::EngineOptions;
use crate::patterns::{PatternType, Patterns};

/// A configured mutation engine. Every call to [`Engine::mutate`] is
/// deterministic for a given configuration, input, size limit and seed.
#[derive(Debug, Clone)]
pub struct Engine {
    /// Selected mutators
    mutations: Mutations,
    /// Selected patterns
    patterns: Patterns,
    /// The selections the registries were parsed from
    options: EngineOptions,
    /// Private copy of the current input, so that input and output memory
    /// may overlap
    scratch: Vec<u8>,
}

impl Engine {
    /// Creates an engine with the default mutators and patterns.
    pub fn new() -> Result<Engine> {
        Engine::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Result<Engine> {
        let mutations = Mutations::parse(&options.mutators)?;
        let patterns = Patterns::parse(&options.patterns)?;
        debug!("engine created with mutators {} and patterns {}", mutations, patterns);

        Ok(Engine {
            mutations,
            patterns,
            options,
            scratch: Vec::new(),
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn mutations(&self) -> &Mutations {
        &self.mutations
    }

    pub fn patterns(&self) -> &Patterns {
        &self.patterns
    }

    /// Replaces the mutator selection. On error the engine is left unchanged.
    pub fn set_mutators(&mut self, selection: &str) -> Result<()> {
        self.mutations = Mutations::parse(selection)?;
        self.options.mutators = selection.to_string();
        info!("selected mutators: {}", self.mutations);

        Ok(())
    }

    /// Replaces the pattern selection. On error the engine is left unchanged.
    pub fn set_patterns(&mut self, selection: &str) -> Result<()> {
        self.patterns = Patterns::parse(selection)?;
        self.options.patterns = selection.to_string();
        info!("selected patterns: {}", self.patterns);

        Ok(())
    }

    /// Produces a variant of `input` that is at most `max_len` bytes long.
    pub fn mutate(&mut self, input: &[u8], max_len: usize, seed: u64) -> Vec<u8> {
        let mut rng = seeded_rng(seed);

        // learned scores only live for the duration of one call
        let mut mutations = self.mutations.clone();
        mutations.randomize(&mut rng);

        let mut output = self.patterns.apply(&mut rng, input, &mut mutations, max_len);
        output.truncate(max_len);
        debug!(
            "seed {}: {} bytes in, {} bytes out",
            seed,
            input.len(),
            output.len()
        );

        output
    }

    /// Mutates the first `len` bytes of `buf` in place. The result is at most
    /// `max_len` bytes and never exceeds the buffer. Returns the new length.
    pub fn mutate_in_place(&mut self, buf: &mut [u8], len: usize, max_len: usize, seed: u64) -> usize {
        let capacity = max_len.min(buf.len());
        let len = len.min(buf.len());
        self.load_scratch(&buf[..len]);
        let output = self.mutate_scratch(capacity, seed);
        buf[..output.len()].copy_from_slice(&output);

        output.len()
    }

    /// Copies `input` into the engine's private buffer.
    pub(crate) fn load_scratch(&mut self, input: &[u8]) {
        self.scratch.clear();
        self.scratch.extend_from_slice(input);
    }

    /// Mutates whatever was last loaded with [`Engine::load_scratch`].
    pub(crate) fn mutate_scratch(&mut self, max_len: usize, seed: u64) -> Vec<u8> {
        let input = std::mem::take(&mut self.scratch);
        let output = self.mutate(&input, max_len, seed);
        self.scratch = input;

        output
    }

    /// Every mutator and pattern the engine knows, with the priorities of the
    /// current selection.
    pub fn catalog(&self) -> Catalog {
        Catalog {
            mutators: MutationStrategy::ALL
                .iter()
                .map(|&strategy| CatalogEntry {
                    id: strategy.id(),
                    info: strategy.info(),
                    priority: self.mutations.get(strategy).map(|m| m.priority),
                })
                .collect(),
            patterns: PatternType::ALL
                .iter()
                .map(|&pattern| CatalogEntry {
                    id: pattern.id(),
                    info: pattern.info(),
                    priority: self.patterns.get(pattern).map(|p| p.priority),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub info: &'static str,
    /// Priority in the current selection, or `None` if not selected
    pub priority: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct Catalog {
    pub mutators: Vec<CatalogEntry>,
    pub patterns: Vec<CatalogEntry>,
}

/// RNG for a single mutation call, keyed on the SHA-256 of the seed.
fn seeded_rng(seed: u64) -> StdRng {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_be_bytes());
    StdRng::from_seed(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &[u8] =
        b"ABCDE\nKLMNOPQRSTUV\nZYX\nfeklafnewlka\nkelwflknewfw\n123214324\nhello world\n";

    #[test]
    fn same_seed_same_output() {
        let mut engine = Engine::new().expect("default engine");
        for seed in 0..10 {
            let first = engine.mutate(INPUT, 80, seed);
            let second = engine.mutate(INPUT, 80, seed);
            assert_eq!(first, second);
            assert!(first.len() <= 80);
        }
    }

    #[test]
    fn output_respects_the_limit() {
        let mut engine = Engine::new().expect("default engine");
        for seed in 0..50 {
            assert!(engine.mutate(INPUT, 16, seed).len() <= 16);
        }
        assert!(engine.mutate(INPUT, 0, 1).is_empty());
    }

    #[test]
    fn separate_engines_agree() {
        let mut a = Engine::new().expect("default engine");
        let mut b = Engine::new().expect("default engine");
        // a previous call must not affect the next one
        a.mutate(b"unrelated", 32, 99);
        assert_eq!(a.mutate(INPUT, 80, 7), b.mutate(INPUT, 80, 7));
    }

    #[test]
    fn bad_selection_keeps_configuration() {
        let mut engine = Engine::new().expect("default engine");
        assert!(engine.set_mutators("bd,zz").is_err());
        assert!(engine.set_patterns("od,xx").is_err());
        assert_eq!(engine.options(), &EngineOptions::default());
        assert_eq!(engine.mutations().len(), 25);

        engine.set_mutators("bi").expect("known mutator");
        assert_eq!(engine.options().mutators, "bi");
        assert_eq!(engine.mutations().len(), 1);
    }

    #[test]
    fn in_place_matches_separate_buffers() {
        let mut engine = Engine::new().expect("default engine");
        let expected = engine.mutate(INPUT, 96, 3);

        let mut buf = [0u8; 96];
        buf[..INPUT.len()].copy_from_slice(INPUT);
        let len = engine.mutate_in_place(&mut buf, INPUT.len(), 96, 3);
        assert_eq!(&buf[..len], &expected[..]);
    }

    #[test]
    fn in_place_honours_the_smaller_limit() {
        let mut engine = Engine::new().expect("default engine");
        for seed in 0..200 {
            let mut buf = *b"0123456789abcdef";
            let len = engine.mutate_in_place(&mut buf, 16, 4, seed);
            assert!(len <= 4, "seed {} gave {} bytes", seed, len);
            assert_eq!(&buf[..len], &engine.mutate(b"0123456789abcdef", 4, seed)[..]);
        }

        let mut buf = [b'a'; 8];
        assert!(engine.mutate_in_place(&mut buf, 8, 1024, 5) <= 8);
    }

    #[test]
    fn huge_priorities_mutate() {
        let mut engine = Engine::new().expect("default engine");
        engine
            .set_mutators("bd=18446744073709551615")
            .expect("priority is clamped");
        engine
            .set_patterns("od=18446744073709551615,nd=18446744073709551615")
            .expect("priority is clamped");
        for seed in 0..20 {
            assert!(engine.mutate(b"hello world\n", 64, seed).len() <= 64);
        }
    }

    #[test]
    fn catalog_marks_selected_entries() {
        let mut engine = Engine::new().expect("default engine");
        engine.set_patterns("bu=3").expect("known pattern");
        let catalog = engine.catalog();
        assert_eq!(catalog.mutators.len(), MutationStrategy::ALL.len());

        let nop = catalog.mutators.iter().find(|e| e.id == "nop").expect("nop listed");
        assert_eq!(nop.priority, None);
        let bu = catalog.patterns.iter().find(|e| e.id == "bu").expect("bu listed");
        assert_eq!(bu.priority, Some(3));
    }
}
