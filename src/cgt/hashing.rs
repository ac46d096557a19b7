//! Zobrist-style hashing for sub-games.
//!
//! The random table is the only process-global mutable state in the core
//! besides the type table. It is append-only: once a word has been handed
//! out for a (kind, value, position) triple it never changes, so concurrent
//! searches over distinct sum-games stay coherent.

use std::sync::{LazyLock, Mutex, OnceLock};

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::type_table::GameTypeId;
use crate::utils::prelude::*;

pub type Hash = u64;

/// The type tag of a hashed value. Keys drawn for different kinds never
/// alias, even for equal values and positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashKind {
    /// Board tiles and other per-position game state.
    Tile,
    /// The dense game-type id, mixed into every local hash once.
    GameType,
    /// A sub-game's position inside a sum.
    SumIndex,
    /// The colour to move on a whole sum.
    ToPlay,
}

struct RandomTable {
    rng: StdRng,
    offsets: FxHashMap<(HashKind, i64), usize>,
    rows: Vec<Vec<Hash>>,
}

impl RandomTable {
    const INITIAL_POSITIONS: usize = 64;

    fn new(seed: u64) -> RandomTable {
        RandomTable {
            rng: StdRng::seed_from_u64(seed),
            offsets: FxHashMap::default(),
            rows: vec![],
        }
    }

    /// A nonzero pseudorandom word.
    fn next_word(&mut self) -> Hash {
        loop {
            let word: Hash = self.rng.random();
            if word != 0 {
                return word;
            }
        }
    }

    /// Looks up the word for a triple, growing both axes on demand.
    fn get(&mut self, kind: HashKind, position: usize, value: i64) -> Hash {
        let next_row = self.rows.len();
        let row_idx = *self.offsets.entry((kind, value)).or_insert(next_row);
        if row_idx == next_row {
            self.rows.push(vec![]);
        }

        let cur_len = self.rows[row_idx].len();
        if position >= cur_len {
            let new_len = (cur_len * 2).max(position + 1).max(Self::INITIAL_POSITIONS);
            log::trace!(
                "growing random table row {row_idx} from {cur_len} to {new_len} positions"
            );
            for _ in cur_len..new_len {
                let word = self.next_word();
                self.rows[row_idx].push(word);
            }
        }

        self.rows[row_idx][position]
    }
}

static SEED: OnceLock<u64> = OnceLock::new();

static TABLE: LazyLock<Mutex<RandomTable>> = LazyLock::new(|| {
    let seed = *SEED.get_or_init(rand::random);
    log::debug!("random table seeded with {seed:#018x}");
    Mutex::new(RandomTable::new(seed))
});

/// Fixes the random-table seed for this process. Returns false if the table
/// was already seeded (explicitly or by first use).
pub fn set_seed(seed: u64) -> bool {
    SEED.set(seed).is_ok()
}

/// The random word for a (kind, position, value) triple. Never zero;
/// stable for the lifetime of the process.
pub fn rand_key(kind: HashKind, position: usize, value: i64) -> Hash {
    TABLE
        .lock()
        .expect("random table lock poisoned")
        .get(kind, position, value)
}

/// Zobrist accumulator for one sub-game.
///
/// Toggling the same (position, value) pair twice cancels out, so play and
/// undo can maintain the value incrementally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocalHash {
    value: Hash,
}

impl LocalHash {
    pub fn new() -> LocalHash {
        LocalHash::default()
    }

    /// Returns the accumulator to the neutral element.
    pub fn reset(&mut self) {
        self.value = 0;
    }

    pub fn value(&self) -> Hash {
        self.value
    }

    /// Direct override, used by the grid hash to export its canonical value.
    pub fn set_value(&mut self, value: Hash) {
        self.value = value;
    }

    /// XORs in the key for a (position, value) pair.
    pub fn toggle(&mut self, position: usize, value: i32) {
        self.value ^= rand_key(HashKind::Tile, position, value as i64);
    }

    /// Mixes the game type into the accumulator so equal boards of
    /// different games never collide.
    pub fn toggle_type(&mut self, game_type: GameTypeId) {
        self.value ^= rand_key(HashKind::GameType, 0, game_type as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_nonzero_and_stable() {
        for position in 0..200 {
            let k = rand_key(HashKind::Tile, position, 2);
            assert_ne!(k, 0);
            assert_eq!(k, rand_key(HashKind::Tile, position, 2));
        }
    }

    #[test]
    fn kinds_do_not_alias() {
        let a = rand_key(HashKind::Tile, 0, 1);
        let b = rand_key(HashKind::SumIndex, 0, 1);
        let c = rand_key(HashKind::ToPlay, 0, 1);
        assert!(a != b && b != c && a != c);
    }

    #[test]
    fn toggle_is_an_involution() {
        let mut h = LocalHash::new();
        h.toggle(0, 0);
        h.toggle(3, 1);
        let mid = h.value();

        h.toggle(7, 2);
        h.toggle(7, 2);
        assert_eq!(h.value(), mid);

        h.toggle(3, 1);
        h.toggle(0, 0);
        assert_eq!(h.value(), 0);
    }

    #[test]
    fn toggle_order_is_irrelevant() {
        let mut h1 = LocalHash::new();
        let mut h2 = LocalHash::new();

        h1.toggle(0, 1);
        h1.toggle(1, 2);
        h2.toggle(1, 2);
        h2.toggle(0, 1);

        assert_eq!(h1.value(), h2.value());
    }

    #[test]
    fn reset_returns_to_neutral() {
        let mut h = LocalHash::new();
        h.toggle(5, 1);
        h.toggle_type(3);
        h.reset();
        assert_eq!(h.value(), 0);
    }
}
