//! Transposition table for the boolean search.

use crate::cgt::prelude::*;

/// The solved status of a position, keyed by (global hash, player to move).
///
/// `InProgress` marks a node somewhere on the current search path; reading
/// it breaks cycles that normalization can create, at the price of a
/// conservative answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableEntry {
    Win,
    Loss,
    InProgress,
}

#[derive(Default)]
pub struct TranspositionTable {
    entries: FxHashMap<(Hash, Player), TableEntry>,
}

impl TranspositionTable {
    pub fn new() -> TranspositionTable {
        TranspositionTable::default()
    }

    pub fn probe(&self, hash: Hash, to_play: Player) -> Option<TableEntry> {
        self.entries.get(&(hash, to_play)).copied()
    }

    pub fn store(&mut self, hash: Hash, to_play: Player, entry: TableEntry) {
        self.entries.insert((hash, to_play), entry);
    }

    /// Drops an `InProgress` marker when its node unwinds without an
    /// answer. Settled entries are never removed.
    pub fn retract(&mut self, hash: Hash, to_play: Player) {
        if let Some(TableEntry::InProgress) = self.probe(hash, to_play) {
            self.entries.remove(&(hash, to_play));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_store_retract() {
        let mut table = TranspositionTable::new();
        assert_eq!(table.probe(1, Player::Black), None);

        table.store(1, Player::Black, TableEntry::InProgress);
        assert_eq!(table.probe(1, Player::Black), Some(TableEntry::InProgress));
        assert_eq!(table.probe(1, Player::White), None);

        table.store(1, Player::Black, TableEntry::Win);
        table.retract(1, Player::Black);
        assert_eq!(table.probe(1, Player::Black), Some(TableEntry::Win));

        table.store(2, Player::White, TableEntry::InProgress);
        table.retract(2, Player::White);
        assert_eq!(table.probe(2, Player::White), None);
    }
}
