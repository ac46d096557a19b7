//! The polymorphic sub-game contract.
//!
//! Concrete games implement [`Game`] and embed a [`GameCore`] that carries
//! the bookkeeping every game shares: the move stack, the parallel
//! undo-code stack, and the local hash with its tri-state. Implementations
//! route their mutations through the `record_*` helpers so that stacks and
//! hash state stay consistent; skipping them is a programmer error that the
//! next stack operation will catch.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use super::basics::Player;
use super::hashing::{Hash, LocalHash};
use super::moves::{self, Move};
use super::type_table::GameTypeId;

/// Distinguishes what the matching entry on the move stack was, so undo
/// restores operations in inverse order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoCode {
    Play,
    Normalize,
}

/// The local-hash state machine. `NeedsUpdate` means a mutation is in
/// flight and an incremental delta may still bring the hash up to date;
/// anything else at read time forces a rebuild through `init_hash`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashState {
    Invalid,
    NeedsUpdate,
    UpToDate,
}

/// Per-game bookkeeping shared by every implementation of [`Game`].
#[derive(Clone, Debug)]
pub struct GameCore {
    move_stack: Vec<Move>,
    undo_stack: Vec<UndoCode>,
    hash: LocalHash,
    hash_state: HashState,
}

impl Default for GameCore {
    fn default() -> Self {
        GameCore {
            move_stack: vec![],
            undo_stack: vec![],
            hash: LocalHash::new(),
            hash_state: HashState::Invalid,
        }
    }
}

impl GameCore {
    pub fn new() -> GameCore {
        GameCore::default()
    }

    /// Pushes a play onto the stacks. The move must not carry a colour yet;
    /// the colour is attached here.
    pub fn record_play(&mut self, m: Move, to_play: Player) {
        self.move_stack.push(moves::set_color(m, to_play));
        self.pre_hash_update();
        self.undo_stack.push(UndoCode::Play);
    }

    /// Pops a play off the stacks, returning the colour-encoded move.
    pub fn record_undo_play(&mut self) -> Move {
        self.pre_hash_update();
        let code = self.undo_stack.pop().expect("undo stack underflow");
        assert_eq!(code, UndoCode::Play, "undo stack top is not a play");
        self.move_stack.pop().expect("move stack underflow")
    }

    /// Pushes a normalize marker.
    pub fn record_normalize(&mut self) {
        self.pre_hash_update();
        self.undo_stack.push(UndoCode::Normalize);
    }

    /// Pops a normalize marker.
    pub fn record_undo_normalize(&mut self) {
        self.pre_hash_update();
        let code = self.undo_stack.pop().expect("undo stack underflow");
        assert_eq!(code, UndoCode::Normalize, "undo stack top is not a normalize");
    }

    /// The most recent colour-encoded move.
    pub fn last_move(&self) -> Move {
        *self.move_stack.last().expect("no moves played")
    }

    pub fn num_moves_played(&self) -> usize {
        self.move_stack.len()
    }

    /// Whether an in-flight mutation may still update the hash
    /// incrementally.
    pub fn hash_updatable(&self) -> bool {
        self.hash_state == HashState::NeedsUpdate
    }

    /// Marks the in-flight incremental update as complete.
    pub fn mark_hash_updated(&mut self) {
        assert_eq!(self.hash_state, HashState::NeedsUpdate);
        self.hash_state = HashState::UpToDate;
    }

    /// Downgrades the hash for a mutation that cannot update incrementally.
    pub fn invalidate_hash(&mut self) {
        self.hash_state = HashState::Invalid;
        self.hash.reset();
    }

    pub fn hash_state(&self) -> HashState {
        self.hash_state
    }

    pub fn hash_value(&self) -> Hash {
        self.hash.value()
    }

    pub fn hash_mut(&mut self) -> &mut LocalHash {
        &mut self.hash
    }

    /// Installs a freshly computed hash.
    pub fn set_hash(&mut self, hash: LocalHash) {
        self.hash = hash;
        self.hash_state = HashState::UpToDate;
    }

    fn pre_hash_update(&mut self) {
        self.hash_state = match self.hash_state {
            HashState::UpToDate => HashState::NeedsUpdate,
            _ => HashState::Invalid,
        };
    }
}

/// The result of asking a game to split itself into independent pieces.
pub enum SplitResult {
    /// No split happened; the game stays as it is.
    Keep,
    /// The game dissolved entirely and is replaced by nothing.
    Dissolve,
    /// The game is replaced by the listed pieces.
    Replace(Vec<Box<dyn Game>>),
}

impl fmt::Debug for SplitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitResult::Keep => write!(f, "Keep"),
            SplitResult::Dissolve => write!(f, "Dissolve"),
            SplitResult::Replace(pieces) => {
                write!(f, "Replace(<{} pieces>)", pieces.len())
            }
        }
    }
}

/// A sub-game of a combinatorial sum.
pub trait Game: fmt::Display {
    /// Access to the shared bookkeeping.
    fn core(&self) -> &GameCore;
    fn core_mut(&mut self) -> &mut GameCore;

    /// The dense run-time type id of this game.
    fn game_type(&self) -> GameTypeId;

    /// For the `order` hook; games downcast their comparand through this.
    fn as_any(&self) -> &dyn Any;

    /// Plays a legal move for `to_play`. Implementations call
    /// `core_mut().record_play` first, then mutate the board, applying the
    /// incremental hash delta when `hash_updatable()`.
    fn play(&mut self, m: Move, to_play: Player);

    /// Reverses the most recent play. The top of the undo-code stack must
    /// be a play.
    fn undo_move(&mut self);

    /// A fresh move cursor for `to_play`. Generators snapshot the board, so
    /// they stay valid while the search plays and undoes moves.
    fn create_move_generator(&self, to_play: Player) -> Box<dyn MoveGenerator>;

    /// The negation of this game: colours swapped, geometry adjusted where
    /// the rules demand it.
    fn inverse(&self) -> Box<dyn Game>;

    /// Rebuilds the local hash from scratch. The game type has already been
    /// mixed in by `get_local_hash`; grid-hash games overwrite the
    /// accumulator with their canonical value instead.
    fn init_hash(&mut self, hash: &mut LocalHash);

    /// Short human text for a move of this game.
    fn print_move(&self, m: Move) -> String;

    /// Splitting into independent pieces; default: nothing to split.
    fn split(&self) -> SplitResult {
        SplitResult::Keep
    }

    /// Rewrites the game into an equivalent canonical form, pushing a
    /// normalize undo code. The default changes nothing.
    fn normalize(&mut self) {
        let core = self.core_mut();
        core.record_normalize();
        if core.hash_updatable() {
            core.mark_hash_updated();
        }
    }

    /// Exactly restores the state before the matching `normalize`.
    fn undo_normalize(&mut self) {
        let core = self.core_mut();
        core.record_undo_normalize();
        if core.hash_updatable() {
            core.mark_hash_updated();
        }
    }

    /// Three-way ordering against a game of the same type, for stable
    /// sorting inside a sum. `None` means unknown and sorts as equal.
    fn order_impl(&self, _rhs: &dyn Game) -> Option<Ordering> {
        None
    }

    /// The current local hash, rebuilding it if it is not up to date.
    fn get_local_hash(&mut self) -> Hash {
        if self.core().hash_state() == HashState::UpToDate {
            return self.core().hash_value();
        }

        let mut hash = LocalHash::new();
        hash.toggle_type(self.game_type());
        self.init_hash(&mut hash);

        self.core_mut().set_hash(hash);
        self.core().hash_value()
    }

    /// Three-way ordering across game types: by type id first, then by the
    /// game's own `order_impl`.
    fn order(&self, rhs: &dyn Game) -> Ordering {
        let type1 = self.game_type();
        let type2 = rhs.game_type();

        if type1 != type2 {
            return type1.cmp(&type2);
        }

        self.order_impl(rhs).unwrap_or(Ordering::Equal)
    }

    /// Whether either player has a legal move.
    fn has_moves(&self) -> bool {
        Player::both()
            .into_iter()
            .any(|p| self.create_move_generator(p).is_valid())
    }
}

/// A forward-only cursor over one game's legal moves for one player.
///
/// Moves are never emitted twice; the order is unspecified but stable
/// within one generator instance. Cancellation is dropping the generator.
pub trait MoveGenerator {
    /// Whether the cursor currently rests on a move.
    fn is_valid(&self) -> bool;

    /// Steps to the next move, if any.
    fn advance(&mut self);

    /// The current move, without colour. Only legal while `is_valid()`.
    fn gen_move(&self) -> Move;
}

/// Drains a generator into a vector; test and debugging helper.
pub fn generate_all(mut generator: Box<dyn MoveGenerator>) -> Vec<Move> {
    let mut result = vec![];
    while generator.is_valid() {
        result.push(generator.gen_move());
        generator.advance();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_state_machine() {
        let mut core = GameCore::new();
        assert_eq!(core.hash_state(), HashState::Invalid);

        core.set_hash(LocalHash::new());
        assert_eq!(core.hash_state(), HashState::UpToDate);

        core.record_play(7, Player::Black);
        assert_eq!(core.hash_state(), HashState::NeedsUpdate);
        assert!(core.hash_updatable());

        core.mark_hash_updated();
        assert_eq!(core.hash_state(), HashState::UpToDate);

        // A second mutation without an incremental update degrades to
        // invalid on the next one.
        core.record_play(9, Player::White);
        core.record_normalize();
        assert_eq!(core.hash_state(), HashState::Invalid);
    }

    #[test]
    fn stacks_stay_parallel() {
        let mut core = GameCore::new();
        core.record_play(3, Player::Black);
        core.record_normalize();
        assert_eq!(core.num_moves_played(), 1);

        core.record_undo_normalize();
        let mc = core.record_undo_play();
        assert_eq!(moves::remove_color(mc), 3);
        assert_eq!(moves::get_color(mc), Player::Black);
        assert_eq!(core.num_moves_played(), 0);
    }

    #[test]
    #[should_panic]
    fn mismatched_undo_code_is_fatal() {
        let mut core = GameCore::new();
        core.record_play(1, Player::Black);
        core.record_undo_normalize();
    }
}
