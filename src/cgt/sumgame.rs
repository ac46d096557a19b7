//! The sum-game: an ordered collection of sub-games played under
//! alternating turns, with a permutation-invariant global hash.

use std::fmt;

use super::basics::Player;
use super::game::{Game, SplitResult};
use super::hashing::{Hash, HashKind, rand_key};
use super::moves::Move;

/// A move at the sum level: one move in one sub-game.
#[derive(Clone, Copy, Debug)]
pub struct SumMove {
    pub index: usize,
    pub mov: Move,
}

enum SumUndo {
    Play {
        index: usize,
    },
    /// Playing in `original` dissolved it into `n_pieces` games now at the
    /// end of the list. The original is retained here, move still applied.
    Split {
        index: usize,
        original: Box<dyn Game>,
        n_pieces: usize,
    },
    Normalize {
        count: usize,
    },
}

fn colour_key(player: Player) -> Hash {
    rand_key(HashKind::ToPlay, 0, player as i64)
}

fn index_key(index: usize) -> Hash {
    rand_key(HashKind::SumIndex, index, 0)
}

/// An ordered sum of owned sub-games.
///
/// The global hash is the XOR of the colour-to-move key, every sub-game's
/// local hash, and one key per occupied index. Local hashes do not pair
/// with their index, so any permutation of the sub-games hashes equal,
/// while sums that differ only in their number of degenerate games do not.
pub struct SumGame {
    games: Vec<Box<dyn Game>>,
    undo_stack: Vec<SumUndo>,
    to_play: Player,
    global_hash: Hash,
}

impl SumGame {
    pub fn new(to_play: Player) -> SumGame {
        SumGame {
            games: vec![],
            undo_stack: vec![],
            to_play,
            global_hash: colour_key(to_play),
        }
    }

    /// Transfers ownership of a sub-game into the sum. Only legal while no
    /// move history is pending.
    pub fn add(&mut self, game: Box<dyn Game>) {
        assert!(
            self.undo_stack.is_empty(),
            "cannot add games while moves are pending"
        );
        self.push_game(game);
    }

    /// Transfers the most recently added sub-game back to the caller.
    pub fn pop(&mut self) -> Box<dyn Game> {
        assert!(
            self.undo_stack.is_empty(),
            "cannot pop games while moves are pending"
        );
        self.pop_game()
    }

    /// The number of sub-games, degenerate zero-move games included.
    pub fn num_total_games(&self) -> usize {
        self.games.len()
    }

    pub fn game(&self, index: usize) -> &dyn Game {
        &*self.games[index]
    }

    pub fn game_mut(&mut self, index: usize) -> &mut dyn Game {
        &mut *self.games[index]
    }

    pub fn to_play(&self) -> Player {
        self.to_play
    }

    /// Sets the colour to move, updating the global hash.
    pub fn set_to_play(&mut self, player: Player) {
        self.global_hash ^= colour_key(self.to_play) ^ colour_key(player);
        self.to_play = player;
    }

    pub fn global_hash(&self) -> Hash {
        self.global_hash
    }

    pub fn num_moves_played(&self) -> usize {
        self.undo_stack.len()
    }

    /// Plays a move in one sub-game for the current player, then lets the
    /// sub-game split. If it does, the sub-game is replaced by its pieces
    /// and retained inside the undo record. Flips the player to move.
    pub fn play(&mut self, sum_move: SumMove) {
        let SumMove { index, mov } = sum_move;
        assert!(index < self.games.len(), "sub-game index out of range");

        let to_play = self.to_play;
        let game = &mut *self.games[index];
        let hash_before = game.get_local_hash();
        game.play(mov, to_play);
        let hash_after = game.get_local_hash();
        self.global_hash ^= hash_before ^ hash_after;

        match self.games[index].split() {
            SplitResult::Keep => {
                self.undo_stack.push(SumUndo::Play { index });
            }
            split => {
                let pieces = match split {
                    SplitResult::Replace(pieces) => pieces,
                    _ => vec![],
                };
                let original = self.games.remove(index);
                self.global_hash ^= index_key(self.games.len()) ^ hash_after;

                let n_pieces = pieces.len();
                for piece in pieces {
                    self.push_game(piece);
                }

                self.undo_stack.push(SumUndo::Split {
                    index,
                    original,
                    n_pieces,
                });
            }
        }

        self.set_to_play(to_play.opponent());
    }

    /// Reverses the most recent sum-level step, including the global hash.
    pub fn undo(&mut self) {
        let record = self.undo_stack.pop().expect("sum-game undo underflow");

        match record {
            SumUndo::Play { index } => {
                self.set_to_play(self.to_play.opponent());

                let game = &mut *self.games[index];
                let hash_before = game.get_local_hash();
                game.undo_move();
                let hash_after = game.get_local_hash();
                self.global_hash ^= hash_before ^ hash_after;
            }
            SumUndo::Split {
                index,
                mut original,
                n_pieces,
            } => {
                self.set_to_play(self.to_play.opponent());

                for _ in 0..n_pieces {
                    self.pop_game();
                }

                original.undo_move();
                let hash_restored = original.get_local_hash();
                self.global_hash ^= index_key(self.games.len()) ^ hash_restored;
                self.games.insert(index, original);
            }
            SumUndo::Normalize { count } => {
                assert_eq!(count, self.games.len());
                for index in (0..count).rev() {
                    let game = &mut *self.games[index];
                    let hash_before = game.get_local_hash();
                    game.undo_normalize();
                    let hash_after = game.get_local_hash();
                    self.global_hash ^= hash_before ^ hash_after;
                }
            }
        }
    }

    /// Normalizes every sub-game in place, recording one undoable step.
    pub fn normalize_all(&mut self) {
        let count = self.games.len();
        for index in 0..count {
            let game = &mut *self.games[index];
            let hash_before = game.get_local_hash();
            game.normalize();
            let hash_after = game.get_local_hash();
            self.global_hash ^= hash_before ^ hash_after;
        }
        self.undo_stack.push(SumUndo::Normalize { count });
    }

    /// Stable sort by the inter-game `order` contract. Only legal while no
    /// move history is pending; the global hash is unaffected.
    pub fn sort_games(&mut self) {
        assert!(
            self.undo_stack.is_empty(),
            "cannot sort games while moves are pending"
        );
        self.games.sort_by(|a, b| a.order(b.as_ref()));
    }

    fn push_game(&mut self, mut game: Box<dyn Game>) {
        let local = game.get_local_hash();
        self.global_hash ^= index_key(self.games.len()) ^ local;
        self.games.push(game);
    }

    fn pop_game(&mut self) -> Box<dyn Game> {
        let mut game = self.games.pop().expect("no sub-games to pop");
        self.global_hash ^= index_key(self.games.len()) ^ game.get_local_hash();
        game
    }
}

impl fmt::Display for SumGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to play:", self.to_play.notate())?;
        for game in &self.games {
            write!(f, " [{game}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::cgt::game::{GameCore, MoveGenerator};
    use crate::cgt::hashing::LocalHash;
    use crate::cgt::moves;
    use crate::cgt::type_table::{self, GameTypeId};
    use crate::games::parse_game;

    fn sum_of(to_play: Player, specs: &[&str]) -> SumGame {
        let mut sum = SumGame::new(to_play);
        for spec in specs {
            sum.add(parse_game(spec).unwrap());
        }
        sum
    }

    #[test]
    fn global_hash_is_permutation_invariant() {
        let a = sum_of(
            Player::Black,
            &["clobber_1xn:XO", "nogo_1xn:.X.", "elephants:X.O"],
        );
        let b = sum_of(
            Player::Black,
            &["elephants:X.O", "clobber_1xn:XO", "nogo_1xn:.X."],
        );
        assert_eq!(a.global_hash(), b.global_hash());

        let c = sum_of(
            Player::White,
            &["clobber_1xn:XO", "nogo_1xn:.X.", "elephants:X.O"],
        );
        assert_ne!(a.global_hash(), c.global_hash());
    }

    #[test]
    fn repeated_degenerate_games_change_the_hash() {
        let one = sum_of(Player::Black, &["clobber_1xn:"]);
        let three = sum_of(Player::Black, &["clobber_1xn:", "clobber_1xn:", "clobber_1xn:"]);
        assert_ne!(one.global_hash(), three.global_hash());
    }

    #[test]
    fn play_and_undo_restore_the_sum() {
        let mut sum = sum_of(Player::Black, &["clobber_1xn:.XOX.", "nogo_1xn:.X."]);
        let hash_before = sum.global_hash();

        sum.play(SumMove {
            index: 0,
            mov: moves::move2::create(1, 2),
        });
        assert_eq!(sum.to_play(), Player::White);
        assert_ne!(sum.global_hash(), hash_before);

        sum.undo();
        assert_eq!(sum.to_play(), Player::Black);
        assert_eq!(sum.global_hash(), hash_before);
        assert_eq!(sum.num_total_games(), 2);
        assert_eq!(sum.num_moves_played(), 0);
    }

    #[test]
    fn split_on_play_is_undone_exactly() {
        // Black playing the second cell of "X..O" leaves "XX.O", which
        // simplifies and splits into the dead pieces "X" and "O".
        let mut sum = sum_of(Player::Black, &["nogo_1xn:X..O"]);
        let hash_before = sum.global_hash();

        sum.play(SumMove {
            index: 0,
            mov: moves::move1::create(1),
        });
        assert_eq!(sum.num_total_games(), 2);
        assert_eq!(sum.game(0).to_string(), "nogo_1xn:X");
        assert_eq!(sum.game(1).to_string(), "nogo_1xn:O");

        sum.undo();
        assert_eq!(sum.num_total_games(), 1);
        assert_eq!(sum.game(0).to_string(), "nogo_1xn:X..O");
        assert_eq!(sum.global_hash(), hash_before);
        assert_eq!(sum.to_play(), Player::Black);
    }

    #[test]
    fn normalize_all_round_trips() {
        let mut sum = sum_of(Player::Black, &["nogo_1xn:.OOX", "clobber_1xn:.OX..XO."]);
        let hash_before = sum.global_hash();

        sum.normalize_all();
        assert_eq!(sum.game(0).to_string(), "nogo_1xn:XO.");
        assert_eq!(sum.game(1).to_string(), "clobber_1xn:OX.XO");

        sum.undo();
        assert_eq!(sum.game(0).to_string(), "nogo_1xn:.OOX");
        assert_eq!(sum.game(1).to_string(), "clobber_1xn:.OX..XO.");
        assert_eq!(sum.global_hash(), hash_before);
    }

    #[test]
    fn add_and_pop_transfer_ownership() {
        let mut sum = sum_of(Player::Black, &["clobber_1xn:XO", "nogo_1xn:.X."]);
        assert_eq!(sum.num_total_games(), 2);

        let game = sum.pop();
        assert_eq!(game.to_string(), "nogo_1xn:.X.");
        assert_eq!(sum.num_total_games(), 1);
    }

    #[test]
    fn sort_games_orders_by_type_then_board() {
        let mut sum = sum_of(
            Player::Black,
            &["nogo_1xn:.X.", "clobber_1xn:XO", "nogo_1xn:.O."],
        );
        let hash_before = sum.global_hash();
        sum.sort_games();
        assert_eq!(sum.global_hash(), hash_before);

        // Equal types are adjacent after the sort.
        let types: Vec<_> = (0..3).map(|i| sum.game(i).game_type()).collect();
        assert!(types[0] == types[1] || types[1] == types[2]);
    }

    /// A game whose only move dissolves it into nothing, exercising the
    /// dissolve path of the sum container.
    struct Vanishing {
        core: GameCore,
    }

    impl Vanishing {
        fn new() -> Vanishing {
            Vanishing {
                core: GameCore::new(),
            }
        }
    }

    impl std::fmt::Display for Vanishing {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "vanishing")
        }
    }

    struct VanishingMoveGenerator {
        exhausted: bool,
    }

    impl MoveGenerator for VanishingMoveGenerator {
        fn is_valid(&self) -> bool {
            !self.exhausted
        }

        fn advance(&mut self) {
            self.exhausted = true;
        }

        fn gen_move(&self) -> moves::Move {
            moves::move1::create(0)
        }
    }

    impl Game for Vanishing {
        fn core(&self) -> &GameCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut GameCore {
            &mut self.core
        }

        fn game_type(&self) -> GameTypeId {
            type_table::game_type::<Vanishing>()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn play(&mut self, m: moves::Move, to_play: Player) {
            self.core.record_play(m, to_play);
        }

        fn undo_move(&mut self) {
            let _ = self.core.record_undo_play();
        }

        fn create_move_generator(&self, _to_play: Player) -> Box<dyn MoveGenerator> {
            Box::new(VanishingMoveGenerator {
                exhausted: self.core.num_moves_played() > 0,
            })
        }

        fn inverse(&self) -> Box<dyn Game> {
            Box::new(Vanishing::new())
        }

        fn init_hash(&mut self, hash: &mut LocalHash) {
            hash.toggle(0, self.core.num_moves_played() as i32);
        }

        fn print_move(&self, _m: moves::Move) -> String {
            "vanish".into()
        }

        fn split(&self) -> SplitResult {
            if self.core.num_moves_played() > 0 {
                SplitResult::Dissolve
            } else {
                SplitResult::Keep
            }
        }
    }

    #[test]
    fn dissolving_split_is_undone_exactly() {
        let mut sum = SumGame::new(Player::Black);
        sum.add(Box::new(Vanishing::new()));
        sum.add(parse_game("clobber_1xn:XO").unwrap());
        let hash_before = sum.global_hash();

        sum.play(SumMove {
            index: 0,
            mov: moves::move1::create(0),
        });
        assert_eq!(sum.num_total_games(), 1);
        assert_eq!(sum.game(0).to_string(), "clobber_1xn:XO");

        sum.undo();
        assert_eq!(sum.num_total_games(), 2);
        assert_eq!(sum.game(0).to_string(), "vanishing");
        assert_eq!(sum.global_hash(), hash_before);
    }
}
