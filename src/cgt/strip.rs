//! One-dimensional boards shared by the strip games.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use itertools::Itertools;

use super::basics::{Player, Tile};
use super::hashing::LocalHash;
use crate::utils::prelude::*;

/// A strip of tiles. Which tile values are legal is up to the owning game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StripBoard {
    board: Vec<Tile>,
}

impl StripBoard {
    /// Parses a sequence of board characters. The empty string is a legal,
    /// dead board.
    pub fn parse(s: &str) -> Result<StripBoard> {
        let board = s.chars().map(Tile::from_char).try_collect()?;
        Ok(StripBoard { board })
    }

    pub fn from_tiles(board: Vec<Tile>) -> StripBoard {
        StripBoard { board }
    }

    pub fn len(&self) -> i32 {
        self.board.len() as i32
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_empty()
    }

    pub fn at(&self, p: i32) -> Tile {
        assert!(0 <= p && p < self.len(), "point {p} off board");
        self.board[p as usize]
    }

    /// Whether `p` is on the board and holds the given tile.
    pub fn checked_is(&self, p: i32, tile: Tile) -> bool {
        0 <= p && p < self.len() && self.board[p as usize] == tile
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.board
    }

    /// Places a stone on an empty cell.
    pub fn play_stone(&mut self, p: i32, player: Player) {
        assert_eq!(self.at(p), Tile::Empty, "cell {p} is occupied");
        self.board[p as usize] = player.into();
    }

    /// Removes a stone, leaving the cell empty.
    pub fn remove_stone(&mut self, p: i32) {
        assert!(self.at(p).is_stone(), "cell {p} holds no stone");
        self.board[p as usize] = Tile::Empty;
    }

    /// Replaces whatever is at `p`. Less checking than play/remove.
    pub fn replace(&mut self, p: i32, tile: Tile) {
        assert!(0 <= p && p < self.len(), "point {p} off board");
        self.board[p as usize] = tile;
    }

    /// A copy of the sub-board covering `range`.
    pub fn sub_board(&self, range: Range<usize>) -> StripBoard {
        StripBoard {
            board: self.board[range].to_vec(),
        }
    }

    /// The board with stone colours swapped.
    pub fn inverse(&self) -> StripBoard {
        StripBoard {
            board: self.board.iter().map(|t| t.inverse()).collect(),
        }
    }

    /// The board reversed end to end.
    pub fn reversed(&self) -> StripBoard {
        StripBoard {
            board: self.board.iter().rev().copied().collect(),
        }
    }

    /// The colour-swapped and mirrored board. Games whose move directions
    /// are colour-asymmetric (elephants) negate with this.
    pub fn inverse_mirror(&self) -> StripBoard {
        self.inverse().reversed()
    }

    /// Whether the mirrored board is the canonically smaller of the two.
    pub fn should_mirror(&self) -> bool {
        let n = self.board.len();
        for i in 0..n / 2 {
            let fwd = self.board[i];
            let rev = self.board[n - 1 - i];
            match rev.cmp(&fwd) {
                Ordering::Less => return true,
                Ordering::Greater => return false,
                Ordering::Equal => {}
            }
        }
        false
    }

    /// Length-major, then cell-wise ordering, for stable sorting of games.
    pub fn compare(&self, other: &StripBoard) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.board.cmp(&other.board))
    }

    /// The default local-hash initialization for strips: one toggle per
    /// board position.
    pub fn init_local_hash(&self, hash: &mut LocalHash) {
        for (i, tile) in self.board.iter().enumerate() {
            hash.toggle(i, *tile as i32);
        }
    }
}

impl fmt::Display for StripBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tile in &self.board {
            write!(f, "{}", tile.to_char())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_print_round_trip() {
        for s in ["", "XO.X", ".", "X#O"] {
            let b = StripBoard::parse(s).unwrap();
            assert_eq!(b.to_string(), s);
        }
        assert!(StripBoard::parse("X|O").is_err());
    }

    #[test]
    fn checked_is_handles_bounds() {
        let b = StripBoard::parse("XO").unwrap();
        assert!(b.checked_is(0, Tile::Black));
        assert!(!b.checked_is(-1, Tile::Black));
        assert!(!b.checked_is(2, Tile::Black));
    }

    #[test]
    fn should_mirror_picks_the_smaller_reading() {
        // Black orders before White, so "OX" canonically reads "XO".
        assert!(StripBoard::parse("OX").unwrap().should_mirror());
        assert!(!StripBoard::parse("XO").unwrap().should_mirror());
        assert!(!StripBoard::parse("X.X").unwrap().should_mirror());
    }

    #[test]
    fn inverse_mirror_composes() {
        let b = StripBoard::parse("XO.").unwrap();
        assert_eq!(b.inverse_mirror().to_string(), ".XO");
    }
}
