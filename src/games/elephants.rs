//! Elephants & Rhinos on a 1-dimensional strip.
//!
//! Black stones step one cell to the right, White stones one cell to the
//! left, and only onto an empty cell. The last player able to step wins.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use crate::cgt::prelude::*;

pub struct Elephants {
    core: GameCore,
    board: StripBoard,
    normalize_did_change: Vec<bool>,
    normalize_boards: Vec<StripBoard>,
}

fn player_dir(player: Player) -> i32 {
    match player {
        Player::Black => 1,
        Player::White => -1,
    }
}

/// A candidate sub-board as (start, length).
type SubRange = (usize, usize);

/// Cuts the board at the two blocking patterns: `XO` (both stones stuck
/// against each other) and `O…X` (stones moving apart forever).
fn subgame_ranges(board: &[Tile]) -> Vec<SubRange> {
    let mut ranges = vec![];
    let n = board.len();
    if n == 0 {
        return ranges;
    }

    let mut chunk_start = 0usize;
    let mut seen_black = false;
    let mut last_black = 0usize;
    let mut seen_white = false;
    let mut last_white = 0usize;

    for (i, &tile) in board.iter().enumerate() {
        match tile {
            Tile::Black => {
                last_black = i;
                seen_black = true;
            }
            Tile::White => {
                last_white = i;
                seen_white = true;
            }
            _ => {}
        }

        if !(seen_black && seen_white) {
            continue;
        }

        if last_black + 1 == last_white {
            // XO wall: neither of the two stones moves again. Drop both.
            ranges.push((chunk_start, last_black - chunk_start));
            chunk_start = i + 1;
            seen_black = false;
            seen_white = false;
        } else if last_white < last_black {
            // O…X: the stones diverge. The O stays with the left piece.
            ranges.push((chunk_start, last_white - chunk_start + 1));
            chunk_start = i;
            seen_white = false;
        }
    }

    if chunk_start < n && (seen_black || seen_white) {
        ranges.push((chunk_start, n - chunk_start));
    }

    ranges
}

/// Trims a range to its live part: left Whites and right Blacks are stuck,
/// empties behind the frontmost Black / in front of the rearmost White are
/// unreachable. Returns false if nothing playable remains.
fn refine_range(board: &[Tile], range: &mut SubRange) -> bool {
    if board.is_empty() || range.1 == 0 {
        return false;
    }

    let (start, length) = *range;
    let end = start + length;

    let mut prune_left = board[start..end]
        .iter()
        .take_while(|&&t| t == Tile::White)
        .count();
    let mut prune_right = board[start..end]
        .iter()
        .rev()
        .take_while(|&&t| t == Tile::Black)
        .count();

    range.0 += prune_left;
    range.1 -= prune_left + prune_right;

    let (start, length) = *range;
    let end = start + length;
    if length == 0 {
        return false;
    }

    prune_left = 0;
    for &tile in &board[start..end] {
        match tile {
            Tile::Empty => prune_left += 1,
            Tile::Black => break,
            _ => {
                prune_left = 0;
                break;
            }
        }
    }

    prune_right = 0;
    for &tile in board[start..end].iter().rev() {
        match tile {
            Tile::Empty => prune_right += 1,
            Tile::White => break,
            _ => {
                prune_right = 0;
                break;
            }
        }
    }

    if prune_left == length || prune_right == length {
        range.1 = 0;
        return false;
    }

    range.0 += prune_left;
    range.1 -= prune_left + prune_right;

    let (start, length) = *range;
    let end = start + length;

    let has_stone = board[start..end].iter().any(|t| t.is_stone());
    let has_empty = board[start..end].iter().any(|&t| t == Tile::Empty);
    if has_stone && has_empty {
        return true;
    }

    range.1 = 0;
    false
}

fn live_ranges(board: &[Tile]) -> Vec<SubRange> {
    subgame_ranges(board)
        .into_iter()
        .filter_map(|mut range| refine_range(board, &mut range).then_some(range))
        .collect()
}

impl Elephants {
    pub fn new(board: StripBoard) -> Result<Elephants> {
        ensure!(
            board.tiles().iter().all(|t| *t != Tile::Border),
            "elephants boards hold stones and empties only"
        );
        Ok(Elephants::with_board(board))
    }

    pub fn from_text(s: &str) -> Result<Elephants> {
        Elephants::new(StripBoard::parse(s)?)
    }

    fn with_board(board: StripBoard) -> Elephants {
        Elephants {
            core: GameCore::new(),
            board,
            normalize_did_change: vec![],
            normalize_boards: vec![],
        }
    }

    pub fn board(&self) -> &StripBoard {
        &self.board
    }
}

impl fmt::Display for Elephants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "elephants:{}", self.board)
    }
}

impl Game for Elephants {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn game_type(&self) -> GameTypeId {
        type_table::game_type::<Elephants>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn play(&mut self, m: Move, to_play: Player) {
        self.core.record_play(m, to_play);

        let (from, to) = moves::move2::unpack(m);
        assert!(self.board.checked_is(from, to_play.into()));
        assert!(self.board.checked_is(to, Tile::Empty));
        assert_eq!(to - from, player_dir(to_play), "step goes the wrong way");

        if self.core.hash_updatable() {
            let hash = self.core.hash_mut();
            hash.toggle(from as usize, to_play as i32);
            hash.toggle(to as usize, Tile::Empty as i32);

            hash.toggle(from as usize, Tile::Empty as i32);
            hash.toggle(to as usize, to_play as i32);
            self.core.mark_hash_updated();
        }

        self.board.play_stone(to, to_play);
        self.board.remove_stone(from);
    }

    fn undo_move(&mut self) {
        let mc = self.core.record_undo_play();

        let m = moves::remove_color(mc);
        let (from, to) = moves::move2::unpack(m);
        let player = moves::get_color(mc);

        assert!(self.board.checked_is(from, Tile::Empty));
        assert!(self.board.checked_is(to, player.into()));

        if self.core.hash_updatable() {
            let hash = self.core.hash_mut();
            hash.toggle(from as usize, Tile::Empty as i32);
            hash.toggle(to as usize, player as i32);

            hash.toggle(from as usize, player as i32);
            hash.toggle(to as usize, Tile::Empty as i32);
            self.core.mark_hash_updated();
        }

        self.board.play_stone(from, player);
        self.board.remove_stone(to);
    }

    fn create_move_generator(&self, to_play: Player) -> Box<dyn MoveGenerator> {
        Box::new(ElephantsMoveGenerator::new(self.board.clone(), to_play))
    }

    fn inverse(&self) -> Box<dyn Game> {
        Box::new(Elephants::with_board(self.board.inverse_mirror()))
    }

    fn init_hash(&mut self, hash: &mut LocalHash) {
        self.board.init_local_hash(hash);
    }

    fn print_move(&self, m: Move) -> String {
        let (from, to) = moves::move2::unpack(m);
        format!("{}-{}", from + 1, to + 1)
    }

    fn split(&self) -> SplitResult {
        if self.board.is_empty() {
            return SplitResult::Keep;
        }

        let ranges = live_ranges(self.board.tiles());
        if ranges.len() < 2 {
            return SplitResult::Keep;
        }

        let pieces = ranges
            .into_iter()
            .map(|(start, length)| {
                Box::new(Elephants::with_board(self.board.sub_board(start..start + length)))
                    as Box<dyn Game>
            })
            .collect();

        SplitResult::Replace(pieces)
    }

    fn normalize(&mut self) {
        self.core.record_normalize();

        let board = self.board.tiles();
        let board_len = board.len();
        let ranges = live_ranges(board);

        if ranges.len() == 1 && ranges[0] == (0, board_len) {
            if self.core.hash_updatable() {
                self.core.mark_hash_updated();
            }
            self.normalize_did_change.push(false);
            return;
        }

        self.normalize_did_change.push(true);
        self.normalize_boards.push(self.board.clone());

        let mut tiles: Vec<Tile> = vec![];
        for (i, &(start, length)) in ranges.iter().enumerate() {
            tiles.extend_from_slice(&board[start..start + length]);

            if i + 1 < ranges.len() {
                // Stitch with an XO wall unless the boundary already
                // blocks in both directions.
                let left = board[start + length - 1];
                let right = board[ranges[i + 1].0];

                let have_black = left == Tile::Black || right == Tile::Black;
                let have_white = left == Tile::White || right == Tile::White;
                if !(have_black && have_white) {
                    tiles.push(Tile::Black);
                    tiles.push(Tile::White);
                }
            }
        }

        self.board = StripBoard::from_tiles(tiles);
        self.core.invalidate_hash();
    }

    fn undo_normalize(&mut self) {
        self.core.record_undo_normalize();

        let did_change = self
            .normalize_did_change
            .pop()
            .expect("normalize stack underflow");

        if !did_change {
            if self.core.hash_updatable() {
                self.core.mark_hash_updated();
            }
            return;
        }

        self.board = self
            .normalize_boards
            .pop()
            .expect("normalize stack underflow");
        self.core.invalidate_hash();
    }

    fn order_impl(&self, rhs: &dyn Game) -> Option<Ordering> {
        let other = rhs.as_any().downcast_ref::<Elephants>()?;
        Some(self.board.compare(&other.board))
    }
}

struct ElephantsMoveGenerator {
    board: StripBoard,
    to_play: Player,
    idx: i32,
    dir: i32,
}

impl ElephantsMoveGenerator {
    fn new(board: StripBoard, to_play: Player) -> ElephantsMoveGenerator {
        let idx = match to_play {
            Player::Black => 0,
            Player::White => board.len() - 1,
        };

        let mut generator = ElephantsMoveGenerator {
            board,
            to_play,
            idx,
            dir: player_dir(to_play),
        };

        if generator.board.len() > 0 && !generator.is_move(generator.idx) {
            generator.advance();
        }
        generator
    }

    fn is_move(&self, idx: i32) -> bool {
        self.board.checked_is(idx, self.to_play.into())
            && self.board.checked_is(idx + self.dir, Tile::Empty)
    }
}

impl MoveGenerator for ElephantsMoveGenerator {
    fn is_valid(&self) -> bool {
        0 <= self.idx && self.idx < self.board.len()
    }

    fn advance(&mut self) {
        self.idx += self.dir;
        while 0 <= self.idx && self.idx < self.board.len() && !self.is_move(self.idx) {
            self.idx += self.dir;
        }
    }

    fn gen_move(&self) -> Move {
        assert!(self.is_valid());
        moves::move2::create(self.idx, self.idx + self.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgt::game::generate_all;

    fn steps(g: &Elephants, player: Player) -> Vec<(i32, i32)> {
        generate_all(g.create_move_generator(player))
            .into_iter()
            .map(moves::move2::unpack)
            .collect()
    }

    #[test]
    fn stones_step_into_empty_cells_only() {
        let g = Elephants::from_text("X.O").unwrap();
        assert_eq!(steps(&g, Player::Black), vec![(0, 1)]);
        assert_eq!(steps(&g, Player::White), vec![(2, 1)]);

        // A blocked pair has no moves at all.
        let g = Elephants::from_text("XO").unwrap();
        assert!(steps(&g, Player::Black).is_empty());
        assert!(steps(&g, Player::White).is_empty());
    }

    #[test]
    fn play_and_undo_restore_everything() {
        let mut g = Elephants::from_text("X.O.").unwrap();
        let hash_before = (&mut g as &mut dyn Game).get_local_hash();

        g.play(moves::move2::create(0, 1), Player::Black);
        assert_eq!(g.board().to_string(), ".XO.");

        g.undo_move();
        assert_eq!(g.board().to_string(), "X.O.");
        assert_eq!((&mut g as &mut dyn Game).get_local_hash(), hash_before);
    }

    #[test]
    fn split_at_diverging_stones() {
        // O moving left and X moving right never interact again.
        let g = Elephants::from_text(".O..X.").unwrap();
        match g.split() {
            SplitResult::Replace(pieces) => {
                let texts: Vec<_> = pieces.iter().map(|p| p.to_string()).collect();
                assert_eq!(texts, vec!["elephants:.O", "elephants:X."]);
            }
            _ => panic!("expected a split"),
        }
    }

    #[test]
    fn split_keeps_interacting_stones() {
        let g = Elephants::from_text("X..O").unwrap();
        assert!(matches!(g.split(), SplitResult::Keep));
    }

    #[test]
    fn normalize_prunes_dead_material() {
        // The leading O and trailing X are stuck against the walls.
        let mut g = Elephants::from_text("OX..O.X").unwrap();
        g.normalize();
        assert_eq!(g.board().to_string(), "X..O");

        g.undo_normalize();
        assert_eq!(g.board().to_string(), "OX..O.X");
    }

    #[test]
    fn inverse_mirrors_the_board() {
        let g = Elephants::from_text("X..O.").unwrap();
        assert_eq!(g.inverse().to_string(), "elephants:.X..O");
    }
}
