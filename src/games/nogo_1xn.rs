//! NoGo on a 1-dimensional strip.
//!
//! A placement is legal iff afterwards every maximal block of stones still
//! touches an empty cell. The last player able to place wins.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use crate::cgt::prelude::*;

pub struct Nogo1xn {
    core: GameCore,
    board: StripBoard,
    normalize_did_change: Vec<bool>,
    normalize_boards: Vec<StripBoard>,
}

/// Collapses runs of equal-coloured stones to a single stone. Empty cells
/// are kept as they are.
fn block_simplify(board: &StripBoard) -> StripBoard {
    let mut tiles: Vec<Tile> = vec![];
    let mut prev = Tile::Empty;

    for &tile in board.tiles() {
        if tile == Tile::Empty || tile != prev {
            tiles.push(tile);
        }
        prev = tile;
    }

    StripBoard::from_tiles(tiles)
}

/// Whether placing `player` at the empty cell `p` leaves every block with a
/// liberty.
fn placement_is_legal(board: &StripBoard, p: i32, player: Player) -> bool {
    if !board.checked_is(p, Tile::Empty) {
        return false;
    }

    let num = board.len();
    let at = |i: i32| -> Tile {
        if i == p { player.into() } else { board.at(i) }
    };

    let mut previous = at(0);
    let mut has_liberty = previous == Tile::Empty;

    for i in 1..num {
        let current = at(i);

        if current == Tile::Empty {
            has_liberty = true;
        } else if current != previous && previous != Tile::Empty {
            // A block just ended against another block.
            if !has_liberty {
                return false;
            }
            has_liberty = false;
        }

        previous = current;
    }

    // The final block may not be landlocked either.
    has_liberty
}

impl Nogo1xn {
    pub fn new(board: StripBoard) -> Result<Nogo1xn> {
        ensure!(
            board.tiles().iter().all(|t| *t != Tile::Border),
            "nogo_1xn boards hold stones and empties only"
        );
        Ok(Nogo1xn::with_board(board))
    }

    pub fn from_text(s: &str) -> Result<Nogo1xn> {
        Nogo1xn::new(StripBoard::parse(s)?)
    }

    fn with_board(board: StripBoard) -> Nogo1xn {
        Nogo1xn {
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

impl fmt::Display for Nogo1xn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nogo_1xn:{}", self.board)
    }
}

impl Game for Nogo1xn {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn game_type(&self) -> GameTypeId {
        type_table::game_type::<Nogo1xn>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn play(&mut self, m: Move, to_play: Player) {
        self.core.record_play(m, to_play);

        let to = moves::move1::value(m);
        assert!(self.board.checked_is(to, Tile::Empty));

        if self.core.hash_updatable() {
            let hash = self.core.hash_mut();
            hash.toggle(to as usize, Tile::Empty as i32);
            hash.toggle(to as usize, to_play as i32);
            self.core.mark_hash_updated();
        }

        self.board.replace(to, to_play.into());
    }

    fn undo_move(&mut self) {
        let mc = self.core.record_undo_play();

        let to = moves::move1::value(moves::remove_color(mc));
        let player = moves::get_color(mc);
        assert!(self.board.checked_is(to, player.into()));

        if self.core.hash_updatable() {
            let hash = self.core.hash_mut();
            hash.toggle(to as usize, player as i32);
            hash.toggle(to as usize, Tile::Empty as i32);
            self.core.mark_hash_updated();
        }

        self.board.replace(to, Tile::Empty);
    }

    fn create_move_generator(&self, to_play: Player) -> Box<dyn MoveGenerator> {
        Box::new(Nogo1xnMoveGenerator::new(self.board.clone(), to_play))
    }

    fn inverse(&self) -> Box<dyn Game> {
        Box::new(Nogo1xn::with_board(self.board.inverse()))
    }

    fn init_hash(&mut self, hash: &mut LocalHash) {
        self.board.init_local_hash(hash);
    }

    fn print_move(&self, m: Move) -> String {
        let to = moves::move1::value(m);
        format!("{}", to + 1)
    }

    /// Splits at XO boundaries, and at empty cells neither player may ever
    /// fill; such a cell acts as a wall between otherwise independent
    /// pieces.
    fn split(&self) -> SplitResult {
        if self.board.is_empty() {
            return SplitResult::Keep;
        }

        let simplified = block_simplify(&self.board);
        let num = simplified.len();

        let mut segments: Vec<(usize, usize)> = vec![];
        let mut segment_start = 0usize;

        for i in 0..num {
            let tile = simplified.at(i);

            if tile == Tile::Empty {
                let dead = !placement_is_legal(&simplified, i, Player::Black)
                    && !placement_is_legal(&simplified, i, Player::White);
                if dead {
                    segments.push((segment_start, i as usize));
                    segment_start = i as usize + 1;
                }
                continue;
            }

            let prev = if i > 0 { simplified.at(i - 1) } else { Tile::Empty };
            if let Some(owner) = tile.stone_owner()
                && prev == Tile::from(owner.opponent())
                && i as usize > segment_start
            {
                segments.push((segment_start, i as usize));
                segment_start = i as usize;
            }
        }
        segments.push((segment_start, num as usize));

        let segments: Vec<(usize, usize)> =
            segments.into_iter().filter(|(s, e)| e > s).collect();

        if segments.len() < 2 {
            return SplitResult::Keep;
        }

        let pieces = segments
            .into_iter()
            .map(|(start, end)| {
                Box::new(Nogo1xn::with_board(simplified.sub_board(start..end))) as Box<dyn Game>
            })
            .collect();

        SplitResult::Replace(pieces)
    }

    fn normalize(&mut self) {
        self.core.record_normalize();

        let mut simplified = block_simplify(&self.board);
        let size_changed = simplified.len() != self.board.len();
        let do_mirror = simplified.should_mirror();

        if !size_changed && !do_mirror {
            if self.core.hash_updatable() {
                self.core.mark_hash_updated();
            }
            self.normalize_did_change.push(false);
            return;
        }

        if do_mirror {
            simplified = simplified.reversed();
        }

        self.normalize_did_change.push(true);
        self.normalize_boards.push(self.board.clone());
        self.board = simplified;
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
        let other = rhs.as_any().downcast_ref::<Nogo1xn>()?;
        Some(self.board.compare(&other.board))
    }
}

struct Nogo1xnMoveGenerator {
    board: StripBoard,
    to_play: Player,
    current: i32,
}

impl Nogo1xnMoveGenerator {
    fn new(board: StripBoard, to_play: Player) -> Nogo1xnMoveGenerator {
        let mut generator = Nogo1xnMoveGenerator {
            board,
            to_play,
            current: 0,
        };

        if generator.board.len() > 0
            && !placement_is_legal(&generator.board, generator.current, to_play)
        {
            generator.advance();
        }
        generator
    }
}

impl MoveGenerator for Nogo1xnMoveGenerator {
    fn is_valid(&self) -> bool {
        self.current < self.board.len()
    }

    fn advance(&mut self) {
        self.current += 1;
        while self.current < self.board.len()
            && !placement_is_legal(&self.board, self.current, self.to_play)
        {
            self.current += 1;
        }
    }

    fn gen_move(&self) -> Move {
        assert!(self.is_valid());
        moves::move1::create(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgt::game::generate_all;

    fn points(g: &Nogo1xn, player: Player) -> Vec<i32> {
        generate_all(g.create_move_generator(player))
            .into_iter()
            .map(moves::move1::value)
            .collect()
    }

    #[test]
    fn empty_board_has_no_moves() {
        let g = Nogo1xn::from_text("").unwrap();
        assert!(points(&g, Player::Black).is_empty());
        assert!(points(&g, Player::White).is_empty());
    }

    #[test]
    fn suicidal_placements_are_illegal() {
        // The middle of "X.O" locks whichever block it joins.
        let g = Nogo1xn::from_text("X.O").unwrap();
        assert!(points(&g, Player::Black).is_empty());
        assert!(points(&g, Player::White).is_empty());

        // With room to breathe the middle is playable, but a placement
        // next to an enemy stone on the wall is not.
        let g = Nogo1xn::from_text(".X.O.").unwrap();
        assert_eq!(points(&g, Player::Black), vec![0, 2]);
        assert_eq!(points(&g, Player::White), vec![2, 4]);
    }

    #[test]
    fn play_and_undo_restore_everything() {
        let mut g = Nogo1xn::from_text("..X.").unwrap();
        let hash_before = (&mut g as &mut dyn Game).get_local_hash();

        g.play(moves::move1::create(0), Player::White);
        assert_eq!(g.board().to_string(), "O.X.");

        g.undo_move();
        assert_eq!(g.board().to_string(), "..X.");
        assert_eq!((&mut g as &mut dyn Game).get_local_hash(), hash_before);
    }

    #[test]
    fn split_on_dead_empty_cell() {
        let g = Nogo1xn::from_text("X.O").unwrap();
        match g.split() {
            SplitResult::Replace(pieces) => {
                let texts: Vec<_> = pieces.iter().map(|p| p.to_string()).collect();
                assert_eq!(texts, vec!["nogo_1xn:X", "nogo_1xn:O"]);
            }
            _ => panic!("expected a split"),
        }
    }

    #[test]
    fn split_on_xo_boundary() {
        // The flanking empties are dead as well, so only the stones remain.
        let g = Nogo1xn::from_text(".XO.").unwrap();
        match g.split() {
            SplitResult::Replace(pieces) => {
                let texts: Vec<_> = pieces.iter().map(|p| p.to_string()).collect();
                assert_eq!(texts, vec!["nogo_1xn:X", "nogo_1xn:O"]);
            }
            _ => panic!("expected a split"),
        }
    }

    #[test]
    fn no_split_without_boundary() {
        let g = Nogo1xn::from_text(".X.O.").unwrap();
        assert!(matches!(g.split(), SplitResult::Keep));
    }

    #[test]
    fn normalize_simplifies_blocks_and_mirrors() {
        let mut g = Nogo1xn::from_text(".OOX").unwrap();
        let hash_before = (&mut g as &mut dyn Game).get_local_hash();

        g.normalize();
        assert_eq!(g.board().to_string(), "XO.");

        g.undo_normalize();
        assert_eq!(g.board().to_string(), ".OOX");
        assert_eq!((&mut g as &mut dyn Game).get_local_hash(), hash_before);
    }
}
