//! Clobber on a 1-dimensional strip.
//!
//! A stone moves onto an orthogonally adjacent enemy stone and captures
//! it. The last player able to move wins.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use crate::cgt::prelude::*;

pub struct Clobber1xn {
    core: GameCore,
    board: StripBoard,
    normalize_did_change: Vec<bool>,
    normalize_boards: Vec<StripBoard>,
}

/// Maximal runs of stones containing both colours; single-colour runs are
/// dead and carry no moves.
fn live_chunks(board: &StripBoard) -> Vec<Range<usize>> {
    let mut chunks = vec![];

    let mut in_chunk = false;
    let mut chunk_start = 0usize;
    let mut found_black = false;
    let mut found_white = false;

    for (i, &tile) in board.tiles().iter().enumerate() {
        if tile != Tile::Empty {
            if !in_chunk {
                in_chunk = true;
                chunk_start = i;
            }
            match tile {
                Tile::Black => found_black = true,
                Tile::White => found_white = true,
                _ => unreachable!("clobber board holds stones and empties only"),
            }
        } else {
            if in_chunk && found_black && found_white {
                chunks.push(chunk_start..i);
            }
            in_chunk = false;
            found_black = false;
            found_white = false;
        }
    }

    if in_chunk && found_black && found_white {
        chunks.push(chunk_start..board.tiles().len());
    }

    chunks
}

impl Clobber1xn {
    pub fn new(board: StripBoard) -> Result<Clobber1xn> {
        ensure!(
            board.tiles().iter().all(|t| *t != Tile::Border),
            "clobber_1xn boards hold stones and empties only"
        );
        Ok(Clobber1xn::with_board(board))
    }

    pub fn from_text(s: &str) -> Result<Clobber1xn> {
        Clobber1xn::new(StripBoard::parse(s)?)
    }

    fn with_board(board: StripBoard) -> Clobber1xn {
        Clobber1xn {
            core: GameCore::new(),
            board,
            normalize_did_change: vec![],
            normalize_boards: vec![],
        }
    }

    /// The alternating board "XOXO...XO" with `n` pairs.
    pub fn xoxo(n: usize) -> Clobber1xn {
        let tiles = (0..2 * n)
            .map(|i| if i % 2 == 0 { Tile::Black } else { Tile::White })
            .collect();
        Clobber1xn::with_board(StripBoard::from_tiles(tiles))
    }

    pub fn board(&self) -> &StripBoard {
        &self.board
    }
}

impl fmt::Display for Clobber1xn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clobber_1xn:{}", self.board)
    }
}

impl Game for Clobber1xn {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn game_type(&self) -> GameTypeId {
        type_table::game_type::<Clobber1xn>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn play(&mut self, m: Move, to_play: Player) {
        self.core.record_play(m, to_play);

        let (from, to) = moves::move2::unpack(m);
        assert!(self.board.checked_is(from, to_play.into()));
        assert!(self.board.checked_is(to, to_play.opponent().into()));

        if self.core.hash_updatable() {
            let hash = self.core.hash_mut();
            hash.toggle(from as usize, to_play as i32);
            hash.toggle(to as usize, to_play.opponent() as i32);

            hash.toggle(from as usize, Tile::Empty as i32);
            hash.toggle(to as usize, to_play as i32);
            self.core.mark_hash_updated();
        }

        self.board.replace(from, Tile::Empty);
        self.board.replace(to, to_play.into());
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
            hash.toggle(to as usize, player.opponent() as i32);
            self.core.mark_hash_updated();
        }

        self.board.replace(from, player.into());
        self.board.replace(to, player.opponent().into());
    }

    fn create_move_generator(&self, to_play: Player) -> Box<dyn MoveGenerator> {
        Box::new(Clobber1xnMoveGenerator::new(self.board.clone(), to_play))
    }

    fn inverse(&self) -> Box<dyn Game> {
        Box::new(Clobber1xn::with_board(self.board.inverse()))
    }

    fn init_hash(&mut self, hash: &mut LocalHash) {
        self.board.init_local_hash(hash);
    }

    fn print_move(&self, m: Move) -> String {
        let (from, to) = moves::move2::unpack(m);
        format!("{}-{}", from + 1, to + 1)
    }

    fn split(&self) -> SplitResult {
        let chunks = live_chunks(&self.board);
        if chunks.len() < 2 {
            return SplitResult::Keep;
        }

        let pieces = chunks
            .into_iter()
            .map(|range| {
                Box::new(Clobber1xn::with_board(self.board.sub_board(range))) as Box<dyn Game>
            })
            .collect();

        SplitResult::Replace(pieces)
    }

    fn normalize(&mut self) {
        self.core.record_normalize();

        let chunks = live_chunks(&self.board);
        let board_len = self.board.tiles().len();

        // Already one chunk covering everything (or nothing at all): only a
        // mirror can still change the board.
        let already_compact = board_len == 0
            || (chunks.len() == 1 && chunks[0].start == 0 && chunks[0].end == board_len);

        if already_compact {
            if self.board.should_mirror() {
                self.normalize_did_change.push(true);
                self.normalize_boards.push(self.board.clone());
                self.board = self.board.reversed();
                self.core.invalidate_hash();
                return;
            }

            if self.core.hash_updatable() {
                self.core.mark_hash_updated();
            }
            self.normalize_did_change.push(false);
            return;
        }

        self.normalize_did_change.push(true);
        self.normalize_boards.push(self.board.clone());

        let mut tiles = vec![];
        for (i, range) in chunks.iter().enumerate() {
            if i > 0 {
                tiles.push(Tile::Empty);
            }
            tiles.extend_from_slice(&self.board.tiles()[range.clone()]);
        }

        let mut new_board = StripBoard::from_tiles(tiles);
        if new_board.should_mirror() {
            new_board = new_board.reversed();
        }

        self.board = new_board;
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
        let other = rhs.as_any().downcast_ref::<Clobber1xn>()?;
        Some(self.board.compare(&other.board))
    }
}

struct Clobber1xnMoveGenerator {
    board: StripBoard,
    to_play: Player,
    current: i32,
    dir: i32,
}

impl Clobber1xnMoveGenerator {
    fn new(board: StripBoard, to_play: Player) -> Clobber1xnMoveGenerator {
        let mut generator = Clobber1xnMoveGenerator {
            board,
            to_play,
            current: 0,
            dir: 1,
        };

        if generator.board.len() > 0 && !generator.is_move(generator.current, generator.dir) {
            generator.find_next_move();
        }
        generator
    }

    fn is_move(&self, p: i32, dir: i32) -> bool {
        self.board.checked_is(p, self.to_play.into())
            && self.board.checked_is(p + dir, self.to_play.opponent().into())
    }

    fn has_move(&self, p: i32) -> bool {
        self.is_move(p, 1) || self.is_move(p, -1)
    }

    fn find_next_move(&mut self) {
        let num = self.board.len();

        // Same stone, other direction first.
        if self.dir == 1
            && self.current < num
            && self.board.checked_is(self.current, self.to_play.into())
            && self.is_move(self.current, -1)
        {
            self.dir = -1;
            return;
        }

        self.current += 1;
        while self.current < num
            && (!self.board.checked_is(self.current, self.to_play.into())
                || !self.has_move(self.current))
        {
            self.current += 1;
        }

        if self.current < num {
            self.dir = if self.is_move(self.current, 1) { 1 } else { -1 };
        }
    }
}

impl MoveGenerator for Clobber1xnMoveGenerator {
    fn is_valid(&self) -> bool {
        self.current < self.board.len()
    }

    fn advance(&mut self) {
        self.find_next_move();
    }

    fn gen_move(&self) -> Move {
        assert!(self.is_valid());
        moves::move2::create(self.current, self.current + self.dir)
    }
}
