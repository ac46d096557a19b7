//! Clobber on a 2-dimensional grid.
//!
//! Like the strip game, but stones capture into any of the four cardinal
//! neighbours. Play is invariant under rotation and reflection, so the
//! full orientation mask is active.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use crate::cgt::prelude::*;

pub struct Clobber {
    core: GameCore,
    board: GridBoard,
    gh: GridHash,
}

impl Clobber {
    pub fn new(board: GridBoard) -> Result<Clobber> {
        ensure!(
            board.tiles().iter().all(|t| *t != Tile::Border),
            "clobber boards hold stones and empties only"
        );
        Ok(Clobber::with_board(board))
    }

    pub fn from_text(s: &str) -> Result<Clobber> {
        Clobber::new(GridBoard::parse(s)?)
    }

    fn with_board(board: GridBoard) -> Clobber {
        crate::games::init();
        Clobber {
            core: GameCore::new(),
            board,
            gh: GridHash::new(type_table::grid_hash_mask::<Clobber>()),
        }
    }

    pub fn board(&self) -> &GridBoard {
        &self.board
    }
}

impl fmt::Display for Clobber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clobber:{}", self.board)
    }
}

impl Game for Clobber {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn game_type(&self) -> GameTypeId {
        type_table::game_type::<Clobber>()
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
            let shape = self.board.shape();
            let cf = GridBoard::point_to_coord(from, shape);
            let ct = GridBoard::point_to_coord(to, shape);

            self.gh.toggle(cf.row, cf.col, to_play as i32);
            self.gh.toggle(ct.row, ct.col, to_play.opponent() as i32);

            self.gh.toggle(cf.row, cf.col, Tile::Empty as i32);
            self.gh.toggle(ct.row, ct.col, to_play as i32);

            self.core.hash_mut().set_value(self.gh.value());
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
            let shape = self.board.shape();
            let cf = GridBoard::point_to_coord(from, shape);
            let ct = GridBoard::point_to_coord(to, shape);

            self.gh.toggle(cf.row, cf.col, Tile::Empty as i32);
            self.gh.toggle(ct.row, ct.col, player as i32);

            self.gh.toggle(cf.row, cf.col, player as i32);
            self.gh.toggle(ct.row, ct.col, player.opponent() as i32);

            self.core.hash_mut().set_value(self.gh.value());
            self.core.mark_hash_updated();
        }

        self.board.replace(from, player.into());
        self.board.replace(to, player.opponent().into());
    }

    fn create_move_generator(&self, to_play: Player) -> Box<dyn MoveGenerator> {
        Box::new(ClobberMoveGenerator::new(self.board.clone(), to_play))
    }

    fn inverse(&self) -> Box<dyn Game> {
        Box::new(Clobber::with_board(self.board.inverse()))
    }

    fn init_hash(&mut self, hash: &mut LocalHash) {
        let game_type = self.game_type();
        self.board.init_grid_hash(&mut self.gh, game_type);
        hash.set_value(self.gh.value());
    }

    fn print_move(&self, m: Move) -> String {
        let (from, to) = moves::move2::unpack(m);
        format!(
            "{}-{}",
            self.board.point_notation(from),
            self.board.point_notation(to)
        )
    }

    fn order_impl(&self, rhs: &dyn Game) -> Option<Ordering> {
        let other = rhs.as_any().downcast_ref::<Clobber>()?;
        Some(self.board.compare(&other.board))
    }
}

struct ClobberMoveGenerator {
    board: GridBoard,
    to_play: Player,
    point: i32,
    dir_idx: usize,
}

impl ClobberMoveGenerator {
    fn new(board: GridBoard, to_play: Player) -> ClobberMoveGenerator {
        let mut generator = ClobberMoveGenerator {
            board,
            to_play,
            point: 0,
            dir_idx: 0,
        };

        if !generator.current_is_move() {
            generator.advance();
        }
        generator
    }

    fn target(&self) -> Option<i32> {
        if self.point >= self.board.size() {
            return None;
        }
        let coord = GridBoard::point_to_coord(self.point, self.board.shape());
        let next = self.board.neighbour(coord, GRID_DIRS_CARDINAL[self.dir_idx])?;
        Some(GridBoard::coord_to_point(next, self.board.shape()))
    }

    fn current_is_move(&self) -> bool {
        self.point < self.board.size()
            && self.board.checked_is(self.point, self.to_play.into())
            && self
                .target()
                .is_some_and(|t| self.board.checked_is(t, self.to_play.opponent().into()))
    }

    fn step(&mut self) {
        self.dir_idx += 1;
        if self.dir_idx == GRID_DIRS_CARDINAL.len() {
            self.dir_idx = 0;
            self.point += 1;
        }
    }
}

impl MoveGenerator for ClobberMoveGenerator {
    fn is_valid(&self) -> bool {
        self.point < self.board.size()
    }

    fn advance(&mut self) {
        loop {
            self.step();
            if self.point >= self.board.size() || self.current_is_move() {
                return;
            }
        }
    }

    fn gen_move(&self) -> Move {
        assert!(self.current_is_move());
        moves::move2::create(self.point, self.target().unwrap())
    }
}
