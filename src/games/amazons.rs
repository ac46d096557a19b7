//! Amazons.
//!
//! A queen slides along any of the eight directions over empty cells, then
//! shoots an arrow the same way from its landing square; the arrow cell is
//! burnt for the rest of the game. The vacated starting square counts as
//! empty for the arrow. The last player able to move wins.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use crate::cgt::prelude::*;

pub struct Amazons {
    core: GameCore,
    board: GridBoard,
    gh: GridHash,
}

impl Amazons {
    pub fn new(board: GridBoard) -> Result<Amazons> {
        Ok(Amazons::with_board(board))
    }

    pub fn from_text(s: &str) -> Result<Amazons> {
        Amazons::new(GridBoard::parse(s)?)
    }

    fn with_board(board: GridBoard) -> Amazons {
        crate::games::init();
        Amazons {
            core: GameCore::new(),
            board,
            gh: GridHash::new(type_table::grid_hash_mask::<Amazons>()),
        }
    }

    pub fn board(&self) -> &GridBoard {
        &self.board
    }
}

impl fmt::Display for Amazons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "amazons:{}", self.board)
    }
}

impl Game for Amazons {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn game_type(&self) -> GameTypeId {
        type_table::game_type::<Amazons>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn play(&mut self, m: Move, to_play: Player) {
        self.core.record_play(m, to_play);

        let ((r1, c1), (r2, c2), (r3, c3)) = moves::move6::unpack_coords(m);
        let (coord1, coord2, coord3) = (
            Coord::new(r1, c1),
            Coord::new(r2, c2),
            Coord::new(r3, c3),
        );

        let shape = self.board.shape();
        let p1 = GridBoard::coord_to_point(coord1, shape);
        let p2 = GridBoard::coord_to_point(coord2, shape);
        let p3 = GridBoard::coord_to_point(coord3, shape);

        // The queen's landing square is distinct from both ends of the
        // arrow's story; the arrow may land on the vacated start.
        assert!(p2 != p1 && p2 != p3);
        assert!(self.board.checked_is(p1, to_play.into()));
        assert!(self.board.checked_is(p2, Tile::Empty));

        if self.core.hash_updatable() {
            self.gh.toggle(r1, c1, to_play as i32);
            self.gh.toggle(r2, c2, Tile::Empty as i32);
            if p1 != p3 {
                self.gh.toggle(r3, c3, Tile::Empty as i32);
            }

            self.gh.toggle(r2, c2, to_play as i32);
            self.gh.toggle(r3, c3, Tile::Border as i32);
            if p1 != p3 {
                self.gh.toggle(r1, c1, Tile::Empty as i32);
            }

            self.core.hash_mut().set_value(self.gh.value());
            self.core.mark_hash_updated();
        }

        self.board.replace(p1, Tile::Empty);
        self.board.replace(p2, to_play.into());
        assert!(self.board.checked_is(p3, Tile::Empty));
        self.board.replace(p3, Tile::Border);
    }

    fn undo_move(&mut self) {
        let mc = self.core.record_undo_play();

        let m = moves::remove_color(mc);
        let player = moves::get_color(mc);

        let ((r1, c1), (r2, c2), (r3, c3)) = moves::move6::unpack_coords(m);
        let shape = self.board.shape();
        let p1 = GridBoard::coord_to_point(Coord::new(r1, c1), shape);
        let p2 = GridBoard::coord_to_point(Coord::new(r2, c2), shape);
        let p3 = GridBoard::coord_to_point(Coord::new(r3, c3), shape);

        assert!(p2 != p1 && p2 != p3);

        // Arrow out first, then the queen walks back.
        assert!(self.board.checked_is(p3, Tile::Border));
        self.board.replace(p3, Tile::Empty);

        assert!(self.board.checked_is(p2, player.into()));
        assert!(self.board.checked_is(p1, Tile::Empty));
        self.board.replace(p1, player.into());
        self.board.replace(p2, Tile::Empty);

        if self.core.hash_updatable() {
            self.gh.toggle(r2, c2, player as i32);
            self.gh.toggle(r3, c3, Tile::Border as i32);
            if p1 != p3 {
                self.gh.toggle(r1, c1, Tile::Empty as i32);
            }

            self.gh.toggle(r1, c1, player as i32);
            self.gh.toggle(r2, c2, Tile::Empty as i32);
            if p1 != p3 {
                self.gh.toggle(r3, c3, Tile::Empty as i32);
            }

            self.core.hash_mut().set_value(self.gh.value());
            self.core.mark_hash_updated();
        }
    }

    fn create_move_generator(&self, to_play: Player) -> Box<dyn MoveGenerator> {
        Box::new(AmazonsMoveGenerator::new(self.board.clone(), to_play))
    }

    fn inverse(&self) -> Box<dyn Game> {
        Box::new(Amazons::with_board(self.board.inverse()))
    }

    fn init_hash(&mut self, hash: &mut LocalHash) {
        let game_type = self.game_type();
        self.board.init_grid_hash(&mut self.gh, game_type);
        hash.set_value(self.gh.value());
    }

    fn print_move(&self, m: Move) -> String {
        let ((r1, c1), (r2, c2), (r3, c3)) = moves::move6::unpack_coords(m);
        let shape = self.board.shape();
        let notate = |r, c| {
            self.board
                .point_notation(GridBoard::coord_to_point(Coord::new(r, c), shape))
        };
        format!("{}-{}-{}", notate(r1, c1), notate(r2, c2), notate(r3, c3))
    }

    fn order_impl(&self, rhs: &dyn Game) -> Option<Ordering> {
        let other = rhs.as_any().downcast_ref::<Amazons>()?;
        Some(self.board.compare(&other.board))
    }
}

/// Queen start × queen direction × queen slide × arrow direction × arrow
/// slide, innermost advancing first.
struct AmazonsMoveGenerator {
    board: GridBoard,
    to_play: Player,
    queen_start: i32,
    queen_dir: usize,
    queen_end: Coord,
    arrow_dir: usize,
    arrow_end: Coord,
    done: bool,
}

impl AmazonsMoveGenerator {
    fn new(board: GridBoard, to_play: Player) -> AmazonsMoveGenerator {
        let mut generator = AmazonsMoveGenerator {
            board,
            to_play,
            queen_start: -1,
            queen_dir: 0,
            queen_end: Coord::new(0, 0),
            arrow_dir: 0,
            arrow_end: Coord::new(0, 0),
            done: false,
        };
        generator.done = !generator.next_queen();
        generator
    }

    fn cell_empty(&self, coord: Coord) -> bool {
        self.board.at_coord(coord) == Tile::Empty
    }

    /// Empty cells and the vacated queen start are open to the arrow.
    fn arrow_free(&self, coord: Coord) -> bool {
        self.cell_empty(coord)
            || GridBoard::coord_to_point(coord, self.board.shape()) == self.queen_start
    }

    fn next_queen(&mut self) -> bool {
        loop {
            self.queen_start += 1;
            if self.queen_start >= self.board.size() {
                return false;
            }
            if !self.board.checked_is(self.queen_start, self.to_play.into()) {
                continue;
            }
            self.queen_dir = 0;
            if self.enter_queen_dir() {
                return true;
            }
        }
    }

    /// Positions the queen on the first reachable square from `queen_dir`
    /// onward, with a first arrow in place.
    fn enter_queen_dir(&mut self) -> bool {
        while self.queen_dir < GRID_DIRS_ALL.len() {
            let start = GridBoard::point_to_coord(self.queen_start, self.board.shape());
            if let Some(coord) = self.board.neighbour(start, GRID_DIRS_ALL[self.queen_dir])
                && self.cell_empty(coord)
            {
                self.queen_end = coord;
                self.arrow_dir = 0;
                if self.enter_arrow_dir() || self.advance_queen_end() {
                    return true;
                }
            }
            self.queen_dir += 1;
        }
        false
    }

    /// Slides the queen one cell further along its direction, repeatedly,
    /// until a square with an arrow is found.
    fn advance_queen_end(&mut self) -> bool {
        loop {
            match self.board.neighbour(self.queen_end, GRID_DIRS_ALL[self.queen_dir]) {
                Some(coord) if self.cell_empty(coord) => {
                    self.queen_end = coord;
                    self.arrow_dir = 0;
                    if self.enter_arrow_dir() {
                        return true;
                    }
                }
                _ => return false,
            }
        }
    }

    /// Finds the first arrow from `arrow_dir` onward.
    fn enter_arrow_dir(&mut self) -> bool {
        while self.arrow_dir < GRID_DIRS_ALL.len() {
            if let Some(coord) = self
                .board
                .neighbour(self.queen_end, GRID_DIRS_ALL[self.arrow_dir])
                && self.arrow_free(coord)
            {
                self.arrow_end = coord;
                return true;
            }
            self.arrow_dir += 1;
        }
        false
    }

    fn advance_arrow(&mut self) -> bool {
        if let Some(coord) = self
            .board
            .neighbour(self.arrow_end, GRID_DIRS_ALL[self.arrow_dir])
            && self.arrow_free(coord)
        {
            self.arrow_end = coord;
            return true;
        }
        self.arrow_dir += 1;
        self.enter_arrow_dir()
    }
}

impl MoveGenerator for AmazonsMoveGenerator {
    fn is_valid(&self) -> bool {
        !self.done
    }

    fn advance(&mut self) {
        assert!(self.is_valid());

        if self.advance_arrow() || self.advance_queen_end() {
            return;
        }

        self.queen_dir += 1;
        if self.enter_queen_dir() {
            return;
        }

        self.done = !self.next_queen();
    }

    fn gen_move(&self) -> Move {
        assert!(self.is_valid());

        let start = GridBoard::point_to_coord(self.queen_start, self.board.shape());
        moves::move6::create_coords(
            (start.row, start.col),
            (self.queen_end.row, self.queen_end.col),
            (self.arrow_end.row, self.arrow_end.col),
        )
    }
}
