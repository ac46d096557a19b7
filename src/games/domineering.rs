//! Domineering.
//!
//! Black places vertical dominoes, White horizontal ones, on empty cells.
//! The last player able to place wins. The rules are mirror- but not
//! rotation-symmetric, so only the mirror orientations are active, and
//! negation transposes the board.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use crate::cgt::prelude::*;

pub struct Domineering {
    core: GameCore,
    board: GridBoard,
    gh: GridHash,
}

fn placement_dir(player: Player) -> GridDir {
    match player {
        Player::Black => GridDir::Down,
        Player::White => GridDir::Right,
    }
}

impl Domineering {
    pub fn new(board: GridBoard) -> Result<Domineering> {
        ensure!(
            board
                .tiles()
                .iter()
                .all(|&t| matches!(t, Tile::Empty | Tile::Border)),
            "domineering boards hold empty and blocked cells only"
        );
        Ok(Domineering::with_board(board))
    }

    pub fn from_text(s: &str) -> Result<Domineering> {
        Domineering::new(GridBoard::parse(s)?)
    }

    fn with_board(board: GridBoard) -> Domineering {
        crate::games::init();
        Domineering {
            core: GameCore::new(),
            board,
            gh: GridHash::new(type_table::grid_hash_mask::<Domineering>()),
        }
    }

    pub fn board(&self) -> &GridBoard {
        &self.board
    }

    fn toggle_pair(&mut self, c1: Coord, c2: Coord, before: Tile, after: Tile) {
        self.gh.toggle(c1.row, c1.col, before as i32);
        self.gh.toggle(c2.row, c2.col, before as i32);
        self.gh.toggle(c1.row, c1.col, after as i32);
        self.gh.toggle(c2.row, c2.col, after as i32);
    }
}

impl fmt::Display for Domineering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "domineering:{}", self.board)
    }
}

impl Game for Domineering {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn game_type(&self) -> GameTypeId {
        type_table::game_type::<Domineering>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn play(&mut self, m: Move, to_play: Player) {
        self.core.record_play(m, to_play);

        let ((r1, c1), (r2, c2)) = moves::move4::unpack_coords(m);
        let coord1 = Coord::new(r1, c1);
        let coord2 = Coord::new(r2, c2);

        // Vertical for Black, horizontal for White.
        let (dr, dc) = placement_dir(to_play).displacement();
        assert_eq!((r2 - r1, c2 - c1), (dr, dc), "wrong domino orientation");

        let shape = self.board.shape();
        let p1 = GridBoard::coord_to_point(coord1, shape);
        let p2 = GridBoard::coord_to_point(coord2, shape);
        assert!(self.board.checked_is(p1, Tile::Empty));
        assert!(self.board.checked_is(p2, Tile::Empty));

        if self.core.hash_updatable() {
            self.toggle_pair(coord1, coord2, Tile::Empty, Tile::Border);
            self.core.hash_mut().set_value(self.gh.value());
            self.core.mark_hash_updated();
        }

        self.board.replace(p1, Tile::Border);
        self.board.replace(p2, Tile::Border);
    }

    fn undo_move(&mut self) {
        let mc = self.core.record_undo_play();

        let m = moves::remove_color(mc);
        let ((r1, c1), (r2, c2)) = moves::move4::unpack_coords(m);
        let coord1 = Coord::new(r1, c1);
        let coord2 = Coord::new(r2, c2);

        let shape = self.board.shape();
        let p1 = GridBoard::coord_to_point(coord1, shape);
        let p2 = GridBoard::coord_to_point(coord2, shape);
        assert!(self.board.checked_is(p1, Tile::Border));
        assert!(self.board.checked_is(p2, Tile::Border));

        if self.core.hash_updatable() {
            self.toggle_pair(coord1, coord2, Tile::Border, Tile::Empty);
            self.core.hash_mut().set_value(self.gh.value());
            self.core.mark_hash_updated();
        }

        self.board.replace(p1, Tile::Empty);
        self.board.replace(p2, Tile::Empty);
    }

    fn create_move_generator(&self, to_play: Player) -> Box<dyn MoveGenerator> {
        Box::new(DomineeringMoveGenerator::new(self.board.clone(), to_play))
    }

    /// Negation swaps the players' roles, which for domineering means
    /// swapping the axes.
    fn inverse(&self) -> Box<dyn Game> {
        Box::new(Domineering::with_board(self.board.transpose()))
    }

    fn init_hash(&mut self, hash: &mut LocalHash) {
        let game_type = self.game_type();
        self.board.init_grid_hash(&mut self.gh, game_type);
        hash.set_value(self.gh.value());
    }

    fn print_move(&self, m: Move) -> String {
        let ((r1, c1), (r2, c2)) = moves::move4::unpack_coords(m);
        let shape = self.board.shape();
        format!(
            "{}-{}",
            self.board
                .point_notation(GridBoard::coord_to_point(Coord::new(r1, c1), shape)),
            self.board
                .point_notation(GridBoard::coord_to_point(Coord::new(r2, c2), shape)),
        )
    }

    /// Splits into the connected components of the empty region, each
    /// trimmed to its bounding box.
    fn split(&self) -> SplitResult {
        let shape = self.board.shape();
        let size = self.board.size();

        let mut component = vec![usize::MAX; size as usize];
        let mut n_components = 0usize;

        for start in 0..size {
            if self.board.at(start) != Tile::Empty || component[start as usize] != usize::MAX {
                continue;
            }

            let id = n_components;
            n_components += 1;

            let mut stack = vec![start];
            component[start as usize] = id;
            while let Some(point) = stack.pop() {
                let coord = GridBoard::point_to_coord(point, shape);
                for dir in GRID_DIRS_CARDINAL {
                    let Some(next) = self.board.neighbour(coord, dir) else {
                        continue;
                    };
                    let next_point = GridBoard::coord_to_point(next, shape);
                    if self.board.at(next_point) == Tile::Empty
                        && component[next_point as usize] == usize::MAX
                    {
                        component[next_point as usize] = id;
                        stack.push(next_point);
                    }
                }
            }
        }

        if n_components < 2 {
            return SplitResult::Keep;
        }

        let mut pieces: Vec<Box<dyn Game>> = vec![];
        for id in 0..n_components {
            let members: Vec<i32> = (0..size)
                .filter(|&p| component[p as usize] == id)
                .collect();

            let coords: Vec<Coord> = members
                .iter()
                .map(|&p| GridBoard::point_to_coord(p, shape))
                .collect();

            let min_r = coords.iter().map(|c| c.row).min().unwrap();
            let max_r = coords.iter().map(|c| c.row).max().unwrap();
            let min_c = coords.iter().map(|c| c.col).min().unwrap();
            let max_c = coords.iter().map(|c| c.col).max().unwrap();

            let piece_shape = (max_r - min_r + 1, max_c - min_c + 1);
            let mut tiles = vec![Tile::Border; (piece_shape.0 * piece_shape.1) as usize];
            for coord in &coords {
                let idx = (coord.row - min_r) * piece_shape.1 + (coord.col - min_c);
                tiles[idx as usize] = Tile::Empty;
            }

            pieces.push(Box::new(Domineering::with_board(GridBoard::from_tiles(
                tiles,
                piece_shape,
            ))));
        }

        SplitResult::Replace(pieces)
    }

    fn order_impl(&self, rhs: &dyn Game) -> Option<Ordering> {
        let other = rhs.as_any().downcast_ref::<Domineering>()?;
        Some(self.board.compare(&other.board))
    }
}

struct DomineeringMoveGenerator {
    board: GridBoard,
    dir: GridDir,
    point: i32,
}

impl DomineeringMoveGenerator {
    fn new(board: GridBoard, to_play: Player) -> DomineeringMoveGenerator {
        let mut generator = DomineeringMoveGenerator {
            board,
            dir: placement_dir(to_play),
            point: 0,
        };

        if !generator.current_is_move() {
            generator.advance();
        }
        generator
    }

    fn second_cell(&self) -> Option<Coord> {
        let coord = GridBoard::point_to_coord(self.point, self.board.shape());
        self.board.neighbour(coord, self.dir)
    }

    fn current_is_move(&self) -> bool {
        if !(self.point < self.board.size() && self.board.at(self.point) == Tile::Empty) {
            return false;
        }
        self.second_cell()
            .is_some_and(|c| self.board.at_coord(c) == Tile::Empty)
    }
}

impl MoveGenerator for DomineeringMoveGenerator {
    fn is_valid(&self) -> bool {
        self.point < self.board.size()
    }

    fn advance(&mut self) {
        loop {
            self.point += 1;
            if self.point >= self.board.size() || self.current_is_move() {
                return;
            }
        }
    }

    fn gen_move(&self) -> Move {
        assert!(self.current_is_move());
        let coord1 = GridBoard::point_to_coord(self.point, self.board.shape());
        let coord2 = self.second_cell().unwrap();
        moves::move4::create_coords((coord1.row, coord1.col), (coord2.row, coord2.col))
    }
}
