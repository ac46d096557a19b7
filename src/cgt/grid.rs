//! Two-dimensional boards and the coordinate helpers shared by grid games.

use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;

use super::basics::Tile;
use super::grid_hash::GridHash;
use super::type_table::GameTypeId;
use crate::utils::prelude::*;

/// A (row, col) coordinate. Signed so neighbour arithmetic can step off the
/// board and be caught by a bounds check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub fn new(row: i32, col: i32) -> Coord {
        Coord { row, col }
    }
}

/// (rows, cols) of a board.
pub type Shape = (i32, i32);

/// The eight grid directions, clockwise from up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridDir {
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

pub const GRID_DIRS_CARDINAL: [GridDir; 4] =
    [GridDir::Up, GridDir::Right, GridDir::Down, GridDir::Left];

pub const GRID_DIRS_ALL: [GridDir; 8] = [
    GridDir::Up,
    GridDir::UpRight,
    GridDir::Right,
    GridDir::DownRight,
    GridDir::Down,
    GridDir::DownLeft,
    GridDir::Left,
    GridDir::UpLeft,
];

impl GridDir {
    /// The (row, col) displacement of one step in this direction.
    pub fn displacement(self) -> (i32, i32) {
        match self {
            GridDir::Up => (-1, 0),
            GridDir::UpRight => (-1, 1),
            GridDir::Right => (0, 1),
            GridDir::DownRight => (1, 1),
            GridDir::Down => (1, 0),
            GridDir::DownLeft => (1, -1),
            GridDir::Left => (0, -1),
            GridDir::UpLeft => (-1, -1),
        }
    }
}

/// A row-major board of tiles with a (rows, cols) shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridBoard {
    board: Vec<Tile>,
    shape: Shape,
}

impl GridBoard {
    /// Parses rows of board characters separated by `|`. All rows must have
    /// equal length.
    pub fn parse(s: &str) -> Result<GridBoard> {
        let mut board = vec![];
        let mut n_rows = 0;
        let mut n_cols = None;

        for row in s.split('|') {
            let tiles: Vec<Tile> = row.chars().map(Tile::from_char).try_collect()?;
            match n_cols {
                None => n_cols = Some(tiles.len()),
                Some(expected) => ensure!(
                    tiles.len() == expected,
                    "ragged grid: row {n_rows} has {} columns, expected {expected}",
                    tiles.len()
                ),
            }
            board.extend(tiles);
            n_rows += 1;
        }

        let shape = (n_rows, n_cols.unwrap_or(0) as i32);
        Ok(GridBoard { board, shape })
    }

    pub fn from_tiles(board: Vec<Tile>, shape: Shape) -> GridBoard {
        assert!(shape.0 >= 0 && shape.1 >= 0);
        assert_eq!(board.len(), (shape.0 * shape.1) as usize);
        GridBoard { board, shape }
    }

    pub fn empty(rows: i32, cols: i32) -> GridBoard {
        GridBoard {
            board: vec![Tile::Empty; (rows * cols) as usize],
            shape: (rows, cols),
        }
    }

    pub fn size(&self) -> i32 {
        self.board.len() as i32
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.board
    }

    pub fn at(&self, point: i32) -> Tile {
        assert!(0 <= point && point < self.size(), "point {point} off board");
        self.board[point as usize]
    }

    pub fn at_coord(&self, coord: Coord) -> Tile {
        self.at(Self::coord_to_point(coord, self.shape))
    }

    /// Whether the point is on the board and holds the given tile.
    pub fn checked_is(&self, point: i32, tile: Tile) -> bool {
        0 <= point && point < self.size() && self.board[point as usize] == tile
    }

    pub fn replace(&mut self, point: i32, tile: Tile) {
        assert!(0 <= point && point < self.size(), "point {point} off board");
        self.board[point as usize] = tile;
    }

    pub fn coord_to_point(coord: Coord, shape: Shape) -> i32 {
        debug_assert!(Self::coord_in_shape(coord, shape));
        coord.row * shape.1 + coord.col
    }

    pub fn point_to_coord(point: i32, shape: Shape) -> Coord {
        debug_assert!(shape.1 > 0);
        Coord::new(point / shape.1, point % shape.1)
    }

    pub fn coord_in_shape(coord: Coord, shape: Shape) -> bool {
        (0..shape.0).contains(&coord.row) && (0..shape.1).contains(&coord.col)
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        Self::coord_in_shape(coord, self.shape)
    }

    /// The neighbouring coordinate one step away, if it is on the board.
    pub fn neighbour(&self, coord: Coord, dir: GridDir) -> Option<Coord> {
        let (dr, dc) = dir.displacement();
        let next = Coord::new(coord.row + dr, coord.col + dc);
        self.in_bounds(next).then_some(next)
    }

    /// The board with stone colours swapped; empties and borders unchanged.
    pub fn inverse(&self) -> GridBoard {
        GridBoard {
            board: self.board.iter().map(|t| t.inverse()).collect(),
            shape: self.shape,
        }
    }

    /// The transposed board, shape (cols, rows).
    pub fn transpose(&self) -> GridBoard {
        let (rows, cols) = self.shape;
        let mut out = Vec::with_capacity(self.board.len());

        for c in 0..cols {
            for r in 0..rows {
                out.push(self.board[(r * cols + c) as usize]);
            }
        }

        GridBoard {
            board: out,
            shape: (cols, rows),
        }
    }

    /// The board rotated 90 degrees clockwise, shape (cols, rows).
    pub fn rotate90(&self) -> GridBoard {
        let (rows, cols) = self.shape;
        let mut out = vec![Tile::Empty; self.board.len()];

        for r in 0..rows {
            for c in 0..cols {
                // (r, c) lands on (c, rows - 1 - r) in the rotated board.
                out[(c * rows + (rows - 1 - r)) as usize] = self.board[(r * cols + c) as usize];
            }
        }

        GridBoard {
            board: out,
            shape: (cols, rows),
        }
    }

    /// Chess-like notation for a point: column letter, then 1-based row.
    pub fn point_notation(&self, point: i32) -> String {
        let coord = Self::point_to_coord(point, self.shape);
        let col = (b'a' + coord.col as u8) as char;
        format!("{}{}", col, coord.row + 1)
    }

    /// Shape-major, then cell-wise ordering, for stable sorting of games.
    pub fn compare(&self, other: &GridBoard) -> Ordering {
        self.shape
            .cmp(&other.shape)
            .then_with(|| self.board.cmp(&other.board))
    }

    /// Rebuilds a grid hash from this board: shape, game type, every cell.
    pub fn init_grid_hash(&self, gh: &mut GridHash, game_type: GameTypeId) {
        gh.reset(self.shape);
        gh.toggle_type(game_type);

        let (rows, cols) = self.shape;
        for r in 0..rows {
            for c in 0..cols {
                gh.toggle(r, c, self.board[(r * cols + c) as usize] as i32);
            }
        }
    }
}

impl fmt::Display for GridBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.shape;
        for r in 0..rows {
            if r > 0 {
                write!(f, "|")?;
            }
            for c in 0..cols {
                write!(f, "{}", self.board[(r * cols + c) as usize].to_char())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_print_round_trip() {
        for s in ["XO.|.X.|..X", "..|..", "X", "...."] {
            let g = GridBoard::parse(s).unwrap();
            assert_eq!(g.to_string(), s);
        }
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        assert!(GridBoard::parse("XO|X").is_err());
        assert!(GridBoard::parse("ZZ").is_err());
    }

    #[test]
    fn rotate_four_times_is_identity() {
        let g = GridBoard::parse("XO.|.X#").unwrap();
        let rotated = g.rotate90().rotate90().rotate90().rotate90();
        assert_eq!(rotated, g);
    }

    #[test]
    fn transpose_twice_is_identity() {
        let g = GridBoard::parse("XO.|.X#").unwrap();
        assert_eq!(g.transpose().transpose(), g);
        assert_eq!(g.transpose().shape(), (3, 2));
    }

    #[test]
    fn rotate_matches_by_hand() {
        let g = GridBoard::parse("XO|.#").unwrap();
        assert_eq!(g.rotate90().to_string(), ".X|#O");
    }

    #[test]
    fn neighbours_respect_bounds() {
        let g = GridBoard::parse("XO|.#").unwrap();
        assert_eq!(g.neighbour(Coord::new(0, 0), GridDir::Up), None);
        assert_eq!(
            g.neighbour(Coord::new(0, 0), GridDir::DownRight),
            Some(Coord::new(1, 1))
        );
    }

    #[test]
    fn point_coord_round_trip() {
        let shape = (3, 4);
        for point in 0..12 {
            let coord = GridBoard::point_to_coord(point, shape);
            assert_eq!(GridBoard::coord_to_point(coord, shape), point);
        }
    }

    #[test]
    fn point_notation_is_one_based() {
        let g = GridBoard::parse("..|..").unwrap();
        assert_eq!(g.point_notation(0), "a1");
        assert_eq!(g.point_notation(3), "b2");
    }
}
