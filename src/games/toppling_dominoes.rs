//! Toppling Dominoes on a row.
//!
//! A player topples one of their dominoes (grey `#` dominoes belong to
//! both) to the left or to the right, knocking down everything on that
//! side. The row shrinks but never changes, so the game keeps the initial
//! row immutable and tracks a sliding `[start, end)` window plus a flip
//! bit; undo is O(1).

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;

use crate::cgt::prelude::*;

pub struct TopplingDominoes {
    core: GameCore,
    initial: Vec<Tile>,
    start: i32,
    end: i32,
    flipped: bool,
    normalize_did_flip: Vec<bool>,
}

impl TopplingDominoes {
    pub fn new(dominoes: Vec<Tile>) -> Result<TopplingDominoes> {
        ensure!(
            dominoes.iter().all(|t| *t != Tile::Empty),
            "every cell of a toppling dominoes row holds a domino"
        );

        let end = dominoes.len() as i32;
        Ok(TopplingDominoes {
            core: GameCore::new(),
            initial: dominoes,
            start: 0,
            end,
            flipped: false,
            normalize_did_flip: vec![],
        })
    }

    pub fn from_text(s: &str) -> Result<TopplingDominoes> {
        TopplingDominoes::new(s.chars().map(Tile::from_char).try_collect()?)
    }

    pub fn n_dominoes(&self) -> i32 {
        (self.end - self.start).max(0)
    }

    /// The domino at a window-relative index, honouring the flip bit.
    pub fn domino_at(&self, idx: i32) -> Tile {
        self.initial[self.idx_to_real(idx) as usize]
    }

    fn idx_to_real(&self, idx: i32) -> i32 {
        assert!(0 <= idx && idx < self.n_dominoes(), "domino {idx} out of window");
        if self.flipped {
            (self.end - 1) - idx
        } else {
            self.start + idx
        }
    }

    fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    fn current_dominoes(&self) -> Vec<Tile> {
        (0..self.n_dominoes()).map(|i| self.domino_at(i)).collect()
    }
}

impl fmt::Display for TopplingDominoes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toppling_dominoes:")?;
        for i in 0..self.n_dominoes() {
            write!(f, "{}", self.domino_at(i).to_char())?;
        }
        Ok(())
    }
}

impl Game for TopplingDominoes {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn game_type(&self) -> GameTypeId {
        type_table::game_type::<TopplingDominoes>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn play(&mut self, m: Move, to_play: Player) {
        self.core.record_play(m, to_play);

        let (new_start, new_end) = moves::move2::unpack(m);
        assert!(self.start <= new_start && new_end <= self.end);
        assert!(self.start != new_start || self.end != new_end);

        self.start = new_start;
        self.end = new_end;
        self.core.invalidate_hash();
    }

    fn undo_move(&mut self) {
        let _ = self.core.record_undo_play();

        let (new_start, new_end) = if self.core.num_moves_played() > 0 {
            moves::move2::unpack(moves::remove_color(self.core.last_move()))
        } else {
            (0, self.initial.len() as i32)
        };

        assert!(self.start >= new_start && new_end >= self.end);
        assert!(self.start != new_start || self.end != new_end);

        self.start = new_start;
        self.end = new_end;
        self.core.invalidate_hash();
    }

    fn create_move_generator(&self, to_play: Player) -> Box<dyn MoveGenerator> {
        Box::new(TopplingDominoesMoveGenerator::new(
            self.current_dominoes(),
            self.start,
            self.end,
            self.flipped,
            to_play,
        ))
    }

    fn inverse(&self) -> Box<dyn Game> {
        let inverted = self
            .current_dominoes()
            .into_iter()
            .map(|t| t.inverse())
            .collect();
        Box::new(TopplingDominoes::new(inverted).expect("inverse of a legal row is legal"))
    }

    fn init_hash(&mut self, hash: &mut LocalHash) {
        for i in 0..self.n_dominoes() {
            hash.toggle(i as usize, self.domino_at(i) as i32);
        }
    }

    fn print_move(&self, m: Move) -> String {
        let (new_start, new_end) = moves::move2::unpack(m);
        format!("keep {}..{}", new_start, new_end)
    }

    /// Flips the row when the reversed reading is canonically smaller.
    fn normalize(&mut self) {
        self.core.record_normalize();

        let mut should_flip = false;
        let n = self.n_dominoes();
        for i in 0..n {
            let now = self.domino_at(i);
            self.flip();
            let flipped = self.domino_at(i);
            self.flip();

            if flipped != now {
                should_flip = flipped < now;
                break;
            }
        }

        self.normalize_did_flip.push(should_flip);

        if should_flip {
            self.flip();
            self.core.invalidate_hash();
        } else if self.core.hash_updatable() {
            self.core.mark_hash_updated();
        }
    }

    fn undo_normalize(&mut self) {
        self.core.record_undo_normalize();

        let should_flip = self
            .normalize_did_flip
            .pop()
            .expect("normalize stack underflow");

        if should_flip {
            self.flip();
            self.core.invalidate_hash();
        } else if self.core.hash_updatable() {
            self.core.mark_hash_updated();
        }
    }

    fn order_impl(&self, rhs: &dyn Game) -> Option<Ordering> {
        let other = rhs.as_any().downcast_ref::<TopplingDominoes>()?;
        Some(
            self.n_dominoes()
                .cmp(&other.n_dominoes())
                .then_with(|| self.current_dominoes().cmp(&other.current_dominoes())),
        )
    }
}

struct TopplingDominoesMoveGenerator {
    dominoes: Vec<Tile>,
    start: i32,
    end: i32,
    flipped: bool,
    to_play: Player,
    idx: i32,
    topple_right: bool,
}

impl TopplingDominoesMoveGenerator {
    fn new(
        dominoes: Vec<Tile>,
        start: i32,
        end: i32,
        flipped: bool,
        to_play: Player,
    ) -> TopplingDominoesMoveGenerator {
        let mut generator = TopplingDominoesMoveGenerator {
            dominoes,
            start,
            end,
            flipped,
            to_play,
            idx: 0,
            topple_right: false,
        };
        generator.skip_enemy_dominoes();
        generator
    }

    fn mine(&self, idx: i32) -> bool {
        let tile = self.dominoes[idx as usize];
        tile == Tile::from(self.to_play) || tile == Tile::Border
    }

    fn skip_enemy_dominoes(&mut self) {
        while self.idx < self.dominoes.len() as i32 && !self.mine(self.idx) {
            self.topple_right = false;
            self.idx += 1;
        }
    }

    fn idx_to_real(&self, idx: i32) -> i32 {
        if self.flipped {
            (self.end - 1) - idx
        } else {
            self.start + idx
        }
    }
}

impl MoveGenerator for TopplingDominoesMoveGenerator {
    fn is_valid(&self) -> bool {
        self.idx < self.dominoes.len() as i32
    }

    fn advance(&mut self) {
        assert!(self.is_valid());

        if !self.topple_right {
            self.topple_right = true;
        } else {
            self.topple_right = false;
            self.idx += 1;
        }
        self.skip_enemy_dominoes();
    }

    fn gen_move(&self) -> Move {
        assert!(self.is_valid());

        let real_idx = self.idx_to_real(self.idx);
        let real_right = self.flipped != self.topple_right;

        // Toppling left keeps [idx + 1, end); right keeps [start, idx).
        if !real_right {
            moves::move2::create(real_idx + 1, self.end)
        } else {
            moves::move2::create(self.start, real_idx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgt::game::generate_all;

    fn text(g: &TopplingDominoes) -> String {
        g.to_string().split(':').nth(1).unwrap().to_string()
    }

    #[test]
    fn toppling_shrinks_the_window() {
        let mut g = TopplingDominoes::from_text("XOX").unwrap();

        // Topple the leftmost X to the right: only itself survives on the
        // left side boundary, leaving nothing left of it.
        g.play(moves::move2::create(0, 0), Player::Black);
        assert_eq!(g.n_dominoes(), 0);

        g.undo_move();
        assert_eq!(text(&g), "XOX");
    }

    #[test]
    fn generator_offers_both_directions_per_domino() {
        let g = TopplingDominoes::from_text("XO").unwrap();
        let black: Vec<_> = generate_all(g.create_move_generator(Player::Black))
            .into_iter()
            .map(moves::move2::unpack)
            .collect();
        // X at 0: topple left keeps [1, 2); topple right keeps [0, 0).
        assert_eq!(black, vec![(1, 2), (0, 0)]);

        let white: Vec<_> = generate_all(g.create_move_generator(Player::White))
            .into_iter()
            .map(moves::move2::unpack)
            .collect();
        assert_eq!(white, vec![(2, 2), (0, 1)]);
    }

    #[test]
    fn grey_dominoes_belong_to_both_players() {
        let g = TopplingDominoes::from_text("#").unwrap();
        assert_eq!(generate_all(g.create_move_generator(Player::Black)).len(), 2);
        assert_eq!(generate_all(g.create_move_generator(Player::White)).len(), 2);
    }

    #[test]
    fn play_and_undo_restore_hash() {
        let mut g = TopplingDominoes::from_text("XOXO").unwrap();
        let hash_before = (&mut g as &mut dyn Game).get_local_hash();

        g.play(moves::move2::create(1, 4), Player::Black);
        assert_eq!(text(&g), "OXO");
        assert_ne!((&mut g as &mut dyn Game).get_local_hash(), hash_before);

        g.undo_move();
        assert_eq!(text(&g), "XOXO");
        assert_eq!((&mut g as &mut dyn Game).get_local_hash(), hash_before);
    }

    #[test]
    fn normalize_flips_to_the_smaller_reading() {
        let mut g = TopplingDominoes::from_text("OOX").unwrap();
        let hash_before = (&mut g as &mut dyn Game).get_local_hash();

        g.normalize();
        assert_eq!(text(&g), "XOO");

        g.undo_normalize();
        assert_eq!(text(&g), "OOX");
        assert_eq!((&mut g as &mut dyn Game).get_local_hash(), hash_before);
    }

    #[test]
    fn flipped_rows_hash_equal() {
        let mut a = TopplingDominoes::from_text("XXO").unwrap();
        let mut b = TopplingDominoes::from_text("OXX").unwrap();
        a.normalize();
        b.normalize();
        assert_eq!(
            (&mut a as &mut dyn Game).get_local_hash(),
            (&mut b as &mut dyn Game).get_local_hash()
        );
    }
}
