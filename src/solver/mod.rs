//! The alternating-play search driver.
//!
//! `win_for` is a boolean negamax over the sum: the player to move wins iff
//! some move in some sub-game leads to a position the opponent loses. A
//! player with no legal move anywhere loses immediately.

mod ttable;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

pub use ttable::{TableEntry, TranspositionTable};

use crate::cgt::prelude::*;

/// The answer of a single-player solve. `Unknown` is the normal return for
/// a search cut short by the deadline or the abort flag; the sum-game is
/// guaranteed to be back in its entry state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveResult {
    Win,
    Loss,
    Unknown,
}

#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Wall-clock budget for one solve; `None` searches to completion.
    pub timeout: Option<Duration>,
    /// Whether to keep a transposition table across the search.
    pub use_table: bool,
    /// Stable-sort the sub-games by the `order` contract on entry.
    pub presort: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            timeout: None,
            use_table: true,
            presort: true,
        }
    }
}

pub struct Solver {
    config: SolverConfig,
    table: Option<TranspositionTable>,
    abort: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
    nodes: u64,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Solver {
        let table = config.use_table.then(TranspositionTable::new);
        Solver {
            config,
            table,
            abort: None,
            deadline: None,
            nodes: 0,
        }
    }

    /// Installs an abort flag an external signal handler may set.
    pub fn with_abort(mut self, abort: Arc<AtomicBool>) -> Solver {
        self.abort = Some(abort);
        self
    }

    /// Nodes visited by the most recent solve.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Decides whether `player` wins the sum moving first.
    pub fn solve_for(&mut self, sum: &mut SumGame, player: Player) -> SolveResult {
        self.deadline = self.config.timeout.map(|t| Instant::now() + t);
        self.nodes = 0;

        sum.set_to_play(player);
        if self.config.presort && sum.num_moves_played() == 0 {
            sum.sort_games();
        }

        let entry_hash = sum.global_hash();
        let entry_games = sum.num_total_games();

        let result = match self.win_for(sum) {
            Some(true) => SolveResult::Win,
            Some(false) => SolveResult::Loss,
            None => SolveResult::Unknown,
        };

        // Every play is matched by an undo, deadline or not.
        assert_eq!(sum.global_hash(), entry_hash);
        assert_eq!(sum.num_total_games(), entry_games);

        log::debug!(
            "solve for {}: {result:?} after {} nodes",
            player.notate(),
            self.nodes
        );
        result
    }

    /// The outcome class of the sum: solves for both players.
    pub fn solve_outcome(&mut self, sum: &mut SumGame) -> OutcomeClass {
        let black = self.solve_for(sum, Player::Black);
        let white = self.solve_for(sum, Player::White);

        match (black, white) {
            (SolveResult::Unknown, _) | (_, SolveResult::Unknown) => OutcomeClass::U,
            (SolveResult::Win, SolveResult::Win) => OutcomeClass::N,
            (SolveResult::Loss, SolveResult::Loss) => OutcomeClass::P,
            (SolveResult::Win, SolveResult::Loss) => OutcomeClass::L,
            (SolveResult::Loss, SolveResult::Win) => OutcomeClass::R,
        }
    }

    /// Whether the player to move wins; `None` when the search was cut off.
    fn win_for(&mut self, sum: &mut SumGame) -> Option<bool> {
        if self.cancelled() {
            return None;
        }
        self.nodes += 1;

        let to_play = sum.to_play();
        let hash = sum.global_hash();

        let mut wrote_marker = false;
        if let Some(table) = &mut self.table {
            match table.probe(hash, to_play) {
                Some(TableEntry::Win) => return Some(true),
                Some(TableEntry::Loss) => return Some(false),
                // A repetition of a node on the current path: treat as a
                // conservative loss and leave the marker alone.
                Some(TableEntry::InProgress) => return Some(false),
                None => {
                    table.store(hash, to_play, TableEntry::InProgress);
                    wrote_marker = true;
                }
            }
        }

        let mut win = false;
        'subgames: for index in 0..sum.num_total_games() {
            let mut generator = sum.game(index).create_move_generator(to_play);

            while generator.is_valid() {
                if self.cancelled() {
                    if wrote_marker {
                        self.table.as_mut().unwrap().retract(hash, to_play);
                    }
                    return None;
                }

                let mov = generator.gen_move();
                sum.play(SumMove { index, mov });
                let opponent_wins = self.win_for(sum);
                sum.undo();

                match opponent_wins {
                    None => {
                        if wrote_marker {
                            self.table.as_mut().unwrap().retract(hash, to_play);
                        }
                        return None;
                    }
                    Some(false) => {
                        win = true;
                        break 'subgames;
                    }
                    Some(true) => {}
                }

                generator.advance();
            }
        }

        if let Some(table) = &mut self.table {
            let entry = if win { TableEntry::Win } else { TableEntry::Loss };
            table.store(hash, to_play, entry);
        }
        Some(win)
    }

    fn cancelled(&self) -> bool {
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return true;
        }
        if let Some(abort) = &self.abort
            && abort.load(AtomicOrdering::Relaxed)
        {
            return true;
        }
        false
    }
}

impl SumGame {
    /// Solves the sum for `player` with default settings.
    pub fn solve(&mut self, player: Player) -> SolveResult {
        Solver::new(SolverConfig::default()).solve_for(self, player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::parse_game;

    fn sum_of(specs: &[&str]) -> SumGame {
        let mut sum = SumGame::new(Player::Black);
        for spec in specs {
            sum.add(parse_game(spec).unwrap());
        }
        sum
    }

    fn outcome(specs: &[&str]) -> OutcomeClass {
        Solver::new(SolverConfig::default()).solve_outcome(&mut sum_of(specs))
    }

    #[test]
    fn empty_nogo_loses_for_whoever_moves() {
        // S1: no moves at all, so the player to move loses.
        assert_eq!(outcome(&["nogo_1xn:"]), OutcomeClass::P);
    }

    #[test]
    fn clobber_xo_wins_for_the_first_player() {
        // S2: Black clobbers 1-2 leaving ".X"; White is stuck.
        let mut sum = sum_of(&["clobber_1xn:XO"]);
        assert_eq!(sum.solve(Player::Black), SolveResult::Win);
        assert_eq!(outcome(&["clobber_1xn:XO"]), OutcomeClass::N);
    }

    #[test]
    fn blocked_elephants_lose_for_both() {
        // S3: neither stone has an empty cell to step into.
        assert_eq!(outcome(&["elephants:XO"]), OutcomeClass::P);
    }

    #[test]
    fn dead_nogo_position_loses_for_both() {
        // S4: "X.O" splits into two dead pieces; neither player can move.
        assert_eq!(outcome(&["nogo_1xn:X.O"]), OutcomeClass::P);
    }

    #[test]
    fn domineering_2x2_is_an_n_position() {
        // S5: whoever starts fills their lane and leaves the opponent dry.
        assert_eq!(outcome(&["domineering:..|.."]), OutcomeClass::N);
    }

    #[test]
    fn star_plus_star_cancels() {
        // clobber "XO" is a single-switch star; the sum of two is a
        // second-player win.
        assert_eq!(outcome(&["clobber_1xn:XO", "clobber_1xn:XO"]), OutcomeClass::P);
    }

    #[test]
    fn one_sided_games_classify_as_l_and_r() {
        assert_eq!(outcome(&["clobber_1xn:XXO"]), OutcomeClass::L);
        assert_eq!(outcome(&["elephants:X.."]), OutcomeClass::L);
        assert_eq!(outcome(&["elephants:..O"]), OutcomeClass::R);
    }

    #[test]
    fn splits_during_search_stay_sound() {
        // Black's only placement in "X..O" leaves "XX.O", which splits into
        // dead pieces mid-search and strands White.
        let mut sum = sum_of(&["nogo_1xn:X..O"]);
        let games_before = sum.num_total_games();
        let hash_before = sum.global_hash();

        let result = sum.solve(Player::Black);
        assert_eq!(result, SolveResult::Win);
        assert_eq!(sum.num_total_games(), games_before);
        assert_eq!(sum.global_hash(), hash_before);
    }

    #[test]
    fn toppling_single_domino_is_a_first_player_win_for_its_owner() {
        assert_eq!(outcome(&["toppling_dominoes:X"]), OutcomeClass::L);
        assert_eq!(outcome(&["toppling_dominoes:O"]), OutcomeClass::R);
        // A grey domino is a move for both.
        assert_eq!(outcome(&["toppling_dominoes:#"]), OutcomeClass::N);
    }

    #[test]
    fn amazons_lone_queen_wins_alone() {
        assert_eq!(outcome(&["amazons:X.."]), OutcomeClass::L);
    }

    #[test]
    fn zero_timeout_returns_unknown_and_restores() {
        let config = SolverConfig {
            timeout: Some(Duration::ZERO),
            ..SolverConfig::default()
        };

        let mut sum = sum_of(&["clobber_1xn:XOXOXO"]);
        let hash_before = sum.global_hash();

        let result = Solver::new(config).solve_for(&mut sum, Player::Black);
        assert_eq!(result, SolveResult::Unknown);
        assert_eq!(sum.global_hash(), hash_before);
        assert_eq!(sum.num_moves_played(), 0);
    }

    #[test]
    fn abort_flag_cancels_the_search() {
        let abort = Arc::new(AtomicBool::new(true));
        let mut solver = Solver::new(SolverConfig::default()).with_abort(abort);

        let mut sum = sum_of(&["clobber_1xn:XOXO"]);
        assert_eq!(solver.solve_for(&mut sum, Player::Black), SolveResult::Unknown);
    }

    #[test]
    fn transposition_table_keeps_answers_between_solves() {
        let mut solver = Solver::new(SolverConfig::default());
        let mut sum = sum_of(&["clobber_1xn:XOXO"]);

        let first = solver.solve_for(&mut sum, Player::Black);
        let nodes_first = solver.nodes();

        let second = solver.solve_for(&mut sum, Player::Black);
        assert_eq!(first, second);
        assert!(solver.nodes() < nodes_first);
    }

    #[test]
    fn disabling_the_table_changes_nothing_observable() {
        let config = SolverConfig {
            use_table: false,
            ..SolverConfig::default()
        };
        let mut sum = sum_of(&["clobber_1xn:XOXO", "nogo_1xn:.X.O."]);
        let with_table = sum.solve(Player::Black);
        let without = Solver::new(config).solve_for(&mut sum, Player::Black);
        assert_eq!(with_table, without);
    }
}
