use std::process::exit;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::Parser;
use flexi_logger::{AdaptiveFormat, Logger, WriteMode};
use lib_mcgs::prelude::*;

#[derive(Clone, Debug, Parser)]
struct Options {
    #[arg(short, long)]
    log_level: Option<String>,

    /// Player to solve for: B, W, or "both" for the outcome class.
    #[arg(short, long, default_value = "both")]
    player: String,

    /// Search budget in milliseconds; unlimited when absent.
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Disable the transposition table.
    #[arg(long, default_value_t = false)]
    no_table: bool,

    /// Skip the stable pre-sort of the sub-games.
    #[arg(long, default_value_t = false)]
    no_presort: bool,

    /// Seed for the zobrist random table.
    #[arg(long)]
    seed: Option<u64>,

    /// Expected result; exits nonzero on mismatch.
    #[arg(short, long)]
    expect: Option<String>,

    /// Sub-games of the sum, each as name:board, e.g. clobber_1xn:XOXO.
    #[arg(required = true)]
    games: Vec<String>,
}

impl Options {
    fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            timeout: self.timeout_ms.map(Duration::from_millis),
            use_table: !self.no_table,
            presort: !self.no_presort,
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let options = Options::parse();
    let _logger =
        Logger::try_with_env_or_str(options.log_level.clone().unwrap_or("info".into()).as_str())?
            .write_mode(WriteMode::BufferAndFlush)
            .log_to_stderr()
            .adaptive_format_for_stderr(match cfg!(debug_assertions) {
                true => AdaptiveFormat::WithThread,
                _ => AdaptiveFormat::Default,
            })
            .start()?;

    if let Some(seed) = options.seed {
        lib_mcgs::cgt::hashing::set_seed(seed);
    }
    init();

    let mut sum = SumGame::new(Player::Black);
    for spec in &options.games {
        sum.add(parse_game(spec)?);
    }

    let abort = Arc::new(AtomicBool::new(false));
    let mut solver = Solver::new(options.solver_config()).with_abort(abort);

    let answer = match options.player.as_str() {
        "both" | "BW" => {
            let outcome = solver.solve_outcome(&mut sum);
            println!("{sum}");
            println!("outcome class: {}", outcome.notate());
            outcome.notate()
        }
        p => {
            let player = Player::parse(p)?;
            let result = solver.solve_for(&mut sum, player);
            let text = match result {
                SolveResult::Win => "win",
                SolveResult::Loss => "loss",
                SolveResult::Unknown => "unknown",
            };
            println!("{sum}");
            println!("{} moving first: {text}", player.notate());
            text.into()
        }
    };

    if let Some(expected) = &options.expect
        && expected != &answer
    {
        log::error!("expected {expected}, solved {answer}");
        exit(1);
    }

    Ok(())
}
