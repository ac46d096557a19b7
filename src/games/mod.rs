/*
 *  The concrete game catalogue.
 */

pub mod amazons;
pub mod clobber;
pub mod clobber_1xn;
pub mod domineering;
pub mod elephants;
pub mod nogo_1xn;
pub mod toppling_dominoes;

use std::sync::Once;

use regex::Regex;

use crate::cgt::prelude::*;

pub use amazons::Amazons;
pub use clobber::Clobber;
pub use clobber_1xn::Clobber1xn;
pub use domineering::Domineering;
pub use elephants::Elephants;
pub use nogo_1xn::Nogo1xn;
pub use toppling_dominoes::TopplingDominoes;

/// Registers the grid-symmetry masks and locks the type table. Idempotent;
/// the grid games call it themselves before their first mask lookup.
pub fn init() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        type_table::set_grid_hash_mask::<Clobber>(GRID_HASH_ACTIVE_MASK_ALL);
        type_table::set_grid_hash_mask::<Amazons>(GRID_HASH_ACTIVE_MASK_ALL);
        type_table::set_grid_hash_mask::<Domineering>(GRID_HASH_ACTIVE_MASK_MIRRORS);
        type_table::lock();
    });
}

/// Parses a game specification of the form `name:board`, e.g.
/// `clobber_1xn:XOXO` or `domineering:..|..`.
pub fn parse_game(spec: &str) -> Result<Box<dyn Game>> {
    let pattern = Regex::new("^(?<name>[a-z0-9_]+):(?<board>.*)$")?;
    let Some(captures) = pattern.captures(spec.trim()) else {
        return Err(anyhow!("could not parse game specification {spec:?}"));
    };

    let name = captures.name("name").unwrap().as_str();
    let board = captures.name("board").unwrap().as_str();

    let game: Box<dyn Game> = match name {
        "amazons" => Box::new(Amazons::from_text(board)?),
        "clobber" => Box::new(Clobber::from_text(board)?),
        "clobber_1xn" => Box::new(Clobber1xn::from_text(board)?),
        "domineering" => Box::new(Domineering::from_text(board)?),
        "elephants" => Box::new(Elephants::from_text(board)?),
        "nogo_1xn" => Box::new(Nogo1xn::from_text(board)?),
        "toppling_dominoes" => Box::new(TopplingDominoes::from_text(board)?),
        _ => return Err(anyhow!("unknown game {name}")),
    };

    Ok(game)
}

pub mod prelude {
    pub use super::{
        Amazons, Clobber, Clobber1xn, Domineering, Elephants, Nogo1xn, TopplingDominoes, init,
        parse_game,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_through_display() {
        for spec in [
            "clobber_1xn:XOXO",
            "nogo_1xn:.X.O.",
            "elephants:X.O",
            "toppling_dominoes:XO#",
            "clobber:XO|.X",
            "domineering:..|..",
            "amazons:X..|...|..O",
        ] {
            let game = parse_game(spec).unwrap();
            assert_eq!(game.to_string(), spec);
        }
    }

    #[test]
    fn parse_rejects_unknown_names_and_bad_boards() {
        assert!(parse_game("chess:XO").is_err());
        assert!(parse_game("clobber_1xn:XZ").is_err());
        assert!(parse_game("no-colon").is_err());
    }
}
