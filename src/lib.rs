/*
 *  A solver for sums of combinatorial games.
 */

pub mod cgt;
pub mod games;
pub mod solver;

pub mod utils {
    pub mod prelude {
        pub use anyhow::{Context, Error, anyhow, bail, ensure};
        pub type Result<T> = anyhow::Result<T, Error>;
        pub use rustc_hash::{FxHashMap, FxHashSet};
    }
}

pub mod prelude {
    pub use super::cgt::prelude::*;
    pub use super::games::prelude::*;
    pub use super::solver::*;
    pub use super::utils::prelude::*;
}
