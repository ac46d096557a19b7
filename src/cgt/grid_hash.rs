//! Symmetry-aware hashing for grid games.
//!
//! A grid hash maintains one local hash per enabled orientation out of the
//! eight {rotation × transpose} views of the board, and exposes the minimum
//! across them. Boards that are symmetry-images of each other under any
//! enabled orientation therefore hash equal.

use super::hashing::{Hash, LocalHash};
use super::type_table::GameTypeId;

/// The eight rotation/transpose orientations. The numeric part is the
/// clockwise rotation in degrees; `T` marks a transpose applied after it.
pub const ORIENTATION_0: u8 = 0;
pub const ORIENTATION_0T: u8 = 1;
pub const ORIENTATION_90: u8 = 2;
pub const ORIENTATION_90T: u8 = 3;
pub const ORIENTATION_180: u8 = 4;
pub const ORIENTATION_180T: u8 = 5;
pub const ORIENTATION_270: u8 = 6;
pub const ORIENTATION_270T: u8 = 7;

pub const N_ORIENTATIONS: usize = 8;

const fn bit(ori: u8) -> u8 {
    1 << ori
}

/// All eight orientations: games whose rules are invariant under rotation
/// and reflection (clobber, nogo, amazons).
pub const GRID_HASH_ACTIVE_MASK_ALL: u8 = 0xFF;

/// Only the orientations reachable by mirroring the board vertically,
/// horizontally, or both (domineering, fission).
pub const GRID_HASH_ACTIVE_MASK_MIRRORS: u8 = bit(ORIENTATION_0)
    | bit(ORIENTATION_90T) // vertical flip
    | bit(ORIENTATION_180) // both flips
    | bit(ORIENTATION_270T); // horizontal flip

const OP_ROW_INV: u8 = 1 << 0; // r -> (R - 1) - r
const OP_COL_INV: u8 = 1 << 1; // c -> (C - 1) - c
const OP_SWAP: u8 = 1 << 2; // transpose

/// Coordinate operations for each 90 degree rotation, transposes excluded.
const ROTATION_OPS: [u8; 4] = [
    0,
    OP_ROW_INV | OP_SWAP,
    OP_ROW_INV | OP_COL_INV,
    OP_COL_INV | OP_SWAP,
];

/// Maps a coordinate through an orientation, returning the transformed
/// coordinate and the transformed shape.
fn transform(r: i32, c: i32, shape: (i32, i32), ori: u8) -> ((i32, i32), (i32, i32)) {
    debug_assert!((ori as usize) < N_ORIENTATIONS);
    let ops = ROTATION_OPS[(ori / 2) as usize];
    let (rows, cols) = shape;

    let r = if ops & OP_ROW_INV != 0 { rows - 1 - r } else { r };
    let c = if ops & OP_COL_INV != 0 { cols - 1 - c } else { c };

    let (mut coord, mut out_shape) = if ops & OP_SWAP != 0 {
        ((c, r), (cols, rows))
    } else {
        ((r, c), (rows, cols))
    };

    if ori % 2 == 1 {
        coord = (coord.1, coord.0);
        out_shape = (out_shape.1, out_shape.0);
    }

    (coord, out_shape)
}

fn transformed_shape(shape: (i32, i32), ori: u8) -> (i32, i32) {
    let ops = ROTATION_OPS[(ori / 2) as usize];
    let swapped = (ops & OP_SWAP != 0) != (ori % 2 == 1);
    if swapped { (shape.1, shape.0) } else { shape }
}

/// Checks that the orientation set of a mask is an equivalence class: the
/// composition of any two enabled orientations is again enabled.
fn mask_is_closed(mask: u8) -> bool {
    const PROBE: (i32, i32) = (2, 3);
    let active = (0..N_ORIENTATIONS as u8).filter(|&o| mask & bit(o) != 0);

    let signature = |ori: u8| -> Vec<(i32, i32)> {
        (0..PROBE.0)
            .flat_map(|r| (0..PROBE.1).map(move |c| transform(r, c, PROBE, ori).0))
            .collect()
    };

    for a in active.clone() {
        for b in active.clone() {
            let composed: Vec<(i32, i32)> = (0..PROBE.0)
                .flat_map(|r| {
                    (0..PROBE.1).map(move |c| {
                        let ((r1, c1), s1) = transform(r, c, PROBE, a);
                        transform(r1, c1, s1, b).0
                    })
                })
                .collect();

            let matched = active
                .clone()
                .any(|candidate| signature(candidate) == composed);
            if !matched {
                return false;
            }
        }
    }

    true
}

/// Eight oriented local hashes behind one canonical value.
#[derive(Clone, Debug)]
pub struct GridHash {
    active_mask: u8,
    shape: (i32, i32),
    hashes: [LocalHash; N_ORIENTATIONS],
}

impl GridHash {
    /// Creates a grid hash maintaining the orientations enabled in `mask`.
    /// The identity orientation must be enabled and the mask must be closed
    /// under composition.
    pub fn new(active_mask: u8) -> GridHash {
        assert!(
            active_mask & bit(ORIENTATION_0) != 0,
            "identity orientation must be active"
        );
        assert!(
            mask_is_closed(active_mask),
            "orientation mask {active_mask:#010b} is not closed under composition"
        );

        GridHash {
            active_mask,
            shape: (0, 0),
            hashes: [LocalHash::new(); N_ORIENTATIONS],
        }
    }

    fn is_active(&self, ori: u8) -> bool {
        self.active_mask & bit(ori) != 0
    }

    /// Reinitializes every active orientation for a board of `shape`,
    /// folding the transformed row/col counts into positions 0 and 1.
    pub fn reset(&mut self, shape: (i32, i32)) {
        assert!(shape.0 >= 0 && shape.1 >= 0);
        self.shape = shape;

        for ori in 0..N_ORIENTATIONS as u8 {
            if !self.is_active(ori) {
                continue;
            }
            let (rows, cols) = transformed_shape(shape, ori);
            let hash = &mut self.hashes[ori as usize];
            hash.reset();
            hash.toggle(0, rows);
            hash.toggle(1, cols);
        }
    }

    /// Toggles a (coordinate, value) pair in every active orientation.
    pub fn toggle(&mut self, r: i32, c: i32, value: i32) {
        for ori in 0..N_ORIENTATIONS as u8 {
            if !self.is_active(ori) {
                continue;
            }
            let ((tr, tc), (_, tcols)) = transform(r, c, self.shape, ori);
            let point = tr * tcols + tc;
            self.hashes[ori as usize].toggle(2 + point as usize, value);
        }
    }

    /// Mixes the game type into every active orientation.
    pub fn toggle_type(&mut self, game_type: GameTypeId) {
        for ori in 0..N_ORIENTATIONS as u8 {
            if self.is_active(ori) {
                self.hashes[ori as usize].toggle_type(game_type);
            }
        }
    }

    /// The symmetry-canonical value: the minimum over active orientations.
    pub fn value(&self) -> Hash {
        (0..N_ORIENTATIONS as u8)
            .filter(|&ori| self.is_active(ori))
            .map(|ori| self.hashes[ori as usize].value())
            .min()
            .expect("grid hash has no active orientations")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predefined_masks_are_closed() {
        assert!(mask_is_closed(GRID_HASH_ACTIVE_MASK_ALL));
        assert!(mask_is_closed(GRID_HASH_ACTIVE_MASK_MIRRORS));
        assert!(mask_is_closed(bit(ORIENTATION_0)));
    }

    #[test]
    fn rotation_pair_without_closure_is_rejected() {
        // {identity, 90} composes to 180, which is missing.
        assert!(!mask_is_closed(bit(ORIENTATION_0) | bit(ORIENTATION_90)));
    }

    #[test]
    #[should_panic]
    fn constructor_requires_identity() {
        let _ = GridHash::new(bit(ORIENTATION_180));
    }

    #[test]
    fn transform_round_trips_through_rotations() {
        let shape = (3, 5);
        // Rotating by 90 degrees four times is the identity.
        for r in 0..3 {
            for c in 0..5 {
                let (mut coord, mut s) = ((r, c), shape);
                for _ in 0..4 {
                    let out = transform(coord.0, coord.1, s, ORIENTATION_90);
                    coord = out.0;
                    s = out.1;
                }
                assert_eq!(coord, (r, c));
                assert_eq!(s, shape);
            }
        }
    }

    #[test]
    fn equal_boards_in_different_orientations_hash_equal() {
        // A 1x3 board [X, O, .] against its 180-degree image [., O, X].
        let mut a = GridHash::new(GRID_HASH_ACTIVE_MASK_ALL);
        a.reset((1, 3));
        a.toggle(0, 0, 0);
        a.toggle(0, 1, 1);
        a.toggle(0, 2, 2);

        let mut b = GridHash::new(GRID_HASH_ACTIVE_MASK_ALL);
        b.reset((1, 3));
        b.toggle(0, 0, 2);
        b.toggle(0, 1, 1);
        b.toggle(0, 2, 0);

        assert_eq!(a.value(), b.value());

        // And against its transpose, a 3x1 column.
        let mut c = GridHash::new(GRID_HASH_ACTIVE_MASK_ALL);
        c.reset((3, 1));
        c.toggle(0, 0, 0);
        c.toggle(1, 0, 1);
        c.toggle(2, 0, 2);

        assert_eq!(a.value(), c.value());
    }

    #[test]
    fn mirror_mask_ignores_rotations() {
        // Under the mirror mask a row and its reversal hash equal...
        let mut a = GridHash::new(GRID_HASH_ACTIVE_MASK_MIRRORS);
        a.reset((1, 2));
        a.toggle(0, 0, 0);
        a.toggle(0, 1, 2);

        let mut b = GridHash::new(GRID_HASH_ACTIVE_MASK_MIRRORS);
        b.reset((1, 2));
        b.toggle(0, 0, 2);
        b.toggle(0, 1, 0);

        assert_eq!(a.value(), b.value());

        // ...but its transpose hashes differently.
        let mut c = GridHash::new(GRID_HASH_ACTIVE_MASK_MIRRORS);
        c.reset((2, 1));
        c.toggle(0, 0, 0);
        c.toggle(1, 0, 2);

        assert_ne!(a.value(), c.value());
    }
}
