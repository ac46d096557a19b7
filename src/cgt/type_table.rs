//! Run-time metadata for concrete game types.
//!
//! Every concrete game gets a dense type id and a serializer id, assigned
//! lazily the first time the type is seen. Grid symmetry masks must be
//! registered explicitly during initialization; after [`lock`] is called
//! any further mask registration is a programmer error.

use std::any::{TypeId, type_name};
use std::sync::{LazyLock, Mutex};

use crate::utils::prelude::*;

pub type GameTypeId = u32;
pub type SerializerId = u32;

#[derive(Clone, Copy, Debug, Default)]
struct TypeEntry {
    game_type: GameTypeId,
    serializer_id: SerializerId,
    grid_hash_mask: u8,
}

#[derive(Default)]
struct TypeTable {
    entries: FxHashMap<TypeId, TypeEntry>,
    next_game_type: GameTypeId,
    next_serializer_id: SerializerId,
    locked: bool,
}

impl TypeTable {
    fn entry(&mut self, key: TypeId) -> &mut TypeEntry {
        self.entries.entry(key).or_default()
    }
}

static TABLE: LazyLock<Mutex<TypeTable>> = LazyLock::new(|| Mutex::new(TypeTable::default()));

/// The dense type id for `T`, assigned on first use. Ids start at 1 so a
/// zero id is always detectable as uninitialized.
pub fn game_type<T: 'static>() -> GameTypeId {
    let mut table = TABLE.lock().expect("type table lock poisoned");
    let key = TypeId::of::<T>();

    if table.entry(key).game_type == 0 {
        table.next_game_type += 1;
        let id = table.next_game_type;
        table.entry(key).game_type = id;
        log::debug!("assigned game type {id} to {}", type_name::<T>());
    }

    table.entries[&key].game_type
}

/// The serializer id for `T`, assigned on first use.
pub fn serializer_id<T: 'static>() -> SerializerId {
    let mut table = TABLE.lock().expect("type table lock poisoned");
    let key = TypeId::of::<T>();

    if table.entry(key).serializer_id == 0 {
        table.next_serializer_id += 1;
        let id = table.next_serializer_id;
        table.entry(key).serializer_id = id;
    }

    table.entries[&key].serializer_id
}

/// Registers the grid-hash orientation mask for `T`. Only legal before
/// [`lock`], and only once per type.
pub fn set_grid_hash_mask<T: 'static>(mask: u8) {
    let mut table = TABLE.lock().expect("type table lock poisoned");

    assert!(
        !table.locked,
        "grid hash mask for {} registered after type table lock",
        type_name::<T>()
    );

    let entry = table.entry(TypeId::of::<T>());
    assert_eq!(
        entry.grid_hash_mask,
        0,
        "grid hash mask for {} registered twice",
        type_name::<T>()
    );
    entry.grid_hash_mask = mask;
}

/// The registered grid-hash mask for `T`. The table must be locked and the
/// mask registered; anything else is a programmer error.
pub fn grid_hash_mask<T: 'static>() -> u8 {
    let mut table = TABLE.lock().expect("type table lock poisoned");

    assert!(table.locked, "type table queried before initialization");
    let mask = table.entry(TypeId::of::<T>()).grid_hash_mask;
    assert_ne!(mask, 0, "no grid hash mask registered for {}", type_name::<T>());
    mask
}

/// Locks explicitly-initialized fields. Lazily assigned ids keep working.
pub fn lock() {
    TABLE.lock().expect("type table lock poisoned").locked = true;
}

pub fn is_locked() -> bool {
    TABLE.lock().expect("type table lock poisoned").locked
}
