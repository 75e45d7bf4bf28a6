
//! Read and write Teeworlds and DDNet map files.
//!
//! A map file is a container of typed items and a pool of
//! independently compressed blobs. This crate decodes that container
//! into a logical [`map::Map`], validates its structural invariants,
//! and encodes a map back into a file the game client accepts.
//!
//! ```
//! use teemap::prelude::*;
//!
//! let map = Map::default_map();
//!
//! let mut bytes = Vec::new();
//! map.write_to_buffered(&mut bytes).unwrap();
//!
//! let reloaded = Map::read_from_buffered(bytes.as_slice()).unwrap();
//! assert_eq!(reloaded.game_layer().unwrap().tiles, map.game_layer().unwrap().tiles);
//! ```

#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused_extern_crates,
    unused,

    missing_copy_implementations,
    missing_debug_implementations,

    clippy::all,
    clippy::pedantic,
)]

#![deny(
    unused_variables,
    unused_assignments,
    dead_code,
    unused_must_use,
    trivial_numeric_casts,
    redundant_semicolons
)]

#![forbid(unsafe_code)]

pub mod io;
pub mod error;
pub mod compress;
pub mod text;
pub mod datafile;
pub mod map;
pub mod decode;
pub mod encode;
pub mod validate;
pub mod entities;

/// Re-exports of the types commonly required
/// for simple reading and writing of a map.
pub mod prelude {

    // main exports
    pub use crate::map::Map;
    pub use crate::map::{Info, Image, Group, Layer, TileLayer, TileLayerKind, QuadLayer, SoundLayer, Quad, Envelope, Envpoint};
    pub use crate::map::tiles::{Tile, TeleTile, SpeedupTile, SwitchTile, TuneTile};

    // secondary modules
    pub use crate::entities;
    pub use crate::error::{Error, Result, UnitResult};
}
