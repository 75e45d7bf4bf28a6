
//! Fuzzy testing.
//! Tries to discover panics with random and damaged bytes.
//! Every input must produce a clean error, never a panic.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use teemap::prelude::*;

fn valid_map_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    Map::default_map().write_to_buffered(&mut bytes).unwrap();
    bytes
}

/// Pure garbage must be rejected without panicking.
#[test]
fn random_bytes_never_panic() {
    let mut random = StdRng::seed_from_u64(2067);

    for _ in 0 .. 512 {
        let length = random.random_range(0 .. 2048);
        let bytes: Vec<u8> = (0 .. length).map(|_| random.random()).collect();

        assert!(Map::read_from_buffered(bytes.as_slice()).is_err());
    }
}

/// Garbage behind a valid signature and version exercises
/// the table parsers instead of the signature check.
#[test]
fn random_tables_never_panic() {
    let mut random = StdRng::seed_from_u64(2068);

    for _ in 0 .. 512 {
        let length = random.random_range(8 .. 1024);
        let mut bytes: Vec<u8> = (0 .. length).map(|_| random.random()).collect();
        bytes[.. 4].copy_from_slice(b"DATA");
        bytes[4 .. 8].copy_from_slice(&4_i32.to_le_bytes());

        assert!(Map::read_from_buffered(bytes.as_slice()).is_err());
    }
}

/// Single-byte damage to a valid file may decode to something or may
/// error, but must never panic and never violate the map invariants.
#[test]
fn damaged_files_never_panic() {
    let valid = valid_map_bytes();
    let mut random = StdRng::seed_from_u64(2069);

    for _ in 0 .. 1024 {
        let mut bytes = valid.clone();
        let position = random.random_range(0 .. bytes.len());
        bytes[position] = random.random();

        if let Ok(map) = Map::read_from_buffered(bytes.as_slice()) {
            assert!(map.validate().is_ok());
        }
    }
}

/// Truncating a valid file anywhere must error, not panic.
#[test]
fn truncated_files_never_panic() {
    let valid = valid_map_bytes();

    for length in 0 .. valid.len() {
        assert!(Map::read_from_buffered(&valid[.. length]).is_err());
    }
}
