
//! The per-cell records of tile layers. The primary grid stores four
//! bytes per cell; the aux grids of the special layers store their own
//! record shapes. All grids are row-major, `width * height` cells.

use bit_field::BitField;
use crate::error::{Error, Result};

/// A record that occupies a fixed number of bytes per grid cell.
pub trait CellData: Sized + Default + Clone {

    /// Number of bytes one cell occupies in its blob.
    const BYTE_SIZE: usize;

    /// Decode one cell. The slice is exactly `BYTE_SIZE` long.
    fn from_bytes(bytes: &[u8]) -> Self;

    /// Append the encoded cell to a blob.
    fn write_bytes(&self, blob: &mut Vec<u8>);
}

/// Decode a whole grid from an inflated blob,
/// validating the blob against the cell count of the layer.
pub fn grid_from_bytes<T: CellData>(
    bytes: &[u8], cell_count: usize, array: &'static str,
) -> Result<Vec<T>> {
    if bytes.len() / T::BYTE_SIZE != cell_count || bytes.len() % T::BYTE_SIZE != 0 {
        return Err(Error::InvalidLayerSize {
            array, expected: cell_count,
            actual: bytes.len() / T::BYTE_SIZE,
        });
    }

    Ok(bytes.chunks_exact(T::BYTE_SIZE).map(T::from_bytes).collect())
}

/// Encode a whole grid into a blob ready for compression.
pub fn grid_to_bytes<T: CellData>(cells: &[T]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(cells.len() * T::BYTE_SIZE);
    for cell in cells { cell.write_bytes(&mut bytes); }
    bytes
}

/// One cell of the primary grid of any tile layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tile {

    /// Position of the tile graphic in its 16x16 tileset,
    /// or the game tile semantic for game-flagged layers.
    pub index: u8,

    /// Mirror and rotation bits, see the accessors.
    pub flags: u8,

    /// Run length used by the client renderer. Passed through verbatim.
    pub skip: u8,

    /// Unused in the current format. Passed through verbatim.
    pub reserved: u8,
}

impl Tile {

    /// A tile showing only this tileset index, with no flags.
    pub fn with_index(index: u8) -> Self {
        Tile { index, .. Self::default() }
    }

    /// Whether the tile graphic is flipped along the vertical axis.
    pub fn vflip(&self) -> bool { self.flags.get_bit(0) }

    /// Whether the tile graphic is flipped along the horizontal axis.
    pub fn hflip(&self) -> bool { self.flags.get_bit(1) }

    /// Whether the renderer may treat the tile as fully opaque.
    pub fn opaque(&self) -> bool { self.flags.get_bit(2) }

    /// Whether the tile graphic is rotated by 90 degrees.
    pub fn rotated(&self) -> bool { self.flags.get_bit(3) }

    /// Column and row of the tile graphic in its 16x16 tileset.
    pub fn coords(&self) -> (u8, u8) {
        (self.index % 16, self.index / 16)
    }
}

impl CellData for Tile {
    const BYTE_SIZE: usize = 4;

    fn from_bytes(bytes: &[u8]) -> Self {
        Tile { index: bytes[0], flags: bytes[1], skip: bytes[2], reserved: bytes[3] }
    }

    fn write_bytes(&self, blob: &mut Vec<u8>) {
        blob.extend_from_slice(&[self.index, self.flags, self.skip, self.reserved]);
    }
}

/// One cell of a tele layer: teleporter number and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeleTile {

    /// Which teleporter channel this cell belongs to.
    pub number: u8,

    /// The tele tile index, e.g. `TILE_TELEIN` or `TILE_TELEOUT`.
    pub kind: u8,
}

impl CellData for TeleTile {
    const BYTE_SIZE: usize = 2;

    fn from_bytes(bytes: &[u8]) -> Self {
        TeleTile { number: bytes[0], kind: bytes[1] }
    }

    fn write_bytes(&self, blob: &mut Vec<u8>) {
        blob.extend_from_slice(&[self.number, self.kind]);
    }
}

/// One cell of a speedup layer. Six bytes per cell on disk,
/// with one padding byte before the little-endian angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpeedupTile {

    /// Acceleration applied to the player.
    pub force: u8,

    /// Velocity cap, zero for none.
    pub max_speed: u8,

    /// The speedup tile index.
    pub kind: u8,

    /// Push direction in degrees.
    pub angle: i16,
}

impl CellData for SpeedupTile {
    const BYTE_SIZE: usize = 6;

    fn from_bytes(bytes: &[u8]) -> Self {
        SpeedupTile {
            force: bytes[0],
            max_speed: bytes[1],
            kind: bytes[2],
            angle: i16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }

    fn write_bytes(&self, blob: &mut Vec<u8>) {
        blob.extend_from_slice(&[self.force, self.max_speed, self.kind, 0]);
        blob.extend_from_slice(&self.angle.to_le_bytes());
    }
}

/// One cell of a switch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchTile {

    /// Which switch channel this cell toggles.
    pub number: u8,

    /// The switch tile index.
    pub kind: u8,

    /// Mirror and rotation bits, as in [`Tile::flags`].
    pub flags: u8,

    /// Activation delay in seconds.
    pub delay: u8,
}

impl CellData for SwitchTile {
    const BYTE_SIZE: usize = 4;

    fn from_bytes(bytes: &[u8]) -> Self {
        SwitchTile { number: bytes[0], kind: bytes[1], flags: bytes[2], delay: bytes[3] }
    }

    fn write_bytes(&self, blob: &mut Vec<u8>) {
        blob.extend_from_slice(&[self.number, self.kind, self.flags, self.delay]);
    }
}

/// One cell of a tune layer: tuning zone number and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TuneTile {

    /// Which tuning zone this cell belongs to.
    pub number: u8,

    /// The tune tile index.
    pub kind: u8,
}

impl CellData for TuneTile {
    const BYTE_SIZE: usize = 2;

    fn from_bytes(bytes: &[u8]) -> Self {
        TuneTile { number: bytes[0], kind: bytes[1] }
    }

    fn write_bytes(&self, blob: &mut Vec<u8>) {
        blob.extend_from_slice(&[self.number, self.kind]);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tile_flags() {
        let tile = Tile { index: 17, flags: 0b1010, skip: 0, reserved: 0 };
        assert!(!tile.vflip());
        assert!(tile.hflip());
        assert!(!tile.opaque());
        assert!(tile.rotated());
        assert_eq!(tile.coords(), (1, 1));
    }

    #[test]
    fn grid_roundtrip() {
        let cells = vec![
            Tile::with_index(0),
            Tile { index: 1, flags: 3, skip: 5, reserved: 9 },
            Tile::with_index(255),
            Tile::default(),
        ];

        let bytes = grid_to_bytes(&cells);
        assert_eq!(bytes.len(), 16);
        assert_eq!(grid_from_bytes::<Tile>(&bytes, 4, "tiles").unwrap(), cells);
    }

    #[test]
    fn mis_sized_grid() {
        let result = grid_from_bytes::<TeleTile>(&[0; 6], 4, "tele");
        assert!(matches!(
            result,
            Err(Error::InvalidLayerSize { array: "tele", expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn speedup_angle_survives() {
        let cell = SpeedupTile { force: 12, max_speed: 0, kind: 28, angle: -90 };
        let bytes = grid_to_bytes(&[cell]);
        assert_eq!(bytes.len(), 6);
        assert_eq!(bytes[3], 0);
        assert_eq!(grid_from_bytes::<SpeedupTile>(&bytes, 1, "speedup").unwrap(), vec![cell]);
    }
}
