
//! The item catalog of a map file. Items of one type occupy one
//! contiguous index range; the payload of every item is a packed
//! stream of little-endian `i32`s whose schema depends on the type.

use crate::io::*;
use crate::error::{Error, Result, UnitResult};

/// Item type ids as stored in the item preamble and the type table.
pub mod item_type {

    /// The mandatory version item, a single integer.
    pub const VERSION: i32 = 0;

    /// Optional map metadata: author, version, credits, license, settings.
    pub const INFO: i32 = 1;

    /// One item per image.
    pub const IMAGE: i32 = 2;

    /// One item per animation envelope.
    pub const ENVELOPE: i32 = 3;

    /// One item per group.
    pub const GROUP: i32 = 4;

    /// One item per layer, all groups sharing one contiguous range.
    pub const LAYER: i32 = 5;

    /// A single item holding every envpoint of the map.
    pub const ENVPOINT: i32 = 6;
}

/// Layer type ids, the first dispatch tag inside a layer item.
pub mod layer_type {

    /// A grid of tiles, possibly carrying an aux tile array.
    pub const TILES: i32 = 2;

    /// Free-floating textured quads.
    pub const QUADS: i32 = 3;

    /// A deprecated sound layer layout. Skipped when read.
    pub const SOUNDS_DEPRECATED: i32 = 9;

    /// Positional audio sources.
    pub const SOUNDS: i32 = 10;
}

/// One entry of the item type table: where the items
/// of one type live in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemTypeEntry {

    /// The type all items of this range share.
    pub type_id: i32,

    /// Catalog index of the first item of this type.
    pub start: usize,

    /// Number of items of this type.
    pub count: usize,
}

/// All items of a map file, with the offset table
/// that addresses their payloads.
#[derive(Debug)]
pub struct ItemTable {
    types: Vec<ItemTypeEntry>,
    offsets: Vec<i32>,
    bytes: Vec<u8>,
}

impl ItemTable {

    /// Bundle the parsed tables with the raw item region.
    pub fn new(types: Vec<ItemTypeEntry>, offsets: Vec<i32>, bytes: Vec<u8>) -> Self {
        ItemTable { types, offsets, bytes }
    }

    /// Number of items in the catalog.
    pub fn item_count(&self) -> usize {
        self.offsets.len()
    }

    /// The `(start, count)` range of a type,
    /// or `(0, 0)` when the file has no items of that type.
    pub fn range(&self, type_id: i32) -> (usize, usize) {
        self.types.iter()
            .find(|entry| entry.type_id == type_id)
            .map(|entry| (entry.start, entry.count))
            .unwrap_or((0, 0))
    }

    /// The payload of the item at the specified catalog index,
    /// as the integer stream it is. The 8-byte preamble is skipped;
    /// the payload size is the delta to the next item's offset.
    pub fn payload_ints(&self, index: usize) -> Result<Vec<i32>> {
        if index >= self.offsets.len() {
            return Err(Error::ItemIndexOutOfRange { index, count: self.offsets.len() });
        }

        let start = i32_to_usize(self.offsets[index])? + 8;
        let end = match self.offsets.get(index + 1) {
            Some(&next) => i32_to_usize(next)?,
            None => self.bytes.len(),
        };

        if start > end || end > self.bytes.len() {
            return Err(Error::TruncatedFile);
        }

        bytes_to_ints(&self.bytes[start .. end])
    }

    /// The payload of the `nth` item of a type,
    /// or `None` when the type has fewer items than that.
    pub fn find(&self, type_id: i32, nth: usize) -> Result<Option<Vec<i32>>> {
        let (start, count) = self.range(type_id);

        if nth < count { self.payload_ints(start + nth).map(Some) }
        else { Ok(None) }
    }
}

/// An item about to be written, still unordered.
/// [`super::write_datafile`] sorts and serializes these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatafileItem {

    /// Determines the payload schema.
    pub type_id: i32,

    /// Position among the items of the same type.
    pub id: i32,

    /// The payload integers.
    pub ints: Vec<i32>,
}

impl DatafileItem {

    /// Byte count of this item in the file, preamble included.
    pub fn byte_size(&self) -> usize {
        8 + self.ints.len() * i32::BYTE_SIZE
    }

    /// Write preamble and payload to the byte stream.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        ((self.type_id << 16) | self.id).write(write)?;
        usize_to_i32(self.ints.len() * i32::BYTE_SIZE).write(write)?;
        i32::write_slice(write, &self.ints)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn example_table() -> ItemTable {
        // two items: type 0 with one integer, type 6 with two
        let mut bytes = Vec::new();

        DatafileItem { type_id: 0, id: 0, ints: vec![1] }.write(&mut bytes).unwrap();
        DatafileItem { type_id: 6, id: 0, ints: vec![-3, 12] }.write(&mut bytes).unwrap();

        ItemTable::new(
            vec![
                ItemTypeEntry { type_id: 0, start: 0, count: 1 },
                ItemTypeEntry { type_id: 6, start: 1, count: 1 },
            ],
            vec![0, 12],
            bytes,
        )
    }

    #[test]
    fn payloads_by_offset() {
        let table = example_table();
        assert_eq!(table.item_count(), 2);
        assert_eq!(table.payload_ints(0).unwrap(), vec![1]);
        assert_eq!(table.payload_ints(1).unwrap(), vec![-3, 12]);
    }

    #[test]
    fn find_by_type() {
        let table = example_table();
        assert_eq!(table.find(6, 0).unwrap(), Some(vec![-3, 12]));
        assert_eq!(table.find(6, 1).unwrap(), None);
        assert_eq!(table.find(2, 0).unwrap(), None);
        assert_eq!(table.range(2), (0, 0));
    }

    #[test]
    fn out_of_range_item() {
        let table = example_table();
        assert!(matches!(
            table.payload_ints(2),
            Err(Error::ItemIndexOutOfRange { index: 2, count: 2 })
        ));
    }
}
