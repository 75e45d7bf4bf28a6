
//! The container layer of a map file: signature, header, the item
//! catalog and the compressed raw-data pool. This module knows nothing
//! about what the items mean; `decode` and `encode` give them meaning.

pub mod items;
pub mod blobs;

use crate::io::*;
use crate::error::{Error, Result, UnitResult};
use self::items::{ItemTable, ItemTypeEntry, DatafileItem};
use self::blobs::{BlobPool, DatafileBlob};


/// The first four bytes of each map file.
/// Used to abort reading non-map files.
pub mod signature {
    use super::*;

    /// The first four bytes of each map file.
    pub const BYTES: [u8; 4] = *b"DATA";

    /// The signature as written by big-endian machines.
    /// The payload of such files is little-endian regardless.
    pub const SWAPPED_BYTES: [u8; 4] = *b"ATAD";

    /// Without validation, write this instance to the byte stream.
    pub fn write(write: &mut impl Write) -> UnitResult {
        u8::write_slice(write, &self::BYTES)
    }

    /// Consume four bytes from the reader and check that they
    /// could start a map file.
    pub fn validate(read: &mut impl Read) -> UnitResult {
        let mut magic = [0_u8; 4];
        u8::read_slice(read, &mut magic)?;

        if magic == self::BYTES || magic == self::SWAPPED_BYTES { Ok(()) }
        else { Err(Error::BadSignature) }
    }
}

/// The map file version this crate reads and writes.
pub const FILE_VERSION: i32 = 4;

/// The fixed prelude of every map file, directly after the signature.
/// The counts describe the four tables that follow the prelude;
/// [`Header::header_len`] is where the item payloads begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {

    /// Format version of the container, always 4.
    pub version: i32,

    /// Total file size minus 16 bytes, as stored. Not used for reading.
    pub file_size: i32,

    /// Byte count subject to endian swapping on big-endian machines.
    /// Stored for fidelity, never interpreted by this crate.
    pub swaplen: i32,

    /// Number of entries in the item type table.
    pub num_item_types: usize,

    /// Number of items in the catalog.
    pub num_items: usize,

    /// Number of blobs in the raw-data pool.
    pub num_raw_data: usize,

    /// Byte count of the item region, preambles included.
    pub item_size: usize,

    /// Byte count of the compressed data region.
    pub data_size: usize,
}

impl Header {

    /// Read the eight header integers, validating the version.
    /// The signature must already have been consumed.
    pub fn read(read: &mut impl Read) -> Result<Self> {
        let version = i32::read(read)?;
        if version != FILE_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let file_size = i32::read(read)?;
        let swaplen = i32::read(read)?;
        let num_item_types = i32_to_usize(i32::read(read)?)?;
        let num_items = i32_to_usize(i32::read(read)?)?;
        let num_raw_data = i32_to_usize(i32::read(read)?)?;
        let item_size = i32_to_usize(i32::read(read)?)?;
        let data_size = i32_to_usize(i32::read(read)?)?;

        Ok(Header {
            version, file_size, swaplen,
            num_item_types, num_items, num_raw_data,
            item_size, data_size,
        })
    }

    /// Without validation, write the eight header integers.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        self.version.write(write)?;
        self.file_size.write(write)?;
        self.swaplen.write(write)?;
        usize_to_i32(self.num_item_types).write(write)?;
        usize_to_i32(self.num_items).write(write)?;
        usize_to_i32(self.num_raw_data).write(write)?;
        usize_to_i32(self.item_size).write(write)?;
        usize_to_i32(self.data_size).write(write)?;
        Ok(())
    }

    /// The byte offset at which the item payloads begin:
    /// prelude, item type table, item offsets, data offsets
    /// and the uncompressed-size table.
    pub fn header_len(&self) -> usize {
        36 + self.num_item_types * 12
            + (self.num_items + 2 * self.num_raw_data) * 4
    }
}

/// A fully indexed map file, held in memory:
/// the parsed header, the item catalog and the blob pool.
#[derive(Debug)]
pub struct Datafile {

    /// The parsed fixed prelude.
    pub header: Header,

    /// All items, addressable by type and index.
    pub items: ItemTable,

    /// All compressed blobs, addressable by index.
    pub blobs: BlobPool,
}

impl Datafile {

    /// Read and index a whole map file.
    /// Decompresses nothing; blobs inflate lazily on access.
    pub fn read(read: &mut impl Read) -> Result<Self> {
        signature::validate(read)?;
        let header = Header::read(read)?;

        let mut types = Vec::new();
        for _ in 0 .. header.num_item_types {
            let type_id = i32::read(read)?;
            let start = i32_to_usize(i32::read(read)?)?;
            let count = i32_to_usize(i32::read(read)?)?;

            if start + count > header.num_items {
                return Err(Error::ItemIndexOutOfRange {
                    index: start + count,
                    count: header.num_items,
                });
            }

            types.push(ItemTypeEntry { type_id, start, count });
        }

        let item_offsets = i32::read_vec(read, header.num_items)?;
        let data_offsets = i32::read_vec(read, header.num_raw_data)?;
        let uncompressed_sizes = i32::read_vec(read, header.num_raw_data)?;
        let item_bytes = u8::read_vec(read, header.item_size)?;
        let data_bytes = u8::read_vec(read, header.data_size)?;

        Ok(Datafile {
            header,
            items: ItemTable::new(types, item_offsets, item_bytes),
            blobs: BlobPool::new(data_offsets, uncompressed_sizes, data_bytes),
        })
    }
}

/// Assemble and write a complete map file from loose items and blobs.
/// Items are put into canonical `(type, id)` order, all offset tables
/// and header sizes are recomputed from scratch.
pub fn write_datafile(
    mut items: Vec<DatafileItem>, blobs: &[DatafileBlob],
    write: &mut impl Write,
) -> UnitResult {
    items.sort_by_key(|item| (item.type_id, item.id));

    let mut types: Vec<ItemTypeEntry> = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match types.last_mut() {
            Some(entry) if entry.type_id == item.type_id => entry.count += 1,
            _ => types.push(ItemTypeEntry { type_id: item.type_id, start: index, count: 1 }),
        }
    }

    let item_size: usize = items.iter().map(DatafileItem::byte_size).sum();
    let data_size: usize = blobs.iter().map(|blob| blob.compressed.len()).sum();
    let offset_size = (items.len() + 2 * blobs.len()) * 4;
    let file_size = 36 + types.len() * 12 + offset_size + item_size + data_size - 16;

    let header = Header {
        version: FILE_VERSION,
        file_size: usize_to_i32(file_size),
        swaplen: usize_to_i32(file_size - data_size),
        num_item_types: types.len(),
        num_items: items.len(),
        num_raw_data: blobs.len(),
        item_size, data_size,
    };

    signature::write(write)?;
    header.write(write)?;

    for entry in &types {
        entry.type_id.write(write)?;
        usize_to_i32(entry.start).write(write)?;
        usize_to_i32(entry.count).write(write)?;
    }

    let mut offset = 0;
    for item in &items {
        usize_to_i32(offset).write(write)?;
        offset += item.byte_size();
    }

    let mut offset = 0;
    for blob in blobs {
        usize_to_i32(offset).write(write)?;
        offset += blob.compressed.len();
    }

    for blob in blobs {
        usize_to_i32(blob.uncompressed_size).write(write)?;
    }

    for item in &items {
        item.write(write)?;
    }

    for blob in blobs {
        u8::write_slice(write, &blob.compressed)?;
    }

    Ok(())
}
