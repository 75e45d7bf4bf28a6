
//! The raw-data pool of a map file: independently compressed blobs,
//! addressed by index. Items reference blobs for everything that is
//! not an integer: tile grids, quad records, images and text.

use crate::io::i32_to_usize;
use crate::compress::{self, Bytes, ByteVec};
use crate::error::{Error, Result};

/// All compressed blobs of a map file, with the offset table that
/// locates them and the uncompressed-size table that sizes them.
#[derive(Debug)]
pub struct BlobPool {
    offsets: Vec<i32>,
    uncompressed_sizes: Vec<i32>,
    bytes: Vec<u8>,
}

impl BlobPool {

    /// Bundle the parsed tables with the raw compressed region.
    pub fn new(offsets: Vec<i32>, uncompressed_sizes: Vec<i32>, bytes: Vec<u8>) -> Self {
        BlobPool { offsets, uncompressed_sizes, bytes }
    }

    /// Number of blobs in the pool.
    pub fn blob_count(&self) -> usize {
        self.offsets.len()
    }

    /// Whether an index as stored in an item references a blob.
    /// Indices outside the pool mark absent data in some item schemas.
    pub fn contains(&self, index: i32) -> bool {
        index >= 0 && (index as usize) < self.offsets.len()
    }

    /// Inflate the blob at the specified index. The compressed size is
    /// the delta to the next blob's offset; the inflated length must
    /// match the uncompressed-size table.
    pub fn decompressed(&self, index: i32) -> Result<ByteVec> {
        if !self.contains(index) {
            return Err(Error::BlobIndexOutOfRange { index, count: self.offsets.len() });
        }

        let blob_index = index as usize;
        let start = i32_to_usize(self.offsets[blob_index])?;
        let end = match self.offsets.get(blob_index + 1) {
            Some(&next) => i32_to_usize(next)?,
            None => self.bytes.len(),
        };

        if start > end || end > self.bytes.len() {
            return Err(Error::TruncatedFile);
        }

        let expected_size = i32_to_usize(self.uncompressed_sizes[blob_index])?;
        compress::decompress_bytes(&self.bytes[start .. end], expected_size)
    }
}

/// A blob about to be written, already compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatafileBlob {

    /// Length of the original bytes, for the uncompressed-size table.
    pub uncompressed_size: usize,

    /// The zlib stream that goes into the file.
    pub compressed: Vec<u8>,
}

impl DatafileBlob {

    /// Compress a blob for the pool.
    pub fn compress(bytes: Bytes<'_>) -> Self {
        DatafileBlob {
            uncompressed_size: bytes.len(),
            compressed: compress::compress_bytes(bytes),
        }
    }
}
