
//! Compresses and decompresses the blobs of the raw-data pool.
//! Every blob is an independent zlib deflate stream.

use crate::error::{Error, Result};

/// A byte vector.
pub type ByteVec = Vec<u8>;

/// A byte slice.
pub type Bytes<'s> = &'s [u8];

/// The zlib compression level the reference writer uses.
const COMPRESSION_LEVEL: u8 = 6;

/// Compress a blob for the raw-data pool.
pub fn compress_bytes(bytes: Bytes<'_>) -> ByteVec {
    miniz_oxide::deflate::compress_to_vec_zlib(bytes, COMPRESSION_LEVEL)
}

/// Decompress a blob from the raw-data pool. The expected byte count
/// comes from the uncompressed-size table of the file; a result of any
/// other length means the blob is corrupt.
pub fn decompress_bytes(bytes: Bytes<'_>, expected_byte_size: usize) -> Result<ByteVec> {
    let decompressed = zune_inflate::DeflateDecoder::new(bytes)
        .decode_zlib().map_err(|_| Error::CorruptBlob)?;

    if decompressed.len() != expected_byte_size {
        return Err(Error::CorruptBlob);
    }

    Ok(decompressed)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrip() {
        let data: Vec<u8> = (0..4096_u32).map(|value| (value % 251) as u8).collect();

        let compressed = compress_bytes(&data);
        assert!(compressed.len() < data.len());

        let decompressed = decompress_bytes(&compressed, data.len()).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn empty_blob() {
        let compressed = compress_bytes(&[]);
        assert_eq!(decompress_bytes(&compressed, 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn wrong_expected_size_is_corrupt() {
        let compressed = compress_bytes(&[1, 2, 3]);
        assert!(matches!(decompress_bytes(&compressed, 4), Err(Error::CorruptBlob)));
    }

    #[test]
    fn garbage_is_corrupt() {
        assert!(matches!(decompress_bytes(&[0xde, 0xad, 0xbe, 0xef], 16), Err(Error::CorruptBlob)));
    }
}
