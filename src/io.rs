
//! Low level binary reading and writing.
//! Every multi-byte value in a map file is little-endian.

pub use std::io::{Read, Write};
use lebe::prelude::*;
use crate::error::{Error, Result, UnitResult};

/// Extension trait for reading and writing little-endian
/// primitive types and slices of them.
pub trait Data: Sized + Default + Clone {

    /// Number of bytes this would consume in a map file.
    const BYTE_SIZE: usize = std::mem::size_of::<Self>();

    /// Read a value of type `Self`.
    fn read(read: &mut impl Read) -> Result<Self>;

    /// Read as many values of type `Self` as fit into the specified slice.
    /// If the slice cannot be filled, returns `TruncatedFile`.
    fn read_slice(read: &mut impl Read, slice: &mut [Self]) -> UnitResult;

    /// Read as many values of type `Self` as the specified count.
    /// Grows the result in blocks, so a lying table count cannot force
    /// a huge allocation before the stream runs dry.
    fn read_vec(read: &mut impl Read, count: usize) -> Result<Vec<Self>> {
        const BLOCK: usize = 1024;
        let mut vec = Vec::new();

        while vec.len() < count {
            let start = vec.len();
            vec.resize(start + BLOCK.min(count - start), Self::default());
            Self::read_slice(read, &mut vec[start ..])?;
        }

        Ok(vec)
    }

    /// Write this value to the byte stream.
    fn write(self, write: &mut impl Write) -> UnitResult;

    /// Write all values of that slice to the byte stream.
    fn write_slice(write: &mut impl Write, slice: &[Self]) -> UnitResult;
}

macro_rules! implement_data_for_primitive {
    ($kind: ident) => {
        impl Data for $kind {
            fn read(read: &mut impl Read) -> Result<Self> {
                Ok(read.read_from_little_endian()?)
            }

            fn write(self, write: &mut impl Write) -> UnitResult {
                write.write_as_little_endian(&self)?;
                Ok(())
            }

            fn read_slice(read: &mut impl Read, slice: &mut [Self]) -> UnitResult {
                read.read_from_little_endian_into(slice)?;
                Ok(())
            }

            fn write_slice(write: &mut impl Write, slice: &[Self]) -> UnitResult {
                write.write_as_little_endian(slice)?;
                Ok(())
            }
        }
    };
}

implement_data_for_primitive!(u8);
implement_data_for_primitive!(i16);
implement_data_for_primitive!(i32);

/// Convert an index stored as `i32` into a `usize`,
/// failing for negative values.
#[inline]
pub fn i32_to_usize(value: i32) -> Result<usize> {
    if value < 0 { Err(Error::TruncatedFile) }
    else { Ok(value as usize) }
}

/// Convert a size into the `i32` the file format stores.
/// Map files are far too small for this to overflow.
#[inline]
pub fn usize_to_i32(value: usize) -> i32 {
    debug_assert!(value <= i32::MAX as usize, "table value too large for an i32");
    value as i32
}

/// Interpret an item payload as the packed stream of `i32`s it is.
/// The payload of every item in a map file has this shape.
pub fn bytes_to_ints(bytes: &[u8]) -> Result<Vec<i32>> {
    if bytes.len() % i32::BYTE_SIZE != 0 {
        return Err(Error::TruncatedFile);
    }

    i32::read_vec(&mut { bytes }, bytes.len() / i32::BYTE_SIZE)
}
