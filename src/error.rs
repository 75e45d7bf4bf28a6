
//! Error type definitions.

use std::fmt;
use std::path::PathBuf;

/// A result that may contain an error from this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A result that, if ok, contains nothing, and otherwise contains an error from this crate.
pub type UnitResult = Result<()>;

pub use std::io::Error as IoError;
pub use std::io::Result as IoResult;

/// All failures that loading, validating or saving a map can produce.
/// Nothing is retried and no partial map is ever returned:
/// the first error aborts the whole operation.
#[derive(Debug)]
pub enum Error {

    /// The first four bytes are neither `DATA` nor `ATAD`.
    BadSignature,

    /// The header version is not 4, or the version item does not contain 1,
    /// or an item carries a version this crate does not know.
    UnsupportedVersion(i32),

    /// A read went past the end of the file,
    /// or an offset table references bytes the file does not have.
    TruncatedFile,

    /// A blob failed to inflate, or its inflated length
    /// contradicts the uncompressed-size table.
    CorruptBlob,

    /// A blob index does not point into the blob pool.
    BlobIndexOutOfRange {

        /// The index as stored in the file.
        index: i32,

        /// Number of blobs in the pool.
        count: usize,
    },

    /// An item index does not point into its item type range.
    ItemIndexOutOfRange {

        /// The absolute item index.
        index: usize,

        /// Number of items in the file.
        count: usize,
    },

    /// A tile array does not contain `width * height` cells.
    InvalidLayerSize {

        /// Which array was mis-sized: `tiles`, `tele`, `speedup`, `switch`, `tune` or `quads`.
        array: &'static str,

        /// The cell count the layer dimensions demand.
        expected: usize,

        /// The cell count that was actually found.
        actual: usize,
    },

    /// A tile layer width or height is zero or negative.
    InvalidDimensions {

        /// Width as stored in the file or model.
        width: i32,

        /// Height as stored in the file or model.
        height: i32,
    },

    /// A tile layer game flag outside of `{0, 1, 2, 4, 8, 16, 32}`.
    UnknownGameFlag(i32),

    /// More than one group contains game layers.
    MultipleGameGroups,

    /// More than one layer with the game flag.
    MultipleGameLayers,

    /// More than one tele layer.
    MultipleTeleLayers,

    /// More than one speedup layer.
    MultipleSpeedupLayers,

    /// More than one front layer.
    MultipleFrontLayers,

    /// More than one switch layer.
    MultipleSwitchLayers,

    /// More than one tune layer.
    MultipleTuneLayers,

    /// A game-flagged tile layer sits in a group that is not the game group.
    GameLayerOutsideGameGroup,

    /// The game group contains no layer with `game_flag == 1`.
    MissingGameLayer,

    /// No group qualifies as the game group.
    MissingGameGroup,

    /// A special tile layer without its aux tile blob.
    MissingAuxTiles(&'static str),

    /// A layer references an image that does not exist.
    ImageIndexOutOfRange {

        /// The image id as stored in the layer.
        index: i32,

        /// Number of images in the map.
        count: usize,
    },

    /// An embedded image whose data is not `width * height * 4` bytes.
    InvalidImageSize {

        /// The byte count the image dimensions demand.
        expected: usize,

        /// The byte count that was actually found.
        actual: usize,
    },

    /// An envelope slices envpoints outside of the envpoint list.
    EnvelopePointsOutOfRange {

        /// First envpoint index of the envelope.
        start: i32,

        /// Number of envpoints of the envelope.
        count: i32,

        /// Number of envpoints in the map.
        available: usize,
    },

    /// A map path with an extension other than `.map`.
    InvalidPath(PathBuf),

    /// An io error other than an unexpected end of file,
    /// which would instead be a `TruncatedFile` error.
    Io(IoError),
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadSignature => write!(formatter, "not a map file (invalid signature)"),
            Error::UnsupportedVersion(version) => write!(formatter, "unsupported version {}", version),
            Error::TruncatedFile => write!(formatter, "the file ends unexpectedly"),
            Error::CorruptBlob => write!(formatter, "a compressed blob is corrupt"),

            Error::BlobIndexOutOfRange { index, count } =>
                write!(formatter, "blob index {} out of range (have {} blobs)", index, count),

            Error::ItemIndexOutOfRange { index, count } =>
                write!(formatter, "item index {} out of range (have {} items)", index, count),

            Error::InvalidLayerSize { array, expected, actual } =>
                write!(formatter, "{} array has {} cells, layer dimensions demand {}", array, actual, expected),

            Error::InvalidDimensions { width, height } =>
                write!(formatter, "invalid layer dimensions {}x{}", width, height),

            Error::UnknownGameFlag(flag) => write!(formatter, "unknown game layer flag {}", flag),
            Error::MultipleGameGroups => write!(formatter, "only one game group allowed"),
            Error::MultipleGameLayers => write!(formatter, "only one game layer allowed"),
            Error::MultipleTeleLayers => write!(formatter, "only one tele layer allowed"),
            Error::MultipleSpeedupLayers => write!(formatter, "only one speedup layer allowed"),
            Error::MultipleFrontLayers => write!(formatter, "only one front layer allowed"),
            Error::MultipleSwitchLayers => write!(formatter, "only one switch layer allowed"),
            Error::MultipleTuneLayers => write!(formatter, "only one tune layer allowed"),
            Error::GameLayerOutsideGameGroup => write!(formatter, "game layers are only allowed in the game group"),
            Error::MissingGameLayer => write!(formatter, "the game group contains no game layer"),
            Error::MissingGameGroup => write!(formatter, "the map contains no game group"),
            Error::MissingAuxTiles(kind) => write!(formatter, "{} layer is missing its tile data", kind),

            Error::ImageIndexOutOfRange { index, count } =>
                write!(formatter, "image id {} out of range (have {} images)", index, count),

            Error::InvalidImageSize { expected, actual } =>
                write!(formatter, "embedded image has {} bytes, dimensions demand {}", actual, expected),

            Error::EnvelopePointsOutOfRange { start, count, available } =>
                write!(formatter, "envelope slices {} points from {} but the map has {}", count, start, available),

            Error::InvalidPath(path) => write!(formatter, "not a map file path: {}", path.display()),
            Error::Io(error) => write!(formatter, "io error: {}", error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(error) => Some(error),
            _ => None,
        }
    }
}

/// Enable using the `?` operator on `io::Result`.
/// An unexpected end of file becomes a `TruncatedFile` error.
impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        if error.kind() == std::io::ErrorKind::UnexpectedEof { Error::TruncatedFile }
        else { Error::Io(error) }
    }
}
