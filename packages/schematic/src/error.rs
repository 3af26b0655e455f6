//! Error types.

use region_data::ContainerError;
use quartz_nbt::io::NbtIoError;
use std::fmt::{self, Formatter, Display};


pub type Result<I> = std::result::Result<I, Error>;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    error: Box<dyn std::error::Error + Send + Sync>,
    tag_path: Option<String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ErrorKind {
    /// Underlying IO error.
    Io,

    /// The bytes could not be parsed as, or the tree could not be written
    /// as, a tag tree at all.
    Nbt,

    /// A region was declared or requested with a zero or negative extent on
    /// some axis.
    InvalidSize,

    /// A stored palette contains the same block state at two ids.
    DuplicatePaletteEntry,

    /// A position was outside of the region.
    ///
    /// Indicates a bug in the caller rather than bad data.
    OutOfBounds,

    /// A tag which the format requires is missing or has the wrong shape.
    MalformedTag,

    /// The input is not a format this library reads, or declares a format
    /// version newer than this library knows.
    UnsupportedFormat,

    /// The version upgrader could not migrate some stored data.
    UpgradeFailure,

    /// (Only when encoding) the schematic holds something that the chosen
    /// format cannot represent.
    Unrepresentable,
}

impl Error {
    pub fn new<E>(
        kind: ErrorKind,
        error: E,
        tag_path: Option<&str>,
    ) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error {
            kind,
            error: error.into(),
            tag_path: tag_path.map(String::from),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Path of the offending tag within the tree, if known.
    pub fn tag_path(&self) -> Option<&str> {
        self.tag_path.as_deref()
    }

    /// Attach a tag path, unless one is already set.
    pub fn at(mut self, tag_path: &str) -> Self {
        if self.tag_path.is_none() {
            self.tag_path = Some(tag_path.to_owned());
        }
        self
    }

    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.error
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.error
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, error, None)
    }
}

impl From<NbtIoError> for Error {
    fn from(error: NbtIoError) -> Self {
        Self::new(ErrorKind::Nbt, error, None)
    }
}

impl From<ContainerError> for Error {
    fn from(error: ContainerError) -> Self {
        let kind = match &error {
            &ContainerError::InvalidSize(_) => ErrorKind::InvalidSize,
            &ContainerError::DuplicateEntry { .. } => ErrorKind::DuplicatePaletteEntry,
            &ContainerError::EmptyPalette
            | &ContainerError::IdOutOfRange { .. }
            | &ContainerError::WordCount { .. } => ErrorKind::MalformedTag,
        };
        Self::new(kind, error, None)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match *self {
            ErrorKind::Io => "IO error",
            ErrorKind::Nbt => "invalid tag tree",
            ErrorKind::InvalidSize => "invalid region size",
            ErrorKind::DuplicatePaletteEntry => "duplicate palette entry",
            ErrorKind::OutOfBounds => "position out of bounds",
            ErrorKind::MalformedTag => "malformed tag",
            ErrorKind::UnsupportedFormat => "unsupported format",
            ErrorKind::UpgradeFailure => "upgrade failure",
            ErrorKind::Unrepresentable => "not representable in format",
        })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.kind, f)?;
        f.write_str(", ")?;
        Display::fmt(&self.error, f)?;
        if let Some(ref tag_path) = self.tag_path {
            f.write_str(" (at ")?;
            f.write_str(tag_path)?;
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner())
    }
}


macro_rules! error {
    ($k:ident, $tag_path:expr, $($e:tt)*)=>{
        $crate::error::Error::new(
            $crate::error::ErrorKind::$k,
            format!($($e)*),
            $tag_path,
        )
    };
}

macro_rules! bail {
    ($($e:tt)*)=>{ return Err($crate::error::error!($($e)*)) };
}

macro_rules! ensure {
    ($c:expr, $($e:tt)*)=>{
        if !$c {
            $crate::error::bail!($($e)*);
        }
    };
}

pub(crate) use error;
pub(crate) use bail;
pub(crate) use ensure;
