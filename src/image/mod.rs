//! Facilities for loading and saving memory images.
//!
//! Two image formats are supported:
//! * Hex text (the default).  An optional `v2.0 raw` header line, then
//!   whitespace-separated hex values placed at consecutive addresses.  A line
//!   may start with `ADDR:` to move to a new address, `.org ADDR` moves to a
//!   new address on its own, `N*VALUE` repeats a value `N` (decimal) times,
//!   and `#` starts a comment.
//! * Raw binary (`.bin` files).  Consecutive cells from address zero, each
//!   stored big-endian in as few whole bytes as the data width allows.

use crate::error::{MemError, MemResult, ParseError};
use crate::mem::{AddrWidth, DataWidth, PagedStore, SharedStore};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

mod binary;
mod hex;
mod lex;

//===========================================================================//

/// The encoding of a memory image file.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ImageFormat {
    /// Human-readable hex text.
    #[default]
    Hex,
    /// Raw big-endian binary cells.
    Binary,
}

impl ImageFormat {
    /// Chooses a format based on a file's extension: `.bin` files are raw
    /// binary, and everything else is hex text.
    pub fn from_path(path: &Path) -> ImageFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("bin") => {
                ImageFormat::Binary
            }
            _ => ImageFormat::Hex,
        }
    }
}

//===========================================================================//

/// One contiguous piece of a parsed memory image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ImageRecord {
    /// Values for consecutive cells starting at `start`.
    Data {
        /// The address of the first value.
        start: u32,
        /// The cell values, not yet masked to the data width.
        values: Vec<u32>,
    },
    /// A run of `len` cells starting at `start`, all holding `value`.
    Fill {
        /// The address of the first cell.
        start: u32,
        /// The number of cells.
        len: u64,
        /// The value of every cell, not yet masked to the data width.
        value: u32,
    },
}

impl ImageRecord {
    /// Writes this record into the store.
    pub fn apply(&self, store: &SharedStore) -> MemResult<bool> {
        match self {
            ImageRecord::Data { start, values } => {
                store.set_range(*start, values)
            }
            ImageRecord::Fill { start, len, value } => {
                store.fill(*start, *len, *value)
            }
        }
    }
}

//===========================================================================//

/// A copy of the allocated pages of a store, taken so that an image can be
/// written without holding the store lock.
#[derive(Clone, Debug)]
pub struct ImageSnapshot {
    addr_width: AddrWidth,
    data_width: DataWidth,
    pages: Vec<(u32, Vec<u32>)>,
}

impl ImageSnapshot {
    /// Copies the contents of `store`.
    pub fn of(store: &PagedStore) -> ImageSnapshot {
        ImageSnapshot {
            addr_width: store.addr_width(),
            data_width: store.data_width(),
            pages: store
                .pages()
                .map(|(base, cells)| (base, cells.to_vec()))
                .collect(),
        }
    }

    /// Copies the contents of a shared store, holding its lock only for the
    /// duration of the copy.
    pub fn of_shared(store: &SharedStore) -> ImageSnapshot {
        store.with_store(ImageSnapshot::of)
    }
}

//===========================================================================//

/// Parses an image held in memory.  Nothing is written to any store, so a
/// malformed image can be rejected as a whole.
pub fn parse_image(
    bytes: &[u8],
    format: ImageFormat,
    addr_width: AddrWidth,
    data_width: DataWidth,
) -> Result<Vec<ImageRecord>, ParseError> {
    match format {
        ImageFormat::Hex => {
            let source = std::str::from_utf8(bytes).map_err(|error| {
                let valid = &bytes[..error.valid_up_to()];
                let line = valid.iter().filter(|&&byte| byte == b'\n').count();
                ParseError::at_line(
                    line as u32 + 1,
                    "image is not valid text".to_string(),
                )
            })?;
            hex::parse_hex(source, addr_width)
        }
        ImageFormat::Binary => {
            binary::parse_binary(bytes, addr_width, data_width)
        }
    }
}

/// Writes an image of the snapshot in the given format.
pub fn write_image<W: Write>(
    writer: &mut W,
    snapshot: &ImageSnapshot,
    format: ImageFormat,
) -> io::Result<()> {
    match format {
        ImageFormat::Hex => hex::write_hex(writer, snapshot),
        ImageFormat::Binary => binary::write_binary(writer, snapshot),
    }
}

//===========================================================================//

/// Replaces the contents of `store` with the image at `path`.
///
/// The whole file is read and parsed before the store is touched, so a
/// malformed image leaves the store unchanged.  Records are then applied one
/// at a time, each under its own acquisition of the store lock.
pub fn load_image(
    store: &SharedStore,
    path: &Path,
    format: ImageFormat,
) -> MemResult<()> {
    let bytes =
        fs::read(path).map_err(|error| MemError::storage(path, error))?;
    let records =
        parse_image(&bytes, format, store.addr_width(), store.data_width())?;
    store.clear();
    for record in &records {
        record.apply(store)?;
    }
    store.mark_clean();
    log::info!(
        "loaded {} record(s) from {} as {format:?}",
        records.len(),
        path.display()
    );
    Ok(())
}

/// Writes the contents of `store` to an image file at `path`.
pub fn save_image(
    store: &SharedStore,
    path: &Path,
    format: ImageFormat,
) -> MemResult<()> {
    let snapshot = ImageSnapshot::of_shared(store);
    let write = || -> io::Result<()> {
        let mut writer = io::BufWriter::new(fs::File::create(path)?);
        write_image(&mut writer, &snapshot, format)?;
        writer.flush()
    };
    write().map_err(|error| MemError::storage(path, error))?;
    store.mark_clean();
    log::info!("saved {} as {format:?}", path.display());
    Ok(())
}

//===========================================================================//


//===========================================================================//
