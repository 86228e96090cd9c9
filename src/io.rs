//! Reading and writing the length sequence that represents a whole coding.

use std::io;

use binout::{AsIs, Serializer, VByte};

use crate::{CodingError, Decoder, Encoder};

/// Writes `sizes` to `output` as its *VByte*-encoded length followed by one
/// byte per symbol.
pub fn write_sizes(output: &mut dyn io::Write, sizes: &[u8]) -> io::Result<()> {
    VByte::write(output, sizes.len() as u32)?;
    sizes.iter().try_for_each(|size| AsIs::write(output, *size))
}

/// Returns the number of bytes which [`write_sizes`] writes for an alphabet
/// of `num_symbols` symbols.
pub fn write_sizes_bytes(num_symbols: usize) -> usize {
    VByte::size(num_symbols as u32) + num_symbols
}

/// Reads a length sequence written by [`write_sizes`].
pub fn read_sizes(input: &mut dyn io::Read) -> io::Result<Box<[u8]>> {
    let num_symbols: u32 = VByte::read(input)?;
    let mut sizes = Vec::with_capacity(num_symbols as usize);
    for _ in 0..num_symbols {
        sizes.push(AsIs::read(input)?);
    }
    Ok(sizes.into_boxed_slice())
}

impl Encoder {
    /// Writes the length sequence of `self` to `output`.
    pub fn write(&self, output: &mut dyn io::Write) -> io::Result<()> {
        write_sizes(output, &self.size_by_symbol())
    }

    /// Returns the number of bytes which [`Self::write`] writes.
    pub fn write_bytes(&self) -> usize {
        write_sizes_bytes(self.num_symbols())
    }

    /// Reads a length sequence written by [`Encoder::write`] or
    /// [`Decoder::write`] and reconstructs the encoder from it.
    ///
    /// A sequence that does not describe a valid coding is reported as
    /// [`io::ErrorKind::InvalidData`].
    pub fn read(input: &mut dyn io::Read) -> io::Result<Self> {
        let sizes = read_sizes(input)?;
        Self::from_sizes(&sizes).map_err(into_io_error)
    }
}

impl Decoder {
    /// Writes the length sequence of `self` to `output`.
    pub fn write(&self, output: &mut dyn io::Write) -> io::Result<()> {
        write_sizes(output, self.size_by_symbol())
    }

    /// Returns the number of bytes which [`Self::write`] writes.
    pub fn write_bytes(&self) -> usize {
        write_sizes_bytes(self.num_symbols())
    }

    /// Reads a length sequence written by [`Encoder::write`] or
    /// [`Decoder::write`] and reconstructs the decoder from it.
    ///
    /// A sequence that does not describe a valid coding is reported as
    /// [`io::ErrorKind::InvalidData`].
    pub fn read(input: &mut dyn io::Read) -> io::Result<Self> {
        let sizes = read_sizes(input)?;
        Self::from_sizes(&sizes).map_err(into_io_error)
    }
}

fn into_io_error(error: CodingError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, error)
}
