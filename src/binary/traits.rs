//! Serialization trait for envelope structures

use std::io::{self, Write};

/// Trait for types that can be written to the binary envelope format
pub trait BinaryWrite {
    /// Write this type to a binary writer
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    /// Get the size in bytes when serialized
    fn serialized_size(&self) -> usize;
}
