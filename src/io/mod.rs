//! I/O carriers for the persisted trie format
//!
//! The codec itself lives with the components it serializes; this module
//! provides the little-endian input/output abstractions it runs over,
//! plus a memory-mapped source behind the `mmap` feature.

pub mod data_input;
pub mod data_output;
#[cfg(feature = "mmap")]
pub mod mmap;

pub use data_input::{from_reader, from_slice, DataInput, ReaderDataInput, SliceDataInput};
pub use data_output::{to_vec, to_writer, DataOutput, VecDataOutput, WriterDataOutput};

#[cfg(feature = "mmap")]
pub use mmap::MemoryMappedInput;
