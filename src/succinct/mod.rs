//! Succinct building blocks: bit vectors with rank/select and packed
//! integer vectors
//!
//! These are the storage primitives underneath the trie layers. Each one
//! exists in an owned form (built or read from a stream) and a borrowed
//! form (bound zero-copy over a mapped buffer).

pub mod bit_vector;
pub mod int_vector;
pub mod storage;

pub use bit_vector::BitVector;
pub use int_vector::IntVector;
pub use storage::{ByteBuf, U32Buf, WordBuf};
