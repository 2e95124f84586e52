//! Hierarchical keys for group-clustered storage
//!
//! A group stores parent and child tables interleaved: every row's store key
//! is the packed form of its HKey, and a child's HKey extends its parent's.
//! A single ordered range read over a group therefore yields each parent
//! immediately followed by its whole subtree.
//!
//! # Invariants
//!
//! - `HKey` ordering equals byte ordering of `codec::pack`
//! - A packed parent key is a strict prefix of each packed descendant key
//! - A subtree occupies exactly `[pack(root), subtree_end(pack(root)))`
//! - HKeys are immutable values; cursors may cache but never mutate them

pub mod codec;
#[allow(clippy::module_inception)]
mod hkey;

pub use codec::{pack, subtree_end, unpack, HKeyDecodeError};
pub use hkey::{HKey, HKeySegment};
