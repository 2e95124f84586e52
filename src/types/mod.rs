//! Type services consumed by the runtime
//!
//! The scalar type system is an external collaborator. This module defines
//! the value model plus the two strategy seams the runtime calls through:
//!
//! - `ValueComparator` for every ordering decision made by sorts and predicates
//! - `ValueSerializer` for row payloads and spill records
//!
//! `DefaultTypes` implements both and is what `QueryContext` uses unless the
//! embedding type layer supplies its own.

mod compare;
mod row;
mod serialize;
mod value;

pub use compare::{DefaultTypes, ValueComparator};
pub use row::{Row, RowType};
pub use serialize::{read_values, write_values, DecodeError, ValueSerializer};
pub use value::Value;
