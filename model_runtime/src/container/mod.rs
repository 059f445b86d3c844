//! Copy-on-write containers holding variants.

mod range;
mod set;
mod tuple;

pub use range::{Range, RangeIterator};
pub use set::{IteratorState, Set, SetIterator};
pub use tuple::Tuple;
