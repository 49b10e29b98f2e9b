//! Allocator strategies behind one [`Allocator`] trait, and containers that take
//! the allocator by reference.
//!
//! ```
//! use compartment::{ArenaAllocator, List, Table};
//!
//! let arena = ArenaAllocator::new();
//! let mut squares = List::new(&arena);
//! let mut index = Table::new(&arena);
//! for i in 0..10u64 {
//!     squares.push(i * i);
//!     index.put(i * i, i);
//! }
//! assert_eq!(squares[3], 9);
//! assert_eq!(index.get(&81).into_option(), Some(9));
//! ```

#[macro_use]
mod logging;

mod config;
mod memory;
mod error;
mod allocator;
mod region;
mod arena;
mod fixed;
mod hash;
mod optional;
mod list;
mod multi_list;
mod iter;
mod table;
mod set;
mod view;
mod string;
mod linked;

pub use config::{ArenaConfig, FixedBufferConfig, MIN_ALIGN, PAGE_ALIGN, PAGE_SIZE};
pub use memory::{align_down, align_up};
pub use error::AllocError;
pub use allocator::{Allocator, AllocatorExt};
pub use arena::ArenaAllocator;
pub use fixed::FixedBufferAllocator;
pub use hash::{fnv1, Hash};
pub use optional::{Optional, OptionalPtr};
pub use list::{List, NOT_FOUND};
pub use multi_list::{Column, Columns, MultiList};
pub use table::Table;
pub use set::Set;
pub use view::StringView;
pub use string::String;
pub use linked::LinkedList;

#[cfg(test)]
pub mod dropflag;
