//! Sort-key comparator synthesis
//!
//! Compiles a declarative sort spec into a comparator over the element type
//! of a collection. Three mutually exclusive modes:
//! - default: natural ordering of the type, a compile error if it has none
//! - `sort-with`: an expression over two bound values yields a signed result
//! - `sort-by`: ordered key extractors, each itself a sort spec; the first
//!   nonzero key comparison decides

mod comparator;
mod compare;
mod element;

pub use comparator::{SortComparator, SortKey, SortMode, Sorting};
pub use compare::{compare_number_tolerant, natural_compare};
pub use element::{SortDef, SortInterp, SORT_BY_TYPE, SORT_TYPE, SORT_TYPE_KEY};
