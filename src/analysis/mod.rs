//! Structural response analysis: markup-or-lines body parsing and the
//! normalized distance metric used for body comparison.

pub mod distance;
pub mod structural;

pub use distance::distance;
pub use structural::{parse_body, BodyNode, StructuralForm};
