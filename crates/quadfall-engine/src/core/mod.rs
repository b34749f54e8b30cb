pub use self::{collision::*, grid::*, shape::*};

pub(crate) mod collision;
pub(crate) mod grid;
pub(crate) mod shape;
