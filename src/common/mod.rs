mod data;
mod fs;
mod polygon;

pub(crate) use data::*;
pub(crate) use fs::*;
pub(crate) use polygon::*;
