pub mod marker;
pub mod surface;
