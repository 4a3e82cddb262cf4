mod vertex;
pub use vertex::*;
