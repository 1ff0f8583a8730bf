pub mod path;
pub mod value;

pub use path::*;
pub use value::*;
