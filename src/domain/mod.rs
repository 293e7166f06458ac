pub mod battery;
pub mod generator;
pub mod mains;
pub mod reading;
pub mod source;

pub use battery::*;
pub use generator::*;
pub use mains::*;
pub use reading::*;
pub use source::*;
