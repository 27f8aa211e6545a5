pub mod engine;
pub mod questions;
pub mod emotion;
pub mod timer;

pub use engine::*;
pub use questions::*;
pub use emotion::*;
pub use timer::*;
