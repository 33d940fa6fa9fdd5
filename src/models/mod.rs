pub mod benchmark;
pub mod fund;
pub mod report;

pub use benchmark::*;
pub use fund::*;
pub use report::*;
