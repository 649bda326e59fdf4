pub use course::*;
pub use id::*;
pub use progress::*;
pub use timestamp::*;

mod course;
mod id;
mod progress;
mod timestamp;

#[cfg(test)]
pub(crate) use course::fixtures;
