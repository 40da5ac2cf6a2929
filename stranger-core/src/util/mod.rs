mod clock;
mod id;

pub use clock::*;
pub use id::*;

#[cfg(test)]
pub(crate) use clock::mock;
