mod locate;

pub use locate::*;
