mod binary;

pub use binary::{read_binary, write_binary};
