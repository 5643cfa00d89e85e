pub mod classifier;
pub mod collector;
pub mod filter;
pub mod source;
