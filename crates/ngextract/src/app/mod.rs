//! Application layer: the text transformation pipeline.

pub mod extract;
pub mod naming;
pub mod rewrite;
pub mod scanner;
pub mod synthesize;
