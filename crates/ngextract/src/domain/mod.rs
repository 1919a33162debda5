//! Plain data shared by the extraction pipeline and its hosts.

pub mod errors;
pub mod model;
