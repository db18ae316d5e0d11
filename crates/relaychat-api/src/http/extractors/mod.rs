//! Request extractors and the middleware that feeds them.

pub mod identity;
