//! Wiring for the `liftwell` binary: store construction and the request
//! console.

pub mod bootstrap;
pub mod intake;
