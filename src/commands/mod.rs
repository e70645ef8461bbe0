//! Commands Layer
//!
//! Edit protocol handlers that bridge console requests to the layout engine.

mod layout_cmd;

pub use layout_cmd::*;
