//! Typed request bodies for the mutation endpoints.
//!
//! Each body deserializes from JSON, is checked for values the type system
//! cannot rule out, and is then turned into the wire event the bridge carries.

pub(crate) mod notification;
pub(crate) mod progress;
