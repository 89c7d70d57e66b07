//! Crate-level test suites for tessel-syntax.

mod behaviour;
