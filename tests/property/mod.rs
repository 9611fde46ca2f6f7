//! Property-based tests

mod context_builder;
