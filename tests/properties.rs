//! Property tests for dtswatch.
//!
//! Properties use randomized input generation to explore edge cases and
//! protect invariants like "never panics" and "round-trips".
//!
//! Run with: `cargo test --test properties`

#[path = "properties/declaration.rs"]
mod declaration;

#[path = "properties/module_names.rs"]
mod module_names;
