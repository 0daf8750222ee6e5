//! Property-based tests for the IR.
//!
//! Uses proptest to check invariants over generated expression trees.


pub mod generators;
