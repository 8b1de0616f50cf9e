//! Support code for Cucumber scenarios


pub use world::{error_kind, TestWorld};
