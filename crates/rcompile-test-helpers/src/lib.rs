//! Test utilities and fixtures for RCompile
//!
//! This crate provides shared test helpers for the integration tests of the
//! compiler and the command line tool.

pub mod compile;
pub mod fixtures;
pub mod harness;
pub mod mocks;
pub mod node;
