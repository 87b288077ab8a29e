//! Contract Agents - Multi-agent contract clause extraction
//!
//! Routes each clause category to one of three specialist agents, validates
//! the extracted spans against the contract text and returns a single
//! `ExtractionResult` with a structured execution trace.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
