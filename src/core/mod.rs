// src/core/mod.rs

/// Error types shared by the checks and the header catalog.
pub mod error;

/// Finding descriptions and remediation advice, keyed by finding code.
pub mod knowledge_base;

/// Data structures shared by the checks, the report and the interface.
pub mod models;

/// The network-facing checks and the full-scan orchestrator.
pub mod scanner;

/// Pure scoring and grading rules.
pub mod scoring;

pub mod target;
pub mod whois;
