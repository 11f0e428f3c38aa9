//! Comparison engine and QC scoring system for equipment parameter data.
//!
//! Sources of parameter readings are staged into a [`matcher::SourceSet`],
//! aligned by exact key, classified by the [`comparison`] engine, validated
//! by the [`qc`] rules, and scored by the [`qc::scoring`] system. All of it
//! is synchronous and side-effect-free; the HTTP surface in [`router`] is a
//! thin wrapper for callers that prefer a service.

pub mod catalog;
pub mod comparison;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod matcher;
pub mod normalize;
pub mod qc;
pub mod router;
pub mod service;
pub mod telemetry;

pub use comparison::{
    ComparisonConfig, ComparisonEngine, ComparisonMode, ComparisonOutcome, ComparisonRun,
    OutcomeKind,
};
pub use domain::{ParameterKey, ParameterRecord};
pub use error::{AppError, EngineError};
pub use matcher::{MatchTable, SourceSet};
pub use normalize::{NormalizedValue, Normalizer, TypeHint};
pub use qc::{QCCategory, QCEngine, QCIssue, QCResult, QCScoringSystem, QCSeverity};
pub use service::AnalysisService;
