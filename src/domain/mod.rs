//! Core domain types and logic.

pub mod market;
pub mod document;
pub mod strategy;
pub mod schema;
pub mod indicator;
pub mod expr;
pub mod expr_parser;
pub mod expr_eval;
pub mod detector;
pub mod signal;
pub mod engine;
pub mod replay;
pub mod backtest;
pub mod error;
