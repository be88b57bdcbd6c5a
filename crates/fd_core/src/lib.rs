//! # fd_core - Deterministic Familiar Dice Optimization Engine
//!
//! This library scores familiar dice rolls, searches lineup combinations
//! under multiple strategies, and analyzes which rerolls can rescue a
//! failing roll. It exposes a JSON API for easy integration with host UIs.
//!
//! ## Features
//! - 100% deterministic calculation (pure functions of explicit inputs)
//! - Data-authored activation conditions with a sandboxed evaluator
//! - Cancelable background search with a 0-100 progress stream
//! - JSON API for easy integration

// Exact float comparison implements the multiplier normalization rule
#![allow(clippy::float_cmp)]
// Lineup math reads more naturally with explicit index loops in places
#![allow(clippy::needless_range_loop)]

pub mod api;
pub mod condition;
pub mod dice;
pub mod error;
pub mod models;
pub mod optimizer;
pub mod reroll;
pub mod scoring;

// Re-export main API functions
pub use api::{
    calculate_score_json, clear_condition_cache_json, evaluate_lineup_json, optimize_lineup_json,
    reroll_analysis_json, validate_condition_json,
};
pub use condition::{BonusActivation, ConditionError, ConditionEvaluator};
pub use error::{CoreError, Result};
pub use models::{BonusItem, ConditionalBonus, Familiar, Rank};
pub use optimizer::{
    find_best_lineup, find_best_lineup_async, find_best_lineup_fast, generate_combinations,
    run_all_strategies, run_all_strategies_async, run_all_strategies_fast, OptimizedLineup,
    OptimizerConfig, StrategyConfig, StrategyKind, StrategyReport,
};
pub use reroll::{PassingCombination, RerollAnalyzer, RerollSuggestion, RerollSummary};
pub use scoring::{CalculationResult, LineupEvaluation, ScoreCalculator, SlotBreakdown};
