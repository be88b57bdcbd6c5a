//! Lineup Optimizer Module
//!
//! 후보 풀에서 k개 조합을 만들고 전략별로 최적 편성을 찾는다.

pub mod combinations;
pub mod config;
pub mod runner;
pub mod strategies;

pub use combinations::generate_combinations;
pub use config::{OptimizerConfig, StrategyConfig, StrategyKind};
pub use runner::{
    find_best_lineup_async, run_all_strategies_async, AllStrategiesHandle, LineupSearchHandle,
    PROGRESS_BATCH,
};
pub use strategies::{
    find_best_lineup, find_best_lineup_fast, run_all_strategies, run_all_strategies_fast,
    OptimizedLineup, StrategyReport,
};
