pub mod engine_json;

pub use engine_json::{
    calculate_score_json, clear_condition_cache_json, evaluate_lineup_json, optimize_lineup_json,
    reroll_analysis_json, validate_condition_json,
};
