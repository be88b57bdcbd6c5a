// Familiar Dice Engine JSON API Layer
// Connects the host UI to the scoring/optimizer/reroll modules

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::condition::ConditionEvaluator;
use crate::error::CoreError;
use crate::models::{BonusItem, ConditionalBonus, Familiar};
use crate::optimizer::{
    generate_combinations, run_all_strategies, run_all_strategies_fast, OptimizerConfig,
    StrategyReport,
};
use crate::reroll::{
    PassingCombination, RerollAnalyzer, RerollSuggestion, RerollSummary, DEFAULT_TOP_LIMIT,
};
use crate::scoring::{CalculationResult, LineupEvaluation, ScoreCalculator};

// ========== Global State ==========

// 조건식 캐시는 평가기 안에 있으므로 평가기 하나를 공유하면 된다
static EVALUATOR: Lazy<ConditionEvaluator> = Lazy::new(ConditionEvaluator::new);

fn parse_request<T: serde::de::DeserializeOwned>(request_json: &str) -> Result<T, CoreError> {
    serde_json::from_str(request_json).map_err(CoreError::from)
}

fn to_json_string<T: Serialize>(response: &T) -> String {
    serde_json::to_string(response)
        .unwrap_or_else(|_| r#"{"success":false,"error":"Serialization failed"}"#.to_string())
}

// ========== Request/Response Structures ==========

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub dice: Vec<u32>,
    #[serde(default)]
    pub familiars: Vec<Familiar>,
    #[serde(default)]
    pub items: Vec<BonusItem>,
    #[serde(default)]
    pub conditionals: Vec<ConditionalBonus>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub success: bool,
    pub result: Option<CalculationResult>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LineupRequest {
    pub familiars: Vec<Familiar>,
    #[serde(default)]
    pub bonuses: Vec<ConditionalBonus>,
    pub dice: Vec<u32>,
}

#[derive(Debug, Serialize)]
pub struct LineupResponse {
    pub success: bool,
    pub evaluation: Option<LineupEvaluation>,
    pub error: Option<String>,
}

fn default_lineup_size() -> usize {
    3
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub pool: Vec<Familiar>,
    #[serde(default = "default_lineup_size")]
    pub lineup_size: usize,
    #[serde(default)]
    pub bonuses: Vec<ConditionalBonus>,
    #[serde(default)]
    pub config: OptimizerConfig,
    /// true면 종합 전략을 평균눈으로 점수화한다
    #[serde(default)]
    pub fast: bool,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub success: bool,
    pub report: Option<StrategyReport>,
    pub combination_count: usize,
    pub error: Option<String>,
}

fn default_top_limit() -> usize {
    DEFAULT_TOP_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct RerollRequest {
    pub current_dice: Vec<u32>,
    pub familiars: Vec<Familiar>,
    #[serde(default)]
    pub items: Vec<BonusItem>,
    #[serde(default)]
    pub conditionals: Vec<ConditionalBonus>,
    pub difficulty: i64,
    #[serde(default = "default_top_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct RerollResponse {
    pub success: bool,
    pub suggestions: Vec<RerollSuggestion>,
    pub summary: Option<RerollSummary>,
    pub can_pass_with_single_reroll: bool,
    pub top_combinations: Vec<PassingCombination>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateConditionRequest {
    pub condition: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateConditionResponse {
    pub success: bool,
    pub valid: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CacheResponse {
    pub success: bool,
    pub error: Option<String>,
}

// ========== Public API Functions ==========

/// 단일 굴림 점수 계산
pub fn calculate_score_json(request_json: &str) -> String {
    let request: ScoreRequest = match parse_request(request_json) {
        Ok(request) => request,
        Err(err) => {
            return to_json_string(&ScoreResponse {
                success: false,
                result: None,
                error: Some(err.to_string()),
            });
        }
    };

    let calc = ScoreCalculator::new(&EVALUATOR);
    let result = calc.calculate_score(
        &request.dice,
        &request.familiars,
        &request.items,
        &request.conditionals,
    );
    to_json_string(&ScoreResponse { success: true, result: Some(result), error: None })
}

/// 편성 평가 (자리별 내역 포함)
pub fn evaluate_lineup_json(request_json: &str) -> String {
    let request: LineupRequest = match parse_request(request_json) {
        Ok(request) => request,
        Err(err) => {
            return to_json_string(&LineupResponse {
                success: false,
                evaluation: None,
                error: Some(err.to_string()),
            });
        }
    };

    let calc = ScoreCalculator::new(&EVALUATOR);
    let evaluation = calc.evaluate_lineup(&request.familiars, &request.bonuses, &request.dice);
    to_json_string(&LineupResponse { success: true, evaluation: Some(evaluation), error: None })
}

/// 풀에서 조합을 만들어 전략별 최적 편성을 찾는다
pub fn optimize_lineup_json(request_json: &str) -> String {
    let request: OptimizeRequest = match parse_request(request_json) {
        Ok(request) => request,
        Err(err) => {
            return to_json_string(&OptimizeResponse {
                success: false,
                report: None,
                combination_count: 0,
                error: Some(err.to_string()),
            });
        }
    };

    if request.lineup_size == 0 {
        let err = CoreError::InvalidParameter("lineup_size must be positive".to_string());
        return to_json_string(&OptimizeResponse {
            success: false,
            report: None,
            combination_count: 0,
            error: Some(err.to_string()),
        });
    }

    let combinations = generate_combinations(&request.pool, request.lineup_size);
    let report = if request.fast {
        run_all_strategies_fast(&combinations, &request.bonuses, &request.config, &EVALUATOR)
    } else {
        run_all_strategies(&combinations, &request.bonuses, &request.config, &EVALUATOR)
    };
    to_json_string(&OptimizeResponse {
        success: true,
        report: Some(report),
        combination_count: combinations.len(),
        error: None,
    })
}

/// 리롤 제안 + 요약 + 상위 통과 조합
pub fn reroll_analysis_json(request_json: &str) -> String {
    let request: RerollRequest = match parse_request(request_json) {
        Ok(request) => request,
        Err(err) => {
            return to_json_string(&RerollResponse {
                success: false,
                suggestions: Vec::new(),
                summary: None,
                can_pass_with_single_reroll: false,
                top_combinations: Vec::new(),
                error: Some(err.to_string()),
            });
        }
    };

    let analyzer = RerollAnalyzer::new(&EVALUATOR);
    let suggestions = analyzer.calculate_reroll_suggestions(
        &request.current_dice,
        &request.familiars,
        &request.items,
        &request.conditionals,
        request.difficulty,
    );
    let summary = analyzer.get_reroll_summary(&suggestions);
    let can_pass = summary.can_pass;
    let top_combinations = analyzer.find_top_passing_combinations(
        &request.familiars,
        &request.items,
        &request.conditionals,
        request.difficulty,
        request.limit,
    );
    to_json_string(&RerollResponse {
        success: true,
        suggestions,
        summary: Some(summary),
        can_pass_with_single_reroll: can_pass,
        top_combinations,
        error: None,
    })
}

/// 조건식 검증. 저작 도구에서 저장 전에 호출한다.
pub fn validate_condition_json(request_json: &str) -> String {
    let request: ValidateConditionRequest = match parse_request(request_json) {
        Ok(request) => request,
        Err(err) => {
            return to_json_string(&ValidateConditionResponse {
                success: false,
                valid: false,
                error: Some(err.to_string()),
            });
        }
    };

    match EVALUATOR.compile_detailed(&request.condition) {
        Ok(_) => to_json_string(&ValidateConditionResponse {
            success: true,
            valid: true,
            error: None,
        }),
        Err(err) => to_json_string(&ValidateConditionResponse {
            success: true,
            valid: false,
            error: Some(err.to_string()),
        }),
    }
}

/// 조건 카탈로그 리로드 시 컴파일 캐시 무효화
pub fn clear_condition_cache_json() -> String {
    EVALUATOR.clear_cache();
    to_json_string(&CacheResponse { success: true, error: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(response: &str) -> Value {
        serde_json::from_str(response).unwrap()
    }

    #[test]
    fn test_calculate_score_roundtrip() {
        let request = r#"{
            "dice": [3, 4, 5],
            "familiars": [
                {"id": "f1", "name": "수달", "rank": "common", "element": "water", "kind": "beast", "conditional": null},
                {"id": "f2", "name": "늑대", "rank": "rare", "element": "wind", "kind": "beast", "conditional": null},
                {"id": "f3", "name": "여우", "rank": "epic", "element": "fire", "kind": "beast", "conditional": null}
            ]
        }"#;
        let response = parse(&calculate_score_json(request));
        assert_eq!(response["success"], true);
        assert_eq!(response["result"]["dice_sum"], 12);
        assert_eq!(response["result"]["total_multiplier"], Value::Null);
        assert_eq!(response["result"]["final_result"], 12);
    }

    #[test]
    fn test_calculate_score_with_conditional() {
        let request = r#"{
            "dice": [3, 4, 5],
            "conditionals": [
                {"name": "맹공", "condition": "sum(dice) >= 10", "flat_bonus": 5, "multiplier_bonus": 2.0}
            ]
        }"#;
        let response = parse(&calculate_score_json(request));
        assert_eq!(response["result"]["total_flat"], 5);
        assert_eq!(response["result"]["total_multiplier"], 2.0);
        assert_eq!(response["result"]["final_result"], 34);
    }

    #[test]
    fn test_malformed_request_is_rejected() {
        let response = parse(&calculate_score_json("not json"));
        assert_eq!(response["success"], false);
        assert!(response["error"].as_str().unwrap().contains("Deserialization"));
    }

    #[test]
    fn test_optimize_lineup_roundtrip() {
        let request = r#"{
            "pool": [
                {"id": "f1", "name": "수달", "rank": "common", "element": "water", "kind": "beast", "conditional": null},
                {"id": "f2", "name": "늑대", "rank": "rare", "element": "wind", "kind": "beast", "conditional": null},
                {"id": "f3", "name": "여우", "rank": "epic", "element": "fire", "kind": "beast", "conditional": null}
            ],
            "lineup_size": 2
        }"#;
        let response = parse(&optimize_lineup_json(request));
        assert_eq!(response["success"], true);
        assert_eq!(response["combination_count"], 3);
        // 최고 눈 전략은 레어+에픽 (4+5=9)
        assert_eq!(response["report"]["high_rolls"]["score"], 9.0);
    }

    #[test]
    fn test_optimize_rejects_zero_lineup_size() {
        let response = parse(&optimize_lineup_json(r#"{"pool": [], "lineup_size": 0}"#));
        assert_eq!(response["success"], false);
        assert!(response["error"].as_str().unwrap().contains("lineup_size"));
    }

    #[test]
    fn test_reroll_analysis_roundtrip() {
        let request = r#"{
            "current_dice": [1, 1, 1],
            "familiars": [
                {"id": "f1", "name": "수달", "rank": "common", "element": "water", "kind": "beast", "conditional": null},
                {"id": "f2", "name": "수달", "rank": "common", "element": "water", "kind": "beast", "conditional": null},
                {"id": "f3", "name": "수달", "rank": "common", "element": "water", "kind": "beast", "conditional": null}
            ],
            "difficulty": 10
        }"#;
        let response = parse(&reroll_analysis_json(request));
        assert_eq!(response["success"], true);
        assert_eq!(response["can_pass_with_single_reroll"], false);
        assert_eq!(response["summary"]["hopeless_positions"], 3);
        assert_eq!(response["top_combinations"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_validate_condition() {
        let good = parse(&validate_condition_json(r#"{"condition": "sum(dice) >= 10"}"#));
        assert_eq!(good["valid"], true);

        let bad = parse(&validate_condition_json(r#"{"condition": "sum(dice >= 10"}"#));
        assert_eq!(bad["success"], true);
        assert_eq!(bad["valid"], false);
        assert!(bad["error"].as_str().unwrap().contains("syntax"));
    }

    #[test]
    fn test_clear_condition_cache() {
        let response = parse(&clear_condition_cache_json());
        assert_eq!(response["success"], true);
    }
}
