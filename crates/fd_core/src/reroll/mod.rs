//! Reroll / Difficulty Analysis Module
//!
//! 실패한 굴림을 어느 자리 리롤로 살릴 수 있는지, 그리고 유효 상한을
//! 지키는 주사위 조합 중 난이도를 넘기는 것들을 확률 순으로 뽑는다.

use serde::{Deserialize, Serialize};

use crate::condition::ConditionEvaluator;
use crate::dice::{self, DiceSpace};
use crate::models::{BonusItem, ConditionalBonus, Familiar};
use crate::scoring::ScoreCalculator;

/// 상위 통과 조합 기본 개수
pub const DEFAULT_TOP_LIMIT: usize = 5;

const DEFAULT_DIE_SIZE: u32 = 3;

/// 자리별 리롤 제안
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerollSuggestion {
    pub position: usize,
    pub current_value: u32,
    /// 지금 굴림이 이미 난이도를 넘는지
    pub current_passes: bool,
    /// 난이도를 넘기는 눈들
    pub passing_values: Vec<u32>,
    /// 통과 확률(%). 통과 눈이 없으면 None.
    pub odds: Option<u32>,
}

/// 리롤 가능성 요약
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerollSummary {
    pub can_pass: bool,
    pub best_odds: Option<u32>,
    /// 통과 눈이 하나라도 있는 자리 수
    pub passable_positions: usize,
    /// 어떤 눈으로도 통과가 안 되는 자리 수
    pub hopeless_positions: usize,
}

/// 난이도를 넘기는 주사위 조합과 그 확률
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassingCombination {
    pub dice: Vec<u32>,
    pub score: i64,
    /// 각 자리에서 이 눈 이상이 나올 확률의 곱 (%)
    pub probability: f64,
}

/// 리롤/난이도 분석기
pub struct RerollAnalyzer<'a> {
    evaluator: &'a ConditionEvaluator,
}

impl<'a> RerollAnalyzer<'a> {
    pub fn new(evaluator: &'a ConditionEvaluator) -> Self {
        Self { evaluator }
    }

    /// 자리별로 1..=최대 눈을 전부 대입해 난이도를 넘기는 눈을 모은다.
    /// 다른 자리는 현재 굴림 그대로 둔다.
    pub fn calculate_reroll_suggestions(
        &self,
        current_dice: &[u32],
        familiars: &[Familiar],
        items: &[BonusItem],
        conditionals: &[ConditionalBonus],
        difficulty: i64,
    ) -> Vec<RerollSuggestion> {
        let calc = ScoreCalculator::new(self.evaluator);
        let maxima = dice::position_maxima(familiars);
        let current_passes =
            calc.calculate_score(current_dice, familiars, items, conditionals).final_result
                >= difficulty;

        let mut suggestions = Vec::with_capacity(current_dice.len());
        for (position, &current_value) in current_dice.iter().enumerate() {
            let max = maxima.get(position).copied().unwrap_or(DEFAULT_DIE_SIZE);
            let mut passing_values = Vec::new();
            for value in 1..=max {
                let mut candidate = current_dice.to_vec();
                candidate[position] = value;
                let score =
                    calc.calculate_score(&candidate, familiars, items, conditionals).final_result;
                if score >= difficulty {
                    passing_values.push(value);
                }
            }
            let odds = if passing_values.is_empty() {
                None
            } else {
                Some(((passing_values.len() as f64 / max as f64) * 100.0).round() as u32)
            };
            suggestions.push(RerollSuggestion {
                position,
                current_value,
                current_passes,
                passing_values,
                odds,
            });
        }
        suggestions
    }

    /// 아직 통과하지 못한 자리 중 확률이 가장 높은 제안.
    /// 대상이 없으면 None.
    pub fn get_best_reroll_option<'s>(
        &self,
        suggestions: &'s [RerollSuggestion],
    ) -> Option<&'s RerollSuggestion> {
        let mut best: Option<&RerollSuggestion> = None;
        for suggestion in suggestions {
            if suggestion.current_passes || suggestion.passing_values.is_empty() {
                continue;
            }
            let better = match best {
                None => true,
                Some(current) => suggestion.odds.unwrap_or(0) > current.odds.unwrap_or(0),
            };
            if better {
                best = Some(suggestion);
            }
        }
        best
    }

    /// 한 번의 리롤로 통과 가능한 자리가 있는지
    pub fn can_pass_with_single_reroll(&self, suggestions: &[RerollSuggestion]) -> bool {
        suggestions.iter().any(|s| !s.passing_values.is_empty())
    }

    /// 제안 목록의 집계 요약
    pub fn get_reroll_summary(&self, suggestions: &[RerollSuggestion]) -> RerollSummary {
        RerollSummary {
            can_pass: self.can_pass_with_single_reroll(suggestions),
            best_odds: suggestions.iter().filter_map(|s| s.odds).max(),
            passable_positions: suggestions.iter().filter(|s| !s.passing_values.is_empty()).count(),
            hopeless_positions: suggestions.iter().filter(|s| s.passing_values.is_empty()).count(),
        }
    }

    /// 유효 상한을 지키는 전체 주사위 공간에서 난이도를 넘기는 조합을
    /// "이 눈 이상이 나올 확률" 순으로 상위 limit개 뽑는다.
    pub fn find_top_passing_combinations(
        &self,
        familiars: &[Familiar],
        items: &[BonusItem],
        conditionals: &[ConditionalBonus],
        difficulty: i64,
        limit: usize,
    ) -> Vec<PassingCombination> {
        let calc = ScoreCalculator::new(self.evaluator);
        let caps = dice::effective_caps(familiars);

        let mut passing = Vec::new();
        for roll in DiceSpace::new(&caps) {
            let score = calc.calculate_score(&roll, familiars, items, conditionals).final_result;
            if score >= difficulty {
                let probability = roll
                    .iter()
                    .zip(caps.iter())
                    .map(|(&value, &max)| (max - value + 1) as f64 / max as f64)
                    .product::<f64>()
                    * 100.0;
                passing.push(PassingCombination { dice: roll, score, probability });
            }
        }

        passing.sort_by(|a, b| {
            b.probability.partial_cmp(&a.probability).unwrap_or(std::cmp::Ordering::Equal)
        });
        passing.truncate(limit);
        passing
    }
}
