//! Score Calculation Module
//!
//! 주사위 합 + 고정 보너스 + 조건부 보너스를 하나의 점수로 합산한다.
//! 배수가 붙으면 `floor((합 + 고정) * 배수)`, 내림이 규칙이다.

use serde::{Deserialize, Serialize};

use crate::condition::ConditionEvaluator;
use crate::dice::DiceSpace;
use crate::models::{normalize_multiplier, BonusItem, ConditionalBonus, Familiar};

/// 단일 계산 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub dice_sum: i64,
    pub total_flat: i64,
    /// 정규화된 배수 합. 합이 정확히 0이면 None (배수 없음).
    pub total_multiplier: Option<f64>,
    pub final_result: i64,
    /// 발동한 조건부 보너스 이름들
    pub active_conditionals: Vec<String>,
}

/// 자리별 발동 내역
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotBreakdown {
    pub familiar_name: String,
    pub triggered: bool,
    pub bonus_name: Option<String>,
    pub flat: i64,
    pub multiplier: f64,
}

/// 편성 평가 결과: 합산치 + 자리별 내역
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupEvaluation {
    pub dice_sum: i64,
    pub total_flat: i64,
    pub total_multiplier: Option<f64>,
    pub score: i64,
    pub active_conditionals: Vec<String>,
    pub slots: Vec<SlotBreakdown>,
}

impl LineupEvaluation {
    /// 편성 요약 문자열
    pub fn summary(&self) -> String {
        let triggered: Vec<&str> = self
            .slots
            .iter()
            .filter(|s| s.triggered)
            .filter_map(|s| s.bonus_name.as_deref())
            .collect();
        let triggered =
            if triggered.is_empty() { "없음".to_string() } else { triggered.join(", ") };
        format!(
            "점수 {} (주사위 {} + 보너스 {}) / 발동: {}",
            self.score, self.dice_sum, self.total_flat, triggered
        )
    }
}

/// 점수 계산기. 조건식 평가기를 주입받는다.
pub struct ScoreCalculator<'a> {
    evaluator: &'a ConditionEvaluator,
}

impl<'a> ScoreCalculator<'a> {
    pub fn new(evaluator: &'a ConditionEvaluator) -> Self {
        Self { evaluator }
    }

    /// 주사위 + 아이템 + 조건부 보너스의 통합 점수
    pub fn calculate_score(
        &self,
        dice: &[u32],
        familiars: &[Familiar],
        items: &[BonusItem],
        conditionals: &[ConditionalBonus],
    ) -> CalculationResult {
        let dice_sum: i64 = dice.iter().map(|&v| v as i64).sum();
        let mut total_flat = 0i64;
        let mut multiplier_sum = 0.0f64;
        let mut active_conditionals = Vec::new();

        for item in items {
            total_flat += item.flat_bonus;
            multiplier_sum += normalize_multiplier(item.multiplier_bonus);
        }

        for bonus in conditionals {
            let activation = self.evaluator.evaluate_bonus(bonus, dice, familiars);
            if activation.active {
                active_conditionals.push(bonus.name.clone());
                total_flat += activation.flat;
                multiplier_sum += activation.multiplier;
            }
        }

        let (total_multiplier, final_result) = finalize(dice_sum, total_flat, multiplier_sum);
        CalculationResult { dice_sum, total_flat, total_multiplier, final_result, active_conditionals }
    }

    /// 편성 평가: 보너스를 환수별 조건부 + 추가 목록에서 가져오고
    /// 자리 순서 그대로 내역을 만든다.
    pub fn evaluate_lineup(
        &self,
        familiars: &[Familiar],
        additional_bonuses: &[ConditionalBonus],
        dice: &[u32],
    ) -> LineupEvaluation {
        let dice_sum: i64 = dice.iter().map(|&v| v as i64).sum();
        let mut total_flat = 0i64;
        let mut multiplier_sum = 0.0f64;
        let mut active_conditionals = Vec::new();
        let mut slots = Vec::with_capacity(familiars.len());

        for familiar in familiars {
            match &familiar.conditional {
                Some(bonus) => {
                    let activation = self.evaluator.evaluate_bonus(bonus, dice, familiars);
                    if activation.active {
                        active_conditionals.push(bonus.name.clone());
                        total_flat += activation.flat;
                        multiplier_sum += activation.multiplier;
                    }
                    slots.push(SlotBreakdown {
                        familiar_name: familiar.name.clone(),
                        triggered: activation.active,
                        bonus_name: Some(bonus.name.clone()),
                        flat: activation.flat,
                        multiplier: activation.multiplier,
                    });
                }
                None => slots.push(SlotBreakdown {
                    familiar_name: familiar.name.clone(),
                    triggered: false,
                    bonus_name: None,
                    flat: 0,
                    multiplier: 0.0,
                }),
            }
        }

        for bonus in additional_bonuses {
            let activation = self.evaluator.evaluate_bonus(bonus, dice, familiars);
            if activation.active {
                active_conditionals.push(bonus.name.clone());
                total_flat += activation.flat;
                multiplier_sum += activation.multiplier;
            }
        }

        let (total_multiplier, score) = finalize(dice_sum, total_flat, multiplier_sum);
        LineupEvaluation { dice_sum, total_flat, total_multiplier, score, active_conditionals, slots }
    }

    /// 전 주사위 공간에 대한 기대 점수 (전수 평균, 표본 아님)
    pub fn calculate_expected_score(
        &self,
        familiars: &[Familiar],
        additional_bonuses: &[ConditionalBonus],
        max_dice_per_position: &[u32],
    ) -> f64 {
        let mut total = 0.0f64;
        let mut count = 0u64;
        for roll in DiceSpace::new(max_dice_per_position) {
            total += self.evaluate_lineup(familiars, additional_bonuses, &roll).score as f64;
            count += 1;
        }
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }
}

fn finalize(dice_sum: i64, total_flat: i64, multiplier_sum: f64) -> (Option<f64>, i64) {
    if multiplier_sum == 0.0 {
        (None, dice_sum + total_flat)
    } else {
        let multiplied = ((dice_sum + total_flat) as f64) * multiplier_sum;
        (Some(multiplier_sum), multiplied.floor() as i64)
    }
}
