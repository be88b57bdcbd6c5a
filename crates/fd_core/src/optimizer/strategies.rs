//! Lineup Optimization Strategies
//!
//! 전략별 "조합 하나를 점수화"하는 로직과 "지금까지의 최선"을 고르는
//! 로직을 분리해 둔다. 동기 탐색과 취소 가능한 탐색이 같은 선택기를
//! 공유한다. 비교는 항상 strictly-greater, 동점이면 먼저 본 조합이 이긴다.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::condition::ConditionEvaluator;
use crate::dice;
use crate::models::{ConditionalBonus, Familiar};
use crate::scoring::ScoreCalculator;

use super::config::{OptimizerConfig, StrategyKind};

/// 조합 수가 이 값을 넘으면 점수화를 병렬로 돌린다
const PARALLEL_THRESHOLD: usize = 50;
/// 하한 보장 전략의 목표 달성율 (%)
const FLOOR_COVERAGE_TARGET: f64 = 80.0;
/// 하한 = 평균의 80%
const FLOOR_RATIO: f64 = 0.8;

/// 전략이 고른 편성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedLineup {
    pub familiars: Vec<Familiar>,
    /// 전략 고유 점수 (전략마다 의미가 다르다)
    pub score: f64,
    /// 사람이 읽는 점수 설명
    pub score_label: String,
    /// 내역 표시에 쓴 주사위 눈
    pub dice: Vec<u32>,
}

/// 전략별 결과 묶음. 비활성화됐거나 조건을 만족하는 조합이 없으면 None.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyReport {
    pub overall: Option<OptimizedLineup>,
    pub low_rolls: Option<OptimizedLineup>,
    pub high_rolls: Option<OptimizedLineup>,
    pub median: Option<OptimizedLineup>,
    pub min_variance: Option<OptimizedLineup>,
    pub floor_guarantee: Option<OptimizedLineup>,
    pub balanced: Option<OptimizedLineup>,
    pub dice_independent: Option<OptimizedLineup>,
}

impl StrategyReport {
    pub fn get(&self, kind: StrategyKind) -> Option<&OptimizedLineup> {
        match kind {
            StrategyKind::Overall => self.overall.as_ref(),
            StrategyKind::LowRolls => self.low_rolls.as_ref(),
            StrategyKind::HighRolls => self.high_rolls.as_ref(),
            StrategyKind::Median => self.median.as_ref(),
            StrategyKind::MinVariance => self.min_variance.as_ref(),
            StrategyKind::FloorGuarantee => self.floor_guarantee.as_ref(),
            StrategyKind::Balanced => self.balanced.as_ref(),
            StrategyKind::DiceIndependent => self.dice_independent.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, kind: StrategyKind) -> &mut Option<OptimizedLineup> {
        match kind {
            StrategyKind::Overall => &mut self.overall,
            StrategyKind::LowRolls => &mut self.low_rolls,
            StrategyKind::HighRolls => &mut self.high_rolls,
            StrategyKind::Median => &mut self.median,
            StrategyKind::MinVariance => &mut self.min_variance,
            StrategyKind::FloorGuarantee => &mut self.floor_guarantee,
            StrategyKind::Balanced => &mut self.balanced,
            StrategyKind::DiceIndependent => &mut self.dice_independent,
        }
    }
}

/// 조합 하나의 점수화 결과
pub(crate) enum ComboScore {
    /// (1차 키, 2차 키) 사전식 최대를 고르는 전략들
    Key { primary: f64, secondary: f64, lineup: OptimizedLineup },
    /// 하한 보장 전략: 달성율과 하한값을 둘 다 들고 간다
    Floor { floor_value: f64, coverage: f64, familiars: Vec<Familiar>, dice: Vec<u32> },
}

/// 지금까지의 최선을 고르는 선택기
pub(crate) struct StrategySelector {
    kind: StrategyKind,
    best_key: Option<(f64, f64)>,
    best_lineup: Option<OptimizedLineup>,
    floor_primary: Option<(f64, OptimizedLineup)>,
    floor_fallback: Option<(f64, OptimizedLineup)>,
}

impl StrategySelector {
    pub(crate) fn new(kind: StrategyKind) -> Self {
        Self {
            kind,
            best_key: None,
            best_lineup: None,
            floor_primary: None,
            floor_fallback: None,
        }
    }

    pub(crate) fn offer(&mut self, score: ComboScore) {
        match score {
            ComboScore::Key { primary, secondary, lineup } => {
                let better = match self.best_key {
                    None => true,
                    Some((bp, bs)) => primary > bp || (primary == bp && secondary > bs),
                };
                if better {
                    self.best_key = Some((primary, secondary));
                    self.best_lineup = Some(lineup);
                }
            }
            ComboScore::Floor { floor_value, coverage, familiars, dice } => {
                // 1차: 목표 달성율을 넘긴 조합 중 하한값 최대
                if coverage >= FLOOR_COVERAGE_TARGET {
                    let better =
                        self.floor_primary.as_ref().map_or(true, |(best, _)| floor_value > *best);
                    if better {
                        self.floor_primary = Some((
                            floor_value,
                            OptimizedLineup {
                                familiars: familiars.clone(),
                                score: floor_value,
                                score_label: format!(
                                    "달성율 {coverage:.0}%로 {floor_value:.1} 이상 보장"
                                ),
                                dice: dice.clone(),
                            },
                        ));
                    }
                }
                // 2차(폴백): 달성율 자체의 최대. 1차와는 별개의 순위 절차다.
                let better =
                    self.floor_fallback.as_ref().map_or(true, |(best, _)| coverage > *best);
                if better {
                    self.floor_fallback = Some((
                        coverage,
                        OptimizedLineup {
                            familiars,
                            score: floor_value,
                            score_label: format!(
                                "최대 달성율 {coverage:.0}% ({floor_value:.1} 이상)"
                            ),
                            dice,
                        },
                    ));
                }
            }
        }
    }

    pub(crate) fn finish(self) -> Option<OptimizedLineup> {
        if self.kind == StrategyKind::FloorGuarantee {
            self.floor_primary
                .map(|(_, lineup)| lineup)
                .or(self.floor_fallback.map(|(_, lineup)| lineup))
        } else {
            self.best_lineup
        }
    }
}

/// 조합 하나를 전략 기준으로 점수화.
/// None은 해당 전략의 자격 미달(주사위 무관 전략의 필터 등)이다.
pub(crate) fn score_combination(
    kind: StrategyKind,
    combo: &[Familiar],
    bonuses: &[ConditionalBonus],
    evaluator: &ConditionEvaluator,
    fast: bool,
) -> Option<ComboScore> {
    let calc = ScoreCalculator::new(evaluator);
    let maxima = dice::position_maxima(combo);
    let averages = dice::ceil_average_dice(combo);

    match kind {
        StrategyKind::Overall => {
            if fast {
                let score = calc.evaluate_lineup(combo, bonuses, &averages).score;
                Some(key_score(
                    score as f64,
                    0.0,
                    combo,
                    score as f64,
                    format!("평균눈 기준 {score}"),
                    averages,
                ))
            } else {
                let expected = calc.calculate_expected_score(combo, bonuses, &maxima);
                Some(key_score(
                    expected,
                    0.0,
                    combo,
                    expected,
                    format!("기대값 {expected:.2}"),
                    averages,
                ))
            }
        }
        StrategyKind::LowRolls => {
            let lows = vec![1u32; combo.len()];
            let score = calc.evaluate_lineup(combo, bonuses, &lows).score;
            Some(key_score(score as f64, 0.0, combo, score as f64, format!("최저 눈 {score}"), lows))
        }
        StrategyKind::HighRolls => {
            let score = calc.evaluate_lineup(combo, bonuses, &maxima).score;
            Some(key_score(
                score as f64,
                0.0,
                combo,
                score as f64,
                format!("최고 눈 {score}"),
                maxima,
            ))
        }
        StrategyKind::Median => {
            let dist = score_distribution(&calc, combo, bonuses, &maxima);
            if dist.is_empty() {
                return None;
            }
            let median = median_of(&dist);
            Some(key_score(median, 0.0, combo, median, format!("중앙값 {median:.1}"), averages))
        }
        StrategyKind::MinVariance => {
            let dist = score_distribution(&calc, combo, bonuses, &maxima);
            if dist.is_empty() {
                return None;
            }
            let mean = mean_of(&dist);
            let std_dev = std_dev_of(&dist, mean);
            // 편차가 작을수록 좋고, 동률이면 평균이 높은 쪽
            Some(key_score(
                -std_dev,
                mean,
                combo,
                std_dev,
                format!("표준편차 {std_dev:.2} (평균 {mean:.2})"),
                averages,
            ))
        }
        StrategyKind::FloorGuarantee => {
            let dist = score_distribution(&calc, combo, bonuses, &maxima);
            if dist.is_empty() {
                return None;
            }
            let mean = mean_of(&dist);
            let floor_value = FLOOR_RATIO * mean;
            let covered = dist.iter().filter(|&&s| s as f64 >= floor_value).count();
            let coverage = covered as f64 / dist.len() as f64 * 100.0;
            Some(ComboScore::Floor {
                floor_value,
                coverage,
                familiars: combo.to_vec(),
                dice: averages,
            })
        }
        StrategyKind::Balanced => {
            let dist = score_distribution(&calc, combo, bonuses, &maxima);
            if dist.is_empty() {
                return None;
            }
            let mean = mean_of(&dist);
            let low = dist.iter().copied().min().unwrap_or(0) as f64;
            let high = dist.iter().copied().max().unwrap_or(0) as f64;
            let weighted = 0.25 * low + 0.50 * mean + 0.25 * high;
            Some(key_score(
                weighted,
                0.0,
                combo,
                weighted,
                format!("균형 점수 {weighted:.2}"),
                averages,
            ))
        }
        StrategyKind::DiceIndependent => {
            if !combo.iter().all(|f| is_dice_independent(f, evaluator)) {
                return None;
            }
            // 주사위 없이(빈 배열) 평가해서 구성만으로 확정되는 보너스를 센다
            let guaranteed = combo
                .iter()
                .filter(|f| {
                    f.conditional
                        .as_ref()
                        .is_some_and(|b| evaluator.evaluate(&b.condition, &[], combo))
                })
                .count();
            let score = calc.evaluate_lineup(combo, bonuses, &averages).score;
            Some(key_score(
                guaranteed as f64,
                score as f64,
                combo,
                score as f64,
                format!("확정 보너스 {guaranteed}개 / 점수 {score}"),
                averages,
            ))
        }
    }
}

fn key_score(
    primary: f64,
    secondary: f64,
    combo: &[Familiar],
    score: f64,
    score_label: String,
    dice: Vec<u32>,
) -> ComboScore {
    ComboScore::Key {
        primary,
        secondary,
        lineup: OptimizedLineup { familiars: combo.to_vec(), score, score_label, dice },
    }
}

/// 조건이 주사위를 참조하지 않아야 "주사위 무관" 자격이 있다.
/// 조건이 없거나 리터럴 true면 통과.
fn is_dice_independent(familiar: &Familiar, evaluator: &ConditionEvaluator) -> bool {
    match &familiar.conditional {
        None => true,
        Some(bonus) => {
            let condition = bonus.condition.trim();
            condition.is_empty()
                || condition == "true"
                || !evaluator.references_dice(&bonus.condition)
        }
    }
}

fn score_distribution(
    calc: &ScoreCalculator,
    combo: &[Familiar],
    bonuses: &[ConditionalBonus],
    maxima: &[u32],
) -> Vec<i64> {
    dice::DiceSpace::new(maxima)
        .map(|roll| calc.evaluate_lineup(combo, bonuses, &roll).score)
        .collect()
}

fn mean_of(dist: &[i64]) -> f64 {
    dist.iter().map(|&s| s as f64).sum::<f64>() / dist.len() as f64
}

fn std_dev_of(dist: &[i64], mean: f64) -> f64 {
    let variance =
        dist.iter().map(|&s| (s as f64 - mean).powi(2)).sum::<f64>() / dist.len() as f64;
    variance.sqrt()
}

fn median_of(dist: &[i64]) -> f64 {
    let mut sorted = dist.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// 전략 기준 최고 조합 탐색. 빈 입력이면 None.
pub fn find_best_lineup(
    combinations: &[Vec<Familiar>],
    bonuses: &[ConditionalBonus],
    kind: StrategyKind,
    evaluator: &ConditionEvaluator,
) -> Option<OptimizedLineup> {
    search_best(combinations, bonuses, kind, evaluator, false)
}

/// `find_best_lineup`과 같은 계약이되, 종합 전략을 기대값 대신
/// 평균눈으로 점수화한다 (속도/정확도 트레이드오프).
pub fn find_best_lineup_fast(
    combinations: &[Vec<Familiar>],
    bonuses: &[ConditionalBonus],
    kind: StrategyKind,
    evaluator: &ConditionEvaluator,
) -> Option<OptimizedLineup> {
    search_best(combinations, bonuses, kind, evaluator, true)
}

fn search_best(
    combinations: &[Vec<Familiar>],
    bonuses: &[ConditionalBonus],
    kind: StrategyKind,
    evaluator: &ConditionEvaluator,
    fast: bool,
) -> Option<OptimizedLineup> {
    if combinations.is_empty() {
        return None;
    }
    log::debug!("{}: {} combinations to score", kind.label(), combinations.len());

    // 점수화는 병렬로 돌려도 되지만 선택은 입력 순서대로 접는다
    let scored: Vec<Option<ComboScore>> = if combinations.len() > PARALLEL_THRESHOLD {
        combinations
            .par_iter()
            .map(|combo| score_combination(kind, combo, bonuses, evaluator, fast))
            .collect()
    } else {
        combinations
            .iter()
            .map(|combo| score_combination(kind, combo, bonuses, evaluator, fast))
            .collect()
    };

    let mut selector = StrategySelector::new(kind);
    for score in scored.into_iter().flatten() {
        selector.offer(score);
    }
    selector.finish()
}

/// 전략별 무시 목록 적용: 환수 조건부는 비우고, 추가 보너스는 뺀다.
pub(crate) fn apply_ignores(
    combinations: &[Vec<Familiar>],
    bonuses: &[ConditionalBonus],
    ignored: &HashSet<String>,
) -> (Vec<Vec<Familiar>>, Vec<ConditionalBonus>) {
    if ignored.is_empty() {
        return (combinations.to_vec(), bonuses.to_vec());
    }

    let combinations = combinations
        .iter()
        .map(|combo| {
            combo
                .iter()
                .map(|familiar| {
                    let mut familiar = familiar.clone();
                    let ignore = familiar
                        .conditional
                        .as_ref()
                        .and_then(|b| b.id.as_ref())
                        .is_some_and(|id| ignored.contains(id));
                    if ignore {
                        familiar.conditional = None;
                    }
                    familiar
                })
                .collect()
        })
        .collect();

    let bonuses = bonuses
        .iter()
        .filter(|b| !b.id.as_ref().is_some_and(|id| ignored.contains(id)))
        .cloned()
        .collect();

    (combinations, bonuses)
}

/// 활성화된 모든 전략 실행. 전략 하나가 빈 결과여도 나머지는 계속 돈다.
pub fn run_all_strategies(
    combinations: &[Vec<Familiar>],
    bonuses: &[ConditionalBonus],
    config: &OptimizerConfig,
    evaluator: &ConditionEvaluator,
) -> StrategyReport {
    run_strategies(combinations, bonuses, config, evaluator, false)
}

/// `run_all_strategies`의 평균눈 기반 변형
pub fn run_all_strategies_fast(
    combinations: &[Vec<Familiar>],
    bonuses: &[ConditionalBonus],
    config: &OptimizerConfig,
    evaluator: &ConditionEvaluator,
) -> StrategyReport {
    run_strategies(combinations, bonuses, config, evaluator, true)
}

fn run_strategies(
    combinations: &[Vec<Familiar>],
    bonuses: &[ConditionalBonus],
    config: &OptimizerConfig,
    evaluator: &ConditionEvaluator,
    fast: bool,
) -> StrategyReport {
    let mut report = StrategyReport::default();
    for kind in StrategyKind::all() {
        if !config.is_enabled(kind) {
            continue;
        }
        let (combinations, bonuses) = apply_ignores(combinations, bonuses, config.ignored(kind));
        *report.slot_mut(kind) = search_best(&combinations, &bonuses, kind, evaluator, fast);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rank;
    use crate::optimizer::combinations::generate_combinations;

    fn evaluator() -> ConditionEvaluator {
        ConditionEvaluator::new()
    }

    fn common(id: &str) -> Familiar {
        Familiar::new(id, format!("수달 {id}"), Some(Rank::Common), "water", "beast")
    }

    #[test]
    fn test_empty_input_yields_none() {
        let evaluator = evaluator();
        assert!(find_best_lineup(&[], &[], StrategyKind::Overall, &evaluator).is_none());
        assert!(find_best_lineup_fast(&[], &[], StrategyKind::LowRolls, &evaluator).is_none());
    }

    #[test]
    fn test_high_rolls_prefers_bigger_dice() {
        let evaluator = evaluator();
        let weak = vec![common("c1")];
        let strong =
            vec![Familiar::new("u1", "유니크 용", Some(Rank::Unique), "fire", "dragon")];
        let combos = vec![weak.clone(), strong.clone()];

        let best = find_best_lineup(&combos, &[], StrategyKind::HighRolls, &evaluator).unwrap();
        assert_eq!(best.familiars[0].id, "u1");
        assert_eq!(best.score, 6.0);
        assert_eq!(best.dice, vec![6]);
    }

    #[test]
    fn test_low_rolls_scores_all_ones() {
        let evaluator = evaluator();
        let combos = vec![vec![common("c1"), common("c2")]];
        let best = find_best_lineup(&combos, &[], StrategyKind::LowRolls, &evaluator).unwrap();
        assert_eq!(best.score, 2.0);
        assert_eq!(best.dice, vec![1, 1]);
    }

    #[test]
    fn test_first_seen_wins_ties() {
        let evaluator = evaluator();
        let combos = vec![vec![common("first")], vec![common("second")]];
        let best = find_best_lineup(&combos, &[], StrategyKind::LowRolls, &evaluator).unwrap();
        assert_eq!(best.familiars[0].id, "first");
    }

    #[test]
    fn test_overall_uses_expectation_and_fast_uses_averages() {
        let evaluator = evaluator();
        // 4 이상에서만 발동하는 보너스: 기대값에는 일부 반영되고
        // 평균눈(올림 3)으로는 발동하지 않는다
        let rare = Familiar::new("r1", "레어 늑대", Some(Rank::Rare), "wind", "beast")
            .with_conditional(ConditionalBonus::new("고득점", "dice[0] >= 4", 8, 0.0));
        let combos = vec![vec![rare]];

        let exact =
            find_best_lineup(&combos, &[], StrategyKind::Overall, &evaluator).unwrap();
        // 분포 {1,2,3,12} 평균 = 4.5
        assert!((exact.score - 4.5).abs() < 1e-9);

        let fast =
            find_best_lineup_fast(&combos, &[], StrategyKind::Overall, &evaluator).unwrap();
        assert_eq!(fast.score, 3.0);
        assert_eq!(fast.dice, vec![3]);
    }

    #[test]
    fn test_median_even_distribution() {
        let evaluator = evaluator();
        let rare = vec![Familiar::new("r1", "레어 늑대", Some(Rank::Rare), "wind", "beast")];
        let best =
            find_best_lineup(&[rare], &[], StrategyKind::Median, &evaluator).unwrap();
        // {1,2,3,4}의 중앙값 = 2.5
        assert_eq!(best.score, 2.5);
    }

    #[test]
    fn test_min_variance_tie_breaks_on_mean() {
        let evaluator = evaluator();
        let plain = vec![common("c1")];
        // 고정 +5 보너스는 분포 모양(편차)을 바꾸지 않고 평균만 끌어올린다
        let boosted = vec![common("c2")
            .with_conditional(ConditionalBonus::new("상시 강화", "true", 5, 0.0))];
        let combos = vec![plain, boosted];

        let best =
            find_best_lineup(&combos, &[], StrategyKind::MinVariance, &evaluator).unwrap();
        assert_eq!(best.familiars[0].id, "c2");
    }

    #[test]
    fn test_floor_guarantee_prefers_coverage_over_mean() {
        let evaluator = evaluator();
        // spiky: 평균은 높지만 하한(0.8*평균) 아래 눈이 1/3이라 달성율 미달
        let spiky = vec![common("spiky")
            .with_conditional(ConditionalBonus::new("폭발", "dice[0] >= 2", 100, 0.0))];
        // steady: 평균은 낮아도 전 구간이 하한 위
        let steady = vec![common("steady")
            .with_conditional(ConditionalBonus::new("상시", "true", 10, 0.0))];
        let combos = vec![spiky, steady];

        let best =
            find_best_lineup(&combos, &[], StrategyKind::FloorGuarantee, &evaluator).unwrap();
        assert_eq!(best.familiars[0].id, "steady");
    }

    #[test]
    fn test_floor_guarantee_fallback_when_none_reach_target() {
        let evaluator = evaluator();
        // 혼자서는 달성율 33%: {1,2,103} 하한 28.3 위는 103 하나뿐
        let a = vec![common("a")
            .with_conditional(ConditionalBonus::new("대폭발", "dice[0] >= 3", 100, 0.0))];
        // {1,102,103} 달성율 66%
        let b = vec![common("b")
            .with_conditional(ConditionalBonus::new("중폭발", "dice[0] >= 2", 100, 0.0))];
        let combos = vec![a, b];

        let best =
            find_best_lineup(&combos, &[], StrategyKind::FloorGuarantee, &evaluator).unwrap();
        // 아무도 80%를 못 넘기면 달성율이 가장 높은 쪽
        assert_eq!(best.familiars[0].id, "b");
    }

    #[test]
    fn test_balanced_weighting() {
        let evaluator = evaluator();
        let combos = vec![vec![common("c1")]];
        let best = find_best_lineup(&combos, &[], StrategyKind::Balanced, &evaluator).unwrap();
        // 0.25*1 + 0.5*2 + 0.25*3 = 2.0
        assert!((best.score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_dice_independent_filters_and_counts() {
        let evaluator = evaluator();
        let dice_bound = vec![common("bound")
            .with_conditional(ConditionalBonus::new("큰 눈", "sum(dice) >= 5", 50, 0.0))];
        let composition = vec![common("comp")
            .with_conditional(ConditionalBonus::new(
                "수달 결속",
                "familiars.all(it.kind == 'beast')",
                5,
                0.0,
            ))];
        let plain = vec![common("plain")];
        let combos = vec![dice_bound, plain, composition];

        let best =
            find_best_lineup(&combos, &[], StrategyKind::DiceIndependent, &evaluator).unwrap();
        // 주사위를 참조하는 조합은 탈락, 확정 보너스 1개가 0개를 이긴다
        assert_eq!(best.familiars[0].id, "comp");
    }

    #[test]
    fn test_dice_independent_none_when_all_reference_dice() {
        let evaluator = evaluator();
        let combos = vec![vec![common("bound")
            .with_conditional(ConditionalBonus::new("큰 눈", "dice[0] >= 2", 5, 0.0))]];
        assert!(find_best_lineup(&combos, &[], StrategyKind::DiceIndependent, &evaluator)
            .is_none());
    }

    #[test]
    fn test_run_all_strategies_respects_config() {
        let evaluator = evaluator();
        let pool = vec![common("c1"), common("c2"), common("c3")];
        let combos = generate_combinations(&pool, 2);

        let mut config = OptimizerConfig::new();
        config.disable(StrategyKind::Median);
        let report = run_all_strategies(&combos, &[], &config, &evaluator);

        assert!(report.overall.is_some());
        assert!(report.median.is_none());
        assert!(report.floor_guarantee.is_some());
        assert_eq!(report.get(StrategyKind::Median).map(|l| l.score), None);
    }

    #[test]
    fn test_ignored_bonus_ids_apply_per_strategy() {
        let evaluator = evaluator();
        let boosted = common("c1")
            .with_conditional(ConditionalBonus::new("상시 강화", "true", 10, 0.0).with_id("b1"));
        let combos = vec![vec![boosted]];

        let mut config = OptimizerConfig::new();
        config.ignore_bonus(StrategyKind::LowRolls, "b1");
        let report = run_all_strategies(&combos, &[], &config, &evaluator);

        // low_rolls에서만 보너스가 무시된다
        assert_eq!(report.low_rolls.unwrap().score, 1.0);
        assert_eq!(report.high_rolls.unwrap().score, 13.0);
    }

    #[test]
    fn test_ignored_standalone_bonus_is_dropped() {
        let evaluator = evaluator();
        let combos = vec![vec![common("c1")]];
        let extra = ConditionalBonus::new("외부 보너스", "true", 7, 0.0).with_id("x1");

        let mut config = OptimizerConfig::new();
        config.ignore_bonus(StrategyKind::HighRolls, "x1");
        let report = run_all_strategies(&combos, &[extra], &config, &evaluator);

        assert_eq!(report.high_rolls.unwrap().score, 3.0);
        assert_eq!(report.low_rolls.unwrap().score, 8.0);
    }
}
