//! Strategy configuration.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static EMPTY_IGNORES: Lazy<HashSet<String>> = Lazy::new(HashSet::new);

/// 편성 전략 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// 기대값 최대화
    Overall,
    /// 전부 최저 눈이 나온 경우
    LowRolls,
    /// 전부 최고 눈이 나온 경우
    HighRolls,
    /// 중앙값 최대화
    Median,
    /// 점수 편차 최소화
    MinVariance,
    /// 하한 보장 (80% 달성율 기준)
    FloorGuarantee,
    /// 저점/평균/고점 가중 합
    Balanced,
    /// 주사위와 무관하게 발동하는 보너스 우선
    DiceIndependent,
}

impl StrategyKind {
    pub fn all() -> [StrategyKind; 8] {
        [
            StrategyKind::Overall,
            StrategyKind::LowRolls,
            StrategyKind::HighRolls,
            StrategyKind::Median,
            StrategyKind::MinVariance,
            StrategyKind::FloorGuarantee,
            StrategyKind::Balanced,
            StrategyKind::DiceIndependent,
        ]
    }

    /// 전략 표시명
    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Overall => "종합",
            StrategyKind::LowRolls => "최저 눈",
            StrategyKind::HighRolls => "최고 눈",
            StrategyKind::Median => "중앙값",
            StrategyKind::MinVariance => "안정",
            StrategyKind::FloorGuarantee => "하한 보장",
            StrategyKind::Balanced => "균형",
            StrategyKind::DiceIndependent => "주사위 무관",
        }
    }
}

/// 전략별 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// 전략 실행 여부
    pub enabled: bool,
    /// 이 전략에서만 무시할 보너스 ID 목록
    #[serde(default)]
    pub ignored_bonus_ids: HashSet<String>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self { enabled: true, ignored_bonus_ids: HashSet::new() }
    }
}

/// 전체 전략 설정. 기본값은 모두 활성, 무시 목록 없음.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub strategies: HashMap<StrategyKind, StrategyConfig>,
}

impl OptimizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, kind: StrategyKind) -> bool {
        self.strategies.get(&kind).map_or(true, |c| c.enabled)
    }

    pub fn ignored(&self, kind: StrategyKind) -> &HashSet<String> {
        self.strategies.get(&kind).map_or(&EMPTY_IGNORES, |c| &c.ignored_bonus_ids)
    }

    pub fn disable(&mut self, kind: StrategyKind) {
        self.strategies.entry(kind).or_default().enabled = false;
    }

    pub fn ignore_bonus(&mut self, kind: StrategyKind, bonus_id: impl Into<String>) {
        self.strategies.entry(kind).or_default().ignored_bonus_ids.insert(bonus_id.into());
    }
}
