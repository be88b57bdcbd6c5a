// 보너스 데이터 구조
use serde::{Deserialize, Serialize};

use super::familiar::Rank;

/// 조건부 보너스
///
/// 발동 조건은 문자열 조건식으로 들고 다니며, 평가 시점에 컴파일된다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalBonus {
    /// 보너스 ID (전략별 무시 목록에서 참조)
    #[serde(default)]
    pub id: Option<String>,
    /// 보너스 이름
    pub name: String,
    /// 발동 조건식
    pub condition: String,
    /// 고정 가산치
    pub flat_bonus: i64,
    /// 배수 가산치
    pub multiplier_bonus: f64,
    /// 보너스 희귀도 (옵션)
    #[serde(default)]
    pub rarity: Option<Rank>,
}

impl ConditionalBonus {
    pub fn new(
        name: impl Into<String>,
        condition: impl Into<String>,
        flat_bonus: i64,
        multiplier_bonus: f64,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            condition: condition.into(),
            flat_bonus,
            multiplier_bonus,
            rarity: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_rarity(mut self, rarity: Rank) -> Self {
        self.rarity = Some(rarity);
        self
    }
}

/// 아이템 보너스 (무조건 적용)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusItem {
    pub id: String,
    pub name: String,
    pub flat_bonus: i64,
    pub multiplier_bonus: f64,
}

impl BonusItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        flat_bonus: i64,
        multiplier_bonus: f64,
    ) -> Self {
        Self { id: id.into(), name: name.into(), flat_bonus, multiplier_bonus }
    }
}

/// 배수 정규화
///
/// x0과 x1은 "배수 효과 없음"을 뜻하는 저작 규칙이므로 0으로 내린다.
pub fn normalize_multiplier(multiplier: f64) -> f64 {
    if multiplier == 0.0 || multiplier == 1.0 {
        0.0
    } else {
        multiplier
    }
}
