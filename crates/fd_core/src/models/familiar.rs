// 환수 데이터 구조
use serde::{Deserialize, Serialize};

use super::bonus::ConditionalBonus;

/// 환수 등급 (커먼~레전더리)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Common,
    Rare,
    Epic,
    Unique,
    Legendary,
}

impl Rank {
    /// 등급별 주사위 최대 눈
    pub fn die_size(&self) -> u32 {
        match self {
            Rank::Common => 3,
            Rank::Rare => 4,
            Rank::Epic => 5,
            Rank::Unique => 6,
            Rank::Legendary => 6,
        }
    }

    /// 주사위 기대 눈 `(1 + max) / 2`
    pub fn average_die(&self) -> f64 {
        (1 + self.die_size()) as f64 / 2.0
    }

    /// 소문자 식별용 이름 (조건식에서 `it.rank == 'epic'` 형태로 비교)
    pub fn name(&self) -> &'static str {
        match self {
            Rank::Common => "common",
            Rank::Rare => "rare",
            Rank::Epic => "epic",
            Rank::Unique => "unique",
            Rank::Legendary => "legendary",
        }
    }

    /// 등급 표시명
    pub fn display_name(&self) -> &'static str {
        match self {
            Rank::Common => "커먼",
            Rank::Rare => "레어",
            Rank::Epic => "에픽",
            Rank::Unique => "유니크",
            Rank::Legendary => "레전더리",
        }
    }

    /// 등급 색상 (터미널/UI용)
    pub fn color(&self) -> &'static str {
        match self {
            Rank::Common => "gray",
            Rank::Rare => "green",
            Rank::Epic => "blue",
            Rank::Unique => "purple",
            Rank::Legendary => "orange",
        }
    }

    /// 이름으로 등급 찾기 (대소문자 무시)
    pub fn parse(name: &str) -> Option<Rank> {
        match name.to_ascii_lowercase().as_str() {
            "common" => Some(Rank::Common),
            "rare" => Some(Rank::Rare),
            "epic" => Some(Rank::Epic),
            "unique" => Some(Rank::Unique),
            "legendary" => Some(Rank::Legendary),
            _ => None,
        }
    }
}

/// 환수 기록
///
/// 로스터 저장용과 계산 컨텍스트용으로 같은 형태를 공유한다.
/// 계산 쪽은 호출마다 복사본을 받아 쓰고 버린다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Familiar {
    /// 환수 고유 ID
    pub id: String,
    /// 환수 이름
    pub name: String,
    /// 등급 (스캔 실패 등으로 비어 있을 수 있음)
    #[serde(default)]
    pub rank: Option<Rank>,
    /// 속성 태그
    pub element: String,
    /// 종류 태그
    pub kind: String,
    /// 조건부 보너스 (옵션)
    #[serde(default)]
    pub conditional: Option<ConditionalBonus>,
}

impl Familiar {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        rank: Option<Rank>,
        element: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rank,
            element: element.into(),
            kind: kind.into(),
            conditional: None,
        }
    }

    pub fn with_conditional(mut self, bonus: ConditionalBonus) -> Self {
        self.conditional = Some(bonus);
        self
    }

    /// 환수 표시 문자열
    pub fn display(&self) -> String {
        let rank = self.rank.map(|r| r.display_name()).unwrap_or("등급 미확인");
        format!("[{}] {} ({}/{})", rank, self.name, self.element, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_die_sizes() {
        assert_eq!(Rank::Common.die_size(), 3);
        assert_eq!(Rank::Rare.die_size(), 4);
        assert_eq!(Rank::Epic.die_size(), 5);
        assert_eq!(Rank::Unique.die_size(), 6);
        assert_eq!(Rank::Legendary.die_size(), 6);
    }

    #[test]
    fn test_rank_average_die() {
        assert_eq!(Rank::Common.average_die(), 2.0);
        assert_eq!(Rank::Rare.average_die(), 2.5);
        assert_eq!(Rank::Legendary.average_die(), 3.5);
    }

    #[test]
    fn test_rank_parse() {
        assert_eq!(Rank::parse("epic"), Some(Rank::Epic));
        assert_eq!(Rank::parse("Legendary"), Some(Rank::Legendary));
        assert_eq!(Rank::parse("mythic"), None);
        assert_eq!(Rank::parse(""), None);
    }

    #[test]
    fn test_familiar_display() {
        let familiar = Familiar::new("fam_001", "화염 여우", Some(Rank::Epic), "fire", "beast");
        assert_eq!(familiar.display(), "[에픽] 화염 여우 (fire/beast)");
    }
}
