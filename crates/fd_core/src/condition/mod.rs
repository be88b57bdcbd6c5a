//! Conditional Expression Module
//!
//! 조건식 컴파일/캐시/평가. 파싱이나 평가가 어디서 깨지든
//! 공개 경계 밖으로는 `false` 한 가지로만 보인다.

mod eval;
mod lexer;
mod parser;

pub use parser::Expr;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::models::{normalize_multiplier, ConditionalBonus, Familiar};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConditionError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("evaluation error: {0}")]
    Eval(String),
}

/// 보너스 평가 결과
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonusActivation {
    pub active: bool,
    pub flat: i64,
    pub multiplier: f64,
}

impl BonusActivation {
    fn inactive() -> Self {
        Self { active: false, flat: 0, multiplier: 0.0 }
    }
}

#[derive(Clone)]
enum CachedProgram {
    Compiled(Arc<Expr>),
    Failed(ConditionError),
}

/// 조건식 평가기
///
/// 컴파일 결과를 원본 문자열 기준으로 캐시한다. 같은 카탈로그가
/// 조합 탐색에서 수백만 번 평가되므로 실패한 문자열도 캐시해서
/// 재파싱을 막는다.
pub struct ConditionEvaluator {
    cache: Mutex<HashMap<String, CachedProgram>>,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self { cache: Mutex::new(HashMap::new()) }
    }

    /// 조건식 컴파일 (캐시 경유)
    pub fn compile(&self, condition: &str) -> Option<Arc<Expr>> {
        match self.compile_detailed(condition) {
            Ok(expr) => Some(expr),
            Err(_) => None,
        }
    }

    /// 조건식 컴파일, 진단용 오류 포함. 저작 도구의 검증 경로가 쓴다.
    pub fn compile_detailed(&self, condition: &str) -> Result<Arc<Expr>, ConditionError> {
        let mut cache = self.cache.lock().expect("condition cache lock poisoned");
        if let Some(entry) = cache.get(condition) {
            return match entry {
                CachedProgram::Compiled(expr) => Ok(expr.clone()),
                CachedProgram::Failed(err) => Err(err.clone()),
            };
        }

        let compiled = lexer::tokenize(condition).and_then(|tokens| parser::parse(&tokens));
        match compiled {
            Ok(expr) => {
                let expr = Arc::new(expr);
                cache.insert(condition.to_string(), CachedProgram::Compiled(expr.clone()));
                Ok(expr)
            }
            Err(err) => {
                log::warn!("condition failed to compile: {err} (source: {condition:?})");
                cache.insert(condition.to_string(), CachedProgram::Failed(err.clone()));
                Err(err)
            }
        }
    }

    /// 조건 평가. 컴파일/평가 오류는 모두 `false`로 수렴한다.
    pub fn evaluate(&self, condition: &str, dice: &[u32], familiars: &[Familiar]) -> bool {
        match self.compile(condition) {
            Some(expr) => eval::eval_condition(&expr, dice, familiars).unwrap_or(false),
            None => false,
        }
    }

    /// 보너스 평가. 비활성이면 기여도는 전부 0이다.
    pub fn evaluate_bonus(
        &self,
        bonus: &ConditionalBonus,
        dice: &[u32],
        familiars: &[Familiar],
    ) -> BonusActivation {
        if self.evaluate(&bonus.condition, dice, familiars) {
            BonusActivation {
                active: true,
                flat: bonus.flat_bonus,
                multiplier: normalize_multiplier(bonus.multiplier_bonus),
            }
        } else {
            BonusActivation::inactive()
        }
    }

    /// 조건식이 `dice` 식별자를 참조하는지 검사.
    /// 컴파일 불가능한 식은 발동 자체가 안 되므로 false로 본다.
    pub fn references_dice(&self, condition: &str) -> bool {
        self.compile(condition).map(|expr| expr.references("dice")).unwrap_or(false)
    }

    /// 설정 리로드 시 캐시 무효화
    pub fn clear_cache(&self) {
        self.cache.lock().expect("condition cache lock poisoned").clear();
    }

    /// 캐시된 조건식 수
    pub fn cached_count(&self) -> usize {
        self.cache.lock().expect("condition cache lock poisoned").len()
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
