//! Cancelable background lineup search.
//!
//! 탐색은 작업 스레드에서 돌고, 진행율은 채널로 0~100이 흘러나온다.
//! 취소는 플래그를 통한 협조적 방식이라 조합 하나 평가를 넘는 지연이
//! 없고, 취소돼도 지금까지의 최선을 버리지 않는다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use crate::condition::ConditionEvaluator;
use crate::models::{ConditionalBonus, Familiar};

use super::config::{OptimizerConfig, StrategyKind};
use super::strategies::{
    apply_ignores, score_combination, OptimizedLineup, StrategyReport, StrategySelector,
};

/// 진행율을 보고하는 조합 처리 간격
pub const PROGRESS_BATCH: usize = 500;

/// 비동기 경로가 순서대로 도는 3단계
const ASYNC_PHASES: [StrategyKind; 3] =
    [StrategyKind::Overall, StrategyKind::LowRolls, StrategyKind::HighRolls];

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round() as u8
}

/// 취소 폴링과 진행 보고를 끼워 넣은 순차 탐색.
/// 반환값의 bool은 취소 여부다. 취소 시에도 지금까지의 최선을 돌려준다.
pub(crate) fn search_with_cancel<FC, FP>(
    combinations: &[Vec<Familiar>],
    bonuses: &[ConditionalBonus],
    kind: StrategyKind,
    evaluator: &ConditionEvaluator,
    fast: bool,
    mut should_cancel: FC,
    mut on_progress: FP,
) -> (Option<OptimizedLineup>, bool)
where
    FC: FnMut(usize) -> bool,
    FP: FnMut(usize),
{
    let mut selector = StrategySelector::new(kind);
    let mut processed = 0usize;

    for combo in combinations {
        // 취소는 조합 평가 사이에서만 반영된다
        if should_cancel(processed) {
            log::info!(
                "{} search canceled after {} of {} combinations",
                kind.label(),
                processed,
                combinations.len()
            );
            return (selector.finish(), true);
        }
        if let Some(score) = score_combination(kind, combo, bonuses, evaluator, fast) {
            selector.offer(score);
        }
        processed += 1;
        if processed % PROGRESS_BATCH == 0 {
            on_progress(processed);
        }
    }

    on_progress(combinations.len());
    (selector.finish(), false)
}

/// 단일 전략 비동기 탐색 핸들
pub struct LineupSearchHandle {
    cancel_flag: Arc<AtomicBool>,
    progress_rx: mpsc::Receiver<u8>,
    worker: thread::JoinHandle<Option<OptimizedLineup>>,
}

impl LineupSearchHandle {
    /// 취소 요청. 다음 조합 평가 전에 반영된다.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// 0~100 진행율 스트림. 채널이 닫히면 탐색이 끝난 것이다.
    pub fn progress(&self) -> &mpsc::Receiver<u8> {
        &self.progress_rx
    }

    /// 완료 대기. 취소된 탐색도 부분 결과를 돌려준다.
    pub fn join(self) -> Option<OptimizedLineup> {
        self.worker.join().unwrap_or_else(|_| {
            log::error!("lineup search worker panicked");
            None
        })
    }
}

/// 취소 가능한 최고 조합 탐색을 작업 스레드에서 시작한다.
pub fn find_best_lineup_async(
    combinations: Vec<Vec<Familiar>>,
    bonuses: Vec<ConditionalBonus>,
    kind: StrategyKind,
    evaluator: Arc<ConditionEvaluator>,
) -> LineupSearchHandle {
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let flag = cancel_flag.clone();
    let (tx, rx) = mpsc::channel();

    let worker = thread::spawn(move || {
        let total = combinations.len();
        let (best, canceled) = search_with_cancel(
            &combinations,
            &bonuses,
            kind,
            &evaluator,
            false,
            |_| flag.load(Ordering::Relaxed),
            |done| {
                let _ = tx.send(percent(done, total));
            },
        );
        if !canceled {
            log::info!("{} search finished over {} combinations", kind.label(), total);
        }
        best
    });

    LineupSearchHandle { cancel_flag, progress_rx: rx, worker }
}

/// 3단계(종합/최저/최고) 비동기 실행 핸들
pub struct AllStrategiesHandle {
    cancel_flag: Arc<AtomicBool>,
    progress_rx: mpsc::Receiver<u8>,
    worker: thread::JoinHandle<StrategyReport>,
}

impl AllStrategiesHandle {
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    pub fn progress(&self) -> &mpsc::Receiver<u8> {
        &self.progress_rx
    }

    /// 완료 대기. 조기 취소 시 아직 안 돈 단계는 None으로 남는다.
    pub fn join(self) -> StrategyReport {
        self.worker.join().unwrap_or_else(|_| {
            log::error!("strategy runner worker panicked");
            StrategyReport::default()
        })
    }
}

/// 단계들을 순서대로 돌리며 전체 진행율을 단계 비중대로 배분한다.
pub(crate) fn run_phases_with_cancel<FC, FP>(
    combinations: &[Vec<Familiar>],
    bonuses: &[ConditionalBonus],
    config: &OptimizerConfig,
    evaluator: &ConditionEvaluator,
    mut should_cancel: FC,
    mut on_progress: FP,
) -> StrategyReport
where
    FC: FnMut(usize) -> bool,
    FP: FnMut(usize, usize),
{
    let phases: Vec<StrategyKind> =
        ASYNC_PHASES.iter().copied().filter(|&kind| config.is_enabled(kind)).collect();
    let grand_total = phases.len() * combinations.len();

    let mut report = StrategyReport::default();
    let mut base = 0usize;
    for kind in phases {
        let (combinations, bonuses) = apply_ignores(combinations, bonuses, config.ignored(kind));
        let (best, canceled) = search_with_cancel(
            &combinations,
            &bonuses,
            kind,
            evaluator,
            false,
            |processed| should_cancel(base + processed),
            |done| on_progress(base + done, grand_total),
        );
        *report.slot_mut(kind) = best;
        if canceled {
            return report;
        }
        base += combinations.len();
    }
    report
}

/// 종합/최저/최고 세 단계를 작업 스레드에서 순서대로 돌린다.
pub fn run_all_strategies_async(
    combinations: Vec<Vec<Familiar>>,
    bonuses: Vec<ConditionalBonus>,
    config: OptimizerConfig,
    evaluator: Arc<ConditionEvaluator>,
) -> AllStrategiesHandle {
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let flag = cancel_flag.clone();
    let (tx, rx) = mpsc::channel();

    let worker = thread::spawn(move || {
        run_phases_with_cancel(
            &combinations,
            &bonuses,
            &config,
            &evaluator,
            |_| flag.load(Ordering::Relaxed),
            |done, grand_total| {
                let _ = tx.send(percent(done, grand_total));
            },
        )
    });

    AllStrategiesHandle { cancel_flag, progress_rx: rx, worker }
}

#[cfg(test)]
mod tests {
    use super::super::strategies::find_best_lineup;
    use super::*;
    use crate::models::Rank;

    fn evaluator() -> ConditionEvaluator {
        ConditionEvaluator::new()
    }

    fn pool(n: usize) -> Vec<Vec<Familiar>> {
        (0..n)
            .map(|i| {
                vec![Familiar::new(
                    format!("f{i}"),
                    format!("수달 {i}"),
                    Some(Rank::Common),
                    "water",
                    "beast",
                )
                .with_conditional(ConditionalBonus::new(
                    format!("보너스 {i}"),
                    "true",
                    i as i64,
                    0.0,
                ))]
            })
            .collect()
    }

    #[test]
    fn test_cancel_after_n_returns_best_of_prefix() {
        let evaluator = evaluator();
        let combos = pool(10);

        // 5개 처리 후 취소: 앞 5개 중 최선(= f4, 보너스 +4)만 반환돼야 한다
        let (best, canceled) = search_with_cancel(
            &combos,
            &[],
            StrategyKind::LowRolls,
            &evaluator,
            false,
            |processed| processed >= 5,
            |_| {},
        );
        assert!(canceled);
        assert_eq!(best.unwrap().familiars[0].id, "f4");
    }

    #[test]
    fn test_uncancelled_search_matches_sync() {
        let evaluator = evaluator();
        let combos = pool(7);

        let mut updates = Vec::new();
        let (best, canceled) = search_with_cancel(
            &combos,
            &[],
            StrategyKind::LowRolls,
            &evaluator,
            false,
            |_| false,
            |done| updates.push(done),
        );
        assert!(!canceled);
        assert_eq!(updates, vec![7]);

        let sync = find_best_lineup(&combos, &[], StrategyKind::LowRolls, &evaluator);
        assert_eq!(best.unwrap().familiars[0].id, sync.unwrap().familiars[0].id);
    }

    #[test]
    fn test_async_handle_completes_with_progress() {
        let evaluator = Arc::new(ConditionEvaluator::new());
        let combos = pool(6);

        let handle =
            find_best_lineup_async(combos, Vec::new(), StrategyKind::LowRolls, evaluator);
        let best = handle.join();
        assert_eq!(best.unwrap().familiars[0].id, "f5");
    }

    #[test]
    fn test_async_progress_stream() {
        let evaluator = Arc::new(ConditionEvaluator::new());
        let combos = pool(3);

        let handle = find_best_lineup_async(
            combos,
            Vec::new(),
            StrategyKind::LowRolls,
            evaluator,
        );
        // 채널이 닫힐 때까지 수신하면 마지막 값은 100이어야 한다
        let updates: Vec<u8> = handle.progress().iter().collect();
        assert!(!updates.is_empty());
        assert_eq!(*updates.last().unwrap(), 100);
        assert!(updates.windows(2).all(|w| w[0] <= w[1]));
        assert!(handle.join().is_some());
    }

    #[test]
    fn test_phased_run_preserves_earlier_results_on_cancel() {
        let evaluator = evaluator();
        let combos = pool(4);
        let config = OptimizerConfig::new();

        // 1단계(종합)가 끝난 직후 취소: 이후 단계는 None으로 남는다
        let cutoff = combos.len();
        let report = run_phases_with_cancel(
            &combos,
            &[],
            &config,
            &evaluator,
            |processed| processed >= cutoff,
            |_, _| {},
        );
        assert!(report.overall.is_some());
        assert!(report.low_rolls.is_none());
        assert!(report.high_rolls.is_none());
    }

    #[test]
    fn test_phased_run_uncancelled_covers_three_phases() {
        let evaluator = evaluator();
        let combos = pool(3);
        let config = OptimizerConfig::new();

        let mut updates = Vec::new();
        let report = run_phases_with_cancel(
            &combos,
            &[],
            &config,
            &evaluator,
            |_| false,
            |done, grand| updates.push(percent(done, grand)),
        );
        assert!(report.overall.is_some());
        assert!(report.low_rolls.is_some());
        assert!(report.high_rolls.is_some());
        // 단계 경계마다 33 -> 67 -> 100으로 비례 배분된다
        assert_eq!(updates, vec![33, 67, 100]);
    }

    #[test]
    fn test_async_all_strategies_roundtrip() {
        let evaluator = Arc::new(ConditionEvaluator::new());
        let combos = pool(5);
        let config = OptimizerConfig::new();

        let handle =
            run_all_strategies_async(combos, Vec::new(), config, evaluator);
        let report = handle.join();
        assert_eq!(report.overall.as_ref().unwrap().familiars[0].id, "f4");
        assert!(report.low_rolls.is_some());
        assert!(report.high_rolls.is_some());
        // 통계 전략들은 비동기 경로 밖이다
        assert!(report.median.is_none());
    }
}
