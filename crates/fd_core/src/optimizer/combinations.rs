//! k-combination generation.

/// 풀에서 크기 k의 조합을 사전순으로 생성한다.
/// 중복 없음, 각 조합 안에서는 풀의 순서를 유지한다.
pub fn generate_combinations<T: Clone>(pool: &[T], k: usize) -> Vec<Vec<T>> {
    let mut result = Vec::new();
    if k > pool.len() {
        return result;
    }
    let mut current = Vec::with_capacity(k);
    backtrack(pool, k, 0, &mut current, &mut result);
    result
}

fn backtrack<T: Clone>(
    pool: &[T],
    k: usize,
    start: usize,
    current: &mut Vec<T>,
    result: &mut Vec<Vec<T>>,
) {
    if current.len() == k {
        result.push(current.clone());
        return;
    }
    let remaining = k - current.len();
    for i in start..=(pool.len() - remaining) {
        current.push(pool[i].clone());
        backtrack(pool, k, i + 1, current, result);
        current.pop();
    }
}
