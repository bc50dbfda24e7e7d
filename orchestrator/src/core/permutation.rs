//! Permutation and constrained interleaving engines
//!
//! Both engines enumerate by position, never by value: two equal items are
//! still two distinct items and produce distinct (if equal-looking) rows.
//! Cost is factorial in the input size, callers bound the input.

/// Factorial, saturating at `u128::MAX`
pub fn factorial(n: usize) -> u128 {
    (1..=n as u128).fold(1u128, |acc, k| acc.saturating_mul(k))
}

/// Every ordering of `items`
///
/// Returns `[items]` for zero or one item, otherwise `n!` rows built by
/// position-exchange backtracking.
pub fn permute<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }

    let capacity = usize::try_from(factorial(items.len())).unwrap_or(usize::MAX);
    let mut results = Vec::with_capacity(capacity.min(1 << 16));
    let mut used = vec![false; items.len()];
    let mut current = Vec::with_capacity(items.len());
    backtrack(items, &mut used, &mut current, &mut results);
    results
}

fn backtrack<T: Clone>(items: &[T], used: &mut [bool], current: &mut Vec<T>, results: &mut Vec<Vec<T>>) {
    if current.len() == items.len() {
        results.push(current.clone());
        return;
    }

    for i in 0..items.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        current.push(items[i].clone());
        backtrack(items, used, current, results);
        current.pop();
        used[i] = false;
    }
}

/// The ordering `permute(items)` would yield at position `index`
///
/// Decodes `index` in the factorial number system, so no other ordering is
/// built. `index` wraps modulo `n!`.
pub fn nth_permutation<T: Clone>(items: &[T], index: u128) -> Vec<T> {
    let mut remaining: Vec<&T> = items.iter().collect();
    let mut rank = index % factorial(items.len());
    let mut ordering = Vec::with_capacity(items.len());

    while !remaining.is_empty() {
        let block = factorial(remaining.len() - 1);
        let pick = (rank / block) as usize;
        rank %= block;
        ordering.push(remaining.remove(pick).clone());
    }
    ordering
}

/// All sequences that end with exactly one element of `tail_set`
///
/// For each choice of final element `g` (by position), every ordering of
/// `free_set ++ (tail_set - g)` followed by `g`. An empty `tail_set` yields
/// `[free_set]` unchanged; callers treat that as the pairing being off.
pub fn interleave_with_mandatory_tail<T: Clone>(free_set: &[T], tail_set: &[T]) -> Vec<Vec<T>> {
    if tail_set.is_empty() {
        return vec![free_set.to_vec()];
    }

    let mut results = Vec::new();
    for (tail_index, last) in tail_set.iter().enumerate() {
        let rest: Vec<T> = free_set
            .iter()
            .cloned()
            .chain(
                tail_set
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != tail_index)
                    .map(|(_, item)| item.clone()),
            )
            .collect();

        for mut ordering in permute(&rest) {
            ordering.push(last.clone());
            results.push(ordering);
        }
    }
    results
}
