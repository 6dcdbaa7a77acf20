use crate::codec::INVALID_INDEX;

/// Computes `fib(n)` iteratively.
///
/// Negative `n` yields [`INVALID_INDEX`]. Results beyond `fib(92)` overflow
/// `i64` and wrap silently.
pub fn fibonacci(n: i32) -> i64 {
    if n < 0 {
        return INVALID_INDEX;
    }
    if n < 2 {
        return i64::from(n);
    }

    let mut last: i64 = 0;
    let mut curr: i64 = 1;
    for _i in 1..n {
        let sum = last.wrapping_add(curr);
        last = curr;
        curr = sum;
    }
    curr
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::Rng;

    use super::*;

    fn recurrence(n: i32) -> i64 {
        let mut seq = vec![0i64, 1];
        for i in 2..=n as usize {
            let next = seq[i - 1].wrapping_add(seq[i - 2]);
            seq.push(next);
        }
        seq[n as usize]
    }

    #[test]
    fn test_small_indices() {
        let got: Vec<i64> = (0..=12).map(fibonacci).collect();
        assert_eq!(got, vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144]);
    }

    #[test]
    fn test_negative_index_is_sentinel() {
        assert_eq!(fibonacci(-1), -1);
        assert_eq!(fibonacci(-5), -1);
        assert_eq!(fibonacci(i32::MIN), -1);
    }

    #[test]
    fn test_largest_exact_value() {
        assert_eq!(fibonacci(92), 7_540_113_804_746_346_429);
    }

    #[test]
    fn test_overflow_wraps() {
        let expected = fibonacci(91).wrapping_add(fibonacci(92));
        assert_eq!(fibonacci(93), expected);
        assert!(fibonacci(93) < 0);
    }

    #[test]
    fn test_matches_recurrence() {
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let n = rng.gen_range(0..2000);
            assert_eq!(fibonacci(n), recurrence(n), "fib({n})");
        }
    }
}
