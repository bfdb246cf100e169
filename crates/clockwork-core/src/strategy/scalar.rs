use super::{Strategy, StrategyKind, TimeOrder};

/// Lamport time: a single counter per event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Scalar;

impl Strategy for Scalar {
    type Time = u64;

    const KIND: StrategyKind = StrategyKind::Scalar;

    fn default_time(_line_count: usize) -> u64 {
        0
    }

    fn increase(_own: usize, predecessor: &u64) -> u64 {
        predecessor.saturating_add(1)
    }

    fn merge(_own: usize, cause: &u64, predecessor: &u64) -> u64 {
        (*cause).max(*predecessor).saturating_add(1)
    }

    fn compare(a: &u64, b: &u64) -> TimeOrder {
        match a.cmp(b) {
            std::cmp::Ordering::Less => TimeOrder::Before,
            std::cmp::Ordering::Equal => TimeOrder::Equal,
            std::cmp::Ordering::Greater => TimeOrder::After,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increase_adds_one() {
        assert_eq!(Scalar::increase(0, &0), 1);
        assert_eq!(Scalar::increase(5, &41), 42);
    }

    #[test]
    fn merge_takes_max_plus_one() {
        assert_eq!(Scalar::merge(1, &1, &0), 2);
        assert_eq!(Scalar::merge(1, &3, &7), 8);
    }

    #[test]
    fn counter_saturates_instead_of_overflowing() {
        assert_eq!(Scalar::increase(0, &u64::MAX), u64::MAX);
        assert_eq!(Scalar::merge(0, &u64::MAX, &0), u64::MAX);
    }

    #[test]
    fn reshaping_is_identity() {
        assert_eq!(Scalar::widen(7, 10), 7);
        assert_eq!(Scalar::drop_line(7, 0), 7);
        assert_eq!(Scalar::default_time(4), 0);
    }

    #[test]
    fn compare_is_total() {
        assert_eq!(Scalar::compare(&1, &2), TimeOrder::Before);
        assert_eq!(Scalar::compare(&2, &2), TimeOrder::Equal);
        assert_eq!(Scalar::compare(&3, &2), TimeOrder::After);
    }
}
