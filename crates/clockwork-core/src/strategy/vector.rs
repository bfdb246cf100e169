use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Strategy, StrategyKind, TimeOrder};

/// Vector time: one counter per line, indexed by line position.
///
/// Components past the end of the vector read as zero, so vectors of
/// different lengths compare and merge as if padded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorTime(Vec<u64>);

impl VectorTime {
    /// All-zero vector with `len` components.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    /// Counter for line `index` (zero if absent).
    #[must_use]
    pub fn get(&self, index: usize) -> u64 {
        self.0.get(index).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of `self` with component `index` incremented by one.
    #[must_use]
    pub fn incremented(&self, index: usize) -> Self {
        let mut out = self.padded(index + 1);
        out.0[index] = out.0[index].saturating_add(1);
        out
    }

    /// Elementwise maximum of `self` and `other`.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let len = self.len().max(other.len());
        Self((0..len).map(|i| self.get(i).max(other.get(i))).collect())
    }

    /// Returns `true` if every component of `self` is ≤ the matching
    /// component of `other`.
    #[must_use]
    pub fn leq(&self, other: &Self) -> bool {
        let len = self.len().max(other.len());
        (0..len).all(|i| self.get(i) <= other.get(i))
    }

    fn padded(&self, len: usize) -> Self {
        let mut out = self.0.clone();
        if out.len() < len {
            out.resize(len, 0);
        }
        Self(out)
    }
}

impl From<Vec<u64>> for VectorTime {
    fn from(components: Vec<u64>) -> Self {
        Self(components)
    }
}

impl fmt::Display for VectorTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{component}")?;
        }
        write!(f, "]")
    }
}

/// Vector clock discipline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vector;

impl Strategy for Vector {
    type Time = VectorTime;

    const KIND: StrategyKind = StrategyKind::Vector;

    fn default_time(line_count: usize) -> VectorTime {
        VectorTime::zeros(line_count)
    }

    fn increase(own: usize, predecessor: &VectorTime) -> VectorTime {
        predecessor.incremented(own)
    }

    fn merge(own: usize, cause: &VectorTime, predecessor: &VectorTime) -> VectorTime {
        cause.join(predecessor).incremented(own)
    }

    fn compare(a: &VectorTime, b: &VectorTime) -> TimeOrder {
        match (a.leq(b), b.leq(a)) {
            (true, true) => TimeOrder::Equal,
            (true, false) => TimeOrder::Before,
            (false, true) => TimeOrder::After,
            (false, false) => TimeOrder::Concurrent,
        }
    }

    fn widen(time: VectorTime, line_count: usize) -> VectorTime {
        time.padded(line_count)
    }

    fn drop_line(time: VectorTime, index: usize) -> VectorTime {
        let mut components = time.0;
        if index < components.len() {
            components.remove(index);
        }
        VectorTime(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(components: &[u64]) -> VectorTime {
        VectorTime::from(components.to_vec())
    }

    #[test]
    fn default_is_zero_vector_sized_to_lines() {
        assert_eq!(Vector::default_time(3), v(&[0, 0, 0]));
        assert!(Vector::default_time(0).is_empty());
    }

    #[test]
    fn increase_bumps_own_component_only() {
        let p = v(&[2, 5, 1]);
        assert_eq!(Vector::increase(1, &p), v(&[2, 6, 1]));
        assert_eq!(p, v(&[2, 5, 1]), "predecessor must not be mutated");
    }

    #[test]
    fn merge_is_elementwise_max_then_own_increment() {
        let cause = v(&[3, 0, 4]);
        let pred = v(&[1, 2, 0]);
        assert_eq!(Vector::merge(1, &cause, &pred), v(&[3, 3, 4]));
    }

    #[test]
    fn short_vectors_read_missing_components_as_zero() {
        let short = v(&[1]);
        assert_eq!(short.get(4), 0);
        assert_eq!(Vector::increase(2, &short), v(&[1, 0, 1]));
        assert_eq!(Vector::merge(0, &v(&[0, 7]), &short), v(&[2, 7]));
    }

    #[test]
    fn widen_pads_and_drop_line_removes() {
        assert_eq!(Vector::widen(v(&[1, 2]), 4), v(&[1, 2, 0, 0]));
        assert_eq!(Vector::widen(v(&[1, 2, 3]), 2), v(&[1, 2, 3]));
        assert_eq!(Vector::drop_line(v(&[1, 2, 3]), 1), v(&[1, 3]));
        assert_eq!(Vector::drop_line(v(&[1]), 5), v(&[1]));
    }

    #[test]
    fn compare_detects_concurrency() {
        assert_eq!(Vector::compare(&v(&[1, 0]), &v(&[1, 1])), TimeOrder::Before);
        assert_eq!(Vector::compare(&v(&[2, 1]), &v(&[1, 1])), TimeOrder::After);
        assert_eq!(Vector::compare(&v(&[1, 0]), &v(&[1])), TimeOrder::Equal);
        assert_eq!(Vector::compare(&v(&[1, 0]), &v(&[0, 1])), TimeOrder::Concurrent);
    }

    #[test]
    fn display_and_serde_are_plain_lists() {
        let time = v(&[1, 0, 2]);
        assert_eq!(time.to_string(), "[1, 0, 2]");
        let json = serde_json::to_string(&time).expect("serialize");
        assert_eq!(json, "[1,0,2]");
        let back: VectorTime = serde_json::from_str(&time.to_string()).expect("parse display");
        assert_eq!(back, time);
    }
}
