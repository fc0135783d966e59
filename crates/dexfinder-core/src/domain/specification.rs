//! Specification pattern for composable entity predicates
//!
//! Each filter dimension is a small predicate object; the filter engine
//! combines them with AND.

/// Predicate over a domain value
pub trait Specification<T>: Send + Sync {
    /// Check if the value satisfies this specification
    fn is_satisfied_by(&self, candidate: &T) -> bool;
}

/// Conjunction over any number of specifications
///
/// An empty conjunction is satisfied by everything.
pub struct AllOf<T> {
    specs: Vec<Box<dyn Specification<T>>>,
}

impl<T> AllOf<T> {
    pub fn new() -> Self {
        Self { specs: Vec::new() }
    }

    pub fn push<S: Specification<T> + 'static>(&mut self, spec: S) {
        self.specs.push(Box::new(spec));
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<T> Default for AllOf<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> Specification<T> for AllOf<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.specs.iter().all(|spec| spec.is_satisfied_by(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AtLeast(u32);

    impl Specification<u32> for AtLeast {
        fn is_satisfied_by(&self, value: &u32) -> bool {
            *value >= self.0
        }
    }

    struct AtMost(u32);

    impl Specification<u32> for AtMost {
        fn is_satisfied_by(&self, value: &u32) -> bool {
            *value <= self.0
        }
    }

    #[test]
    fn test_all_of() {
        let mut all = AllOf::new();
        all.push(AtLeast(5));
        all.push(AtMost(7));

        assert_eq!(all.len(), 2);
        assert!(all.is_satisfied_by(&6));
        assert!(!all.is_satisfied_by(&8));
    }

    #[test]
    fn test_empty_all_of_accepts_everything() {
        let all = AllOf::<u32>::default();
        assert!(all.is_empty());
        assert!(all.is_satisfied_by(&0));
        assert!(all.is_satisfied_by(&u32::MAX));
    }
}
