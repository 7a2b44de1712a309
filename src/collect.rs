//! Result-collection strategies for operations that gather many values.
//!
//! A [`CanBuild`] produces a fresh, empty buffer per run, accepts values in arrival order and
//! finishes into the caller's collection type. Because every run starts from a new buffer, one
//! strategy can serve any number of concurrent interpretations.

use std::marker::PhantomData;

/// Builds a collection of `A` one element at a time.
pub trait CanBuild<A> {
    type Buffer;
    type Output;

    fn create_buffer(&self) -> Self::Buffer;

    fn add(&self, buffer: &mut Self::Buffer, value: A);

    fn build(&self, buffer: Self::Buffer) -> Self::Output;
}

/// Collects into a `Vec`, preserving arrival order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToVec;

impl<A> CanBuild<A> for ToVec {
    type Buffer = Vec<A>;
    type Output = Vec<A>;

    fn create_buffer(&self) -> Vec<A> {
        Vec::new()
    }

    fn add(&self, buffer: &mut Vec<A>, value: A) {
        buffer.push(value);
    }

    fn build(&self, buffer: Vec<A>) -> Vec<A> {
        buffer
    }
}

/// Collects into any `C: Default + Extend<A>`: sets, maps from pairs, strings, deques.
pub struct Collecting<C> {
    _marker: PhantomData<fn() -> C>,
}

impl<C> Collecting<C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<C> Default for Collecting<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for Collecting<C> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<C> Copy for Collecting<C> {}

impl<C> std::fmt::Debug for Collecting<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Collecting")
    }
}

impl<A, C> CanBuild<A> for Collecting<C>
where
    C: Default + Extend<A>,
{
    type Buffer = C;
    type Output = C;

    fn create_buffer(&self) -> C {
        C::default()
    }

    fn add(&self, buffer: &mut C, value: A) {
        buffer.extend(std::iter::once(value));
    }

    fn build(&self, buffer: C) -> C {
        buffer
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;

    fn fill<A, C: CanBuild<A>>(cbf: &C, values: Vec<A>) -> C::Output {
        let mut buffer = cbf.create_buffer();
        for value in values {
            cbf.add(&mut buffer, value);
        }
        cbf.build(buffer)
    }

    #[test]
    fn to_vec_keeps_order() {
        assert_eq!(fill(&ToVec, vec![3, 1, 2]), vec![3, 1, 2]);
    }

    #[test]
    fn collecting_dedups_into_set() {
        let set = fill(&Collecting::<BTreeSet<i32>>::new(), vec![2, 1, 2]);
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn collecting_pairs_into_map() {
        let map = fill(
            &Collecting::<BTreeMap<&str, i32>>::new(),
            vec![("a", 1), ("b", 2)],
        );
        assert_eq!(map.get("b"), Some(&2));
    }

    #[test]
    fn buffers_are_fresh_per_use() {
        let cbf = ToVec;
        assert_eq!(fill(&cbf, vec![1]), vec![1]);
        assert_eq!(fill(&cbf, vec![2]), vec![2]);
    }
}
