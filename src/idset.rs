//! The non-fungible token ID set algebra (FAT-1).
//!
//! A set is an ordered sequence of [`Element`]s — non-negative integer
//! singletons or `{min, max}` ranges — representing the union of the IDs
//! they cover. Elements must be pairwise disjoint; see [`validate`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, InvalidIdSetReason};

/// One element of an [`NFTokenIdSet`]: a single ID or an inclusive range.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Element {
    Id(u64),
    Range { min: u64, max: u64 },
}

impl Element {
    fn bounds(&self) -> (u64, u64) {
        match *self {
            Element::Id(id) => (id, id),
            Element::Range { min, max } => (min, max),
        }
    }

    fn count(&self) -> u64 {
        let (min, max) = self.bounds();
        max - min + 1
    }
}

/// A range-compressed set of non-fungible token IDs, as carried by FAT-1
/// inputs, outputs, and (on coinbase) `token_metadata` entries.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NFTokenIdSet(Vec<Element>);

impl NFTokenIdSet {
    /// Wraps a sequence of elements without validating it. Callers that
    /// need the invariants enforced should follow up with [`validate`].
    pub fn new(elements: Vec<Element>) -> NFTokenIdSet {
        NFTokenIdSet(elements)
    }

    pub fn elements(&self) -> &[Element] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Confirms every element is well-formed and that elements are pairwise
    /// disjoint. Detects overlap by a single sweep after sorting by lower
    /// bound (ties broken by larger upper bound first), which is enough to
    /// catch any intersection in O(n log n).
    pub fn validate(&self) -> Result<(), Error> {
        validate(self)
    }

    /// Every covered ID, strictly increasing. Only safe to call after
    /// [`validate`] has succeeded; only used on small sets (equality checks).
    pub fn expand(&self) -> Vec<u64> {
        expand(self)
    }

    /// Cardinality of the set, computed without materializing it.
    pub fn count(&self) -> u64 {
        count(self)
    }

    /// The canonical minimal-range form: adjacent/overlapping runs merged,
    /// singletons emitted where `lo == hi`.
    pub fn reduce(&self) -> NFTokenIdSet {
        reduce(self)
    }
}

/// See [`NFTokenIdSet::validate`].
pub fn validate(set: &NFTokenIdSet) -> Result<(), Error> {
    for element in set.0.iter() {
        let (min, max) = element.bounds();
        if max < min {
            return Err(Error::InvalidIdSet(InvalidIdSetReason::EmptyRange));
        }
    }

    let mut sorted: Vec<(u64, u64)> = set.0.iter().map(Element::bounds).collect();
    // Tie-break on equal lower bounds by putting the larger upper bound
    // first, so an overlap between same-start elements is always caught by
    // comparing each element only to its immediate predecessor.
    sorted.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    for window in sorted.windows(2) {
        let (_, prev_max) = window[0];
        let (next_min, _) = window[1];
        if next_min <= prev_max {
            return Err(Error::InvalidIdSet(InvalidIdSetReason::Overlap));
        }
    }

    Ok(())
}

/// See [`NFTokenIdSet::expand`].
pub fn expand(set: &NFTokenIdSet) -> Vec<u64> {
    let mut ids: Vec<u64> = Vec::new();
    for element in set.0.iter() {
        let (min, max) = element.bounds();
        ids.extend(min..=max);
    }
    ids.sort_unstable();
    ids
}

/// See [`NFTokenIdSet::count`].
pub fn count(set: &NFTokenIdSet) -> u64 {
    set.0.iter().map(Element::count).sum()
}

/// See [`NFTokenIdSet::reduce`].
pub fn reduce(set: &NFTokenIdSet) -> NFTokenIdSet {
    let mut sorted: Vec<(u64, u64)> = set.0.iter().map(Element::bounds).collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut merged: Vec<(u64, u64)> = Vec::new();
    for (min, max) in sorted {
        match merged.last_mut() {
            Some((_, last_max)) if min <= last_max.saturating_add(1) => {
                if max > *last_max {
                    *last_max = max;
                }
            }
            _ => merged.push((min, max)),
        }
    }

    let elements = merged
        .into_iter()
        .map(|(min, max)| {
            if min == max {
                Element::Id(min)
            } else {
                Element::Range { min, max }
            }
        })
        .collect();

    NFTokenIdSet(elements)
}


#[cfg(any(test, feature = "proptest-impl"))]
mod prop {
    use super::*;
    use proptest::prelude::*;

    fn small_valid_set() -> impl Strategy<Value = NFTokenIdSet> {
        proptest::collection::vec(0u64..200, 0..12).prop_map(|mut ids| {
            ids.sort_unstable();
            ids.dedup();
            NFTokenIdSet::new(ids.into_iter().map(Element::Id).collect())
        })
    }

    proptest! {
        #[test]
        fn count_matches_expand_len(set in small_valid_set()) {
            prop_assert_eq!(set.count() as usize, set.expand().len());
        }

        #[test]
        fn reduce_is_idempotent_prop(set in small_valid_set()) {
            prop_assert_eq!(set.reduce(), set.reduce().reduce());
        }

        #[test]
        fn reduce_preserves_expansion(set in small_valid_set()) {
            prop_assert_eq!(set.expand(), set.reduce().expand());
        }
    }
}
