use std::{collections::HashSet, sync::Arc};

use itertools::Itertools;

/// Bands to pick out of a multi-band file, by zero based index.
///
/// With `drop` set the listed bands are excluded instead.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct BandSelection {
    selection: Arc<[usize]>,
    drop: bool,
}

impl<const N: usize> From<([usize; N], bool)> for BandSelection {
    fn from(value: ([usize; N], bool)) -> Self {
        let selection = Arc::from(value.0);
        let drop = value.1;
        BandSelection { selection, drop }
    }
}

impl From<(std::ops::Range<usize>, bool)> for BandSelection {
    fn from(value: (std::ops::Range<usize>, bool)) -> Self {
        let selection = value.0.collect();
        let drop = value.1;
        BandSelection { selection, drop }
    }
}

impl<const N: usize> From<[usize; N]> for BandSelection {
    fn from(value: [usize; N]) -> Self {
        BandSelection {
            selection: Arc::from(value),
            drop: false,
        }
    }
}

impl From<std::ops::Range<usize>> for BandSelection {
    fn from(value: std::ops::Range<usize>) -> Self {
        BandSelection {
            selection: value.collect(),
            drop: false,
        }
    }
}

impl Default for BandSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl BandSelection {
    pub fn all() -> Self {
        Self {
            selection: Arc::from([]),
            drop: true,
        }
    }

    pub fn first() -> Self {
        Self::from([0])
    }

    /// Indexes into a collection of `collection_len` bands.
    ///
    /// Indexes past the end are discarded.
    pub fn indexes_from(&self, collection_len: usize) -> Vec<usize> {
        if self.drop {
            let dropped: HashSet<usize> = self.selection.iter().copied().collect();
            (0..collection_len)
                .filter(|idx| !dropped.contains(idx))
                .collect()
        } else {
            self.selection
                .iter()
                .copied()
                .filter(|idx| *idx < collection_len)
                .unique()
                .collect()
        }
    }

    pub fn select_from<T: Clone>(&self, collection: &[T]) -> Vec<T> {
        self.indexes_from(collection.len())
            .into_iter()
            .map(|idx| collection[idx].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BandSelection::all(), vec![0, 1, 2, 3])]
    #[case(BandSelection::first(), vec![0])]
    #[case(BandSelection::from([2, 0, 2]), vec![2, 0])]
    #[case(BandSelection::from(1..3), vec![1, 2])]
    #[case(BandSelection::from(([1, 3], true)), vec![0, 2])]
    #[case(BandSelection::from([7]), vec![])]
    fn indexes_into_four_bands(#[case] selection: BandSelection, #[case] expected: Vec<usize>) {
        assert_eq!(selection.indexes_from(4), expected);
    }

    #[rstest]
    fn selects_items() {
        let names = ["B02", "B03", "B04"];
        assert_eq!(BandSelection::from(([1], true)).select_from(&names), vec!["B02", "B04"]);
    }
}
