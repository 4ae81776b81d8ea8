use std::collections::{BTreeMap, BTreeSet};

use super::profile::{MetadataValue, ProfileDataset};

// ---------------------------------------------------------------------------
// Filter predicate: which unique values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// If a column is absent, it means "no filter" (show all).
pub type FilterState = BTreeMap<String, BTreeSet<MetadataValue>>;

/// Initialise a [`FilterState`] with all values selected (i.e., show everything).
pub fn init_filter_state(dataset: &ProfileDataset) -> FilterState {
    dataset
        .unique_values
        .iter()
        .map(|(col, vals)| (col.clone(), vals.clone()))
        .collect()
}

/// Return indices of profiles that pass all active filters.
///
/// A column filter only constrains profiles that carry the column: fibre
/// profiles have no `polar` or `plane`, so ring selections never hide them.
/// An empty selection hides every profile carrying the column.
pub fn filtered_indices(dataset: &ProfileDataset, filters: &FilterState) -> Vec<usize> {
    // Columns with every value selected impose nothing.
    let active: Vec<(&String, &BTreeSet<MetadataValue>)> = filters
        .iter()
        .filter(|(col, selected)| {
            dataset
                .unique_values
                .get(*col)
                .map_or(true, |all| selected.len() != all.len())
        })
        .collect();

    dataset
        .profiles
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            active.iter().all(|(col, selected)| {
                p.metadata
                    .get(*col)
                    .map_or(true, |val| selected.contains(val))
            })
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::profile::Profile;

    fn dataset() -> ProfileDataset {
        let rings = [0.0, 5.0, 10.0];
        let profiles = rings
            .iter()
            .map(|&polar| {
                let mut metadata = BTreeMap::new();
                metadata.insert("polar".to_string(), MetadataValue::Float(polar));
                metadata.insert("plane".to_string(), MetadataValue::String("111".into()));
                Profile { x: vec![0.0, 5.0], y: vec![1.0, 2.0], metadata }
            })
            .collect();
        ProfileDataset::from_profiles(profiles)
    }

    #[test]
    fn test_all_selected_shows_everything() {
        let ds = dataset();
        let filters = init_filter_state(&ds);
        assert_eq!(filtered_indices(&ds, &filters), vec![0, 1, 2]);
    }

    #[test]
    fn test_partial_selection() {
        let ds = dataset();
        let mut filters = init_filter_state(&ds);
        filters
            .get_mut("polar")
            .unwrap()
            .remove(&MetadataValue::Float(5.0));
        assert_eq!(filtered_indices(&ds, &filters), vec![0, 2]);
    }

    #[test]
    fn test_empty_selection_hides_all() {
        let ds = dataset();
        let mut filters = init_filter_state(&ds);
        filters.insert("plane".to_string(), BTreeSet::new());
        assert!(filtered_indices(&ds, &filters).is_empty());
    }

    #[test]
    fn test_ring_selection_keeps_fibres() {
        let mut profiles = dataset().profiles;
        let mut metadata = BTreeMap::new();
        metadata.insert("kind".to_string(), MetadataValue::String("fibre".into()));
        profiles.push(Profile { x: vec![1.0, 2.0], y: vec![3.0, 4.0], metadata });
        let ds = ProfileDataset::from_profiles(profiles);

        let mut filters = init_filter_state(&ds);
        filters.insert("polar".to_string(), BTreeSet::new());
        assert_eq!(filtered_indices(&ds, &filters), vec![3]);

        filters.insert("kind".to_string(), BTreeSet::new());
        assert!(filtered_indices(&ds, &filters).is_empty());
    }
}
