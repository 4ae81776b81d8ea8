use std::collections::BTreeSet;
use std::path::PathBuf;

use texeval2mtex::data::filter::{filtered_indices, init_filter_state, FilterState};
use texeval2mtex::data::loader::load_files;
use texeval2mtex::data::profile::{MetadataValue, ProfileDataset};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full viewer state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded profiles (None until files are opened).
    pub dataset: Option<ProfileDataset>,

    /// Per-column filter selections.
    pub filters: FilterState,

    /// Indices of profiles passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Which metadata column is used for colouring.
    pub color_column: Option<String>,

    /// Active colour map.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Scale every visible profile to [0, 1].
    pub minmax_scaling: bool,
}

impl AppState {
    /// Ingest a newly loaded dataset, initialise filters and colour.
    pub fn set_dataset(&mut self, dataset: ProfileDataset) {
        self.filters = init_filter_state(&dataset);
        self.visible_indices = (0..dataset.len()).collect();

        // Pole figure rings read best coloured by polar angle.
        self.color_column = if dataset.column_names.iter().any(|c| c == "polar") {
            Some("polar".to_string())
        } else {
            dataset.column_names.first().cloned()
        };
        self.rebuild_color_map(&dataset);

        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Load files, replacing the current dataset.  Errors end up in
    /// `status_message`.
    pub fn load_paths(&mut self, paths: &[PathBuf]) {
        match load_files(paths) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} profiles with columns {:?}",
                    dataset.len(),
                    dataset.column_names
                );
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load files: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Drop the dataset and all selections.
    pub fn clear(&mut self) {
        *self = AppState {
            minmax_scaling: self.minmax_scaling,
            ..AppState::default()
        };
    }

    /// Rebuild the colour map from the current `color_column`.
    pub fn rebuild_color_map(&mut self, dataset: &ProfileDataset) {
        self.color_map = self.color_column.as_ref().and_then(|col| {
            dataset
                .unique_values
                .get(col)
                .map(|vals| ColorMap::new(col, vals))
        });
    }

    /// Recompute `visible_indices` after filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.filters);
        }
    }

    /// Set colour column and rebuild the map.
    pub fn set_color_column(&mut self, col: String) {
        self.color_column = Some(col);
        if let Some(ds) = self.dataset.take() {
            self.rebuild_color_map(&ds);
            self.dataset = Some(ds);
        }
    }

    /// Toggle a single metadata value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &MetadataValue) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(all_vals) = self
            .dataset
            .as_ref()
            .and_then(|ds| ds.unique_values.get(column))
        {
            self.filters.insert(column.to_string(), all_vals.clone());
            self.refilter();
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use texeval2mtex::data::profile::Profile;

    fn dataset() -> ProfileDataset {
        let profiles = [0.0, 5.0]
            .iter()
            .map(|&polar| {
                let mut metadata = BTreeMap::new();
                metadata.insert("file".to_string(), MetadataValue::String("a".into()));
                metadata.insert("polar".to_string(), MetadataValue::Float(polar));
                Profile { x: vec![0.0, 5.0], y: vec![1.0, 2.0], metadata }
            })
            .collect();
        ProfileDataset::from_profiles(profiles)
    }

    #[test]
    fn test_set_dataset_colours_by_polar() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        assert_eq!(state.color_column.as_deref(), Some("polar"));
        assert_eq!(state.visible_indices, vec![0, 1]);
        assert!(state.color_map.is_some());
    }

    #[test]
    fn test_toggle_and_select() {
        let mut state = AppState::default();
        state.set_dataset(dataset());

        state.toggle_filter_value("polar", &MetadataValue::Float(0.0));
        assert_eq!(state.visible_indices, vec![1]);

        state.select_none("polar");
        assert!(state.visible_indices.is_empty());

        state.select_all("polar");
        assert_eq!(state.visible_indices, vec![0, 1]);
    }

    #[test]
    fn test_load_error_sets_status() {
        let mut state = AppState::default();
        state.load_paths(&[PathBuf::from("/nonexistent/missing.dat")]);
        assert!(state.dataset.is_none());
        assert!(state.status_message.is_some());
    }

    #[test]
    fn test_clear_keeps_scaling() {
        let mut state = AppState::default();
        state.minmax_scaling = true;
        state.set_dataset(dataset());
        state.clear();
        assert!(state.dataset.is_none());
        assert!(state.minmax_scaling);
    }
}
