use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in a metadata column
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value attached to a plotted profile.
/// Using `BTreeMap` / `BTreeSet` downstream so `MetadataValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Null,
}

// -- Manual Eq/Ord so we can put MetadataValue in BTreeSet --

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use MetadataValue::*;
        fn discriminant(v: &MetadataValue) -> u8 {
            match v {
                Null => 0,
                Integer(_) => 1,
                Float(_) => 2,
                String(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.2}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetadataValue {
    /// Try to interpret the value as an `f64` for numeric colour mapping.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Profile – one plotted curve
// ---------------------------------------------------------------------------

/// One curve in the viewer: a polar ring of a pole figure (intensity over
/// azimuth) or a sampled fibre (ODF value over sample position).
#[derive(Debug, Clone)]
pub struct Profile {
    /// Abscissa (azimuth in degrees or sample position).
    pub x: Vec<f64>,
    /// Ordinate – same length as `x`.
    pub y: Vec<f64>,
    /// Metadata columns: column_name → value.
    pub metadata: BTreeMap<String, MetadataValue>,
}

// ---------------------------------------------------------------------------
// ProfileDataset – everything loaded into the viewer
// ---------------------------------------------------------------------------

/// All loaded profiles with pre-computed column indices.
#[derive(Debug, Clone, Default)]
pub struct ProfileDataset {
    pub profiles: Vec<Profile>,
    /// Ordered list of metadata column names.
    pub column_names: Vec<String>,
    /// For each metadata column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<MetadataValue>>,
}

impl ProfileDataset {
    /// Build column indices from the loaded profiles.
    pub fn from_profiles(profiles: Vec<Profile>) -> Self {
        let mut column_names_set: BTreeSet<String> = BTreeSet::new();
        let mut unique_values: BTreeMap<String, BTreeSet<MetadataValue>> = BTreeMap::new();

        for p in &profiles {
            for (col, val) in &p.metadata {
                column_names_set.insert(col.clone());
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        let column_names: Vec<String> = column_names_set.into_iter().collect();
        ProfileDataset {
            profiles,
            column_names,
            unique_values,
        }
    }

    /// Append another dataset, rebuilding the column indices.
    pub fn merge(self, other: ProfileDataset) -> Self {
        let mut profiles = self.profiles;
        profiles.extend(other.profiles);
        Self::from_profiles(profiles)
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(kind: &str, ring: Option<f64>) -> Profile {
        let mut metadata = BTreeMap::new();
        metadata.insert("kind".to_string(), MetadataValue::String(kind.to_string()));
        if let Some(r) = ring {
            metadata.insert("polar".to_string(), MetadataValue::Float(r));
        }
        Profile { x: vec![0.0], y: vec![1.0], metadata }
    }

    #[test]
    fn test_columns_and_unique_values() {
        let ds = ProfileDataset::from_profiles(vec![
            profile("pole figure", Some(0.0)),
            profile("pole figure", Some(5.0)),
            profile("fibre", None),
        ]);
        assert_eq!(ds.column_names, vec!["kind".to_string(), "polar".to_string()]);
        assert_eq!(ds.unique_values["kind"].len(), 2);
        assert_eq!(ds.unique_values["polar"].len(), 2);
    }

    #[test]
    fn test_merge_rebuilds_index() {
        let a = ProfileDataset::from_profiles(vec![profile("fibre", None)]);
        let b = ProfileDataset::from_profiles(vec![profile("pole figure", Some(10.0))]);
        let merged = a.merge(b);
        assert_eq!(merged.len(), 2);
        assert!(merged.column_names.contains(&"polar".to_string()));
    }

    #[test]
    fn test_metadata_ordering_mixes_types() {
        let mut set = BTreeSet::new();
        set.insert(MetadataValue::String("b".into()));
        set.insert(MetadataValue::Float(1.0));
        set.insert(MetadataValue::Null);
        set.insert(MetadataValue::Integer(3));
        let order: Vec<_> = set.into_iter().collect();
        assert_eq!(order[0], MetadataValue::Null);
        assert_eq!(order[3], MetadataValue::String("b".into()));
    }
}
