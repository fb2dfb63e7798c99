use serde::Deserialize;
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Preset {
    pub id: u32,
    pub name: String,
}

impl Preset {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Presets kept in ascending id order. Immutable once built.
#[derive(Clone, Debug, Default)]
pub struct PresetList {
    presets: Vec<Preset>,
}

impl PresetList {
    /// Sorts by id. Id 0 and repeated ids are dropped, first occurrence wins.
    pub fn new(presets: impl IntoIterator<Item = Preset>) -> Self {
        let mut seen = HashSet::new();
        let mut presets: Vec<Preset> = presets
            .into_iter()
            .filter(|preset| {
                if preset.id == 0 {
                    tracing::warn!("ignoring preset {:?} with id 0", preset.name);
                    return false;
                }
                if !seen.insert(preset.id) {
                    tracing::warn!("ignoring duplicate preset id {}", preset.id);
                    return false;
                }
                true
            })
            .collect();
        presets.sort_by_key(|preset| preset.id);
        Self { presets }
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Preset> {
        self.presets
            .binary_search_by_key(&id, |preset| preset.id)
            .ok()
            .map(|index| &self.presets[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }
}

impl<'a> IntoIterator for &'a PresetList {
    type Item = &'a Preset;
    type IntoIter = std::slice::Iter<'a, Preset>;

    fn into_iter(self) -> Self::IntoIter {
        self.presets.iter()
    }
}
