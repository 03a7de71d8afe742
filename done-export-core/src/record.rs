/// Name of the synthetic column stamped onto every exported row.
pub const EXPORTED_ON_FIELD: &str = "ExportedOnUtc";

/// One exported item: field names mapped to normalised text, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordRow {
    fields: Vec<(String, String)>,
}

impl RecordRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`. An existing field keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RecordRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RecordRow::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}
