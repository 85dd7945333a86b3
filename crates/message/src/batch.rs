//! Batch - ordered sequence of parts handled as one work item

use crate::part::Part;

#[cfg(test)]
#[path = "batch_test.rs"]
mod tests;

/// An ordered sequence of [`Part`]s.
///
/// A batch may be empty - a processor can filter every part out. Batches
/// are identified by reference and never deduplicated.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    parts: Vec<Part>,
}

impl Batch {
    /// Create a batch from parts.
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    /// Create an empty batch.
    pub fn empty() -> Self {
        Self { parts: Vec::new() }
    }

    /// Append a part.
    pub fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// Number of parts.
    #[inline]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the batch holds no parts.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Total payload size in bytes, metadata excluded.
    pub fn byte_size(&self) -> usize {
        self.parts.iter().map(Part::byte_size).sum()
    }

    /// Get a part by index.
    pub fn get(&self, index: usize) -> Option<&Part> {
        self.parts.get(index)
    }

    /// Iterate over parts.
    pub fn iter(&self) -> std::slice::Iter<'_, Part> {
        self.parts.iter()
    }

    /// Iterate mutably over parts.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Part> {
        self.parts.iter_mut()
    }

    /// Borrow the parts as a slice.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Consume the batch, yielding its parts.
    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    /// Whether any part carries an error tag.
    pub fn has_errored_part(&self) -> bool {
        self.parts.iter().any(Part::is_errored)
    }
}

impl From<Vec<Part>> for Batch {
    fn from(parts: Vec<Part>) -> Self {
        Self { parts }
    }
}

impl FromIterator<Part> for Batch {
    fn from_iter<I: IntoIterator<Item = Part>>(iter: I) -> Self {
        Self {
            parts: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Batch {
    type Item = Part;
    type IntoIter = std::vec::IntoIter<Part>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Part;
    type IntoIter = std::slice::Iter<'a, Part>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}
