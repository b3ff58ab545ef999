use crate::models::{CategoryFilter, Note};

/// Client-side note filter: case-insensitive title search plus a category choice.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoteFilter {
    pub search: String,
    pub category: CategoryFilter,
}

impl NoteFilter {
    pub fn new(search: impl Into<String>, category: CategoryFilter) -> Self {
        Self {
            search: search.into(),
            category,
        }
    }

    pub fn matches(&self, note: &Note) -> bool {
        self.category.admits(note.category)
            && note
                .title
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }

    /// Notes that pass the filter, in their original order.
    pub fn apply<'a>(&self, notes: &'a [Note]) -> Vec<&'a Note> {
        notes.iter().filter(|n| self.matches(n)).collect()
    }
}
