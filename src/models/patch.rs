//! Optional-presence field updates

/// Change to a single field in an edit request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch<T> {
    /// Keep the stored value
    Unchanged,
    /// Replace the stored value
    SetTo(T),
}

impl<T> Default for FieldPatch<T> {
    fn default() -> Self {
        FieldPatch::Unchanged
    }
}

impl<T: Clone> FieldPatch<T> {
    pub fn apply_to(&self, target: &mut T) {
        if let FieldPatch::SetTo(value) = self {
            *target = value.clone();
        }
    }
}

impl FieldPatch<String> {
    /// Absent and empty strings both mean "leave unchanged"; a field cannot be cleared.
    pub fn from_text(value: Option<String>) -> Self {
        match value {
            Some(v) if !v.is_empty() => FieldPatch::SetTo(v),
            _ => FieldPatch::Unchanged,
        }
    }
}
