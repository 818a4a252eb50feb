use serde::{Deserialize, Serialize};

/// Per-point keep/discard decision, aligned with the point store it was computed from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetainMask {
    retained: Vec<bool>,
}

impl RetainMask {
    pub fn new(retained: Vec<bool>) -> Self {
        Self { retained }
    }

    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    pub fn is_retained(&self, idx: usize) -> bool {
        self.retained.get(idx).copied().unwrap_or(false)
    }

    pub fn retained_count(&self) -> usize {
        self.retained.iter().filter(|r| **r).count()
    }

    pub fn discarded_count(&self) -> usize {
        self.len() - self.retained_count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.retained
    }

    /// Clones the items whose mask entry is set, in order.
    pub fn apply<E: Clone>(&self, items: &[E]) -> Vec<E> {
        self.retain(items.to_vec())
    }

    /// Keeps the items whose mask entry is set, in order.
    /// Items beyond the length of the mask are dropped.
    pub fn retain<E>(&self, items: Vec<E>) -> Vec<E> {
        items
            .into_iter()
            .zip(self.retained.iter())
            .filter_map(|(item, keep)| keep.then_some(item))
            .collect()
    }
}

impl From<Vec<bool>> for RetainMask {
    fn from(retained: Vec<bool>) -> Self {
        Self::new(retained)
    }
}

#[cfg(test)]
mod tests {
    use super::RetainMask;

    #[test]
    fn apply_keeps_order() {
        let mask = RetainMask::new(vec![true, false, true, true, false]);
        assert_eq!(mask.apply(&["a", "b", "c", "d", "e"]), vec!["a", "c", "d"]);
        assert_eq!(mask.retained_count(), 3);
        assert_eq!(mask.discarded_count(), 2);
        assert!(mask.is_retained(0));
        assert!(!mask.is_retained(1));
        assert!(!mask.is_retained(42));
    }
}
