//! Byte-range edit list applied over the original source

use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Collected edits.
///
/// Edits must not overlap; an edit starting inside an already applied range
/// is dropped. Insertions at the same offset keep their recording order.
#[derive(Debug, Default)]
pub(crate) struct EditList {
    edits: Vec<Edit>,
}

impl EditList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&mut self, start: usize, end: usize) {
        self.replace(start, end, String::new());
    }

    pub fn replace(&mut self, start: usize, end: usize, text: impl Into<String>) {
        debug_assert!(start <= end);
        self.edits.push(Edit {
            start,
            end,
            text: text.into(),
        });
    }

    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.replace(at, at, text);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn apply(mut self, source: &str) -> String {
        self.edits.sort_by_key(|e| (e.start, e.end));

        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for edit in self.edits {
            if edit.start < cursor {
                trace!("Dropping overlapping edit at {}..{}", edit.start, edit.end);
                continue;
            }
            out.push_str(&source[cursor..edit.start]);
            out.push_str(&edit.text);
            cursor = edit.end;
        }
        out.push_str(&source[cursor..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_mixed_edits() {
        let mut edits = EditList::new();
        edits.remove(5, 13);
        edits.insert(0, "/*a*/ ");
        edits.replace(16, 17, "y");
        assert_eq!(edits.len(), 3);
        assert_eq!(edits.apply("let x: number = z;"), "/*a*/ let x = y;");
    }

    #[test]
    fn test_insertions_keep_order() {
        let mut edits = EditList::new();
        edits.insert(3, "1");
        edits.insert(3, "2");
        assert_eq!(edits.apply("abcdef"), "abc12def");
    }

    #[test]
    fn test_insertion_before_removal_at_same_offset() {
        let mut edits = EditList::new();
        edits.remove(3, 6);
        edits.insert(3, "X");
        assert_eq!(edits.apply("abcdef"), "abcX");
    }

    #[test]
    fn test_overlapping_edit_dropped() {
        let mut edits = EditList::new();
        edits.remove(0, 4);
        edits.remove(2, 3);
        assert_eq!(edits.apply("abcdef"), "ef");
    }
}
