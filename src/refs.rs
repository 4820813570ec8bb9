//! Reference tracking for cycles and shared objects.
//!
//! A [`RefScope`] owns the output buffer of one serializer together with the
//! identity table of every object entered so far. Each object gets a marker
//! number the first time it is entered, numbered in pre-order across the whole
//! top-level call:
//!
//! - re-entered while still open (a cycle): the marker `#<n>` is written;
//! - re-entered after completion (a shared reference): the text produced the
//!   first time is written again, so aliasing is invisible in the output.
//!
//! Child scopes read through to their parent but never write to it. They are
//! used to compute sort keys, so the keys of sibling elements cannot depend on
//! the order in which the orderer happens to look at them.

use crate::value::{ObjectId, ObjectRef};
use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;

enum Slot {
    /// Entered, serialization in progress; holds the marker number.
    Open(usize),
    /// Completed; the object's text is `output[range]` of the owning scope.
    Closed(Range<usize>),
}

/// Outcome of entering an object.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Visit {
    /// First encounter: the caller serializes the contents.
    Entered,
    /// The object is an ancestor of itself.
    Cycle(usize),
    /// The object was already serialized; this is its text.
    Repeat(String),
}

pub(crate) struct RefScope<'p> {
    parent: Option<&'p RefScope<'p>>,
    output: String,
    // The handle keeps the allocation alive, so ids cannot be reused mid-call.
    slots: HashMap<ObjectId, (ObjectRef, Slot)>,
}

impl RefScope<'static> {
    pub(crate) fn root() -> Self {
        RefScope {
            parent: None,
            output: String::with_capacity(256),
            slots: HashMap::new(),
        }
    }
}

impl<'p> RefScope<'p> {
    /// A disposable scope seeded from this one.
    pub(crate) fn child(&self) -> RefScope<'_> {
        RefScope {
            parent: Some(self),
            output: String::new(),
            slots: HashMap::new(),
        }
    }

    #[inline]
    pub(crate) fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    #[inline]
    pub(crate) fn write_char(&mut self, c: char) {
        self.output.push(c);
    }

    #[inline]
    pub(crate) fn output_mut(&mut self) -> &mut String {
        &mut self.output
    }

    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.output.len()
    }

    /// Number of objects entered so far, ancestors' scopes included.
    pub(crate) fn entered(&self) -> usize {
        self.parent.map_or(0, RefScope::entered) + self.slots.len()
    }

    /// The text to write for an already-seen object, if any.
    pub(crate) fn lookup(&self, id: ObjectId) -> Option<Cow<'_, str>> {
        match self.slots.get(&id) {
            Some((_, Slot::Open(marker))) => Some(Cow::Owned(format!("#{}", marker))),
            Some((_, Slot::Closed(range))) => Some(Cow::Borrowed(&self.output[range.clone()])),
            None => self.parent.and_then(|parent| parent.lookup(id)),
        }
    }

    /// Marker number of `id` if it is still being written.
    pub(crate) fn open_marker(&self, id: ObjectId) -> Option<usize> {
        match self.slots.get(&id) {
            Some((_, Slot::Open(marker))) => Some(*marker),
            Some((_, Slot::Closed(_))) => None,
            None => self.parent.and_then(|parent| parent.open_marker(id)),
        }
    }

    /// Registers `object` on first encounter, or reports how to refer to it.
    pub(crate) fn enter(&mut self, object: &ObjectRef) -> Visit {
        let id = object.id();
        if let Some(marker) = self.open_marker(id) {
            return Visit::Cycle(marker);
        }
        if let Some(text) = self.lookup(id) {
            return Visit::Repeat(text.into_owned());
        }
        let marker = self.entered();
        self.slots.insert(id, (object.clone(), Slot::Open(marker)));
        Visit::Entered
    }

    /// Records that `object`'s text spans from `start` to the current end of output.
    pub(crate) fn complete(&mut self, object: &ObjectRef, start: usize) {
        let end = self.output.len();
        if let Some((_, slot)) = self.slots.get_mut(&object.id()) {
            *slot = Slot::Closed(start..end);
        }
    }

    pub(crate) fn into_output(self) -> String {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    fn handle(value: &Value) -> ObjectRef {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_markers_are_sequential() {
        let a = handle(&Value::empty_object());
        let b = handle(&Value::empty_object());
        let mut scope = RefScope::root();

        assert_eq!(scope.enter(&a), Visit::Entered);
        assert_eq!(scope.enter(&b), Visit::Entered);
        assert_eq!(scope.enter(&a), Visit::Cycle(0));
        assert_eq!(scope.enter(&b), Visit::Cycle(1));
        assert_eq!(scope.entered(), 2);
    }

    #[test]
    fn test_completed_objects_repeat_their_text() {
        let a = handle(&Value::empty_object());
        let mut scope = RefScope::root();
        scope.write("[");
        let start = scope.position();
        assert_eq!(scope.enter(&a), Visit::Entered);
        scope.write("{x:1}");
        scope.complete(&a, start);

        assert_eq!(scope.enter(&a), Visit::Repeat("{x:1}".to_string()));
        assert_eq!(scope.lookup(a.id()).as_deref(), Some("{x:1}"));
    }

    #[test]
    fn test_child_reads_parent_without_writing() {
        let a = handle(&Value::empty_object());
        let b = handle(&Value::empty_object());
        let mut root = RefScope::root();
        assert_eq!(root.enter(&a), Visit::Entered);

        {
            let mut child = root.child();
            assert_eq!(child.enter(&a), Visit::Cycle(0));
            assert_eq!(child.enter(&b), Visit::Entered);
            assert_eq!(child.entered(), 2);
        }

        assert_eq!(root.entered(), 1);
        assert_eq!(root.lookup(b.id()), None);
    }
}
