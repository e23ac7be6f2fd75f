use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
struct ClassMark {
    /// Newest accepted (or retired) sequence number.
    applied: u64,
    /// Requests evaluating off the main thread.
    outstanding: usize,
}

/// Per-class write ordering: the latest request wins.
///
/// Every request gets a number from one monotonic counter. A write is accepted
/// only if its number is newer than the last accepted one for the same class,
/// so a slow off-thread result can never overwrite a newer main-thread write.
///
/// Only classes with a deferred request are tracked. Any later request draws a
/// larger number, so a class with nothing outstanding needs no mark.
#[derive(Debug, Default)]
pub struct WriteSequencer {
    next: u64,
    marks: FxHashMap<String, ClassMark>,
}

impl WriteSequencer {
    /// Number for a new request.
    pub fn issue(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    /// A request for `class_name` left the main thread and will come back
    /// through [`Self::land`].
    pub fn defer(&mut self, class_name: &str) {
        self.marks
            .entry(class_name.to_owned())
            .or_default()
            .outstanding += 1;
    }

    /// A deferred request came back. Returns whether it may still be written.
    pub fn land(&mut self, class_name: &str, sequence: u64) -> bool {
        let current = self.is_current(class_name, sequence);
        if let Some(mark) = self.marks.get_mut(class_name) {
            mark.outstanding = mark.outstanding.saturating_sub(1);
            if mark.outstanding == 0 {
                self.marks.remove(class_name);
            }
        }
        current
    }

    /// Whether a write numbered `sequence` would still be accepted.
    pub fn is_current(&self, class_name: &str, sequence: u64) -> bool {
        self.marks
            .get(class_name)
            .is_none_or(|mark| sequence > mark.applied)
    }

    /// Record a write. Returns `false` (and records nothing) for stale writes.
    pub fn accept(&mut self, class_name: &str, sequence: u64) -> bool {
        if !self.is_current(class_name, sequence) {
            return false;
        }
        if let Some(mark) = self.marks.get_mut(class_name) {
            mark.applied = sequence;
        }
        true
    }

    /// Reject every request issued so far for `class_name`.
    pub fn retire(&mut self, class_name: &str) {
        if let Some(mark) = self.marks.get_mut(class_name) {
            mark.applied = self.next;
        }
    }
}
