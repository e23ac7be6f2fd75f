//! Rule sink: ordered, capacity-bounded rule containers.
//!
//! Each class name owns at most one slot. Writing to a class that already has a
//! slot replaces the slot's text in place. New rules take a slot freed by an
//! earlier removal when one exists, otherwise they append to the current
//! container; a fresh container becomes the write target once the current one
//! holds [`MAX_SIZE`] slots. Slots never move, so a [`SlotRef`] stays valid
//! until its rule is removed.

use log::trace;
use rustc_hash::FxHashMap;

/// Maximum number of rule slots per container.
pub const MAX_SIZE: usize = 65536;

/// Location of a rule slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotRef {
    /// Container index, in allocation order.
    pub container: usize,
    /// Slot index inside the container.
    pub slot: usize,
}

#[derive(Debug)]
struct Rule {
    /// Class that wrote the rule; `None` for rules added with [`RuleSink::append`].
    owner: Option<String>,
    css: String,
}

#[derive(Debug, Default)]
struct RuleContainer {
    slots: Vec<Option<Rule>>,
    live: usize,
}

/// Store of compiled rules keyed by class name.
#[derive(Debug)]
pub struct RuleSink {
    containers: Vec<RuleContainer>,
    index: FxHashMap<String, SlotRef>,
    /// Emptied slots waiting for reuse.
    free: Vec<SlotRef>,
    container_capacity: usize,
}

impl Default for RuleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleSink {
    /// Empty sink with [`MAX_SIZE`] slots per container.
    pub fn new() -> Self {
        Self::with_container_capacity(MAX_SIZE)
    }

    /// Empty sink with a custom per-container capacity (at least one slot).
    pub fn with_container_capacity(capacity: usize) -> Self {
        Self {
            containers: Vec::new(),
            index: FxHashMap::default(),
            free: Vec::new(),
            container_capacity: capacity.max(1),
        }
    }

    /// Write the rule for `class_name`, replacing its text if a slot exists.
    pub fn write(&mut self, class_name: &str, css: &str) -> SlotRef {
        if let Some(&slot_ref) = self.index.get(class_name)
            && let Some(Some(rule)) = self.slot_mut(slot_ref)
        {
            css.clone_into(&mut rule.css);
            return slot_ref;
        }
        let slot_ref = self.place(Rule {
            owner: Some(class_name.to_owned()),
            css: css.to_owned(),
        });
        self.index.insert(class_name.to_owned(), slot_ref);
        slot_ref
    }

    /// Add a rule no class owns, such as a global rule restored from
    /// extracted CSS. It can only be removed through the selector scan of
    /// [`Self::remove`].
    pub fn append(&mut self, css: &str) -> SlotRef {
        self.place(Rule {
            owner: None,
            css: css.to_owned(),
        })
    }

    /// Remove the rule for `class_name`. Returns whether a rule was removed.
    ///
    /// Without an indexed slot, the first unowned rule whose text starts with
    /// the class selector is removed instead. Rules owned by other classes are
    /// never matched, even when their selector starts with this class.
    pub fn remove(&mut self, class_name: &str) -> bool {
        let target = self
            .index
            .remove(class_name)
            .or_else(|| self.find_unowned(class_name));
        let Some(slot_ref) = target else {
            return false;
        };
        let Some(container) = self.containers.get_mut(slot_ref.container) else {
            return false;
        };
        let Some(slot @ Some(_)) = container.slots.get_mut(slot_ref.slot) else {
            return false;
        };
        *slot = None;
        container.live -= 1;
        self.free.push(slot_ref);
        trace!("rule sink removed .{class_name}");
        true
    }

    /// Current rule text for a class.
    pub fn rule(&self, class_name: &str) -> Option<&str> {
        let slot_ref = self.index.get(class_name)?;
        self.containers
            .get(slot_ref.container)?
            .slots
            .get(slot_ref.slot)?
            .as_ref()
            .map(|rule| rule.css.as_str())
    }

    /// Slot location for a class.
    #[inline]
    pub fn slot_of(&self, class_name: &str) -> Option<SlotRef> {
        self.index.get(class_name).copied()
    }

    /// Container holding a class's rule.
    #[inline]
    pub fn container_of(&self, class_name: &str) -> Option<usize> {
        self.slot_of(class_name).map(|slot_ref| slot_ref.container)
    }

    /// Number of live rules.
    pub fn slot_count(&self) -> usize {
        self.containers.iter().map(|container| container.live).sum()
    }

    /// Number of allocated containers.
    #[inline]
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Live rule texts in container and slot order.
    pub fn rules(&self) -> impl Iterator<Item = &str> {
        self.containers.iter().flat_map(|container| {
            container
                .slots
                .iter()
                .filter_map(|slot| slot.as_ref().map(|rule| rule.css.as_str()))
        })
    }

    /// All live rules joined by newlines.
    pub fn to_css_string(&self) -> String {
        self.rules().collect::<Vec<_>>().join("\n")
    }

    /// Put `rule` into a freed slot, or append it, rotating containers when
    /// the current one is full.
    fn place(&mut self, rule: Rule) -> SlotRef {
        while let Some(slot_ref) = self.free.pop() {
            if let Some(container) = self.containers.get_mut(slot_ref.container)
                && let Some(slot @ None) = container.slots.get_mut(slot_ref.slot)
            {
                *slot = Some(rule);
                container.live += 1;
                return slot_ref;
            }
        }

        let needs_container = self
            .containers
            .last()
            .is_none_or(|container| container.slots.len() >= self.container_capacity);
        if needs_container {
            self.containers.push(RuleContainer::default());
            trace!("rule sink allocated container #{}", self.containers.len());
        }

        let container_index = self.containers.len() - 1;
        let container = &mut self.containers[container_index];
        container.slots.push(Some(rule));
        container.live += 1;
        SlotRef {
            container: container_index,
            slot: container.slots.len() - 1,
        }
    }

    fn slot_mut(&mut self, slot_ref: SlotRef) -> Option<&mut Option<Rule>> {
        self.containers
            .get_mut(slot_ref.container)?
            .slots
            .get_mut(slot_ref.slot)
    }

    fn find_unowned(&self, class_name: &str) -> Option<SlotRef> {
        let selector = format!(".{class_name}");
        self.containers
            .iter()
            .enumerate()
            .find_map(|(container_index, container)| {
                container
                    .slots
                    .iter()
                    .position(|slot| {
                        slot.as_ref().is_some_and(|rule| {
                            rule.owner.is_none() && starts_with_selector(&rule.css, &selector)
                        })
                    })
                    .map(|slot| SlotRef {
                        container: container_index,
                        slot,
                    })
            })
    }
}

/// `text` begins with `selector` and the selector is not just a prefix of a
/// longer class name.
fn starts_with_selector(text: &str, selector: &str) -> bool {
    text.strip_prefix(selector).is_some_and(|rest| {
        rest.chars()
            .next()
            .is_none_or(|next| !(next.is_alphanumeric() || next == '-' || next == '_'))
    })
}
