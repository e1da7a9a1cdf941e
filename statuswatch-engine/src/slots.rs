//! The ordered slot registry.
//!
//! The host toolbar is append-only: it can take a new item at the end
//! and it can be cleared, nothing else. To keep the visible order equal
//! to the priority order, every mutation re-renders the full sequence:
//! clear, then append each registered slot in descending priority,
//! ties stable by insertion order.
//!
//! The registry is owned by the engine's dispatcher task, which applies
//! one mutation at a time; nothing can observe a partially re-rendered
//! toolbar.

use std::cmp::Reverse;

/// The data carried by a slot - the plain handle the host renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotContent {
    /// Text shown in the toolbar.
    pub text: String,
    /// Muted slots render de-emphasized (the host decides how).
    pub muted: bool,
}

impl SlotContent {
    /// Regular-emphasis content.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            muted: false,
        }
    }

    /// De-emphasized content, for placeholder slots.
    pub fn muted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            muted: true,
        }
    }
}

/// A named, prioritized toolbar slot.
///
/// At most one slot per name is registered at any time.
#[derive(Debug, Clone)]
pub struct Slot {
    /// Unique key for the slot.
    pub name: String,
    /// Higher priority renders earlier in the toolbar.
    pub priority: i32,
    /// What the host renders for this slot.
    pub content: SlotContent,
}

impl Slot {
    pub fn new(name: impl Into<String>, priority: i32, content: SlotContent) -> Self {
        Self {
            name: name.into(),
            priority,
            content,
        }
    }
}

/// The host toolbar collaborator.
///
/// The real host only supports appending at the end; it has no reorder
/// or remove-by-name primitive, which is why the registry re-renders in
/// full after every mutation.
pub trait Toolbar: Send {
    /// Append an item at the end of the toolbar.
    fn append(&mut self, name: &str, content: &SlotContent);

    /// Detach every currently attached item.
    fn clear(&mut self);

    /// Called once a full re-render has completed. Hosts that draw a
    /// composed line (rather than individual items) hook this.
    fn rendered(&mut self) {}
}

/// Ordered collection of named display slots over a [`Toolbar`].
///
/// # Example
///
/// ```
/// use statuswatch_engine::{Slot, SlotContent, SlotRegistry, Toolbar};
///
/// #[derive(Default)]
/// struct Items(Vec<String>);
///
/// impl Toolbar for Items {
///     fn append(&mut self, name: &str, _: &SlotContent) {
///         self.0.push(name.to_string());
///     }
///     fn clear(&mut self) {
///         self.0.clear();
///     }
/// }
///
/// let mut registry = SlotRegistry::new(Items::default());
/// registry.upsert(Slot::new("low", 1, SlotContent::new("b")));
/// registry.upsert(Slot::new("high", 9, SlotContent::new("a")));
/// assert_eq!(registry.names_in_order(), vec!["high", "low"]);
/// ```
#[derive(Debug)]
pub struct SlotRegistry<B: Toolbar> {
    /// Registered slots, in insertion order.
    slots: Vec<Slot>,
    toolbar: B,
}

impl<B: Toolbar> SlotRegistry<B> {
    /// Create an empty registry over the given toolbar.
    pub fn new(toolbar: B) -> Self {
        Self {
            slots: Vec::new(),
            toolbar,
        }
    }

    /// Insert a slot, or replace the slot with the same name in place.
    ///
    /// A replaced slot keeps its insertion position, so priority ties
    /// stay stable across updates. The toolbar is re-rendered.
    pub fn upsert(&mut self, slot: Slot) {
        match self.slots.iter_mut().find(|s| s.name == slot.name) {
            Some(existing) => *existing = slot,
            None => self.slots.push(slot),
        }
        self.render();
    }

    /// Remove a slot by name and re-render. No-op if absent.
    pub fn remove(&mut self, name: &str) {
        let before = self.slots.len();
        self.slots.retain(|s| s.name != name);
        if self.slots.len() != before {
            self.render();
        }
    }

    /// Remove every slot and detach everything from the toolbar.
    ///
    /// Used at engine shutdown; no slot outlives the engine.
    pub fn clear_all(&mut self) {
        self.slots.clear();
        self.toolbar.clear();
        self.toolbar.rendered();
    }

    /// Registered slot names in render order.
    pub fn names_in_order(&self) -> Vec<&str> {
        let mut ordered: Vec<&Slot> = self.slots.iter().collect();
        ordered.sort_by_key(|s| Reverse(s.priority));
        ordered.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of registered slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Access the underlying toolbar.
    pub fn toolbar(&self) -> &B {
        &self.toolbar
    }

    /// Detach all items and re-attach them in descending-priority
    /// order, ties stable by insertion order.
    fn render(&mut self) {
        self.toolbar.clear();
        let mut ordered: Vec<&Slot> = self.slots.iter().collect();
        // Stable sort preserves insertion order within a priority
        ordered.sort_by_key(|s| Reverse(s.priority));
        for slot in ordered {
            self.toolbar.append(&slot.name, &slot.content);
        }
        self.toolbar.rendered();
    }
}
