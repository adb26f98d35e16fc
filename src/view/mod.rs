//! Live filtered and sorted projection over a slice of items.
//!
//! The view stores source indices only. Every operation takes the source
//! slice so the view never owns or outlives the items it projects. Callers
//! must report changes: `notify_item_changed` for a mutated item and
//! `notify_collection_changed` after items were added or removed.

pub mod filter;

use std::cmp::Ordering;

use tracing::debug;

use crate::observable::{EventHandlers, Subscription};

/// Change notification emitted by [`FilteredSortedView`]. Positions index the
/// view, `index` values index the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewChange {
    /// The whole view was rebuilt; carries the new ordered source indices.
    Reset(Vec<usize>),
    Inserted { position: usize, index: usize },
    Removed { position: usize, index: usize },
    Updated { position: usize, index: usize },
    Moved { from: usize, to: usize, index: usize },
}

type Predicate<T, A> = Box<dyn Fn(&T, &A) -> bool>;
type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;

pub struct FilteredSortedView<T, A> {
    predicate: Predicate<T, A>,
    comparator: Comparator<T>,
    argument: A,
    visible: Vec<usize>,
    members: Vec<bool>,
    changed: EventHandlers<ViewChange>,
}

impl<T, A: PartialEq> FilteredSortedView<T, A> {
    pub fn new(
        source: &[T],
        predicate: impl Fn(&T, &A) -> bool + 'static,
        argument: A,
        comparator: impl Fn(&T, &T) -> Ordering + 'static,
    ) -> Self {
        let mut view = Self {
            predicate: Box::new(predicate),
            comparator: Box::new(comparator),
            argument,
            visible: Vec::new(),
            members: Vec::new(),
            changed: EventHandlers::new(),
        };
        view.rebuild(source);
        view
    }

    pub fn argument(&self) -> &A {
        &self.argument
    }

    /// Replace the filter argument. Returns false, without notifying, when it
    /// equals the current one.
    pub fn set_filter_argument(&mut self, source: &[T], argument: A) -> bool {
        if self.argument == argument {
            return false;
        }
        self.argument = argument;
        self.rebuild(source);
        debug!(visible = self.visible.len(), "filter argument replaced");
        self.changed.emit(&ViewChange::Reset(self.visible.clone()));
        true
    }

    /// Re-evaluate the membership and position of the item at `index`.
    pub fn notify_item_changed(&mut self, source: &[T], index: usize) {
        self.check_source(source);
        let matches = (self.predicate)(&source[index], &self.argument);
        let current = if self.members[index] {
            Some(self.position_of(source, index))
        } else {
            None
        };

        let change = match (current, matches) {
            (None, false) => return,
            (Some(position), false) => {
                self.visible.remove(position);
                self.members[index] = false;
                ViewChange::Removed { position, index }
            }
            (None, true) => {
                let position = self.insertion_point(source, index);
                self.visible.insert(position, index);
                self.members[index] = true;
                ViewChange::Inserted { position, index }
            }
            (Some(position), true) if self.in_order_at(source, position) => {
                ViewChange::Updated { position, index }
            }
            (Some(from), true) => {
                self.visible.remove(from);
                let to = self.insertion_point(source, index);
                self.visible.insert(to, index);
                ViewChange::Moved { from, to, index }
            }
        };
        self.changed.emit(&change);
    }

    /// Rebuild the view after items were added to or removed from `source`.
    pub fn notify_collection_changed(&mut self, source: &[T]) {
        self.rebuild(source);
        self.changed.emit(&ViewChange::Reset(self.visible.clone()));
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Source indices in display order.
    pub fn indices(&self) -> &[usize] {
        &self.visible
    }

    pub fn get<'a>(&self, source: &'a [T], position: usize) -> Option<&'a T> {
        self.visible.get(position).map(|&index| &source[index])
    }

    pub fn iter<'a>(&'a self, source: &'a [T]) -> impl Iterator<Item = &'a T> + 'a {
        self.visible.iter().map(move |&index| &source[index])
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&ViewChange) + 'static) -> Subscription {
        self.changed.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.changed.unsubscribe(subscription)
    }

    fn rebuild(&mut self, source: &[T]) {
        self.members = source
            .iter()
            .map(|item| (self.predicate)(item, &self.argument))
            .collect();
        let mut visible: Vec<usize> = (0..source.len()).filter(|&i| self.members[i]).collect();
        // stable: ties keep source order
        visible.sort_by(|&a, &b| (self.comparator)(&source[a], &source[b]));
        self.visible = visible;
    }

    /// Total order: comparator first, then source position.
    fn order(&self, source: &[T], a: usize, b: usize) -> Ordering {
        (self.comparator)(&source[a], &source[b]).then(a.cmp(&b))
    }

    fn insertion_point(&self, source: &[T], index: usize) -> usize {
        self.visible
            .partition_point(|&other| self.order(source, other, index) == Ordering::Less)
    }

    fn position_of(&self, source: &[T], index: usize) -> usize {
        match self
            .visible
            .binary_search_by(|&other| self.order(source, other, index))
        {
            Ok(position) => position,
            // the item's sort key changed since it was placed
            Err(_) => self
                .visible
                .iter()
                .position(|&other| other == index)
                .unwrap_or_else(|| panic!("view member {} missing from visible list", index)),
        }
    }

    fn in_order_at(&self, source: &[T], position: usize) -> bool {
        let index = self.visible[position];
        let after_prev = position == 0
            || self.order(source, self.visible[position - 1], index) == Ordering::Less;
        let before_next = position + 1 == self.visible.len()
            || self.order(source, index, self.visible[position + 1]) == Ordering::Less;
        after_prev && before_next
    }

    fn check_source(&self, source: &[T]) {
        assert_eq!(
            self.members.len(),
            source.len(),
            "source length changed without notify_collection_changed"
        );
    }
}
