//! The ordered dispatcher registry.

use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::dispatcher::{BoxDispatch, Dispatch};

/// The sort key of a registered dispatcher.
///
/// Numeric weights sort ascending and keep their registration order among
/// ties. `Top` and `Bottom` pin to the extremes: a later `Top` lands
/// before earlier ones, a later `Bottom` after earlier ones. `Before` and
/// `After` position relative to a named sibling, falling back to a plain
/// zero weight when the sibling is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Weight {
    Top,
    Bottom,
    Fixed(i32),
    Before(String),
    After(String),
}

impl Weight {
    pub fn before(id: impl Into<String>) -> Self {
        Self::Before(id.into())
    }

    pub fn after(id: impl Into<String>) -> Self {
        Self::After(id.into())
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self::Fixed(0)
    }
}

impl From<i32> for Weight {
    fn from(weight: i32) -> Self {
        Self::Fixed(weight)
    }
}

struct Entry {
    handler: BoxDispatch,
    weight: Weight,
}

/// An ordered mapping of dispatcher identifier to handler and weight.
///
/// The evaluation order is derived lazily from the weights and cached
/// until the registry is mutated.
///
/// # Example
///
/// ```
/// use ricochet_dispatch::{DispatcherRegistry, Weight, dispatch_fn};
///
/// let mut registry = DispatcherRegistry::new();
/// registry.add("pages", dispatch_fn(|_| Ok(None)), Weight::default());
/// registry.add("auth", dispatch_fn(|_| Ok(None)), Weight::Top);
///
/// let ids: Vec<_> = registry.ordered().map(|(id, _)| id).collect();
/// assert_eq!(ids, ["auth", "pages"]);
/// ```
#[derive(Default)]
pub struct DispatcherRegistry {
    entries: IndexMap<String, Entry>,
    order: OnceLock<Vec<String>>,
}

impl DispatcherRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dispatcher under `id`. Re-registering an id replaces
    /// its handler and weight.
    pub fn add(&mut self, id: impl Into<String>, handler: impl Dispatch, weight: Weight) {
        self.add_boxed(id, std::sync::Arc::new(handler), weight);
    }

    /// Register an already shared dispatcher.
    pub fn add_boxed(&mut self, id: impl Into<String>, handler: BoxDispatch, weight: Weight) {
        self.entries.insert(id.into(), Entry { handler, weight });
        self.order = OnceLock::new();
    }

    /// Remove a dispatcher.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.entries.shift_remove(id).is_some();
        if removed {
            self.order = OnceLock::new();
        }
        removed
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BoxDispatch> {
        self.entries.get(id).map(|entry| &entry.handler)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the dispatchers in weight-derived order.
    pub fn ordered(&self) -> impl Iterator<Item = (&str, &BoxDispatch)> {
        self.order
            .get_or_init(|| self.compute_order())
            .iter()
            .filter_map(|id| {
                self.entries
                    .get(id)
                    .map(|entry| (id.as_str(), &entry.handler))
            })
    }

    /// Derive the total order from the weights.
    ///
    /// Fixed-position entries are placed first: tops, then numeric
    /// weights sorted ascending with a stable sort, then bottoms.
    /// Relative entries are placed in a second pass, in registration
    /// order, next to their sibling.
    fn compute_order(&self) -> Vec<String> {
        enum Anchor<'a> {
            Before(&'a str),
            After(&'a str),
        }

        let mut tops = Vec::new();
        let mut middle: Vec<(i32, &String)> = Vec::new();
        let mut bottoms = Vec::new();
        let mut relatives = Vec::new();

        for (id, entry) in &self.entries {
            match &entry.weight {
                Weight::Top => tops.insert(0, id),
                Weight::Bottom => bottoms.push(id),
                Weight::Fixed(weight) => middle.push((*weight, id)),
                Weight::Before(sibling) => relatives.push((id, Anchor::Before(sibling.as_str()))),
                Weight::After(sibling) => relatives.push((id, Anchor::After(sibling.as_str()))),
            }
        }
        middle.sort_by_key(|(weight, _)| *weight);

        let mut order: Vec<String> = tops
            .into_iter()
            .chain(middle.into_iter().map(|(_, id)| id))
            .cloned()
            .collect();
        // relatives fall back to the end of the middle segment when their
        // sibling is not placed
        let fallback = order.len();
        for (id, anchor) in relatives {
            let at = match anchor {
                Anchor::Before(sibling) => order
                    .iter()
                    .position(|placed| placed == sibling)
                    .unwrap_or(fallback.min(order.len())),
                Anchor::After(sibling) => order
                    .iter()
                    .position(|placed| placed == sibling)
                    .map(|at| at + 1)
                    .unwrap_or(fallback.min(order.len())),
            };
            order.insert(at, id.clone());
        }
        order.extend(bottoms.into_iter().cloned());
        order
    }
}

impl std::fmt::Debug for DispatcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(id, entry)| (id, &entry.weight)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch_fn;

    fn noop() -> impl Dispatch {
        dispatch_fn(|_| Ok(None))
    }

    fn ids(registry: &DispatcherRegistry) -> Vec<&str> {
        registry.ordered().map(|(id, _)| id).collect()
    }

    #[test]
    fn weighted_ordering() {
        let mut registry = DispatcherRegistry::new();
        registry.add("two", noop(), Weight::Fixed(0));
        registry.add("three", noop(), Weight::Fixed(0));
        registry.add("bottom", noop(), Weight::Bottom);
        registry.add("megabottom", noop(), Weight::Bottom);
        registry.add("hyperbottom", noop(), Weight::Bottom);
        registry.add("one", noop(), Weight::before("two"));
        registry.add("four", noop(), Weight::after("three"));
        registry.add("top", noop(), Weight::Top);
        registry.add("megatop", noop(), Weight::Top);
        registry.add("hypertop", noop(), Weight::Top);

        assert_eq!(
            ids(&registry),
            [
                "hypertop",
                "megatop",
                "top",
                "one",
                "two",
                "three",
                "four",
                "bottom",
                "megabottom",
                "hyperbottom",
            ]
        );
    }

    #[test]
    fn numeric_weights_sort_ascending_and_stable() {
        let mut registry = DispatcherRegistry::new();
        registry.add("b", noop(), Weight::Fixed(10));
        registry.add("a", noop(), Weight::Fixed(-5));
        registry.add("c", noop(), Weight::Fixed(10));
        registry.add("d", noop(), Weight::Fixed(0));

        assert_eq!(ids(&registry), ["a", "d", "b", "c"]);
    }

    #[test]
    fn missing_sibling_falls_back_to_plain_weight() {
        let mut registry = DispatcherRegistry::new();
        registry.add("a", noop(), Weight::default());
        registry.add("ghost-follower", noop(), Weight::after("ghost"));
        registry.add("z", noop(), Weight::Bottom);

        assert_eq!(ids(&registry), ["a", "ghost-follower", "z"]);
    }

    #[test]
    fn mutation_invalidates_the_cached_order() {
        let mut registry = DispatcherRegistry::new();
        registry.add("a", noop(), Weight::default());
        assert_eq!(ids(&registry), ["a"]);

        registry.add("b", noop(), Weight::Top);
        assert_eq!(ids(&registry), ["b", "a"]);

        registry.remove("a");
        assert_eq!(ids(&registry), ["b"]);
    }
}
