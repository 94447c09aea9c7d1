use std::collections::BTreeMap;

use vlist::{HeightOracle, ItemGeometry, VisibleRange};

use crate::EngineError;

/// Turns indexes into displayable items.
///
/// The engine knows nothing about handles beyond moving them around and giving them back to
/// [`Renderer::destroy`]. Every handle returned by `render` is destroyed exactly once.
pub trait Renderer {
    type Handle;
    type Error;

    fn render(
        &mut self,
        index: usize,
        geometry: ItemGeometry,
    ) -> Result<Self::Handle, Self::Error>;

    fn destroy(&mut self, index: usize, handle: Self::Handle);

    /// Actual size of a rendered item along the list axis, if it can be measured.
    ///
    /// Only consulted in variable-size mode.
    fn measure(&self, _handle: &Self::Handle) -> Option<u32> {
        None
    }

    /// Moves an already rendered item after earlier measurements shifted it.
    fn reposition(
        &mut self,
        _index: usize,
        _handle: &mut Self::Handle,
        _geometry: ItemGeometry,
    ) {
    }
}

/// A live handle and the geometry it was last laid out with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedItem<H> {
    pub handle: H,
    pub geometry: ItemGeometry,
}

/// The currently materialized items, keyed by index.
#[derive(Clone, Debug)]
pub struct RenderedSet<H> {
    items: BTreeMap<usize, RenderedItem<H>>,
}

impl<H> Default for RenderedSet<H> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<H> RenderedSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.items.contains_key(&index)
    }

    pub fn get(&self, index: usize) -> Option<&RenderedItem<H>> {
        self.items.get(&index)
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &RenderedItem<H>)> + '_ {
        self.items.iter().map(|(&i, item)| (i, item))
    }

    /// Whether the key set is exactly `range`'s index set.
    pub fn matches(&self, range: Option<VisibleRange>) -> bool {
        match range {
            None => self.items.is_empty(),
            Some(range) => {
                self.items.len() == range.len()
                    && self.items.first_key_value().map(|(&i, _)| i) == Some(range.start)
                    && self.items.last_key_value().map(|(&i, _)| i) == Some(range.end)
            }
        }
    }

    /// Removes and returns every item outside `range` (everything when `range` is `None`).
    fn take_outside(&mut self, range: Option<VisibleRange>) -> Vec<(usize, RenderedItem<H>)> {
        let Some(range) = range else {
            return std::mem::take(&mut self.items).into_iter().collect();
        };
        let after = match range.end.checked_add(1) {
            Some(next) => self.items.split_off(&next),
            None => BTreeMap::new(),
        };
        let kept = self.items.split_off(&range.start);
        let before = std::mem::replace(&mut self.items, kept);
        before.into_iter().chain(after).collect()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (usize, RenderedItem<H>)> {
        std::mem::take(&mut self.items).into_iter()
    }
}

/// What a reconciliation pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReconcileOutcome {
    pub added: usize,
    pub removed: usize,
    pub repositioned: usize,
    /// At least one measurement differed from the size the oracle assumed.
    pub drifted: bool,
}

/// Diffs the rendered set against a new range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reconciler {
    measure: bool,
}

impl Reconciler {
    /// `measure` enables the estimate-then-correct loop (variable-size lists).
    pub fn new(measure: bool) -> Self {
        Self { measure }
    }

    pub fn measures(&self) -> bool {
        self.measure
    }

    /// Brings `set` in line with `range`.
    ///
    /// Items leaving the range are destroyed, items entering it are rendered in ascending
    /// order, and items staying are never rendered again. A handle is only registered once
    /// `render` succeeded, so a failure leaves no partial entry behind. Registered items are
    /// repositioned before a render error is returned.
    pub fn reconcile<R: Renderer>(
        &self,
        range: Option<VisibleRange>,
        set: &mut RenderedSet<R::Handle>,
        oracle: &mut HeightOracle,
        renderer: &mut R,
    ) -> Result<ReconcileOutcome, EngineError<R::Error>> {
        let mut outcome = ReconcileOutcome::default();

        for (index, item) in set.take_outside(range) {
            renderer.destroy(index, item.handle);
            outcome.removed += 1;
        }

        let Some(range) = range else {
            return Ok(outcome);
        };

        let rendered = render_missing(self.measure, range, set, oracle, renderer, &mut outcome);
        // Earlier measurements in this pass may have shifted registered items, failure or not.
        outcome.repositioned = reposition_stale(set, oracle, renderer);
        rendered?;

        vtrace!(
            start = range.start,
            end = range.end,
            added = outcome.added,
            removed = outcome.removed,
            repositioned = outcome.repositioned,
            drifted = outcome.drifted,
            "reconcile"
        );
        Ok(outcome)
    }

    /// Re-reads the size of every rendered item into `oracle`. Returns whether any changed.
    pub fn remeasure<R: Renderer>(
        &self,
        set: &RenderedSet<R::Handle>,
        oracle: &mut HeightOracle,
        renderer: &R,
    ) -> bool {
        if !self.measure {
            return false;
        }
        let mut drifted = false;
        for (index, item) in set.iter() {
            if index >= oracle.item_count() {
                continue;
            }
            if let Some(actual) = renderer.measure(&item.handle) {
                drifted |= record(oracle, index, actual);
            }
        }
        drifted
    }
}

fn render_missing<R: Renderer>(
    measure: bool,
    range: VisibleRange,
    set: &mut RenderedSet<R::Handle>,
    oracle: &mut HeightOracle,
    renderer: &mut R,
    outcome: &mut ReconcileOutcome,
) -> Result<(), EngineError<R::Error>> {
    for index in range.indices() {
        if set.contains(index) {
            continue;
        }
        let mut geometry = oracle.geometry(index);
        let handle = renderer
            .render(index, geometry)
            .map_err(|source| EngineError::Render { index, source })?;
        if measure {
            if let Some(actual) = renderer.measure(&handle) {
                outcome.drifted |= record(oracle, index, actual);
                geometry.size = oracle.height_of(index);
            }
        }
        set.items.insert(index, RenderedItem { handle, geometry });
        outcome.added += 1;
    }
    Ok(())
}

fn record(oracle: &mut HeightOracle, index: usize, size: u32) -> bool {
    match oracle.record_measurement(index, size) {
        Ok(delta) => {
            if delta != 0 {
                vdebug!(index, size, delta, "measurement drift");
            }
            delta != 0
        }
        Err(_err) => {
            vwarn!(index, size, error = %_err, "ignoring measurement");
            false
        }
    }
}

/// Lays out again every item whose geometry no longer matches the oracle.
fn reposition_stale<R: Renderer>(
    set: &mut RenderedSet<R::Handle>,
    oracle: &HeightOracle,
    renderer: &mut R,
) -> usize {
    let mut moved = 0;
    for (&index, item) in set.items.iter_mut() {
        let current = oracle.geometry(index);
        if current != item.geometry {
            renderer.reposition(index, &mut item.handle, current);
            item.geometry = current;
            moved += 1;
        }
    }
    moved
}
