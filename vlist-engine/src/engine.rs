use std::rc::Rc;

use vlist::{
    Align, HeightOracle, ItemGeometry, ListConfig, RangeCalculator, ViewportState, VisibleRange,
    WindowRange,
};

use crate::{
    EngineError, FrameScheduler, HostContainer, ReconcileOutcome, Reconciler,
    RenderedSet, Renderer, ScrollDriver, SignalKind, SignalSender, Subscription,
};

/// Synchronous recomputations stop after this many passes if measurements keep drifting; the
/// remainder converges on the next frames.
const MAX_SETTLE_PASSES: usize = 4;

/// Where the engine is in its recompute cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineState {
    Idle,
    /// A frame was requested and has not run yet.
    RecomputePending,
    Reconciling,
}

/// Keeps a host scroll container's rendered items equal to its visible range.
///
/// This type owns the [`HeightOracle`] exclusively. The only writes to it come from the
/// reconciler's measurement step and [`Engine::record_measurement`], both behind `&mut self`,
/// so there is a single writer without any locking.
///
/// Adapters drive it by:
/// - forwarding host scroll/resize signals (through the [`SignalSender`]s handed to
///   [`HostContainer::subscribe_scroll`] / [`HostContainer::subscribe_resize`])
/// - calling [`Engine::on_frame`] when a frame requested from the [`FrameScheduler`] fires
///
/// Dropping the engine (or calling [`Engine::destroy`]) cancels the pending frame,
/// unsubscribes from the host and destroys every rendered handle.
pub struct Engine<H: HostContainer, R: Renderer> {
    config: ListConfig,
    oracle: HeightOracle,
    calculator: RangeCalculator,
    reconciler: Reconciler,
    rendered: RenderedSet<R::Handle>,
    window: Option<WindowRange>,
    viewport: ViewportState,
    reported_extent: Option<u64>,
    reconciling: bool,
    driver: Rc<ScrollDriver>,
    subscriptions: Vec<Subscription>,
    torn_down: bool,
    host: H,
    renderer: R,
}

impl<H: HostContainer, R: Renderer> Engine<H, R> {
    /// Validates `config`, subscribes to the host and schedules the first frame.
    pub fn new(
        config: ListConfig,
        mut host: H,
        renderer: R,
        scheduler: Rc<dyn FrameScheduler>,
    ) -> Result<Self, EngineError<R::Error>> {
        config.validate()?;
        let oracle = HeightOracle::new(config.sizing, config.item_count)?;
        vdebug!(
            count = config.item_count,
            overscan = config.overscan,
            variable = config.sizing.is_variable(),
            "Engine::new"
        );

        let driver = ScrollDriver::new(scheduler);
        let subscriptions = vec![
            host.subscribe_scroll(SignalSender::new(&driver, SignalKind::Scroll)),
            host.subscribe_resize(SignalSender::new(&driver, SignalKind::Resize)),
        ];

        let mut engine = Self {
            calculator: RangeCalculator::new(config.overscan),
            reconciler: Reconciler::new(config.sizing.is_variable()),
            rendered: RenderedSet::new(),
            window: None,
            viewport: ViewportState::default(),
            reported_extent: None,
            reconciling: false,
            driver,
            subscriptions,
            torn_down: false,
            config,
            oracle,
            host,
            renderer,
        };
        engine.sync_extent();
        engine.driver.request();
        Ok(engine)
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    pub fn oracle(&self) -> &HeightOracle {
        &self.oracle
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn state(&self) -> EngineState {
        if self.reconciling {
            EngineState::Reconciling
        } else if self.driver.is_pending() {
            EngineState::RecomputePending
        } else {
            EngineState::Idle
        }
    }

    /// The rendered (overscanned) range of the last completed pass.
    pub fn visible_range(&self) -> Option<VisibleRange> {
        self.window.map(|w| w.expanded)
    }

    /// The range intersecting the viewport during the last completed pass, without overscan.
    pub fn raw_range(&self) -> Option<VisibleRange> {
        self.window.map(|w| w.raw)
    }

    pub fn total_extent(&self) -> u64 {
        self.oracle.total_extent()
    }

    /// Host geometry read by the last pass.
    pub fn viewport_state(&self) -> ViewportState {
        self.viewport
    }

    pub fn rendered(&self) -> &RenderedSet<R::Handle> {
        &self.rendered
    }

    pub fn rendered_len(&self) -> usize {
        self.rendered.len()
    }

    pub fn handle(&self, index: usize) -> Option<&R::Handle> {
        self.rendered.get(index).map(|item| &item.handle)
    }

    /// Current layout of `index` according to the oracle.
    pub fn geometry(&self, index: usize) -> Option<ItemGeometry> {
        (index < self.oracle.item_count()).then(|| self.oracle.geometry(index))
    }

    /// Same as a host scroll signal.
    pub fn notify_scroll(&self) {
        self.driver.notify(SignalKind::Scroll);
    }

    /// Same as a host resize signal.
    pub fn notify_resize(&self) {
        self.driver.notify(SignalKind::Resize);
    }

    /// Runs the pending recomputation, if any.
    ///
    /// Returns `Ok(false)` when no frame was pending. A pass whose measurements drifted, or
    /// whose renderer failed, requests a follow-up frame.
    pub fn on_frame(&mut self) -> Result<bool, EngineError<R::Error>> {
        let Some(_signals) = self.driver.begin_frame() else {
            return Ok(false);
        };
        vtrace!(
            scrolls = _signals.scrolls,
            resizes = _signals.resizes,
            "frame"
        );
        let outcome = self.run_pass()?;
        if outcome.drifted {
            self.driver.request();
        }
        Ok(true)
    }

    /// Clears every measurement and recomputes immediately.
    ///
    /// Rendered items are measured again rather than rendered again.
    pub fn refresh(&mut self) -> Result<(), EngineError<R::Error>> {
        vdebug!("refresh");
        self.driver.cancel();
        self.oracle.invalidate_all();
        self.reconciler
            .remeasure(&self.rendered, &mut self.oracle, &self.renderer);
        self.settle()
    }

    /// Changes the item count, invalidating every measurement, and recomputes immediately.
    ///
    /// Rendered items past the new end are destroyed.
    pub fn set_item_count(&mut self, item_count: usize) -> Result<(), EngineError<R::Error>> {
        vdebug!(
            from = self.config.item_count,
            to = item_count,
            "set_item_count"
        );
        self.driver.cancel();
        self.config.item_count = item_count;
        self.oracle.set_item_count(item_count);
        self.reconciler
            .remeasure(&self.rendered, &mut self.oracle, &self.renderer);
        self.settle()
    }

    /// Overrides the size of `index` and schedules a recomputation.
    ///
    /// Returns the size delta applied (always `0` for fixed-size lists).
    pub fn record_measurement(
        &mut self,
        index: usize,
        size: u32,
    ) -> Result<i64, EngineError<R::Error>> {
        let delta = self.oracle.record_measurement(index, size)?;
        if delta != 0 {
            self.sync_extent();
            self.driver.request();
        }
        Ok(delta)
    }

    /// Scrolls the host so that `index` lands at `align`, and schedules a recomputation.
    ///
    /// Returns the (clamped) offset handed to the host, or `None` for an empty list.
    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> Option<u64> {
        let offset = RangeCalculator::scroll_offset_for(
            &self.oracle,
            index,
            align,
            self.host.viewport_size(),
            self.host.scroll_offset(),
        )?;
        vtrace!(index, ?align, offset, "scroll_to_index");
        self.host.scroll_to(offset);
        self.driver.request();
        Some(offset)
    }

    /// Tears the engine down. Equivalent to dropping it.
    pub fn destroy(self) {
        drop(self);
    }

    fn settle(&mut self) -> Result<(), EngineError<R::Error>> {
        for _ in 0..MAX_SETTLE_PASSES {
            if !self.run_pass()?.drifted {
                return Ok(());
            }
        }
        self.driver.request();
        Ok(())
    }

    fn run_pass(&mut self) -> Result<ReconcileOutcome, EngineError<R::Error>> {
        self.reconciling = true;
        self.viewport = ViewportState {
            scroll_offset: self.host.scroll_offset(),
            viewport_size: self.host.viewport_size(),
        };
        let window = self.calculator.compute_range(
            &self.oracle,
            self.viewport.scroll_offset,
            self.viewport.viewport_size,
        );
        let result = self.reconciler.reconcile(
            window.map(|w| w.expanded),
            &mut self.rendered,
            &mut self.oracle,
            &mut self.renderer,
        );
        self.reconciling = false;
        self.sync_extent();

        if window != self.window {
            vdebug!(
                start = window.map(|w| w.expanded.start),
                end = window.map(|w| w.expanded.end),
                "visible range changed"
            );
        }
        // Committed even on failure: the rendered set is a subset of it and the retry
        // frame renders the rest.
        self.window = window;
        if let Err(EngineError::Render { index: _index, .. }) = &result {
            vwarn!(index = _index, "render failed, retrying next frame");
            self.driver.request();
        }
        result
    }

    fn sync_extent(&mut self) {
        let extent = self.oracle.total_extent();
        if self.reported_extent != Some(extent) {
            vtrace!(extent, "content extent");
            self.host.set_content_extent(extent);
            self.reported_extent = Some(extent);
        }
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.driver.close();
        self.subscriptions.clear();
        let _destroyed = self.rendered.len();
        for (index, item) in self.rendered.drain() {
            self.renderer.destroy(index, item.handle);
        }
        self.window = None;
        vdebug!(destroyed = _destroyed, "Engine destroyed");
    }
}

impl<H: HostContainer, R: Renderer> Drop for Engine<H, R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
