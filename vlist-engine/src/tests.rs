use crate::*;

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use vlist::{ConfigError, MeasureError};

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        start + (self.next_u64() % (end_exclusive - start))
    }
}

#[derive(Default)]
struct HostState {
    offset: u64,
    viewport: u32,
    extent: Option<u64>,
    scroll_to_calls: Vec<u64>,
    scroll_signals: Option<SignalSender>,
    resize_signals: Option<SignalSender>,
    unsubscribed: usize,
}

/// A scroll container that fires its own scroll signal on `scroll_to`, like a browser does.
#[derive(Clone, Default)]
struct FakeHost(Rc<RefCell<HostState>>);

impl FakeHost {
    fn new(viewport: u32) -> Self {
        let host = Self::default();
        host.0.borrow_mut().viewport = viewport;
        host
    }

    fn scroll(&self, offset: u64) {
        let signals = {
            let mut state = self.0.borrow_mut();
            state.offset = offset;
            state.scroll_signals.clone()
        };
        if let Some(signals) = signals {
            signals.notify();
        }
    }

    fn resize(&self, viewport: u32) {
        let signals = {
            let mut state = self.0.borrow_mut();
            state.viewport = viewport;
            state.resize_signals.clone()
        };
        if let Some(signals) = signals {
            signals.notify();
        }
    }

    fn extent(&self) -> Option<u64> {
        self.0.borrow().extent
    }
}

impl HostContainer for FakeHost {
    fn scroll_offset(&self) -> u64 {
        self.0.borrow().offset
    }

    fn viewport_size(&self) -> u32 {
        self.0.borrow().viewport
    }

    fn scroll_to(&mut self, offset: u64) {
        self.0.borrow_mut().scroll_to_calls.push(offset);
        self.scroll(offset);
    }

    fn set_content_extent(&mut self, extent: u64) {
        self.0.borrow_mut().extent = Some(extent);
    }

    fn subscribe_scroll(&mut self, signals: SignalSender) -> Subscription {
        self.0.borrow_mut().scroll_signals = Some(signals);
        let state = Rc::clone(&self.0);
        Subscription::new(move || {
            let mut state = state.borrow_mut();
            state.scroll_signals = None;
            state.unsubscribed += 1;
        })
    }

    fn subscribe_resize(&mut self, signals: SignalSender) -> Subscription {
        self.0.borrow_mut().resize_signals = Some(signals);
        let state = Rc::clone(&self.0);
        Subscription::new(move || {
            let mut state = state.borrow_mut();
            state.resize_signals = None;
            state.unsubscribed += 1;
        })
    }
}

#[derive(Default)]
struct RenderLog {
    rendered: Vec<usize>,
    destroyed: Vec<usize>,
    repositioned: Vec<(usize, ItemGeometry)>,
    live: BTreeSet<u64>,
    next_id: u64,
}

#[derive(Debug)]
struct TestHandle {
    id: u64,
    size: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
#[error("render failed at {0}")]
struct RenderFailed(usize);

#[derive(Clone, Default)]
struct FakeRenderer {
    log: Rc<RefCell<RenderLog>>,
    sizes: Option<Rc<dyn Fn(usize) -> u32>>,
    fail_at: Rc<Cell<Option<usize>>>,
}

impl FakeRenderer {
    fn measuring(sizes: impl Fn(usize) -> u32 + 'static) -> Self {
        Self {
            sizes: Some(Rc::new(sizes)),
            ..Self::default()
        }
    }
}

impl Renderer for FakeRenderer {
    type Handle = TestHandle;
    type Error = RenderFailed;

    fn render(
        &mut self,
        index: usize,
        _geometry: ItemGeometry,
    ) -> Result<TestHandle, RenderFailed> {
        if self.fail_at.get() == Some(index) {
            return Err(RenderFailed(index));
        }
        let mut log = self.log.borrow_mut();
        let id = log.next_id;
        log.next_id += 1;
        log.live.insert(id);
        log.rendered.push(index);
        Ok(TestHandle {
            id,
            size: self.sizes.as_ref().map(|f| f(index)),
        })
    }

    fn destroy(&mut self, index: usize, handle: TestHandle) {
        let mut log = self.log.borrow_mut();
        assert!(log.live.remove(&handle.id), "handle destroyed twice");
        log.destroyed.push(index);
    }

    fn measure(&self, handle: &TestHandle) -> Option<u32> {
        handle.size
    }

    fn reposition(&mut self, index: usize, _handle: &mut TestHandle, geometry: ItemGeometry) {
        self.log.borrow_mut().repositioned.push((index, geometry));
    }
}

type TestEngine = Engine<FakeHost, FakeRenderer>;

struct Harness {
    engine: TestEngine,
    host: FakeHost,
    log: Rc<RefCell<RenderLog>>,
    scheduler: Rc<ManualScheduler>,
}

impl Harness {
    fn new(config: ListConfig, viewport: u32) -> Self {
        Self::with_renderer(config, viewport, FakeRenderer::default())
    }

    fn with_renderer(config: ListConfig, viewport: u32, renderer: FakeRenderer) -> Self {
        let host = FakeHost::new(viewport);
        let log = Rc::clone(&renderer.log);
        let scheduler = Rc::new(ManualScheduler::new());
        let engine = Engine::new(config, host.clone(), renderer, scheduler.clone()).unwrap();
        Self {
            engine,
            host,
            log,
            scheduler,
        }
    }

    /// Runs frames until none is pending.
    fn pump(&mut self) -> usize {
        let mut frames = 0;
        while self.scheduler.is_due() {
            assert!(frames < 16, "frames did not settle");
            self.scheduler.take_due();
            self.engine.on_frame().unwrap();
            frames += 1;
        }
        frames
    }

    fn rendered_count(&self) -> usize {
        self.log.borrow().rendered.len()
    }

    fn assert_consistent(&self) {
        let rendered = self.engine.rendered();
        assert!(rendered.matches(self.engine.visible_range()));
        assert_eq!(self.log.borrow().live.len(), rendered.len());
        for (index, item) in rendered.iter() {
            assert_eq!(Some(item.geometry), self.engine.geometry(index));
        }
    }
}

#[test]
fn first_frame_renders_overscanned_window() {
    let mut h = Harness::new(ListConfig::fixed(10_000, 40).with_overscan(3), 400);
    assert_eq!(h.engine.state(), EngineState::RecomputePending);
    assert_eq!(h.rendered_count(), 0);
    assert_eq!(h.host.extent(), Some(400_000));

    assert_eq!(h.pump(), 1);
    assert_eq!(h.engine.state(), EngineState::Idle);
    assert_eq!(h.engine.raw_range(), Some(VisibleRange::new(0, 9)));
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(0, 12)));
    assert_eq!(h.log.borrow().rendered, (0..=12).collect::<Vec<_>>());
    h.assert_consistent();
}

#[test]
fn scroll_bursts_coalesce_into_one_frame() {
    let mut h = Harness::new(ListConfig::fixed(10_000, 40).with_overscan(3), 400);
    h.pump();
    let requested = h.scheduler.requested_count();

    h.host.scroll(100);
    h.host.scroll(2000);
    h.host.scroll(4000);
    assert_eq!(h.scheduler.requested_count(), requested + 1);
    assert_eq!(h.scheduler.pending_len(), 1);
    assert_eq!(h.engine.state(), EngineState::RecomputePending);

    assert_eq!(h.pump(), 1);
    assert_eq!(h.engine.raw_range(), Some(VisibleRange::new(100, 109)));
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(97, 112)));
    assert_eq!(h.engine.viewport_state().scroll_offset, 4000);
    h.assert_consistent();
}

#[test]
fn retained_items_are_not_rendered_again() {
    let mut h = Harness::new(ListConfig::fixed(10_000, 40).with_overscan(3), 400);
    h.pump();

    h.host.scroll(80);
    h.pump();
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(0, 14)));
    let log = h.log.borrow();
    assert_eq!(&log.rendered[13..], &[13, 14]);
    assert!(log.destroyed.is_empty());
    assert!(log.repositioned.is_empty());
}

#[test]
fn random_scrolling_keeps_rendered_set_equal_to_range() {
    let sizes = |i: usize| 5 + (i as u32 * 7) % 23;
    for variable in [false, true] {
        let config = if variable {
            ListConfig::estimated(5_000, 10)
        } else {
            ListConfig::fixed(5_000, 10)
        };
        let renderer = if variable {
            FakeRenderer::measuring(sizes)
        } else {
            FakeRenderer::default()
        };
        let mut h = Harness::with_renderer(config.with_overscan(2), 120, renderer);
        let mut rng = Lcg(0xfeed);
        h.pump();
        for _ in 0..200 {
            let extent = h.engine.total_extent();
            h.host.scroll(rng.gen_range_u64(0, extent + 100));
            if rng.gen_range_u64(0, 10) == 0 {
                h.host.resize(rng.gen_range_u64(0, 400) as u32);
            }
            h.pump();
            h.assert_consistent();
        }
    }
}

#[test]
fn resize_triggers_recompute() {
    let mut h = Harness::new(ListConfig::fixed(100, 40).with_overscan(0), 400);
    h.pump();
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(0, 9)));

    h.host.resize(800);
    assert_eq!(h.engine.state(), EngineState::RecomputePending);
    h.pump();
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(0, 19)));
    assert_eq!(h.engine.viewport_state().viewport_size, 800);
}

#[test]
fn zero_viewport_renders_a_single_item_plus_overscan() {
    let mut h = Harness::new(ListConfig::fixed(100, 40).with_overscan(1), 0);
    h.pump();
    assert_eq!(h.engine.raw_range(), Some(VisibleRange::single(0)));
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(0, 1)));
}

#[test]
fn refresh_twice_is_idempotent() {
    let fixed = Harness::new(ListConfig::fixed(1_000, 20).with_overscan(2), 100);
    let variable = Harness::with_renderer(
        ListConfig::estimated(1_000, 10).with_overscan(2),
        100,
        FakeRenderer::measuring(|i| 10 + (i as u32 % 3) * 5),
    );
    for mut h in [fixed, variable] {
        h.pump();
        let range = h.engine.visible_range();
        let renders = h.rendered_count();
        let destroys = h.log.borrow().destroyed.len();

        h.engine.refresh().unwrap();
        assert_eq!(h.engine.visible_range(), range);
        assert_eq!(h.rendered_count(), renders);

        h.engine.refresh().unwrap();
        assert_eq!(h.engine.visible_range(), range);
        assert_eq!(h.rendered_count(), renders);
        assert_eq!(h.log.borrow().destroyed.len(), destroys);
        h.assert_consistent();
    }
}

#[test]
fn empty_list_never_renders() {
    let mut h = Harness::new(ListConfig::estimated(0, 40).with_overscan(3), 400);
    h.pump();
    assert_eq!(h.engine.visible_range(), None);
    assert_eq!(h.engine.total_extent(), 0);
    assert_eq!(h.host.extent(), Some(0));
    assert_eq!(h.engine.rendered_len(), 0);

    h.engine.refresh().unwrap();
    h.host.scroll(500);
    h.pump();
    assert_eq!(h.engine.scroll_to_index(3, Align::Start), None);
    assert_eq!(h.rendered_count(), 0);
}

#[test]
fn scroll_to_index_round_trips() {
    let mut h = Harness::new(ListConfig::fixed(1_000, 20).with_overscan(2), 100);
    h.pump();

    assert_eq!(h.engine.scroll_to_index(500, Align::Start), Some(10_000));
    assert_eq!(h.host.0.borrow().scroll_to_calls, vec![10_000]);
    assert_eq!(h.scheduler.pending_len(), 1);
    h.pump();
    assert_eq!(h.engine.raw_range().map(|r| r.start), Some(500));
    assert_eq!(h.engine.visible_range().map(|r| r.start), Some(498));

    // Near the end the offset is clamped to the last page.
    assert_eq!(h.engine.scroll_to_index(999, Align::Start), Some(19_900));
    h.pump();
    assert_eq!(h.engine.raw_range(), Some(VisibleRange::new(995, 999)));

    assert_eq!(h.engine.scroll_to_index(10, Align::Center), Some(160));
    h.pump();
    h.assert_consistent();
}

#[test]
fn measurements_correct_estimates_on_the_following_frame() {
    let mut h = Harness::with_renderer(
        ListConfig::estimated(100, 10).with_overscan(0),
        30,
        FakeRenderer::measuring(|i| if i == 0 { 25 } else { 10 }),
    );
    // First pass renders [0, 2] from estimates and measures item 0; the follow-up pass
    // drops item 2, which no longer fits.
    assert_eq!(h.pump(), 2);
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(0, 1)));
    assert_eq!(h.log.borrow().rendered, vec![0, 1, 2]);
    assert_eq!(h.log.borrow().destroyed, vec![2]);
    assert_eq!(h.engine.oracle().offset_of(1), 25);
    assert_eq!(h.engine.total_extent(), 25 + 99 * 10);
    assert_eq!(h.host.extent(), Some(1015));
    h.assert_consistent();
}

#[test]
fn manual_measurement_repositions_shifted_items() {
    let mut h = Harness::new(ListConfig::estimated(100, 10).with_overscan(0), 30);
    h.host.scroll(500);
    h.pump();
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(50, 52)));

    assert_eq!(h.engine.record_measurement(50, 20).unwrap(), 10);
    assert_eq!(h.host.extent(), Some(1010));
    assert_eq!(h.engine.state(), EngineState::RecomputePending);
    h.pump();

    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(50, 51)));
    let log = h.log.borrow();
    assert_eq!(log.destroyed, vec![52]);
    assert_eq!(
        log.repositioned,
        vec![
            (
                50,
                ItemGeometry {
                    offset: 500,
                    size: 20
                }
            ),
            (
                51,
                ItemGeometry {
                    offset: 520,
                    size: 10
                }
            ),
        ]
    );
}

#[test]
fn fixed_lists_ignore_manual_measurements() {
    let mut h = Harness::new(ListConfig::fixed(100, 10), 30);
    h.pump();
    assert_eq!(h.engine.record_measurement(3, 99).unwrap(), 0);
    assert_eq!(h.engine.state(), EngineState::Idle);
    assert_eq!(h.engine.total_extent(), 1000);
}

#[test]
fn measurement_errors_are_returned() {
    let mut h = Harness::new(ListConfig::estimated(100, 10), 30);
    assert!(matches!(
        h.engine.record_measurement(100, 5),
        Err(EngineError::Measure(MeasureError::IndexOutOfBounds {
            index: 100,
            count: 100
        }))
    ));
    assert!(matches!(
        h.engine.record_measurement(1, 0),
        Err(EngineError::Measure(MeasureError::ZeroSize { index: 1 }))
    ));
}

#[test]
fn render_failure_propagates_and_schedules_a_retry() {
    let renderer = FakeRenderer::default();
    renderer.fail_at.set(Some(3));
    let fail_at = Rc::clone(&renderer.fail_at);
    let mut h = Harness::with_renderer(ListConfig::fixed(100, 10).with_overscan(0), 50, renderer);

    h.scheduler.take_due();
    let err = h.engine.on_frame().unwrap_err();
    assert!(matches!(err, EngineError::Render { index: 3, .. }));
    assert_eq!(h.engine.rendered().indices().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(h.log.borrow().live.len(), 3);
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(0, 4)));
    assert_eq!(h.engine.state(), EngineState::RecomputePending);
    assert!(h.scheduler.is_due());

    fail_at.set(None);
    h.pump();
    assert_eq!(h.log.borrow().rendered, vec![0, 1, 2, 3, 4]);
    h.assert_consistent();
}

#[test]
fn render_failure_after_drift_still_repositions_shifted_items() {
    let renderer = FakeRenderer::measuring(|i| if i == 49 { 40 } else { 10 });
    renderer.fail_at.set(Some(53));
    let fail_at = Rc::clone(&renderer.fail_at);
    let config = ListConfig::estimated(100, 10).with_overscan(0);
    let mut h = Harness::with_renderer(config, 30, renderer);
    h.host.scroll(500);
    h.pump();
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(50, 52)));

    // Item 49 grows by 30 and pushes 50..=52 down, then item 53 fails to render.
    h.host.scroll(495);
    h.host.resize(60);
    h.scheduler.take_due();
    let err = h.engine.on_frame().unwrap_err();
    assert!(matches!(err, EngineError::Render { index: 53, .. }));

    assert_eq!(
        h.engine.rendered().indices().collect::<Vec<_>>(),
        vec![49, 50, 51, 52]
    );
    for (index, item) in h.engine.rendered().iter() {
        assert_eq!(Some(item.geometry), h.engine.geometry(index));
    }
    assert_eq!(h.engine.geometry(50).map(|g| g.offset), Some(530));
    assert!(h.log.borrow().repositioned.iter().any(|&(i, _)| i == 50));
    let range = h.engine.visible_range().unwrap();
    assert!(h.engine.rendered().indices().all(|i| range.contains(i)));
    assert_eq!(h.engine.state(), EngineState::RecomputePending);

    fail_at.set(None);
    h.pump();
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(49, 52)));
    h.assert_consistent();
}

#[test]
fn set_item_count_shrinks_rendered_set() {
    let mut h = Harness::new(ListConfig::fixed(100, 10).with_overscan(2), 50);
    h.host.scroll(950);
    h.pump();
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(93, 99)));

    h.engine.set_item_count(50).unwrap();
    assert_eq!(h.engine.raw_range(), Some(VisibleRange::new(45, 49)));
    assert_eq!(h.engine.visible_range(), Some(VisibleRange::new(43, 49)));
    assert_eq!(h.host.extent(), Some(500));
    let mut destroyed = h.log.borrow().destroyed.clone();
    destroyed.sort_unstable();
    assert_eq!(destroyed, (93..=99).collect::<Vec<_>>());
    h.assert_consistent();

    h.engine.set_item_count(0).unwrap();
    assert_eq!(h.engine.visible_range(), None);
    assert!(h.log.borrow().live.is_empty());
}

#[test]
fn destroy_releases_every_handle_and_subscription() {
    let mut h = Harness::new(ListConfig::fixed(100, 10).with_overscan(1), 50);
    h.pump();
    let rendered = h.engine.rendered_len();
    let stale = h.host.0.borrow().scroll_signals.clone().unwrap();

    h.host.scroll(200);
    assert_eq!(h.scheduler.pending_len(), 1);

    let Harness {
        engine,
        host,
        log,
        scheduler,
    } = h;
    engine.destroy();

    assert_eq!(scheduler.pending_len(), 0);
    assert_eq!(scheduler.cancelled_count(), 1);
    assert_eq!(host.0.borrow().unsubscribed, 2);
    assert!(host.0.borrow().scroll_signals.is_none());
    assert_eq!(log.borrow().destroyed.len(), rendered);
    assert!(log.borrow().live.is_empty());
    assert!(!stale.is_connected());
    assert!(!stale.notify());
    assert_eq!(scheduler.pending_len(), 0);
}

#[test]
fn invalid_config_is_rejected_before_subscribing() {
    let host = FakeHost::new(100);
    let scheduler = Rc::new(ManualScheduler::new());
    let result = Engine::new(
        ListConfig::fixed(10, 0),
        host.clone(),
        FakeRenderer::default(),
        scheduler.clone(),
    );
    assert!(matches!(
        result,
        Err(EngineError::Config(ConfigError::ZeroItemSize))
    ));
    assert!(host.0.borrow().scroll_signals.is_none());
    assert_eq!(scheduler.requested_count(), 0);
}

#[test]
fn synchronous_recompute_supersedes_pending_frame() {
    let mut h = Harness::new(ListConfig::fixed(100, 10), 50);
    h.pump();
    h.host.scroll(300);
    assert_eq!(h.engine.state(), EngineState::RecomputePending);

    h.engine.refresh().unwrap();
    assert_eq!(h.engine.state(), EngineState::Idle);
    assert_eq!(h.scheduler.cancelled_count(), 1);
    assert_eq!(h.engine.raw_range(), Some(VisibleRange::new(30, 34)));
    assert!(!h.engine.on_frame().unwrap());
}

#[test]
fn subscriptions_cancel_once() {
    let calls = Rc::new(Cell::new(0));
    let sub = Subscription::new({
        let calls = Rc::clone(&calls);
        move || calls.set(calls.get() + 1)
    });
    sub.unsubscribe();
    assert_eq!(calls.get(), 1);
    drop(Subscription::detached());
}

#[test]
fn manual_scheduler_tracks_requests_and_cancellations() {
    let scheduler = ManualScheduler::new();
    let a = scheduler.request_frame();
    let b = scheduler.request_frame();
    assert_ne!(a, b);
    scheduler.cancel_frame(a);
    scheduler.cancel_frame(a);
    assert_eq!(scheduler.cancelled_count(), 1);
    assert_eq!(scheduler.take_due(), vec![b]);
    assert!(!scheduler.is_due());
    assert_eq!(scheduler.requested_count(), 2);
}
