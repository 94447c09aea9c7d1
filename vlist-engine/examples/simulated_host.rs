use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use vlist_engine::{
    Align, Engine, HostContainer, ItemGeometry, ListConfig, ManualScheduler, Renderer,
    SignalSender, Subscription,
};

fn main() {
    // Example: a headless host driven by a manual frame loop.
    //
    // A real adapter would:
    // - forward scroll/resize events to the `SignalSender`s it was handed
    // - call `on_frame` from its requestAnimationFrame equivalent
    // - create/move/remove real widgets in the `Renderer`
    let host = Host::default();
    host.0.borrow_mut().viewport = 200;
    let scheduler = Rc::new(ManualScheduler::new());
    let config = ListConfig::estimated(1_000, 40).with_overscan(2);

    let mut engine = match Engine::new(config, host.clone(), Rows, scheduler.clone()) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("invalid list: {err}");
            return;
        }
    };

    let frame = |engine: &mut Engine<Host, Rows>| {
        while scheduler.is_due() {
            scheduler.take_due();
            if let Err(err) = engine.on_frame() {
                eprintln!("frame failed: {err}");
                return;
            }
        }
        println!(
            "offset={} visible={:?} rendered={} extent={}",
            engine.viewport_state().scroll_offset,
            engine.visible_range(),
            engine.rendered_len(),
            engine.total_extent()
        );
    };

    frame(&mut engine);

    host.user_scroll(1_500);
    host.user_scroll(3_000);
    frame(&mut engine);

    engine.scroll_to_index(900, Align::Center);
    frame(&mut engine);

    engine.destroy();
    println!("connected after destroy: {}", host.user_scroll(0));
}

#[derive(Default)]
struct HostState {
    offset: u64,
    viewport: u32,
    scroll: Option<SignalSender>,
}

#[derive(Clone, Default)]
struct Host(Rc<RefCell<HostState>>);

impl Host {
    fn user_scroll(&self, offset: u64) -> bool {
        let sender = {
            let mut state = self.0.borrow_mut();
            state.offset = offset;
            state.scroll.clone()
        };
        sender.is_some_and(|s| s.notify())
    }
}

impl HostContainer for Host {
    fn scroll_offset(&self) -> u64 {
        self.0.borrow().offset
    }

    fn viewport_size(&self) -> u32 {
        self.0.borrow().viewport
    }

    fn scroll_to(&mut self, offset: u64) {
        self.user_scroll(offset);
    }

    fn subscribe_scroll(&mut self, signals: SignalSender) -> Subscription {
        self.0.borrow_mut().scroll = Some(signals);
        let state = Rc::clone(&self.0);
        Subscription::new(move || state.borrow_mut().scroll = None)
    }

    fn subscribe_resize(&mut self, _signals: SignalSender) -> Subscription {
        Subscription::detached()
    }
}

/// Rows alternate between one and two lines of text.
struct Rows;

impl Renderer for Rows {
    type Handle = u32;
    type Error = Infallible;

    fn render(&mut self, index: usize, _geometry: ItemGeometry) -> Result<u32, Infallible> {
        Ok(if index % 2 == 0 { 30 } else { 60 })
    }

    fn destroy(&mut self, _index: usize, _handle: u32) {}

    fn measure(&self, handle: &u32) -> Option<u32> {
        Some(*handle)
    }
}
