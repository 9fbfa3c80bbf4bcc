//! Host double: a [`FakeClock`] plus manually fired intervals and a queue of
//! spawned tasks.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use async_trait::async_trait;
use futures::executor::block_on;
use futures::future::LocalBoxFuture;
use slidefx_core::SlideResult;
use slidefx_render::testing::FakeClock;
use slidefx_render::FrameClock;

use crate::host::Host;

type Tick = Rc<RefCell<Box<dyn FnMut()>>>;

pub struct FakeHost {
    clock: FakeClock,
    next_interval: Cell<u32>,
    intervals: RefCell<BTreeMap<u32, (u32, Tick)>>,
    spawned: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            clock: FakeClock::new(16.0),
            next_interval: Cell::new(1),
            intervals: RefCell::new(BTreeMap::new()),
            spawned: RefCell::new(Vec::new()),
        }
    }

    pub fn clock(&self) -> &FakeClock {
        &self.clock
    }

    pub fn active_intervals(&self) -> usize {
        self.intervals.borrow().len()
    }

    pub fn interval_periods(&self) -> Vec<u32> {
        self.intervals.borrow().values().map(|(period, _)| *period).collect()
    }

    /// Fire every registered interval once.
    pub fn fire_intervals(&self) {
        let ticks: Vec<Tick> = self
            .intervals
            .borrow()
            .values()
            .map(|(_, tick)| Rc::clone(tick))
            .collect();
        for tick in ticks {
            (tick.borrow_mut())();
        }
    }

    /// Drive every queued task to completion; returns how many ran.
    pub fn run_spawned(&self) -> usize {
        let mut ran = 0;
        loop {
            let tasks: Vec<_> = self.spawned.borrow_mut().drain(..).collect();
            if tasks.is_empty() {
                return ran;
            }
            for task in tasks {
                block_on(task);
                ran += 1;
            }
        }
    }
}

#[async_trait(?Send)]
impl FrameClock for FakeHost {
    fn now(&self) -> f64 {
        self.clock.now()
    }

    async fn next_frame(&self) -> SlideResult<f64> {
        self.clock.next_frame().await
    }

    async fn sleep(&self, ms: u32) {
        self.clock.sleep(ms).await
    }
}

impl Host for FakeHost {
    type Interval = u32;

    fn set_interval(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> SlideResult<u32> {
        let id = self.next_interval.get();
        self.next_interval.set(id + 1);
        self.intervals
            .borrow_mut()
            .insert(id, (period_ms, Rc::new(RefCell::new(tick))));
        Ok(id)
    }

    fn clear_interval(&self, interval: u32) {
        self.intervals.borrow_mut().remove(&interval);
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.spawned.borrow_mut().push(task);
    }
}
