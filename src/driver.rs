//! Tokio driver for a [`BounceEngine`]
//!
//! The engine's timer queue is virtual; the driver maps it onto tokio time.
//! It sleeps until the next queued callback is due, fires everything that
//! is due, and goes back to sleep. Callers reach the engine through
//! [`BounceDriver::with_engine`], which first catches the engine clock up to
//! the present and then wakes the driver so newly queued callbacks are seen.

use crate::core::engine::BounceEngine;
use crate::layers::surface::RenderSurface;
use crate::prelude::{Arc, Duration};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub struct BounceDriver<S: RenderSurface + Send + 'static> {
    engine: Arc<Mutex<BounceEngine<S>>>,
    wake: Arc<Notify>,
    running: Arc<AtomicBool>,
    origin: Instant,
}

impl<S: RenderSurface + Send + 'static> Clone for BounceDriver<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            wake: Arc::clone(&self.wake),
            running: Arc::clone(&self.running),
            origin: self.origin,
        }
    }
}

impl<S: RenderSurface + Send + 'static> BounceDriver<S> {
    /// Wraps `engine`; its clock is anchored at the current tokio instant
    pub fn new(engine: BounceEngine<S>) -> Self {
        let now = Instant::now();
        let origin = now
            .checked_sub(Duration::from_millis(engine.now()))
            .unwrap_or(now);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            wake: Arc::new(Notify::new()),
            running: Arc::new(AtomicBool::new(true)),
            origin,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn lock(&self) -> MutexGuard<'_, BounceEngine<S>> {
        // A panicking surface must not take every marker down with it
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the engine, brought up to the present first
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut BounceEngine<S>) -> R) -> R {
        let result = {
            let mut engine = self.lock();
            engine.advance_to(self.elapsed_ms());
            f(&mut engine)
        };
        self.wake.notify_one();
        result
    }

    /// Fires every callback that is due now and returns how many fired
    pub fn tick(&self) -> usize {
        self.lock().advance_to(self.elapsed_ms())
    }

    /// Spawns the driver loop onto the current tokio runtime
    pub fn spawn(&self) -> JoinHandle<()> {
        let driver = self.clone();
        tokio::spawn(async move { driver.run().await })
    }

    /// Drives the engine until [`BounceDriver::shutdown`] is called
    pub async fn run(self) {
        log::debug!("bounce driver started");
        while self.running.load(Ordering::Acquire) {
            let deadline = {
                let mut engine = self.lock();
                engine.advance_to(self.elapsed_ms());
                engine.next_deadline()
            };

            match deadline {
                Some(due) => {
                    let at = self.origin + Duration::from_millis(due);
                    tokio::select! {
                        _ = tokio::time::sleep_until(at) => {}
                        _ = self.wake.notified() => {}
                    }
                }
                None => self.wake.notified().await,
            }
        }
        log::debug!("bounce driver stopped");
    }

    /// Asks the driver loop to exit; callbacks still queued stay queued
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
        self.wake.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}
