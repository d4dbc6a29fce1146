use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::engine::DispatchEngine;
use crate::error::Result;
use crate::models::SimConfig;
use crate::status::{StatusSnapshot, SummaryReport};

/// Owns the engine behind a single lock and paces it from a background
/// thread. Readers may call `status`/`summary` from any thread at any time;
/// the loop is the only writer.
pub struct SimulationService {
    engine: Arc<Mutex<DispatchEngine>>,
    running: Arc<AtomicBool>,
    speed: AtomicU64,
    tick_ms: AtomicU64,
    worker: Mutex<Option<Worker>>,
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl SimulationService {
    pub fn new(config: &SimConfig) -> Result<Self> {
        Ok(Self {
            engine: Arc::new(Mutex::new(DispatchEngine::new(config)?)),
            running: Arc::new(AtomicBool::new(false)),
            speed: AtomicU64::new(config.speed),
            tick_ms: AtomicU64::new(config.tick_ms),
            worker: Mutex::new(None),
        })
    }

    /// Stops any running loop and rebuilds the engine from `config`,
    /// discarding all previous state including queued events.
    pub fn init(&self, config: &SimConfig) -> Result<()> {
        self.stop();
        let engine = DispatchEngine::new(config)?;
        *lock_or_recover(&self.engine) = engine;
        self.speed.store(config.speed, Ordering::Relaxed);
        self.tick_ms.store(config.tick_ms, Ordering::Relaxed);
        Ok(())
    }

    /// No-op when already running. Rewinds the visible clock and spawns the
    /// pacing loop against a fresh wall-clock start instant.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        lock_or_recover(&self.engine).rewind_clock();

        let engine = Arc::clone(&self.engine);
        let running = Arc::clone(&self.running);
        let speed = self.speed.load(Ordering::Relaxed);
        let tick = Duration::from_millis(self.tick_ms.load(Ordering::Relaxed));
        let (stop_tx, stop_rx) = mpsc::channel();
        let started = Instant::now();
        let handle =
            thread::spawn(move || pacing_loop(&engine, &running, &stop_rx, started, speed, tick));
        *lock_or_recover(&self.worker) = Some(Worker { stop_tx, handle });
        log::info!("simulation started ({}x speed, {}ms tick)", speed, tick.as_millis());
    }

    /// No-op when not running. Interrupts the loop's sleep and joins it.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let worker = lock_or_recover(&self.worker).take();
        if let Some(worker) = worker {
            let _ = worker.stop_tx.send(());
            let _ = worker.handle.join();
        }
        log::info!("simulation stopped at time {}", self.current_time());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn current_time(&self) -> u64 {
        lock_or_recover(&self.engine).current_time()
    }

    pub fn status(&self) -> StatusSnapshot {
        lock_or_recover(&self.engine).status()
    }

    pub fn summary(&self) -> SummaryReport {
        lock_or_recover(&self.engine).summary()
    }
}

impl Drop for SimulationService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn pacing_loop(
    engine: &Mutex<DispatchEngine>,
    running: &AtomicBool,
    stop_rx: &Receiver<()>,
    started: Instant,
    speed: u64,
    tick: Duration,
) {
    while running.load(Ordering::SeqCst) {
        let target = target_sim_time(started.elapsed(), speed);
        {
            let mut engine = lock_or_recover(engine);
            if let Err(err) = engine.advance_to(target) {
                log::error!("pacing loop halted: {err}");
                running.store(false, Ordering::SeqCst);
                return;
            }
        }
        // the sleep doubles as the stop signal wait, so stop() is prompt
        match stop_rx.recv_timeout(tick) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

/// Whole elapsed wall-clock seconds scaled by the speed multiplier.
fn target_sim_time(elapsed: Duration, speed: u64) -> u64 {
    elapsed.as_secs() * speed
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
