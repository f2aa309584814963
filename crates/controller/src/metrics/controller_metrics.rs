use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug)]
pub struct ControllerMetrics {
    iterations: AtomicU64,
    iterations_skipped: AtomicU64,
    definitions_created: AtomicU64,
    definitions_updated: AtomicU64,
    definitions_deleted: AtomicU64,
    definition_errors: AtomicU64,
    cache_refreshes: AtomicU64,
    cached_definitions: AtomicU64,
    iteration_latency_sum_us: AtomicU64,
    iteration_latency_count: AtomicU64,
    primed: AtomicBool,
}

impl ControllerMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            iterations: AtomicU64::new(0),
            iterations_skipped: AtomicU64::new(0),
            definitions_created: AtomicU64::new(0),
            definitions_updated: AtomicU64::new(0),
            definitions_deleted: AtomicU64::new(0),
            definition_errors: AtomicU64::new(0),
            cache_refreshes: AtomicU64::new(0),
            cached_definitions: AtomicU64::new(0),
            iteration_latency_sum_us: AtomicU64::new(0),
            iteration_latency_count: AtomicU64::new(0),
            primed: AtomicBool::new(false),
        })
    }

    pub fn inc_iterations(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_iterations_skipped(&self) {
        self.iterations_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_definitions_created(&self) {
        self.definitions_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_definitions_updated(&self) {
        self.definitions_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_definitions_deleted(&self) {
        self.definitions_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_definition_errors(&self) {
        self.definition_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_refreshes(&self) {
        self.cache_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_cached_definitions(&self, count: usize) {
        self.cached_definitions
            .store(count as u64, Ordering::Relaxed);
    }

    pub fn record_iteration_latency(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.iteration_latency_sum_us
            .fetch_add(us, Ordering::Relaxed);
        self.iteration_latency_count
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_primed(&self) {
        self.primed.store(true, Ordering::Release);
    }

    pub fn is_primed(&self) -> bool {
        self.primed.load(Ordering::Acquire)
    }

    pub fn iterations_val(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    pub fn iterations_skipped_val(&self) -> u64 {
        self.iterations_skipped.load(Ordering::Relaxed)
    }

    pub fn definitions_created_val(&self) -> u64 {
        self.definitions_created.load(Ordering::Relaxed)
    }

    pub fn definitions_updated_val(&self) -> u64 {
        self.definitions_updated.load(Ordering::Relaxed)
    }

    pub fn definitions_deleted_val(&self) -> u64 {
        self.definitions_deleted.load(Ordering::Relaxed)
    }

    pub fn definition_errors_val(&self) -> u64 {
        self.definition_errors.load(Ordering::Relaxed)
    }

    pub fn cache_refreshes_val(&self) -> u64 {
        self.cache_refreshes.load(Ordering::Relaxed)
    }

    pub fn cached_definitions_val(&self) -> u64 {
        self.cached_definitions.load(Ordering::Relaxed)
    }

    pub fn iteration_latency_vals(&self) -> (u64, u64) {
        (
            self.iteration_latency_sum_us.load(Ordering::Relaxed),
            self.iteration_latency_count.load(Ordering::Relaxed),
        )
    }
}
