use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Performance profiler with zero-cost when disabled
pub struct Profiler {
  enabled: bool,
  stats: Arc<ProfileStats>,
}

#[derive(Default)]
pub struct ProfileStats {
  // Module resolution
  pub resolution_calls: AtomicUsize,
  pub resolution_time_ns: AtomicU64,

  // Import collection
  pub collector_invocations: AtomicUsize,
  pub collector_cache_hits: AtomicUsize,
  pub collector_time_ns: AtomicU64,

  // Content pipeline
  pub pipeline_steps: AtomicUsize,
  pub pipeline_time_ns: AtomicU64,

  // Freshness oracle
  pub freshness_checks: AtomicUsize,
  pub freshness_stale_hits: AtomicUsize,
  pub freshness_time_ns: AtomicU64,
}

impl Profiler {
  /// Create a new profiler
  pub fn new(enabled: bool) -> Self {
    Self {
      enabled,
      stats: Arc::new(ProfileStats::default()),
    }
  }

  /// Check if profiling is enabled (inline for zero-cost check)
  #[inline(always)]
  pub fn is_enabled(&self) -> bool {
    self.enabled
  }

  /// Record a module resolution call
  #[inline]
  pub fn record_resolution(&self, duration_ns: u64) {
    if !self.enabled {
      return;
    }
    self.stats.resolution_calls.fetch_add(1, Ordering::Relaxed);
    self
      .stats
      .resolution_time_ns
      .fetch_add(duration_ns, Ordering::Relaxed);
  }

  /// Record a collector invocation, noting whether it hit the content cache
  #[inline]
  pub fn record_collector(&self, cache_hit: bool, duration_ns: u64) {
    if !self.enabled {
      return;
    }
    self
      .stats
      .collector_invocations
      .fetch_add(1, Ordering::Relaxed);
    if cache_hit {
      self
        .stats
        .collector_cache_hits
        .fetch_add(1, Ordering::Relaxed);
    }
    self
      .stats
      .collector_time_ns
      .fetch_add(duration_ns, Ordering::Relaxed);
  }

  /// Record a single pipeline processor step (one transpile or peek call)
  #[inline]
  pub fn record_pipeline_step(&self, duration_ns: u64) {
    if !self.enabled {
      return;
    }
    self.stats.pipeline_steps.fetch_add(1, Ordering::Relaxed);
    self
      .stats
      .pipeline_time_ns
      .fetch_add(duration_ns, Ordering::Relaxed);
  }

  /// Record a freshness oracle check, noting whether it reported stale
  #[inline]
  pub fn record_freshness_check(&self, stale: bool, duration_ns: u64) {
    if !self.enabled {
      return;
    }
    self.stats.freshness_checks.fetch_add(1, Ordering::Relaxed);
    if stale {
      self
        .stats
        .freshness_stale_hits
        .fetch_add(1, Ordering::Relaxed);
    }
    self
      .stats
      .freshness_time_ns
      .fetch_add(duration_ns, Ordering::Relaxed);
  }

  /// Get the statistics
  pub fn stats(&self) -> &ProfileStats {
    &self.stats
  }

  /// Print profiling report
  pub fn print_report(&self) {
    if !self.enabled {
      return;
    }

    let stats = self.stats();

    eprintln!("\n╔═══════════════════════════════════════════════════════════╗");
    eprintln!("║              BUNDLER PROFILING REPORT                     ║");
    eprintln!("╠═══════════════════════════════════════════════════════════╣");

    let resolution_calls = stats.resolution_calls.load(Ordering::Relaxed);
    let resolution_time_ms = stats.resolution_time_ns.load(Ordering::Relaxed) / 1_000_000;

    eprintln!("║ Module Resolution:                                        ║");
    eprintln!(
      "║   Total calls:        {:>10}                         ║",
      format_number(resolution_calls)
    );
    eprintln!(
      "║   Time spent:         {:>10} ms                      ║",
      format_number(resolution_time_ms as usize)
    );
    eprintln!("╠═══════════════════════════════════════════════════════════╣");

    let collector_invocations = stats.collector_invocations.load(Ordering::Relaxed);
    let collector_cache_hits = stats.collector_cache_hits.load(Ordering::Relaxed);
    let collector_time_ms = stats.collector_time_ns.load(Ordering::Relaxed) / 1_000_000;
    let collector_hit_rate = if collector_invocations > 0 {
      (collector_cache_hits as f64 / collector_invocations as f64) * 100.0
    } else {
      0.0
    };

    eprintln!("║ Import Collectors:                                        ║");
    eprintln!(
      "║   Total invocations:  {:>10}                         ║",
      format_number(collector_invocations)
    );
    eprintln!(
      "║   Cache hits:         {:>10} ({:>5.1}%)                ║",
      format_number(collector_cache_hits),
      collector_hit_rate
    );
    eprintln!(
      "║   Time spent:         {:>10} ms                      ║",
      format_number(collector_time_ms as usize)
    );
    eprintln!("╠═══════════════════════════════════════════════════════════╣");

    let pipeline_steps = stats.pipeline_steps.load(Ordering::Relaxed);
    let pipeline_time_ms = stats.pipeline_time_ns.load(Ordering::Relaxed) / 1_000_000;

    eprintln!("║ Content Pipeline:                                          ║");
    eprintln!(
      "║   Processor steps:    {:>10}                         ║",
      format_number(pipeline_steps)
    );
    eprintln!(
      "║   Time spent:         {:>10} ms                      ║",
      format_number(pipeline_time_ms as usize)
    );
    eprintln!("╠═══════════════════════════════════════════════════════════╣");

    let freshness_checks = stats.freshness_checks.load(Ordering::Relaxed);
    let freshness_stale_hits = stats.freshness_stale_hits.load(Ordering::Relaxed);
    let freshness_time_ms = stats.freshness_time_ns.load(Ordering::Relaxed) / 1_000_000;

    eprintln!("║ Freshness Oracle:                                          ║");
    eprintln!(
      "║   Total checks:       {:>10}                         ║",
      format_number(freshness_checks)
    );
    eprintln!(
      "║   Stale:              {:>10}                         ║",
      format_number(freshness_stale_hits)
    );
    eprintln!(
      "║   Time spent:         {:>10} ms                      ║",
      format_number(freshness_time_ms as usize)
    );
    eprintln!("╚═══════════════════════════════════════════════════════════╝");

    let total_measured_ms =
      resolution_time_ms + collector_time_ms + pipeline_time_ms + freshness_time_ms;

    if total_measured_ms > 0 {
      eprintln!("\n═══════════════════ TIME BREAKDOWN ═══════════════════");
      eprintln!(
        "Resolution: {:>6} ms ({:>5.1}%)",
        resolution_time_ms,
        (resolution_time_ms as f64 / total_measured_ms as f64) * 100.0
      );
      eprintln!(
        "Collectors: {:>6} ms ({:>5.1}%)",
        collector_time_ms,
        (collector_time_ms as f64 / total_measured_ms as f64) * 100.0
      );
      eprintln!(
        "Pipeline:   {:>6} ms ({:>5.1}%)",
        pipeline_time_ms,
        (pipeline_time_ms as f64 / total_measured_ms as f64) * 100.0
      );
      eprintln!(
        "Freshness:  {:>6} ms ({:>5.1}%)",
        freshness_time_ms,
        (freshness_time_ms as f64 / total_measured_ms as f64) * 100.0
      );
      eprintln!("═══════════════════════════════════════════════════════\n");
    }

    if collector_hit_rate < 50.0 && collector_invocations > 100 {
      eprintln!(
        "note: low collector cache hit rate ({:.1}%) - source tree may have many single-use files",
        collector_hit_rate
      );
    }
  }
}

fn format_number(n: usize) -> String {
  let s = n.to_string();
  let mut result = String::new();
  for (i, c) in s.chars().rev().enumerate() {
    if i > 0 && i % 3 == 0 {
      result.push(',');
    }
    result.push(c);
  }
  result.chars().rev().collect()
}

/// Timer guard that records duration when dropped
pub struct TimerGuard<'a, F>
where
  F: FnOnce(u64),
{
  start: Instant,
  callback: Option<F>,
  _phantom: std::marker::PhantomData<&'a ()>,
}

impl<'a, F> TimerGuard<'a, F>
where
  F: FnOnce(u64),
{
  pub fn new(callback: F) -> Self {
    Self {
      start: Instant::now(),
      callback: Some(callback),
      _phantom: std::marker::PhantomData,
    }
  }
}

impl<'a, F> Drop for TimerGuard<'a, F>
where
  F: FnOnce(u64),
{
  fn drop(&mut self) {
    let duration_ns = self.start.elapsed().as_nanos() as u64;
    if let Some(callback) = self.callback.take() {
      callback(duration_ns);
    }
  }
}

/// Macro to time a block of code (zero-cost when profiler is disabled)
#[macro_export]
macro_rules! profile_scope {
  ($profiler:expr, $method:ident) => {
    let _timer = if $profiler.is_enabled() {
      Some($crate::profiler::TimerGuard::new(|duration_ns| {
        $profiler.$method(duration_ns);
      }))
    } else {
      None
    };
  };
}
