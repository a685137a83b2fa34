use std::sync::Arc;

use parking_lot::Mutex;
use repaint_core::{ComponentId, Rect};
use repaint_ui::RepaintManager;
use web_time::Instant;

pub struct Hud {
    drains: u64,
    last_drain: Option<Instant>,
    rate_smooth: f32,
    pub metrics: Metrics,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Hud {
    pub fn new() -> Self {
        Self {
            drains: 0,
            last_drain: None,
            rate_smooth: 0.0,
            metrics: Metrics::default(),
        }
    }

    pub fn record(&mut self, painted: &[(ComponentId, Rect)]) {
        self.record_at(Instant::now(), painted);
    }

    pub fn record_at(&mut self, now: Instant, painted: &[(ComponentId, Rect)]) {
        self.drains += 1;
        // Drains per second
        if let Some(prev) = self.last_drain.replace(now) {
            let dt = now.saturating_duration_since(prev).as_secs_f32();
            if dt > 0.0 {
                let rate = 1.0 / dt;
                // simple EMA
                let a = 0.2;
                self.rate_smooth = if self.rate_smooth == 0.0 {
                    rate
                } else {
                    (1.0 - a) * self.rate_smooth + a * rate
                };
            }
        }
        self.metrics.roots += painted.len() as u64;
        self.metrics.pixels += painted
            .iter()
            .map(|(_, r)| r.w.max(0) as u64 * r.h.max(0) as u64)
            .sum::<u64>();
        self.metrics.largest = painted
            .iter()
            .map(|(_, r)| *r)
            .fold(self.metrics.largest, |acc, r| {
                if r.w as i64 * r.h as i64 > acc.w as i64 * acc.h as i64 {
                    r
                } else {
                    acc
                }
            });
    }

    pub fn drains(&self) -> u64 {
        self.drains
    }

    pub fn drain_rate(&self) -> f32 {
        self.rate_smooth
    }

    pub fn summary(&self) -> String {
        let m = &self.metrics;
        let lines = [
            format!("drains: {}", self.drains),
            format!("rate: {:.1}/s", self.rate_smooth),
            format!("roots: {}", m.roots),
            format!("pixels: {}", m.pixels),
            format!("largest: {}x{}", m.largest.w, m.largest.h),
        ];
        lines.join("  |  ")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Metrics {
    /// Paint roots painted so far.
    pub roots: u64,
    /// Sum of painted root areas.
    pub pixels: u64,
    pub largest: Rect,
}

/// Watches a repaint manager and keeps a [`Hud`] of what it paints.
#[derive(Clone)]
pub struct Inspector {
    hud: Arc<Mutex<Hud>>,
}

impl Inspector {
    /// Installs itself as `rm`'s paint observer, replacing any other.
    pub fn attach(rm: &RepaintManager) -> Self {
        let hud = Arc::new(Mutex::new(Hud::new()));
        let sink = hud.clone();
        rm.set_paint_observer(move |painted| {
            let mut hud = sink.lock();
            hud.record(painted);
            log::trace!("{}", hud.summary());
        });
        Self { hud }
    }

    pub fn metrics(&self) -> Metrics {
        self.hud.lock().metrics
    }

    pub fn drains(&self) -> u64 {
        self.hud.lock().drains()
    }

    pub fn summary(&self) -> String {
        self.hud.lock().summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repaint_core::{Color, ComponentTree, EventQueue};
    use repaint_ui::{Panel, RepaintConfig};
    use std::time::Duration;

    #[test]
    fn hud_smooths_drain_rate() {
        let mut hud = Hud::new();
        let t0 = Instant::now();
        hud.record_at(t0, &[]);
        assert_eq!(hud.drain_rate(), 0.0);
        hud.record_at(t0 + Duration::from_millis(100), &[]);
        assert!((hud.drain_rate() - 10.0).abs() < 0.01);
        hud.record_at(t0 + Duration::from_millis(150), &[]);
        // 0.8 * 10 + 0.2 * 20
        assert!((hud.drain_rate() - 12.0).abs() < 0.01);
        assert_eq!(hud.drains(), 3);
    }

    #[test]
    fn inspector_counts_painted_roots() {
        let tree = ComponentTree::new().into_shared();
        let w = tree
            .write()
            .insert_window(Rect::new(0, 0, 20, 10), Arc::new(Panel::new(Color::WHITE)));
        let queue = EventQueue::new();
        let rm = RepaintManager::new(tree, queue.clone(), RepaintConfig::default());
        let inspector = Inspector::attach(&rm);

        rm.mark_completely_dirty(w);
        queue.run_pending();
        rm.add_dirty_region(w, 0, 0, 5, 5);
        queue.run_pending();

        assert_eq!(inspector.drains(), 2);
        assert_eq!(
            inspector.metrics(),
            Metrics {
                roots: 2,
                pixels: 200 + 25,
                largest: Rect::new(0, 0, 20, 10),
            }
        );
        assert!(inspector.summary().starts_with("drains: 2  |  "));
    }
}
