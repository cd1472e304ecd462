//! The per-widget display state.
//!
//! [`DisplayState`] is the one object every engine operation works on: the
//! view geometry, the metric epoch, the set of stale lines, the metric
//! scheduler, the viewport and the queue of host notifications. The document
//! and the fonts are passed alongside it on each call, so the same state can
//! be driven from the [`crate::widget::TextWidget`] facade or directly.

use crate::config::DisplayConfig;
use crate::host::{HostEvent, ViewHost};
use crate::layout::dline::DLine;
use crate::layout::engine::{layout_dline, LayoutCx, LineStart};
use crate::metrics::cache::{update_line_height_information, MetricWrite};
use crate::metrics::epoch::Epoch;
use crate::metrics::range_list::RangeList;
use crate::model::font::FontMetrics;
use crate::model::store::TextStore;
use crate::scheduler::SchedulerState;
use crate::view_state::Viewport;

/// Running counters, mostly for tests and the benchmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutStats {
    /// Display lines laid out for any reason.
    pub layouts: usize,
    /// Display lines laid out by the metric scheduler.
    pub metric_layouts: usize,
    /// Logical lines whose metrics were finalized.
    pub lines_finalized: usize,
    /// Metric slices run.
    pub slices: usize,
    /// Viewport lines reused without layout.
    pub reused: usize,
    /// Block copies issued while scrolling.
    pub copies: usize,
}

/// View geometry, metric bookkeeping and viewport of one text view.
#[derive(Debug)]
pub struct DisplayState {
    pub(crate) config: DisplayConfig,
    pub(crate) epoch: Epoch,
    pub(crate) stale: RangeList,
    pub(crate) scheduler: SchedulerState,
    pub(crate) view: Viewport,
    pub(crate) stats: LayoutStats,
    pub(crate) events: Vec<HostEvent>,
}

impl DisplayState {
    /// State for a document of `line_count` lines whose metrics are all
    /// stale.
    pub fn new(config: DisplayConfig, line_count: usize) -> Self {
        let mut stale = RangeList::new();
        if line_count > 0 {
            stale.add(0, line_count - 1);
        }
        let mut state = Self {
            config,
            epoch: Epoch::default(),
            stale,
            scheduler: SchedulerState::Idle,
            view: Viewport::new(),
            stats: LayoutStats::default(),
            events: Vec::new(),
        };
        state.schedule_metric_update();
        state
    }

    /// View geometry.
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Current metric epoch.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Lines whose metrics are stale.
    pub fn stale(&self) -> &RangeList {
        &self.stale
    }

    /// Counters.
    pub fn stats(&self) -> &LayoutStats {
        &self.stats
    }

    /// Viewport.
    pub fn viewport(&self) -> &Viewport {
        &self.view
    }

    /// State of the background metric computation.
    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler
    }

    /// Returns true once every line's metrics are current.
    pub fn metrics_complete(&self) -> bool {
        self.stale.is_empty()
    }

    /// Removes and returns the queued host notifications.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    /// Hands the queued notifications to `host` in order.
    pub fn deliver(&mut self, host: &mut dyn ViewHost) {
        for event in self.events.drain(..) {
            host.notify(event);
        }
    }

    pub(crate) fn push_event(&mut self, event: HostEvent) {
        self.events.push(event);
    }

    /// Queues a redraw request unless one is already queued.
    pub fn request_redraw(&mut self) {
        if !self.events.contains(&HostEvent::RedrawRequested) {
            self.push_event(HostEvent::RedrawRequested);
        }
    }
}

/// Lays out the display line at `start` and counts it.
pub(crate) fn layout_line(
    config: &DisplayConfig,
    epoch: Epoch,
    stats: &mut LayoutStats,
    store: &dyn TextStore,
    fonts: &dyn FontMetrics,
    start: LineStart,
    dline: &mut DLine,
) {
    let cx = LayoutCx::new(store, fonts, config, epoch);
    layout_dline(&cx, start, dline);
    stats.layouts += cx.layouts();
}

/// Feeds a laid-out display line to the metric cache and counts
/// finalized lines.
pub(crate) fn record_metrics(
    store: &mut dyn TextStore,
    stale: &mut RangeList,
    epoch: Epoch,
    stats: &mut LayoutStats,
    dline: &DLine,
) -> MetricWrite {
    let write = update_line_height_information(store, stale, epoch, dline);
    if matches!(write, MetricWrite::Finalized { .. }) {
        stats.lines_finalized += 1;
    }
    write
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RecordingHost;

    #[test]
    fn new_state_marks_every_line_stale() {
        let state = DisplayState::new(DisplayConfig::default(), 12);
        assert_eq!(state.stale().count(), 12);
        assert!(!state.metrics_complete());
        assert_eq!(state.scheduler_state(), SchedulerState::AsyncUpdatePending);
    }

    #[test]
    fn deliver_drains_queued_events() {
        let mut state = DisplayState::new(DisplayConfig::default(), 3);
        let mut host = RecordingHost::default();
        state.deliver(&mut host);
        assert_eq!(host.events, vec![HostEvent::ScheduleMetricUpdate]);
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn redraw_requests_are_coalesced() {
        let mut state = DisplayState::new(DisplayConfig::default(), 0);
        state.request_redraw();
        state.request_redraw();
        assert_eq!(state.take_events(), vec![HostEvent::RedrawRequested]);
    }
}
