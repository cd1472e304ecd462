//! Background computation of line metrics.
//!
//! Line heights start out as estimates. The scheduler replaces them with
//! laid-out heights a slice at a time, walking the stale line set front to
//! back, so a host can keep its UI responsive on documents of any size. Each
//! slice is bounded by a layout budget; a logical line too long for one
//! slice is left with a partial display-line array and resumed by the next.
//!
//! The host owns the clock. It drives a [`MetricTask`] from whatever idle or
//! timer primitive it has and calls [`MetricTask::step`] until it reports
//! [`TaskStatus::Finished`].

use crate::config::DisplayConfig;
use crate::display::{layout_line, record_metrics, DisplayState};
use crate::host::HostEvent;
use crate::layout::engine::LineStart;
use crate::metrics::cache::MetricWrite;
use crate::model::font::FontMetrics;
use crate::model::index::TextIndex;
use crate::model::store::TextStore;
use tracing::{debug, info, trace};

/// Budgets below this also cap the number of logical lines per slice, at
/// one line per eight layouts.
pub const SMALL_BUDGET: usize = 64;

/// State of the background metric computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchedulerState {
    /// Every line's metrics are current, or nobody asked for an update yet.
    #[default]
    Idle,
    /// Stale lines exist and the host was asked to run a slice.
    AsyncUpdatePending,
    /// A slice is running.
    Running,
    /// Waiting for the pending redisplay before running again.
    Deferred,
}

/// Outcome of one [`MetricTask::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Work remains; call `step` again later.
    Yield,
    /// A redisplay is pending. Run it, then call `step` again.
    Deferred,
    /// All metrics are current.
    Finished,
}

/// What one metric slice did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceReport {
    /// Display lines laid out.
    pub layouts: usize,
    /// Logical lines whose metrics were finalized.
    pub lines_finalized: usize,
    /// Stale lines left afterwards.
    pub remaining: usize,
}

impl DisplayState {
    /// Asks the host for a metric slice unless one is already on its way.
    pub(crate) fn schedule_metric_update(&mut self) {
        if !self.stale.is_empty() && self.scheduler == SchedulerState::Idle {
            self.scheduler = SchedulerState::AsyncUpdatePending;
            trace!(target: "textdisp::scheduler", stale = self.stale.count(), "metric update scheduled");
            self.push_event(HostEvent::ScheduleMetricUpdate);
        }
    }

    /// Runs one metric slice of at most `budget` display-line layouts,
    /// starting at the first stale line.
    ///
    /// When the last stale line is finalized the scheduler goes idle and the
    /// host is told the new document height and scroll fractions.
    pub fn update_line_metrics(
        &mut self,
        store: &mut dyn TextStore,
        fonts: &dyn FontMetrics,
        budget: usize,
    ) -> SliceReport {
        let budget = budget.max(1);
        let line_limit = if budget < SMALL_BUDGET {
            (budget / 8).max(1)
        } else {
            usize::MAX
        };
        let was_stale = !self.stale.is_empty();
        let line_count = store.line_count();
        self.stale.truncate_at_end(line_count.saturating_sub(1));
        if line_count == 0 {
            self.stale.clear();
        }

        let mut report = SliceReport::default();
        let mut lines = 0;
        debug!(target: "textdisp::scheduler", budget, stale = self.stale.count(), "metric slice start");
        while report.layouts < budget && lines < line_limit {
            let Some(line) = self.stale.first().map(|r| r.low) else {
                break;
            };
            let (layouts, finalized) = self.compute_line(store, fonts, line, budget - report.layouts);
            report.layouts += layouts;
            report.lines_finalized += usize::from(finalized);
            lines += 1;
        }
        self.stats.slices += 1;
        report.remaining = self.stale.count();
        debug!(
            target: "textdisp::scheduler",
            layouts = report.layouts,
            finalized = report.lines_finalized,
            remaining = report.remaining,
            "metric slice end"
        );

        if self.stale.is_empty() && (was_stale || self.scheduler != SchedulerState::Idle) {
            self.scheduler = SchedulerState::Idle;
            let total_pixels = store.total_pixels();
            info!(target: "textdisp::scheduler", total_pixels, "line metrics complete");
            self.push_event(HostEvent::MetricsComplete { total_pixels });
            self.report_yview(store, fonts);
        }
        report
    }

    /// Lays out logical line `line` with at most `allowance` display-line
    /// layouts, resuming a partial computation of the current epoch.
    /// Returns the layouts done and whether the line was finalized.
    fn compute_line(
        &mut self,
        store: &mut dyn TextStore,
        fonts: &dyn FontMetrics,
        line: usize,
        allowance: usize,
    ) -> (usize, bool) {
        let epoch = self.epoch;
        let mut start = match store.pixel_info(line) {
            None => {
                self.stale.remove(line, line);
                return (0, false);
            }
            Some(info) if epoch.is_complete(info.epoch) => {
                self.stale.remove(line, line);
                return (0, false);
            }
            Some(info) if epoch.is_partial(info.epoch) => match info.disp.as_deref() {
                Some(disp) if !disp.entries.is_empty() => LineStart {
                    index: TextIndex::new(line, disp.next_offset),
                    display_line_no: disp.entries.len(),
                    carry: disp.entries.last().and_then(|e| e.hyphen_rule),
                },
                _ => LineStart::logical(line),
            },
            Some(_) => LineStart::logical(line),
        };

        let mut id = self.view.take_metric_temp();
        let mut used = 0;
        let mut restarted = false;
        let mut finalized = false;
        while used < allowance {
            let dline = self.view.arena.get_mut(id);
            layout_line(&self.config, epoch, &mut self.stats, &*store, fonts, start, dline);
            used += 1;
            let dline = self.view.arena.get(id);
            match record_metrics(store, &mut self.stale, epoch, &mut self.stats, dline) {
                MetricWrite::Finalized { .. } => finalized = true,
                MetricWrite::Partial => {}
                MetricWrite::Ignored if !restarted => {
                    debug!(target: "textdisp::scheduler", line, "partial metrics out of date, restarting line");
                    restarted = true;
                    if let Some(info) = store.pixel_info_mut(line) {
                        info.invalidate();
                    }
                    start = LineStart::logical(line);
                    continue;
                }
                MetricWrite::Ignored => {
                    self.stale.remove(line, line);
                    break;
                }
            }

            let dline = self.view.arena.get(id);
            let next = LineStart::after(dline);
            if self.view.wants(dline) {
                self.view.saved.push(id);
                id = self.view.arena.alloc();
            }
            if finalized {
                break;
            }
            start = next;
        }
        self.view.return_metric_temp(id);
        self.stats.metric_layouts += used;
        (used, finalized)
    }

    /// Brings the metrics of every stale line in `from..=to` up to date
    /// before returning. Returns the number of layouts done.
    pub fn update_line_metrics_sync(
        &mut self,
        store: &mut dyn TextStore,
        fonts: &dyn FontMetrics,
        from: usize,
        to: usize,
    ) -> usize {
        let line_count = store.line_count();
        let mut layouts = 0;
        while let Some(line) = self.stale.find_nearest(from).map(|r| r.low.max(from)) {
            if line > to || line >= line_count {
                break;
            }
            layouts += self.compute_line(store, fonts, line, usize::MAX).0;
        }
        trace!(target: "textdisp::scheduler", from, to, layouts, "synchronous metric update");
        if self.stale.is_empty() && self.scheduler != SchedulerState::Idle {
            self.update_line_metrics(store, fonts, 1);
        }
        layouts
    }

    /// Invalidates every line's metrics, as after a change to the view
    /// width or to a style used everywhere.
    pub fn invalidate_all(&mut self, store: &mut dyn TextStore) {
        self.epoch.bump();
        self.stale.clear();
        let line_count = store.line_count();
        if line_count > 0 {
            self.stale.add(0, line_count - 1);
        }
        self.view.invalidate_all();
        debug!(target: "textdisp::scheduler", epoch = self.epoch.get(), line_count, "all line metrics invalidated");
        self.schedule_metric_update();
    }

    /// Invalidates the metrics of lines `first..=last`, whose content or
    /// styling changed.
    pub fn invalidate_lines(&mut self, store: &mut dyn TextStore, first: usize, last: usize) {
        let last = last.min(store.line_count().saturating_sub(1));
        if first > last {
            return;
        }
        for line in first..=last {
            if let Some(info) = store.pixel_info_mut(line) {
                info.invalidate();
            }
        }
        self.stale.add(first, last);
        self.view.lines_changed(first, last);
        self.schedule_metric_update();
    }

    /// Accounts for `count` lines inserted after line `first`, which was
    /// itself modified.
    pub fn lines_inserted(&mut self, store: &mut dyn TextStore, first: usize, count: usize) {
        if count > 0 {
            self.stale.insert(first + 1, first + count);
            self.view.lines_inserted(first, count);
        }
        self.invalidate_lines(store, first, first + count);
    }

    /// Accounts for the `count` lines following `first` having been joined
    /// into it.
    pub fn lines_deleted(&mut self, store: &mut dyn TextStore, first: usize, count: usize) {
        if count > 0 {
            self.stale.delete(first + 1, first + count);
            self.view.lines_deleted(first, count);
        }
        self.invalidate_lines(store, first, first);
    }

    /// Accounts for text in `first..=last` being elided or revealed.
    pub fn elision_changed(&mut self, store: &mut dyn TextStore, first: usize, last: usize) {
        trace!(target: "textdisp::scheduler", first, last, "elision changed");
        self.invalidate_lines(store, first, last);
    }

    /// Replaces the view geometry. A width change invalidates every line;
    /// other changes only rebuild the visible list.
    pub fn set_config(&mut self, store: &mut dyn TextStore, config: DisplayConfig) {
        let relayout = config.width != self.config.width
            || config.insert_width != self.config.insert_width
            || config.show_cursor != self.config.show_cursor;
        self.config = config;
        if relayout {
            self.invalidate_all(store);
        } else {
            self.view.invalidate_all();
        }
    }
}

/// Resumable metric computation driven by the host.
#[derive(Debug, Clone)]
pub struct MetricTask {
    budget: usize,
    slices: usize,
}

impl MetricTask {
    /// Task running slices of `budget` layouts.
    pub fn new(budget: usize) -> Self {
        Self {
            budget: budget.max(1),
            slices: 0,
        }
    }

    /// Slices run so far.
    pub fn slices(&self) -> usize {
        self.slices
    }

    /// Runs one slice unless a redisplay must happen first.
    pub fn step(
        &mut self,
        state: &mut DisplayState,
        store: &mut dyn TextStore,
        fonts: &dyn FontMetrics,
    ) -> TaskStatus {
        if state.stale.is_empty() && state.scheduler == SchedulerState::Idle {
            return TaskStatus::Finished;
        }
        if state.view.layout_pending {
            state.scheduler = SchedulerState::Deferred;
            state.request_redraw();
            trace!(target: "textdisp::scheduler", "metric slice deferred until redisplay");
            return TaskStatus::Deferred;
        }
        state.scheduler = SchedulerState::Running;
        self.slices += 1;
        state.update_line_metrics(store, fonts, self.budget);
        if state.stale.is_empty() {
            TaskStatus::Finished
        } else {
            state.scheduler = SchedulerState::AsyncUpdatePending;
            TaskStatus::Yield
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RecordingHost;
    use crate::model::buffer::TextBuffer;
    use crate::model::font::CellMetrics;
    use crate::model::style::Style;

    fn numbered(lines: usize) -> String {
        (0..lines).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
    }

    fn setup(text: &str, width: i32) -> (TextBuffer, CellMetrics, DisplayState) {
        let buffer = TextBuffer::from_text(text, Style::default().shared(), 20);
        let fonts = CellMetrics::new(10, 20);
        let state = DisplayState::new(DisplayConfig::new(width, 100), buffer.line_count());
        (buffer, fonts, state)
    }

    fn drain(state: &mut DisplayState, buffer: &mut TextBuffer, fonts: &CellMetrics, budget: usize) -> usize {
        let mut task = MetricTask::new(budget);
        loop {
            match task.step(state, buffer, fonts) {
                TaskStatus::Finished => return task.slices(),
                TaskStatus::Deferred => state.update_display_info(buffer, fonts),
                TaskStatus::Yield => {}
            }
            assert!(task.slices() < 10_000, "scheduler does not converge");
        }
    }

    #[test]
    fn slice_respects_budget() {
        let (mut buffer, fonts, mut state) = setup(&numbered(500), 200);
        let report = state.update_line_metrics(&mut buffer, &fonts, 100);
        assert_eq!(report.layouts, 100);
        assert_eq!(report.lines_finalized, 100);
        assert_eq!(report.remaining, 400);
        assert_eq!(state.stale().first().map(|r| r.low), Some(100));
    }

    #[test]
    fn small_budget_caps_logical_lines() {
        let (mut buffer, fonts, mut state) = setup(&numbered(50), 200);
        let report = state.update_line_metrics(&mut buffer, &fonts, 16);
        assert_eq!(report.lines_finalized, 2);
        let report = state.update_line_metrics(&mut buffer, &fonts, 3);
        assert_eq!(report.lines_finalized, 1);
    }

    #[test]
    fn long_line_resumes_across_slices() {
        let text = "aaaa ".repeat(40);
        let (mut buffer, fonts, mut state) = setup(&text, 60);
        let report = state.update_line_metrics(&mut buffer, &fonts, 8);
        assert_eq!(report.layouts, 8);
        assert_eq!(report.lines_finalized, 0);
        let info = buffer.pixel_info(0).expect("line 0");
        assert!(state.epoch().is_partial(info.epoch));
        assert_eq!(info.disp.as_ref().map(|d| d.entries.len()), Some(8));

        let mut slices = 1;
        while !state.metrics_complete() {
            state.update_line_metrics(&mut buffer, &fonts, 8);
            slices += 1;
        }
        assert_eq!(slices, 5);
        assert_eq!(buffer.total_pixels(), 40 * 20);
        assert_eq!(state.stats().metric_layouts, 40);
    }

    #[test]
    fn epoch_bump_restarts_partial_line() {
        let text = "aaaa ".repeat(40);
        let (mut buffer, fonts, mut state) = setup(&text, 60);
        state.update_line_metrics(&mut buffer, &fonts, 8);
        state.invalidate_all(&mut buffer);
        state.update_line_metrics(&mut buffer, &fonts, 8);
        let info = buffer.pixel_info(0).expect("line 0");
        assert_eq!(info.disp.as_ref().map(|d| d.entries.len()), Some(8));
        assert_eq!(info.disp.as_ref().map(|d| d.entries[0].byte_offset), Some(0));
    }

    #[test]
    fn completion_notifies_host_once() {
        let (mut buffer, fonts, mut state) = setup(&numbered(30), 200);
        let slices = drain(&mut state, &mut buffer, &fonts, 10);
        assert!(slices >= 3);
        assert_eq!(state.scheduler_state(), SchedulerState::Idle);

        let mut host = RecordingHost::default();
        state.deliver(&mut host);
        assert_eq!(host.completions(), 1);
        assert!(host.events.contains(&HostEvent::MetricsComplete { total_pixels: 600 }));

        state.update_line_metrics(&mut buffer, &fonts, 10);
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn step_defers_to_pending_redisplay() {
        let (mut buffer, fonts, mut state) = setup(&numbered(30), 200);
        let mut task = MetricTask::new(10);
        assert_eq!(task.step(&mut state, &mut buffer, &fonts), TaskStatus::Deferred);
        assert_eq!(state.scheduler_state(), SchedulerState::Deferred);
        state.update_display_info(&mut buffer, &fonts);
        assert_eq!(task.step(&mut state, &mut buffer, &fonts), TaskStatus::Yield);
        assert_eq!(state.scheduler_state(), SchedulerState::AsyncUpdatePending);
    }

    #[test]
    fn metric_layouts_are_parked_for_pending_redisplay() {
        let (mut buffer, fonts, mut state) = setup(&numbered(30), 200);
        state.update_line_metrics(&mut buffer, &fonts, SMALL_BUDGET);
        assert_eq!(state.viewport().saved(), 30);

        let before = state.stats().layouts;
        state.update_display_info(&mut buffer, &fonts);
        assert_eq!(state.stats().layouts, before, "visible lines come from the saved list");
        assert_eq!(state.viewport().saved(), 0);
    }

    #[test]
    fn sync_update_covers_requested_lines_only() {
        let (mut buffer, fonts, mut state) = setup(&numbered(100), 200);
        state.update_line_metrics_sync(&mut buffer, &fonts, 10, 19);
        assert!(!state.stale().contains_any(10, 19));
        assert!(state.stale().find(9).is_some());
        assert!(state.stale().find(20).is_some());
        assert_eq!(state.stale().count(), 90);
    }

    #[test]
    fn insertion_shifts_and_marks_lines() {
        let (mut buffer, fonts, mut state) = setup(&numbered(10), 200);
        state.update_line_metrics_sync(&mut buffer, &fonts, 0, 9);
        assert!(state.metrics_complete());

        let summary = buffer
            .insert_text(TextIndex::new(3, 2), "x\ny\nz")
            .expect("insert");
        state.lines_inserted(&mut buffer, summary.first_line, summary.lines_added);
        let stale: Vec<_> = state.stale().values().collect();
        assert_eq!(stale, vec![3, 4, 5]);
        assert_eq!(state.scheduler_state(), SchedulerState::AsyncUpdatePending);
    }

    #[test]
    fn deletion_marks_surviving_line() {
        let (mut buffer, fonts, mut state) = setup(&numbered(10), 200);
        state.update_line_metrics_sync(&mut buffer, &fonts, 0, 9);
        state.stale.add(8, 9);

        let summary = buffer
            .delete(TextIndex::new(2, 1), TextIndex::new(5, 1))
            .expect("delete");
        state.lines_deleted(&mut buffer, summary.first_line, summary.lines_removed);
        let stale: Vec<_> = state.stale().values().collect();
        assert_eq!(stale, vec![2, 5, 6]);
    }

    #[test]
    fn width_change_invalidates_everything() {
        let (mut buffer, fonts, mut state) = setup(&numbered(10), 200);
        state.update_line_metrics_sync(&mut buffer, &fonts, 0, 9);
        let epoch = state.epoch();

        state.set_config(&mut buffer, DisplayConfig::new(200, 300));
        assert!(state.metrics_complete());
        assert_eq!(state.epoch(), epoch);

        state.set_config(&mut buffer, DisplayConfig::new(40, 300));
        assert_eq!(state.stale().count(), 10);
        assert_ne!(state.epoch(), epoch);
    }

    #[test]
    fn drained_metrics_match_fresh_computation() {
        let text = "one two three four five six\nseven\n\neight nine ten eleven";
        let (mut buffer, fonts, mut state) = setup(text, 80);
        drain(&mut state, &mut buffer, &fonts, 3);
        let summary = buffer.insert_text(TextIndex::new(1, 5), " and more words").expect("insert");
        state.lines_inserted(&mut buffer, summary.first_line, summary.lines_added);
        drain(&mut state, &mut buffer, &fonts, 3);

        let (mut fresh, _, mut fresh_state) = setup(&buffer.text(), 80);
        fresh_state.update_line_metrics_sync(&mut fresh, &fonts, 0, usize::MAX);
        assert_eq!(buffer.total_pixels(), fresh.total_pixels());
        for line in 0..buffer.line_count() {
            assert_eq!(
                buffer.pixel_info(line).map(|i| i.height),
                fresh.pixel_info(line).map(|i| i.height),
                "line {line}"
            );
        }
    }
}
