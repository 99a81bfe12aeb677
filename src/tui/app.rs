use chrono::{DateTime, Utc};

use crate::leaderboard::ViewState;
use crate::models::{Metric, RankingView};

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    /// Nothing shown yet
    Loading,
    Ready,
    /// Loaded fine, but there are no explorers
    Empty,
    Error(String),
}

pub struct App {
    pub metric: Metric,
    pub view: Option<RankingView>,
    pub status: Status,
    pub refreshing: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub selected: usize,
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self {
            metric: Metric::TotalScore,
            view: None,
            status: Status::Loading,
            refreshing: false,
            last_updated: None,
            selected: 0,
            should_quit: false,
        }
    }
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, state: ViewState) {
        match state {
            ViewState::Idle => {
                self.refreshing = false;
            }
            ViewState::Loading => {
                self.refreshing = true;
            }
            ViewState::Ranked(view) => {
                self.metric = view.metric;
                self.view = Some(view);
                self.status = Status::Ready;
                self.refreshing = false;
                self.clamp_selection();
            }
            ViewState::Empty => {
                self.view = None;
                self.status = Status::Empty;
                self.refreshing = false;
                self.selected = 0;
            }
            ViewState::Error { message, retained } => {
                // keep whatever was on screen rather than blanking it
                if retained.is_some() {
                    self.view = retained;
                }
                self.status = Status::Error(message);
                self.refreshing = false;
                self.clamp_selection();
            }
        }
    }

    /// Metric the user wants next; the controller confirms it with a new view
    pub fn select_next_metric(&mut self) -> Metric {
        self.metric = self.metric.next();
        self.metric
    }

    pub fn select_previous_metric(&mut self) -> Metric {
        self.metric = self.metric.previous();
        self.metric
    }

    pub fn select_metric_at(&mut self, index: usize) -> Option<Metric> {
        let metric = Metric::all().get(index).copied()?;
        self.metric = metric;
        Some(metric)
    }

    pub fn move_selection_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if self.selected + 1 < self.row_count() {
            self.selected += 1;
        }
    }

    pub fn row_count(&self) -> usize {
        self.view.as_ref().map(|v| v.ordered_records.len()).unwrap_or(0)
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.row_count().saturating_sub(1));
    }
}
