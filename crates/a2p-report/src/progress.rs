/// Number of `advance` calls a full dashboard run makes.
pub const DASHBOARD_PROGRESS_STEPS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    Step {
        current: usize,
        total: usize,
        label: String,
    },
    /// The indicator should be cleared.
    Finished,
}

impl ProgressUpdate {
    pub fn fraction(&self) -> f64 {
        match self {
            Self::Step { current, total, .. } => *current as f64 / (*total).max(1) as f64,
            Self::Finished => 1.0,
        }
    }
}

#[derive(Debug, Clone)]
/// Step counter owned by a single run.
///
/// Each `advance` moves one step forward. Reaching the final step clears the
/// indicator instead of displaying it, so the last step's label is never
/// shown.
pub struct ProgressTracker {
    current: usize,
    total: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            current: 0,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn advance(&mut self, label: impl Into<String>) -> ProgressUpdate {
        self.current = self.current.saturating_add(1);
        if self.current >= self.total {
            return ProgressUpdate::Finished;
        }
        ProgressUpdate::Step {
            current: self.current,
            total: self.total,
            label: label.into(),
        }
    }
}
