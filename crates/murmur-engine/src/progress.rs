use std::collections::VecDeque;

/// Smooths raw model-preparation progress reports into a monotonically
/// non-decreasing percentage. Raw values are averaged over a short history
/// window and the output never moves backwards.
pub struct ProgressTracker {
    history: VecDeque<f32>,
    window: usize,
    last: f32,
}

impl ProgressTracker {
    pub fn new(window: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(window.max(1)),
            window: window.max(1),
            last: 0.0,
        }
    }

    pub fn update(&mut self, raw: f32) -> f32 {
        self.history.push_back(raw.clamp(0.0, 100.0));
        if self.history.len() > self.window {
            self.history.pop_front();
        }
        let mean = self.history.iter().sum::<f32>() / self.history.len() as f32;
        self.last = mean.max(self.last);
        self.last
    }

    pub fn current(&self) -> f32 {
        self.last
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(4)
    }
}
