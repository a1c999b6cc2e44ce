//! ECG baseline filtration

/// Pole of the DC-blocking filter.
const DC_POLE: f32 = 0.995;
/// Taps of the smoothing stage used with aggressive filtration.
const SMOOTHING_TAPS: usize = 5;

/// Single-pole DC blocker with an optional moving-average stage.
#[derive(Debug, Clone)]
pub struct EcgFilter {
    aggressive: bool,
    previous: Option<(f32, f32)>,
    window: [f32; SMOOTHING_TAPS],
    filled: usize,
    cursor: usize,
}

impl EcgFilter {
    pub fn new(aggressive: bool) -> Self {
        Self { aggressive, previous: None, window: [0.0; SMOOTHING_TAPS], filled: 0, cursor: 0 }
    }

    pub fn is_aggressive(&self) -> bool {
        self.aggressive
    }

    /// Switch mode. Filter state restarts so the two modes never mix.
    pub fn set_aggressive(&mut self, aggressive: bool) {
        *self = Self::new(aggressive);
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.aggressive);
    }

    pub fn apply(&mut self, sample: f32) -> f32 {
        let (prev_in, prev_out) = self.previous.unwrap_or((sample, 0.0));
        let blocked = sample - prev_in + DC_POLE * prev_out;
        self.previous = Some((sample, blocked));

        if !self.aggressive {
            return blocked;
        }

        self.window[self.cursor] = blocked;
        self.cursor = (self.cursor + 1) % SMOOTHING_TAPS;
        self.filled = (self.filled + 1).min(SMOOTHING_TAPS);
        self.window[..self.filled].iter().sum::<f32>() / self.filled as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_input_is_removed() {
        let mut filter = EcgFilter::new(false);
        let outputs: Vec<f32> = (0..50).map(|_| filter.apply(1.5)).collect();
        assert!(outputs.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn step_response_decays() {
        let mut filter = EcgFilter::new(false);
        filter.apply(0.0);
        let first = filter.apply(1.0);
        let later = (0..500).map(|_| filter.apply(1.0)).last().unwrap();
        assert!((first - 1.0).abs() < 1e-6);
        assert!(later < 0.1);
    }

    #[test]
    fn aggressive_mode_smooths_spikes() {
        let mut plain = EcgFilter::new(false);
        let mut smooth = EcgFilter::new(true);
        for _ in 0..10 {
            plain.apply(0.0);
            smooth.apply(0.0);
        }
        let spike_plain = plain.apply(5.0);
        let spike_smooth = smooth.apply(5.0);
        assert!(spike_smooth.abs() < spike_plain.abs());
    }

    #[test]
    fn toggling_resets_state() {
        let mut filter = EcgFilter::new(false);
        filter.apply(3.0);
        filter.apply(7.0);
        filter.set_aggressive(true);
        assert!(filter.is_aggressive());
        assert_eq!(filter.apply(2.0), 0.0);
    }
}
