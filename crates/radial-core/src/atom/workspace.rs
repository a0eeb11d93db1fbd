use super::oscillatory::{SLOW_PHASE_THRESHOLD, SinCosSamples, SinCosScratch};

/// Scratch buffers for the quadrature engine.
#[derive(Debug, Clone)]
pub struct QuadratureScratch {
    pub(crate) integrand: Vec<f64>,
    pub(crate) samples: SinCosSamples,
    pub(crate) difference: SinCosSamples,
    pub(crate) sum_running: Vec<f64>,
    pub(crate) difference_running: Vec<f64>,
    pub(crate) sin_cos: SinCosScratch,
    pub(crate) threshold: f64,
}

/// Per-calculation scratch arena, sized once to the grid and reused by every
/// integral so the hot loops never allocate full-grid buffers.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub(crate) quadrature: QuadratureScratch,
    pub(crate) running: Vec<f64>,
    pub(crate) weight: Vec<f64>,
    pub(crate) inward: Vec<f64>,
    pub(crate) yk: Vec<f64>,
}

impl Workspace {
    pub fn new(points: usize) -> Self {
        Self {
            quadrature: QuadratureScratch {
                integrand: vec![0.0; points],
                samples: SinCosSamples::default(),
                difference: SinCosSamples::default(),
                sum_running: Vec::new(),
                difference_running: Vec::new(),
                sin_cos: SinCosScratch::default(),
                threshold: SLOW_PHASE_THRESHOLD,
            },
            running: vec![0.0; points],
            weight: vec![0.0; points],
            inward: vec![0.0; points],
            yk: vec![0.0; points],
        }
    }

    /// Overrides the slow/fast switch of the oscillatory integrator.
    pub fn set_phase_threshold(&mut self, threshold: f64) {
        self.quadrature.threshold = threshold;
    }

    pub fn phase_threshold(&self) -> f64 {
        self.quadrature.threshold
    }
}
