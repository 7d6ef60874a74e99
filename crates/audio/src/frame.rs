use ringbuf::{HeapRb, Rb};

use crate::dsp;

/// One block of mono samples handed to the estimator on a tick.
#[derive(Clone, Copy, Debug)]
pub struct AudioFrame<'a> {
    samples: &'a [f32],
    sample_rate: u32,
}

impl<'a> AudioFrame<'a> {
    pub fn new(samples: &'a [f32], sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn rms(&self) -> f32 {
        dsp::rms(self.samples)
    }
}

/// Sliding window over the most recent `size` samples of a stream.
///
/// Starts out full of silence, so a snapshot always has exactly `size` samples.
pub struct AnalysisWindow {
    ring: HeapRb<f32>,
    size: usize,
}

impl AnalysisWindow {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let mut ring = HeapRb::new(size);
        for _ in 0..size {
            ring.push_overwrite(0.0);
        }
        Self { ring, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn extend<I: IntoIterator<Item = f32>>(&mut self, samples: I) {
        for sample in samples {
            self.ring.push_overwrite(sample);
        }
    }

    /// Copies the window, oldest sample first, into `out`.
    pub fn copy_into(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.ring.iter().copied());
    }
}
