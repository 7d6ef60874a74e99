/// Root mean square of a block of samples. Empty input is silent.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum();
    (energy / samples.len() as f32).sqrt()
}

/// Drops the loud edges of a frame so the autocorrelation starts and ends near
/// a zero crossing.
///
/// The start is the first sample in the first half quieter than `threshold`,
/// the (exclusive) end the first such sample scanning inward from the back.
/// Either edge falls back to the frame boundary when nothing qualifies. On odd
/// lengths both scans include the middle sample.
pub fn trim_edges(samples: &[f32], threshold: f32) -> &[f32] {
    let size = samples.len();
    let half = (size + 1) / 2;
    let start = (0..half)
        .find(|&i| samples[i].abs() < threshold)
        .unwrap_or(0);
    let end = (1..half)
        .map(|i| size - i)
        .find(|&i| samples[i].abs() < threshold)
        .unwrap_or(size.saturating_sub(1));
    if end <= start {
        return &[];
    }
    &samples[start..end]
}

/// Averages interleaved channels into a mono signal.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_constant_and_empty() {
        assert!((rms(&[0.5, -0.5, 0.5, -0.5]) - 0.5).abs() < 1e-6);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn trim_skips_loud_edges() {
        let samples = [0.9, 0.8, 0.1, 0.5, -0.5, 0.05, 0.9, 0.9];
        let trimmed = trim_edges(&samples, 0.2);
        // start at index 2, end scanning from the back: 7, 6 loud; 5 is quiet.
        assert_eq!(trimmed, &samples[2..5]);
    }

    #[test]
    fn trim_defaults_to_frame_bounds() {
        let samples = [0.9; 8];
        assert_eq!(trim_edges(&samples, 0.2), &samples[0..7]);
        assert!(trim_edges(&[0.1], 0.2).is_empty());
        assert!(trim_edges(&[], 0.2).is_empty());
    }

    #[test]
    fn trim_odd_length_reaches_middle_sample() {
        let samples = [0.9, 0.9, 0.1, 0.1, 0.9];
        assert_eq!(trim_edges(&samples, 0.2), &[0.1]);

        // Only the middle sample is quiet: start lands on it, the end scan
        // finds nothing and falls back to the last index.
        let samples = [0.9, 0.9, 0.1, 0.9, 0.9];
        assert_eq!(trim_edges(&samples, 0.2), &samples[2..4]);
    }

    #[test]
    fn downmix_averages_channels() {
        let mono = downmix(&[1.0, 0.0, 0.5, 0.5], 2);
        assert_eq!(mono, vec![0.5, 0.5]);
        assert_eq!(downmix(&[0.25, 0.75], 1), vec![0.25, 0.75]);
    }
}
