//! # Peak Detection
//!
//! Finds local maxima in a channel of ADC samples and derives the average
//! peak magnitude and the signal frequency from them.
//!
//! ## Peak Rule
//!
//! A sample at index `i` (with two neighbours on each side) is a peak when:
//! - it is `>=` both immediate neighbours
//! - it is `>` both neighbours two positions away
//! - it is above the noise floor ([`NOISE_FLOOR`])
//! - it is more than [`MIN_PEAK_SPACING`] indices after the last accepted peak
//!
//! Candidates that are too close to the previous peak are dropped; the first
//! peak found always wins.
//!
//! ## Usage
//!
//! ```
//! use kip_console::signal::peaks::{find_peaks, frequency};
//!
//! let mut samples = [0u16; 64];
//! samples[10] = 100;
//! samples[20] = 100;
//!
//! assert_eq!(find_peaks(&samples).collect::<Vec<_>>(), vec![10, 20]);
//! assert_eq!(frequency(&samples), 150.0);
//! ```

/// Samples at or below this value are never peaks (ADC units)
pub const NOISE_FLOOR: u16 = 4;

/// Accepted peaks must be more than this many indices apart
pub const MIN_PEAK_SPACING: usize = 5;

/// Board sampling cadence constant: frequency = this / peak distance
pub const SAMPLING_CONSTANT: f64 = 1500.0;

/// Lazy iterator over peak indices in ascending order
///
/// Clone before consuming (or call [`find_peaks`] again) to walk the same
/// peaks twice.
#[derive(Debug, Clone)]
pub struct Peaks<'a> {
    samples: &'a [u16],
    next_index: usize,
    last_peak: Option<usize>,
}

impl<'a> Peaks<'a> {
    fn is_local_maximum(&self, i: usize) -> bool {
        let s = self.samples;
        let value = s[i];

        value >= s[i - 1]
            && value >= s[i + 1]
            && value > s[i - 2]
            && value > s[i + 2]
            && value > NOISE_FLOOR
    }
}

impl<'a> Iterator for Peaks<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        // Index i needs two samples on each side
        let end = self.samples.len().saturating_sub(2);

        while self.next_index < end {
            let i = self.next_index;
            self.next_index += 1;

            if !self.is_local_maximum(i) {
                continue;
            }

            match self.last_peak {
                Some(last) if i - last <= MIN_PEAK_SPACING => continue,
                _ => {
                    self.last_peak = Some(i);
                    return Some(i);
                }
            }
        }

        None
    }
}

/// Find peak indices in a channel of samples
///
/// # Arguments
///
/// * `samples` - One channel of ADC readings (normally 64 samples)
///
/// # Returns
///
/// * `Peaks` - Iterator over peak indices, evaluated on demand
pub fn find_peaks(samples: &[u16]) -> Peaks<'_> {
    Peaks {
        samples,
        next_index: 2,
        last_peak: None,
    }
}

/// Average value of all peaks, or 0 when there are none
pub fn peak_magnitude(samples: &[u16]) -> u16 {
    let (sum, count) = find_peaks(samples).fold((0u32, 0u32), |(sum, count), i| {
        (sum + u32::from(samples[i]), count + 1)
    });

    if count == 0 {
        return 0;
    }

    (sum / count) as u16
}

/// Signal frequency from the distance between the first two peaks
///
/// Returns 0.0 when fewer than two peaks are found.
pub fn frequency(samples: &[u16]) -> f64 {
    let mut peaks = find_peaks(samples);

    match (peaks.next(), peaks.next()) {
        (Some(first), Some(second)) => SAMPLING_CONSTANT / (second - first) as f64,
        _ => 0.0,
    }
}
