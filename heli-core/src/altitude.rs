//! Altitude estimation from the height sensor's raw ADC samples.
//!
//! Samples land in a fixed ring ([`AltitudeBuffer`]). Once the ring has been
//! filled the first time its mean becomes the ground reference
//! ([`AltitudeReference`]), and only then can an [`AltitudeEstimator`] exist.

use crate::config::AltitudeConfig;

/// Ring depth of the reference rig.
pub const ALTITUDE_BUFFER_DEPTH: usize = 25;

/// Ring of the most recent raw samples.
#[derive(Debug, Clone)]
pub struct AltitudeBuffer<const N: usize = ALTITUDE_BUFFER_DEPTH> {
    samples: [u16; N],
    cursor: usize,
    received: usize,
    last_mean: u16,
}

/// Ground reference in raw ADC counts, frozen at calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AltitudeReference(u16);

impl AltitudeReference {
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// Calibration is not available yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// The ring has not been filled once.
    Pending { received: usize, capacity: usize },
}

impl core::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Pending { received, capacity } => {
                write!(f, "calibration pending ({}/{} samples)", received, capacity)
            }
        }
    }
}

impl<const N: usize> AltitudeBuffer<N> {
    #[must_use]
    pub const fn new() -> Self {
        const { assert!(N > 0, "altitude buffer needs at least one slot") };
        Self {
            samples: [0; N],
            cursor: 0,
            received: 0,
            last_mean: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Samples received so far, saturating at the capacity.
    #[inline]
    #[must_use]
    pub const fn received(&self) -> usize {
        self.received
    }

    /// Mean computed by the last call to [`mean`](Self::mean).
    #[inline]
    #[must_use]
    pub const fn last_mean(&self) -> u16 {
        self.last_mean
    }

    /// Store one sample, overwriting the oldest.
    #[inline]
    pub fn record_sample(&mut self, raw: u16) {
        self.samples[self.cursor] = raw;
        self.cursor = (self.cursor + 1) % N;
        if self.received < N {
            self.received += 1;
        }
    }

    /// Rounded mean over every slot of the ring.
    pub fn mean(&mut self) -> u16 {
        let sum: u64 = self.samples.iter().map(|&s| u64::from(s)).sum();
        let n = N as u64;
        // (2 * sum + n) / 2n rounds half up; the result never exceeds u16::MAX
        self.last_mean = ((2 * sum + n) / 2 / n) as u16;
        self.last_mean
    }

    /// Take the ground reference from a full ring.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::Pending`] until `N` samples have arrived.
    pub fn calibrate(&mut self) -> Result<AltitudeReference, CalibrationError> {
        if self.received < N {
            return Err(CalibrationError::Pending {
                received: self.received,
                capacity: N,
            });
        }
        Ok(AltitudeReference(self.mean()))
    }
}

impl<const N: usize> Default for AltitudeBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Calibrated altitude estimator.
#[derive(Debug, Clone)]
pub struct AltitudeEstimator<const N: usize = ALTITUDE_BUFFER_DEPTH> {
    buffer: AltitudeBuffer<N>,
    reference: AltitudeReference,
    counts_per_volt: i32,
}

impl<const N: usize> AltitudeEstimator<N> {
    pub fn new(buffer: AltitudeBuffer<N>, reference: AltitudeReference, config: &AltitudeConfig) -> Self {
        Self {
            buffer,
            reference,
            counts_per_volt: config.counts_per_volt,
        }
    }

    #[inline]
    pub fn record_sample(&mut self, raw: u16) {
        self.buffer.record_sample(raw);
    }

    /// Recompute the mean and return the new altitude in percent.
    pub fn update(&mut self) -> i32 {
        self.buffer.mean();
        self.altitude_percent()
    }

    /// Altitude in percent of the calibrated range, from the last mean.
    ///
    /// The sensor reads lower as the rig climbs, so a mean below the
    /// reference is a positive altitude.
    #[must_use]
    pub fn altitude_percent(&self) -> i32 {
        let offset = i32::from(self.buffer.last_mean()) - i32::from(self.reference.raw());
        -(offset * 100) / self.counts_per_volt
    }

    #[inline]
    #[must_use]
    pub const fn reference(&self) -> AltitudeReference {
        self.reference
    }

    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &AltitudeBuffer<N> {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG;

    fn calibrated(raw: u16) -> AltitudeEstimator {
        let mut buffer = AltitudeBuffer::new();
        for _ in 0..ALTITUDE_BUFFER_DEPTH {
            buffer.record_sample(raw);
        }
        let reference = buffer.calibrate().unwrap();
        AltitudeEstimator::new(buffer, reference, &DEFAULT_CONFIG.altitude)
    }

    fn fill(estimator: &mut AltitudeEstimator, raw: u16) -> i32 {
        for _ in 0..ALTITUDE_BUFFER_DEPTH {
            estimator.record_sample(raw);
        }
        estimator.update()
    }

    #[test]
    fn test_calibration_pending_until_full() {
        let mut buffer = AltitudeBuffer::<25>::new();
        for i in 0..24 {
            buffer.record_sample(2000);
            assert_eq!(
                buffer.calibrate(),
                Err(CalibrationError::Pending {
                    received: i + 1,
                    capacity: 25
                })
            );
        }
        buffer.record_sample(2000);
        assert_eq!(buffer.calibrate().map(AltitudeReference::raw), Ok(2000));
    }

    #[test]
    fn test_received_saturates() {
        let mut buffer = AltitudeBuffer::<4>::new();
        for _ in 0..10 {
            buffer.record_sample(1);
        }
        assert_eq!(buffer.received(), 4);
        assert_eq!(buffer.capacity(), 4);
    }

    #[test]
    fn test_mean_rounds_half_up() {
        let mut buffer = AltitudeBuffer::<4>::new();
        for s in [1, 1, 1, 2] {
            buffer.record_sample(s);
        }
        assert_eq!(buffer.mean(), 1);

        for s in [1, 1, 2, 2] {
            buffer.record_sample(s);
        }
        assert_eq!(buffer.mean(), 2);
        assert_eq!(buffer.last_mean(), 2);
    }

    #[test]
    fn test_mean_is_order_independent() {
        let mut a = AltitudeBuffer::<5>::new();
        let mut b = AltitudeBuffer::<5>::new();
        for s in [4095, 0, 17, 2048, 3] {
            a.record_sample(s);
        }
        for s in [3, 2048, 4095, 17, 0] {
            b.record_sample(s);
        }
        assert_eq!(a.mean(), b.mean());
    }

    #[test]
    fn test_oldest_sample_overwritten() {
        let mut buffer = AltitudeBuffer::<3>::new();
        for s in [100, 100, 100, 400] {
            buffer.record_sample(s);
        }
        assert_eq!(buffer.mean(), 200);
    }

    #[test]
    fn test_altitude_percent() {
        let mut estimator = calibrated(2000);
        assert_eq!(estimator.update(), 0);
        assert_eq!(fill(&mut estimator, 1937), 5);
        assert_eq!(fill(&mut estimator, 1900), 8);
        assert_eq!(fill(&mut estimator, 1990), 0);
        // Sinking below the reference reads negative
        assert_eq!(fill(&mut estimator, 2100), -8);
        assert_eq!(estimator.reference().raw(), 2000);
    }

    #[test]
    fn test_altitude_decreases_as_mean_rises() {
        let mut estimator = calibrated(2000);
        let mut previous = i32::MAX;
        for raw in (1000..=3000).step_by(50) {
            let altitude = fill(&mut estimator, raw);
            assert!(altitude <= previous);
            previous = altitude;
        }
    }
}
