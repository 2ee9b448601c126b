//! Height sensor sampling on ADC0.

use embassy_rp::adc::{self, Adc, Async};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use heli_core::SensorSource;

/// Samples buffered between the sampler task and the scheduler.
pub const SAMPLE_QUEUE_DEPTH: usize = 32;

/// Bounded queue of raw 12-bit conversions.
pub type SampleChannel = Channel<CriticalSectionRawMutex, u16, SAMPLE_QUEUE_DEPTH>;

/// ADC0 reader feeding a [`SampleChannel`].
///
/// Never blocks on the queue: when the scheduler falls behind the newest
/// conversion is dropped and counted.
pub struct Sampler<'d> {
    adc: Adc<'d, Async>,
    pin: adc::Channel<'d>,
    queue: Sender<'static, CriticalSectionRawMutex, u16, SAMPLE_QUEUE_DEPTH>,
    overruns: u32,
}

impl<'d> Sampler<'d> {
    pub fn new(
        adc: Adc<'d, Async>,
        pin: adc::Channel<'d>,
        queue: Sender<'static, CriticalSectionRawMutex, u16, SAMPLE_QUEUE_DEPTH>,
    ) -> Self {
        Self {
            adc,
            pin,
            queue,
            overruns: 0,
        }
    }

    /// Convert once and queue the result.
    pub async fn sample(&mut self) -> Result<u16, adc::Error> {
        let raw = self.adc.read(&mut self.pin).await?;
        if self.queue.try_send(raw).is_err() {
            self.overruns = self.overruns.wrapping_add(1);
        }
        Ok(raw)
    }

    /// Conversions dropped because the queue was full.
    #[inline]
    #[must_use]
    pub fn overruns(&self) -> u32 {
        self.overruns
    }
}

/// Consumer end of the sample queue.
pub struct SampleQueue {
    rx: Receiver<'static, CriticalSectionRawMutex, u16, SAMPLE_QUEUE_DEPTH>,
}

impl SampleQueue {
    pub fn new(rx: Receiver<'static, CriticalSectionRawMutex, u16, SAMPLE_QUEUE_DEPTH>) -> Self {
        Self { rx }
    }
}

impl SensorSource for SampleQueue {
    fn poll_sample(&mut self) -> Option<u16> {
        self.rx.try_receive().ok()
    }
}
