//! Status telemetry over UART0.

use embassy_rp::uart::{Async, Error as UartError, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use heli_core::{OutputError, TelemetrySink};
use heli_proto::StatusFrame;

/// Telemetry link speed.
pub const TELEMETRY_BAUDRATE: u32 = 9_600;
/// Records buffered for the UART task.
pub const STATUS_QUEUE_DEPTH: usize = 4;

pub type StatusChannel = Channel<CriticalSectionRawMutex, StatusFrame, STATUS_QUEUE_DEPTH>;

/// Non-blocking producer side used by the scheduler.
pub struct StatusQueue {
    tx: Sender<'static, CriticalSectionRawMutex, StatusFrame, STATUS_QUEUE_DEPTH>,
}

impl StatusQueue {
    pub fn new(tx: Sender<'static, CriticalSectionRawMutex, StatusFrame, STATUS_QUEUE_DEPTH>) -> Self {
        Self { tx }
    }
}

impl TelemetrySink for StatusQueue {
    fn send_status(&mut self, frame: &StatusFrame) -> Result<(), OutputError> {
        self.tx.try_send(*frame).map_err(|_| OutputError::Dropped)
    }
}

/// Error writing one record to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum LinkError {
    /// UART peripheral error.
    Uart(UartError),
    /// Record did not fit the line buffer.
    Format,
}

impl From<UartError> for LinkError {
    fn from(e: UartError) -> Self {
        Self::Uart(e)
    }
}

/// UART writer for status records.
///
/// Sends the checksummed frame, or with `text-telemetry` the report line
/// terminated by CR LF.
pub struct TelemetryUart<'d> {
    tx: UartTx<'d, Async>,
}

impl<'d> TelemetryUart<'d> {
    pub fn new(tx: UartTx<'d, Async>) -> Self {
        Self { tx }
    }

    #[cfg(not(feature = "text-telemetry"))]
    pub async fn write_status(&mut self, frame: &StatusFrame) -> Result<(), LinkError> {
        use heli_proto::{Serialize, MAX_STATUS_SIZE};

        let bytes = frame
            .serialize_to_vec::<MAX_STATUS_SIZE>()
            .map_err(|_| LinkError::Format)?;
        self.tx.write(&bytes).await?;
        Ok(())
    }

    #[cfg(feature = "text-telemetry")]
    pub async fn write_status(&mut self, frame: &StatusFrame) -> Result<(), LinkError> {
        use core::fmt::Write;

        let mut line: heapless::String<192> = heapless::String::new();
        write!(line, "{}\r\n", frame).map_err(|_| LinkError::Format)?;
        self.tx.write(line.as_bytes()).await?;
        Ok(())
    }
}
