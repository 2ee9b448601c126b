//! Status telemetry types and wire format for the helicopter rig.
//!
//! This crate provides everything needed to move a status record between the
//! flight controller and a ground terminal:
//!
//! - **Types**: [`StatusFrame`] (one status record) and [`FlightPhase`]
//! - **Serialization**: [`Serialize`] for the checksummed frame, plus a
//!   [`Display`](core::fmt::Display) impl producing the human-readable report line
//! - **Parsing**: [`parse_status()`] for ground tools and tests
//!
//! # Frame Format
//!
//! ```text
//! S<alt_sp>:<alt>:<yaw_sp>:<yaw>:<main>:<tail>:<phase>*<checksum>\n
//! ```
//!
//! - `S` - Frame prefix
//! - `alt_sp,alt` - Altitude setpoint / reading in percent, signed decimal i16
//! - `yaw_sp,yaw` - Yaw setpoint / reading in degrees, signed decimal i16
//! - `main,tail` - Rotor duty cycles in percent, unsigned decimal u8
//! - `phase` - Flight phase digit (0 landed, 1 taking off, 2 flying, 3 landing)
//! - `checksum` - 2 hex digits (CRC-8/SMBUS of the bytes between `S` and `*`)
//!
//! # Example
//!
//! ```
//! use heli_proto::{parse_status, FlightPhase, Serialize, StatusFrame};
//!
//! let frame = StatusFrame {
//!     altitude_setpoint: 10,
//!     altitude: 9,
//!     yaw_setpoint: 15,
//!     yaw: 14,
//!     main_duty: 47,
//!     tail_duty: 40,
//!     phase: FlightPhase::Flying,
//! };
//!
//! let mut buf = [0u8; 64];
//! let len = frame.serialize(&mut buf).unwrap();
//! assert_eq!(parse_status(&buf[..len]), Ok(frame));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`heapless`**: Enable `serialize_to_vec()`

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod crc;
mod fmt;
pub mod parser;
pub mod serialize;
pub mod types;

pub use crc::{calculate_crc8, Crc8Digest};
pub use parser::{parse_status, ParseError, MAX_LINE_LENGTH};
pub use serialize::{Serialize, SerializeError, MAX_STATUS_SIZE};
pub use types::{FlightPhase, StatusFrame};
