//! Status frame parser, used by ground tools and tests.

use crate::crc::calculate_crc8;
use crate::types::{FlightPhase, StatusFrame};

/// Maximum accepted line length (including newline).
pub const MAX_LINE_LENGTH: usize = 64;

/// Minimum valid frame: S0:0:0:0:0:0:0*XX = 17 bytes
const MIN_FRAME_LEN: usize = 17;

/// Error type for frame parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Malformed frame.
    Parse,
    /// Checksum mismatch.
    Checksum,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Parse => write!(f, "malformed status frame"),
            Self::Checksum => write!(f, "status frame checksum mismatch"),
        }
    }
}

/// Parse one status frame line. A trailing `\n` and/or `\r` is ignored.
pub fn parse_status(line: &[u8]) -> Result<StatusFrame, ParseError> {
    let line = strip_line_ending(line);
    if line.len() < MIN_FRAME_LEN || line.len() > MAX_LINE_LENGTH || line[0] != b'S' {
        return Err(ParseError::Parse);
    }

    let star = line
        .iter()
        .rposition(|&b| b == b'*')
        .ok_or(ParseError::Parse)?;
    if star + 3 != line.len() {
        return Err(ParseError::Parse);
    }

    let payload = &line[1..star];
    let received = parse_hex_u8(&line[star + 1..])?;
    if calculate_crc8(payload) != received {
        return Err(ParseError::Checksum);
    }

    let mut fields = payload.split(|&b| b == b':');
    let mut next = || fields.next().ok_or(ParseError::Parse);

    let altitude_setpoint = parse_i16(next()?)?;
    let altitude = parse_i16(next()?)?;
    let yaw_setpoint = parse_i16(next()?)?;
    let yaw = parse_i16(next()?)?;
    let main_duty = parse_u8(next()?)?;
    let tail_duty = parse_u8(next()?)?;
    let phase = match next()? {
        [digit @ b'0'..=b'9'] => FlightPhase::from_code(digit - b'0').ok_or(ParseError::Parse)?,
        _ => return Err(ParseError::Parse),
    };

    if fields.next().is_some() {
        return Err(ParseError::Parse);
    }

    Ok(StatusFrame {
        altitude_setpoint,
        altitude,
        yaw_setpoint,
        yaw,
        main_duty,
        tail_duty,
        phase,
    })
}

#[inline]
fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[inline]
fn hex_digit(b: u8) -> Result<u8, ParseError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        _ => Err(ParseError::Parse),
    }
}

#[inline]
fn parse_hex_u8(s: &[u8]) -> Result<u8, ParseError> {
    match s {
        [high, low] => Ok((hex_digit(*high)? << 4) | hex_digit(*low)?),
        _ => Err(ParseError::Parse),
    }
}

/// Parse unsigned decimal digits with overflow checking.
fn parse_magnitude(s: &[u8]) -> Result<u32, ParseError> {
    if s.is_empty() || s.len() > 6 {
        return Err(ParseError::Parse);
    }
    s.iter().try_fold(0u32, |acc, &b| {
        if b.is_ascii_digit() {
            Ok(acc * 10 + u32::from(b - b'0'))
        } else {
            Err(ParseError::Parse)
        }
    })
}

#[inline]
fn parse_i16(s: &[u8]) -> Result<i16, ParseError> {
    let (negative, digits) = match s.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, s),
    };
    let magnitude = i32::try_from(parse_magnitude(digits)?).map_err(|_| ParseError::Parse)?;
    let value = if negative { -magnitude } else { magnitude };
    i16::try_from(value).map_err(|_| ParseError::Parse)
}

#[inline]
fn parse_u8(s: &[u8]) -> Result<u8, ParseError> {
    u8::try_from(parse_magnitude(s)?).map_err(|_| ParseError::Parse)
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    use super::*;
    use crate::serialize::{Serialize, MAX_STATUS_SIZE};

    fn line_for(payload: &str) -> std::string::String {
        format!("S{}*{:02X}\n", payload, calculate_crc8(payload.as_bytes()))
    }

    #[test]
    fn test_parse_landed_frame() {
        let frame = parse_status(line_for("0:0:0:0:0:0:0").as_bytes()).unwrap();
        assert_eq!(frame, StatusFrame::default());
    }

    #[test]
    fn test_parse_negative_fields() {
        let frame = parse_status(line_for("10:-2:-15:-180:20:16:2").as_bytes()).unwrap();
        assert_eq!(frame.altitude, -2);
        assert_eq!(frame.yaw_setpoint, -15);
        assert_eq!(frame.yaw, -180);
        assert_eq!(frame.main_duty, 20);
        assert_eq!(frame.tail_duty, 16);
        assert_eq!(frame.phase, FlightPhase::Flying);
    }

    #[test]
    fn test_parse_serialized_frame() {
        let frame = StatusFrame {
            altitude_setpoint: 5,
            altitude: 6,
            yaw_setpoint: 0,
            yaw: 8,
            main_duty: 55,
            tail_duty: 44,
            phase: FlightPhase::Landing,
        };
        let mut buf = [0u8; MAX_STATUS_SIZE];
        let len = frame.serialize(&mut buf).unwrap();
        assert_eq!(parse_status(&buf[..len]), Ok(frame));
    }

    #[test]
    fn test_checksum_mismatch() {
        let payload = "0:0:0:0:0:0:0";
        let wrong = calculate_crc8(payload.as_bytes()) ^ 0xFF;
        let line = format!("S{}*{:02X}\n", payload, wrong);
        assert_eq!(parse_status(line.as_bytes()), Err(ParseError::Checksum));
    }

    #[test]
    fn test_invalid_prefix() {
        let line = line_for("0:0:0:0:0:0:0").replacen('S', "G", 1);
        assert_eq!(parse_status(line.as_bytes()), Err(ParseError::Parse));
    }

    #[test]
    fn test_unknown_phase_rejected() {
        assert_eq!(
            parse_status(line_for("0:0:0:0:0:0:7").as_bytes()),
            Err(ParseError::Parse)
        );
    }

    #[test]
    fn test_field_count_checked() {
        assert_eq!(
            parse_status(line_for("0:0:0:0:0:0:0:0").as_bytes()),
            Err(ParseError::Parse)
        );
        assert_eq!(
            parse_status(line_for("0:0:0:0:0:0").as_bytes()),
            Err(ParseError::Parse)
        );
    }

    #[test]
    fn test_duty_overflow_rejected() {
        assert_eq!(
            parse_status(line_for("0:0:0:0:256:0:0").as_bytes()),
            Err(ParseError::Parse)
        );
    }

    #[test]
    fn test_crlf_accepted() {
        let line = line_for("0:0:0:0:0:0:0").replace('\n', "\r\n");
        assert!(parse_status(line.as_bytes()).is_ok());
    }
}
