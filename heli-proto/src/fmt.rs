//! Allocation-free number writers used by the frame serializer.

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Write a u8 as 2 uppercase hex digits. Returns 2.
#[inline]
pub fn write_hex_u8(buf: &mut [u8], value: u8) -> usize {
    debug_assert!(buf.len() >= 2, "buffer too small for hex u8");
    buf[0] = HEX_DIGITS[(value >> 4) as usize];
    buf[1] = HEX_DIGITS[(value & 0xF) as usize];
    2
}

/// Write an unsigned value as decimal digits. Returns the number of bytes written.
#[inline]
fn write_digits(buf: &mut [u8], mut value: u32) -> usize {
    // u16 magnitudes need at most 5 digits
    let mut reversed = [0u8; 5];
    let mut len = 0;
    loop {
        reversed[len] = b'0' + (value % 10) as u8;
        value /= 10;
        len += 1;
        if value == 0 {
            break;
        }
    }
    for (dst, src) in buf.iter_mut().zip(reversed[..len].iter().rev()) {
        *dst = *src;
    }
    len
}

/// Write an i16 as a signed decimal string (1-6 bytes).
#[inline]
pub fn write_i16(buf: &mut [u8], value: i16) -> usize {
    debug_assert!(buf.len() >= 6, "buffer too small for i16");
    let magnitude = i32::from(value).unsigned_abs();
    if value < 0 {
        buf[0] = b'-';
        1 + write_digits(&mut buf[1..], magnitude)
    } else {
        write_digits(buf, magnitude)
    }
}

/// Write a u8 as an unsigned decimal string (1-3 bytes).
#[inline]
pub fn write_u8(buf: &mut [u8], value: u8) -> usize {
    debug_assert!(buf.len() >= 3, "buffer too small for u8");
    write_digits(buf, u32::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_hex_u8() {
        let mut buf = [0u8; 2];

        write_hex_u8(&mut buf, 0x00);
        assert_eq!(&buf, b"00");

        write_hex_u8(&mut buf, 0xF4);
        assert_eq!(&buf, b"F4");
    }

    #[test]
    fn test_write_i16() {
        let mut buf = [0u8; 6];

        let len = write_i16(&mut buf, 0);
        assert_eq!(&buf[..len], b"0");

        let len = write_i16(&mut buf, -180);
        assert_eq!(&buf[..len], b"-180");

        let len = write_i16(&mut buf, 32767);
        assert_eq!(&buf[..len], b"32767");

        let len = write_i16(&mut buf, i16::MIN);
        assert_eq!(&buf[..len], b"-32768");
    }

    #[test]
    fn test_write_u8() {
        let mut buf = [0u8; 3];

        let len = write_u8(&mut buf, 0);
        assert_eq!(&buf[..len], b"0");

        let len = write_u8(&mut buf, 64);
        assert_eq!(&buf[..len], b"64");

        let len = write_u8(&mut buf, 255);
        assert_eq!(&buf[..len], b"255");
    }
}
