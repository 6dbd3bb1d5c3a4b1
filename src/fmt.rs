//! No-std decimal formatting and parsing for checksum suffixes.
//!
//! These helpers write and read the `|<number>` suffix text without heap
//! allocation or the standard library.

/// Write a u16 as decimal digits.
///
/// Returns the number of bytes written (1-5).
///
/// # Panics
///
/// Panics if `buf.len() < 5` (max size: "65535").
#[inline]
pub fn write_u16(buf: &mut [u8], value: u16) -> usize {
    debug_assert!(buf.len() >= 5, "buffer too small for u16");

    if value == 0 {
        buf[0] = b'0';
        return 1;
    }

    // Write digits in reverse order to a temporary buffer
    let mut temp = [0u8; 5];
    let mut n = value;
    let mut len = 0;
    while n > 0 {
        temp[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
    }

    // Copy digits in correct order
    for i in 0..len {
        buf[i] = temp[len - 1 - i];
    }

    len
}

/// Write a `|<decimal>` checksum suffix.
///
/// Returns the number of bytes written (2-6).
///
/// # Panics
///
/// Panics if `buf.len() < 6`.
#[inline]
pub fn write_checksum_suffix(buf: &mut [u8], value: u16) -> usize {
    debug_assert!(buf.len() >= 6, "buffer too small for checksum suffix");
    buf[0] = b'|';
    1 + write_u16(&mut buf[1..], value)
}

/// Parse decimal digits as u16.
///
/// Strict: the whole slice must be ASCII digits and the value must fit in
/// 16 bits. Returns `None` otherwise (including for an empty slice).
#[inline]
pub fn parse_u16(s: &[u8]) -> Option<u16> {
    if s.is_empty() {
        return None;
    }

    let mut value: u32 = 0;
    for &b in s {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + (b - b'0') as u32;
        if value > u16::MAX as u32 {
            return None;
        }
    }

    Some(value as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_u16() {
        let mut buf = [0u8; 5];

        let len = write_u16(&mut buf, 0);
        assert_eq!(&buf[..len], b"0");

        let len = write_u16(&mut buf, 7);
        assert_eq!(&buf[..len], b"7");

        let len = write_u16(&mut buf, 12345);
        assert_eq!(&buf[..len], b"12345");

        let len = write_u16(&mut buf, u16::MAX);
        assert_eq!(&buf[..len], b"65535");
    }

    #[test]
    fn test_write_checksum_suffix() {
        let mut buf = [0u8; 6];

        let len = write_checksum_suffix(&mut buf, 123);
        assert_eq!(&buf[..len], b"|123");

        let len = write_checksum_suffix(&mut buf, 65535);
        assert_eq!(&buf[..len], b"|65535");
    }

    #[test]
    fn test_parse_u16() {
        assert_eq!(parse_u16(b"0"), Some(0));
        assert_eq!(parse_u16(b"007"), Some(7));
        assert_eq!(parse_u16(b"65535"), Some(65535));
    }

    #[test]
    fn test_parse_u16_rejects_garbage() {
        assert_eq!(parse_u16(b""), None);
        assert_eq!(parse_u16(b"12a"), None);
        assert_eq!(parse_u16(b"-5"), None);
        assert_eq!(parse_u16(b" 12"), None);
        assert_eq!(parse_u16(b"65536"), None);
    }

    #[test]
    fn test_write_parse_round_trip() {
        let mut buf = [0u8; 5];
        for value in [0u16, 1, 9, 10, 255, 256, 9999, 65535] {
            let len = write_u16(&mut buf, value);
            assert_eq!(parse_u16(&buf[..len]), Some(value));
        }
    }
}
