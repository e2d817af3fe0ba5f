use core::fmt::Write as CoreWrite;

/// A very simple buffer to pre format a short line of text
/// limited arbitrarily to 32 bytes, enough for a date and time.
/// Text past the end is dropped.
#[derive(Clone, Copy)]
pub struct FmtBuf {
    buf: [u8; 32],
    ptr: usize,
}

impl FmtBuf {
    pub fn new() -> Self {
        Self {
            buf: [0; 32],
            ptr: 0,
        }
    }

    pub fn reset(&mut self) {
        self.ptr = 0;
    }

    pub fn as_str(&self) -> &str {
        // Truncation can split a multi byte char, keep the valid prefix.
        match core::str::from_utf8(&self.buf[0..self.ptr]) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&self.buf[0..e.valid_up_to()]).unwrap_or_default(),
        }
    }
}

impl Default for FmtBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreWrite for FmtBuf {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let rest_len = self.buf.len() - self.ptr;
        let len = if rest_len < s.len() {
            rest_len
        } else {
            s.len()
        };
        self.buf[self.ptr..(self.ptr + len)].copy_from_slice(&s.as_bytes()[0..len]);
        self.ptr += len;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_into_buffer() {
        let mut buf = FmtBuf::new();
        write!(buf, "{:02}:{:02}", 7, 5).unwrap();
        assert_eq!(buf.as_str(), "07:05");
        buf.reset();
        assert_eq!(buf.as_str(), "");
    }

    #[test]
    fn drops_text_past_capacity() {
        let mut buf = FmtBuf::new();
        for _ in 0..5 {
            buf.write_str("0123456789").unwrap();
        }
        assert_eq!(buf.as_str().len(), 32);
        assert!(buf.as_str().starts_with("0123456789"));
    }

    #[test]
    fn keeps_valid_prefix_when_char_is_split() {
        let mut buf = FmtBuf::new();
        buf.write_str("0123456789012345678901234567890").unwrap();
        // Two byte char, only the first byte fits.
        buf.write_str("é").unwrap();
        assert_eq!(buf.as_str(), "0123456789012345678901234567890");
    }
}
