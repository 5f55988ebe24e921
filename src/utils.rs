use std::fmt::{self, Formatter};

/// Writes `bytes` as a quoted string: printable ASCII as is, quotes escaped,
/// everything else as `\xNN`. Opcode and length bytes of a blob stand out
/// from the text they frame.
pub fn write_byte_string(f: &mut Formatter, bytes: &[u8]) -> fmt::Result {
    write!(f, "\"")?;
    for b in bytes {
        match *b {
            32..=33 | 35..=91 | 93..=126 => write!(f, "{}", *b as char)?,
            34 => write!(f, "\\\"")?,
            92 => write!(f, "\\\\")?,
            _ => write!(f, "\\x{:02X}", b)?,
        }
    }
    write!(f, "\"")
}

/// Empties `buf` for reuse. Capacity above `retain` items is released.
pub fn recycle_vec<T>(buf: &mut Vec<T>, retain: Option<usize>) {
    buf.clear();
    if let Some(max) = retain {
        if buf.capacity() > max {
            buf.shrink_to(max);
        }
    }
}
