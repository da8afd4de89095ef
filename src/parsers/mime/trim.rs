use std::io::{self, Read};

const ZERO_WIDTH_SPACE: char = '\u{200B}';
const ZERO_WIDTH_NON_JOINER: char = '\u{200C}';
const ZERO_WIDTH_JOINER: char = '\u{200D}';
const ZERO_WIDTH_NO_BREAK_SPACE: char = '\u{FEFF}';

fn is_leading_noise(c: char) -> bool {
    matches!(
        c,
        ZERO_WIDTH_SPACE | ZERO_WIDTH_NON_JOINER | ZERO_WIDTH_JOINER | ZERO_WIDTH_NO_BREAK_SPACE
    ) || c.is_whitespace()
}

/// Length in bytes of the run of whitespace and zero-width characters at the start of `data`
fn leading_noise_len(data: &[u8]) -> usize {
    let mut pos = 0;

    while pos < data.len() {
        let width = match data[pos] {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => break,
        };
        let Some(bytes) = data.get(pos..pos + width) else {
            break;
        };
        match std::str::from_utf8(bytes).ok().and_then(|s| s.chars().next()) {
            Some(c) if is_leading_noise(c) => pos += width,
            _ => break,
        }
    }

    pos
}

/// 去掉开头的空白与零宽字符
pub fn trim_leading_noise(data: &[u8]) -> &[u8] {
    &data[leading_noise_len(data)..]
}

/// Reader adapter that drops leading whitespace and zero-width characters
///
/// Only the start of the stream is trimmed: once a byte of real content has
/// been passed on, everything else goes through untouched. Header parsers
/// are sensitive to leading blank lines, which is what this is for.
#[derive(Debug)]
pub struct TrimLeadingReader<R> {
    inner: R,
    trimmed: bool,
}

impl<R: Read> TrimLeadingReader<R> {
    pub fn new(inner: R) -> Self {
        TrimLeadingReader {
            inner,
            trimmed: false,
        }
    }
}

impl<R: Read> Read for TrimLeadingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = self.inner.read(buf)?;
            if self.trimmed || n == 0 {
                return Ok(n);
            }

            let skip = leading_noise_len(&buf[..n]);
            if skip == n {
                // A chunk made only of noise must not look like end of input
                continue;
            }

            self.trimmed = true;
            buf.copy_within(skip..n, 0);
            return Ok(n - skip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_zero_width_and_whitespace() {
        let data = "\u{FEFF}\u{200B} \r\n\u{200C}\u{200D}\tFrom: x\r\n".as_bytes();
        assert_eq!(trim_leading_noise(data), b"From: x\r\n");
    }

    #[test]
    fn leaves_clean_input_alone() {
        assert_eq!(trim_leading_noise(b"From: x"), b"From: x");
        assert_eq!(trim_leading_noise(b""), b"");
        assert_eq!(trim_leading_noise(&[0xFF, b' ']), &[0xFF, b' ']);
    }

    #[test]
    fn reader_trims_only_once() {
        let input = "\u{200B}\n Header: a\n\n body".as_bytes();
        let mut output = Vec::new();
        TrimLeadingReader::new(input).read_to_end(&mut output).unwrap();
        assert_eq!(output, b"Header: a\n\n body");
    }

    #[test]
    fn reader_skips_noise_only_chunks() {
        // 一次只读一个字节，开头的噪声跨越多个块
        struct OneByte<'a>(&'a [u8]);
        impl Read for OneByte<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0.is_empty() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0[0];
                self.0 = &self.0[1..];
                Ok(1)
            }
        }

        let mut output = Vec::new();
        TrimLeadingReader::new(OneByte(b"  \n X \n"))
            .read_to_end(&mut output)
            .unwrap();
        assert_eq!(output, b"X \n");
    }
}
