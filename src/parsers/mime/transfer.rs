//! 传输编码解码层
//!
//! 按 Content-Transfer-Encoding 还原原始字节；未知或缺失的编码原样通过。

use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::core::DecodeError;

/// 支持的传输编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    Base64,
    QuotedPrintable,
    /// `7bit`、`8bit`、`binary`、缺失或无法识别的编码
    #[default]
    Identity,
}

impl TransferEncoding {
    /// Maps a Content-Transfer-Encoding header value to an encoding
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(name) if name.eq_ignore_ascii_case("base64") => TransferEncoding::Base64,
            Some(name) if name.eq_ignore_ascii_case("quoted-printable") => {
                TransferEncoding::QuotedPrintable
            }
            _ => TransferEncoding::Identity,
        }
    }

    pub fn decode(self, raw: Vec<u8>) -> Result<Vec<u8>, DecodeError> {
        match self {
            TransferEncoding::Base64 => decode_base64(&raw),
            TransferEncoding::QuotedPrintable => decode_quoted_printable(&raw),
            TransferEncoding::Identity => Ok(raw),
        }
    }
}

// 标准字母表，要求补齐；末尾符号的多余位不做检查
const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Standard (padded) base64; line breaks and other ASCII whitespace are ignored
pub fn decode_base64(raw: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let compact: Vec<u8> = raw
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    Ok(BASE64_LENIENT.decode(compact)?)
}

/// Quoted-printable as defined by RFC 2045 section 6.7
///
/// Trailing whitespace on each line is dropped, `=` at the end of a line is a
/// soft break, and `=XY` is a hex escape (either case). Any other use of `=`
/// is an error.
pub fn decode_quoted_printable(raw: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoded = Vec::with_capacity(raw.len());
    let mut line_start = 0;

    while line_start < raw.len() {
        let (line_end, break_len) = match raw[line_start..].iter().position(|&b| b == b'\n') {
            Some(idx) => {
                let newline = line_start + idx;
                if newline > line_start && raw[newline - 1] == b'\r' {
                    (newline - 1, 2)
                } else {
                    (newline, 1)
                }
            }
            None => (raw.len(), 0),
        };

        let mut content_end = line_end;
        while content_end > line_start && matches!(raw[content_end - 1], b' ' | b'\t') {
            content_end -= 1;
        }

        let soft_break = content_end > line_start && raw[content_end - 1] == b'=';
        if soft_break {
            content_end -= 1;
        }

        let mut i = line_start;
        while i < content_end {
            if raw[i] == b'=' {
                let escape = raw
                    .get(i + 1..i + 3)
                    .filter(|_| i + 3 <= content_end)
                    .and_then(|hex| Some((hex_value(hex[0])? << 4) | hex_value(hex[1])?))
                    .ok_or(DecodeError::QuotedPrintable { offset: i })?;
                decoded.push(escape);
                i += 3;
            } else {
                decoded.push(raw[i]);
                i += 1;
            }
        }

        if !soft_break {
            decoded.extend_from_slice(&raw[line_end..line_end + break_len]);
        }
        line_start = line_end + break_len;
    }

    Ok(decoded)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}
