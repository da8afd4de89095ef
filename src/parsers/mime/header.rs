use std::io::BufRead;

use crate::core::{MhtmlError, ParseErrorKind};

/// 头部集合：有序、名称大小写不敏感、可多值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    fields: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个字段，保留同名的已有字段
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// 设置字段：替换同名的全部已有值
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .fields
            .iter()
            .position(|(field, _)| field.eq_ignore_ascii_case(name))
        {
            Some(first) => {
                self.fields[first].1 = value;
                let mut i = first + 1;
                while i < self.fields.len() {
                    if self.fields[i].0.eq_ignore_ascii_case(name) {
                        self.fields.remove(i);
                        continue;
                    }
                    i += 1;
                }
            }
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// 第一个同名字段的值
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Reads one header block, up to and including the terminating blank line
///
/// Lines may end in CRLF or LF. Folded continuation lines (starting with a
/// space or tab) are joined to the previous field with a single space.
/// Running out of input before the blank line is an error.
pub fn read_header_block<R: BufRead>(reader: &mut R) -> Result<HeaderMap, MhtmlError> {
    let mut header = HeaderMap::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        reader.read_until(b'\n', &mut line)?;
        if line.last() != Some(&b'\n') {
            return Err(ParseErrorKind::UnexpectedEof.into());
        }

        let text = String::from_utf8_lossy(strip_line_break(&line)).into_owned();
        if text.is_empty() {
            return Ok(header);
        }

        if text.starts_with([' ', '\t']) {
            match header.fields.last_mut() {
                Some((_, value)) => {
                    let continuation = text.trim();
                    if !continuation.is_empty() {
                        if !value.is_empty() {
                            value.push(' ');
                        }
                        value.push_str(continuation);
                    }
                }
                None => return Err(ParseErrorKind::MalformedHeader(text).into()),
            }
            continue;
        }

        match text.split_once(':') {
            Some((name, value)) if is_field_name(name) => {
                header.append(name, value.trim());
            }
            _ => return Err(ParseErrorKind::MalformedHeader(text).into()),
        }
    }
}

fn strip_line_break(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

// RFC 5322 field names: printable ASCII except colon
fn is_field_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| (33..=126).contains(&b) && b != b':')
}
