//! 多部分解码器
//!
//! 递归展开嵌套的 `multipart/*` 实体，按深度优先顺序产出叶子部分。
//! 顺序很重要：它参与缓存键的生成，且第一个 HTML 部分会被当作根文档。

use std::io::Cursor;

use tracing::debug;

use crate::core::{MhtmlError, ParseErrorKind};

use super::header::{read_header_block, HeaderMap};
use super::media_type::MediaType;
use super::transfer::TransferEncoding;

/// 缺少 Content-Type 时假定的类型
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// 完全解码后的叶子部分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub header: HeaderMap,
    pub body: Vec<u8>,
}

/// Decodes an entity into its flat, depth-first list of leaf parts
///
/// `max_depth` bounds the number of nested multipart levels. Any error aborts
/// the whole decode; no partial list is returned.
pub fn decode_parts(header: HeaderMap, body: &[u8], max_depth: usize) -> Result<Vec<Part>, MhtmlError> {
    let mut parts = Vec::new();
    decode_entity(header, body, 0, max_depth, &mut parts)?;
    Ok(parts)
}

fn decode_entity(
    mut header: HeaderMap,
    body: &[u8],
    depth: usize,
    max_depth: usize,
    parts: &mut Vec<Part>,
) -> Result<(), MhtmlError> {
    if !header.contains("Content-Type") {
        header.set("Content-Type", DEFAULT_CONTENT_TYPE);
    }
    let media_type: MediaType = header.get("Content-Type").unwrap_or_default().parse()?;

    if !media_type.is_multipart() {
        let encoding = TransferEncoding::from_header(header.get("Content-Transfer-Encoding"));
        let body = encoding.decode(body.to_vec())?;
        debug!(
            content_type = media_type.essence(),
            location = header.get("Content-Location").unwrap_or_default(),
            size = body.len(),
            "decoded part"
        );
        parts.push(Part { header, body });
        return Ok(());
    }

    if depth >= max_depth {
        return Err(ParseErrorKind::TooDeep(max_depth).into());
    }
    let boundary = media_type
        .param("boundary")
        .ok_or(ParseErrorKind::MissingBoundary)?;

    for entity in split_multipart(body, boundary)? {
        let mut cursor = Cursor::new(entity);
        let sub_header = read_header_block(&mut cursor)?;
        let sub_body = strip_trailing_line_break(&entity[cursor.position() as usize..]);
        decode_entity(sub_header, sub_body, depth + 1, max_depth, parts)?;
    }

    Ok(())
}

#[derive(PartialEq)]
enum Line {
    Delimiter,
    Close,
    Other,
}

/// Splits a multipart body into its raw sub-entities (header block plus body)
///
/// The preamble before the first delimiter and the epilogue after the close
/// delimiter are discarded. Each returned slice still ends with the line
/// break that precedes the next delimiter. A body without any delimiter has
/// no entities; a body that opens but never closes is an error.
pub fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<&'a [u8]>, ParseErrorKind> {
    let dash_boundary = format!("--{boundary}");
    let mut entities = Vec::new();
    let mut entity_start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |idx| pos + idx + 1);

        match classify_line(&body[pos..line_end], dash_boundary.as_bytes()) {
            Line::Delimiter => {
                if let Some(start) = entity_start {
                    entities.push(&body[start..pos]);
                }
                entity_start = Some(line_end);
            }
            Line::Close => {
                if let Some(start) = entity_start {
                    entities.push(&body[start..pos]);
                }
                return Ok(entities);
            }
            Line::Other => {}
        }

        pos = line_end;
    }

    match entity_start {
        Some(_) => Err(ParseErrorKind::UnterminatedMultipart),
        None => Ok(entities),
    }
}

fn classify_line(line: &[u8], dash_boundary: &[u8]) -> Line {
    let Some(rest) = line.strip_prefix(dash_boundary) else {
        return Line::Other;
    };

    // Transport padding after the delimiter is allowed
    let rest = trim_trailing(rest);
    if rest.is_empty() {
        Line::Delimiter
    } else if rest == b"--" {
        Line::Close
    } else {
        Line::Other
    }
}

fn trim_trailing(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .map_or(0, |idx| idx + 1);
    &bytes[..end]
}

// 分隔符前的换行属于分隔符本身
fn strip_trailing_line_break(body: &[u8]) -> &[u8] {
    if let Some(stripped) = body.strip_suffix(b"\r\n") {
        stripped
    } else {
        body.strip_suffix(b"\n").unwrap_or(body)
    }
}
