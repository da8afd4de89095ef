use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::sync::Arc;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::Resource;
use crate::env::{self, EnvError, EnvVar};
use crate::parsers::html::{
    get_charset, html_to_dom, rewrite_references, serialize_document, set_charset,
};
use crate::parsers::mime::{decode_parts, read_header_block, MediaType, Part, TrimLeadingReader};

/// Represents errors that can occur while converting a web archive
///
/// Every failure is fatal to the conversion in progress; nothing is cached
/// for an archive whose conversion returned an error.
#[derive(Debug, Error)]
pub enum MhtmlError {
    /// Opening or reading the archive failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A transfer-encoded payload was malformed
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The MIME structure of the archive could not be parsed
    #[error("parse error: {0}")]
    Parse(#[from] ParseErrorKind),

    /// A decoded part carries no Content-Type value
    #[error("no Content-Type found for MIME entity")]
    MissingContentType,

    /// No `text/html` part exists anywhere in the archive
    #[error("html not found")]
    HtmlNotFound,

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] EnvError),
}

impl MhtmlError {
    /// Stable short name of the error kind, suitable for logs and status mapping
    pub fn kind_name(&self) -> &'static str {
        match self {
            MhtmlError::Io(_) => "io",
            MhtmlError::Decode(_) => "decode",
            MhtmlError::Parse(kind) => kind.name(),
            MhtmlError::MissingContentType => "missing_content_type",
            MhtmlError::HtmlNotFound => "html_not_found",
            MhtmlError::Config(_) => "config",
        }
    }
}

/// Structural MIME failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid content-type [{0}]")]
    InvalidContentType(String),

    #[error("no boundary found for multipart entity")]
    MissingBoundary,

    #[error("malformed MIME header line: {0}")]
    MalformedHeader(String),

    #[error("unexpected end of input while reading MIME header")]
    UnexpectedEof,

    #[error("multipart body has no closing boundary")]
    UnterminatedMultipart,

    #[error("multipart nesting exceeds {0} levels")]
    TooDeep(usize),
}

impl ParseErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ParseErrorKind::InvalidContentType(_) => "invalid_content_type",
            ParseErrorKind::MissingBoundary => "missing_boundary",
            ParseErrorKind::MalformedHeader(_) => "malformed_header",
            ParseErrorKind::UnexpectedEof => "unexpected_eof",
            ParseErrorKind::UnterminatedMultipart => "unterminated_multipart",
            ParseErrorKind::TooDeep(_) => "too_deep",
        }
    }
}

/// Malformed content-transfer-encoded payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid quoted-printable escape at byte {offset}")]
    QuotedPrintable { offset: usize },
}

pub type Result<T> = std::result::Result<T, MhtmlError>;

/// Configuration options for archive conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MhtmlOptions {
    /// URL path under which cached resources are served, e.g. `/mhtml-resources`
    pub resource_prefix: String,
    /// Maximum number of nested multipart levels
    pub max_depth: usize,
}

impl Default for MhtmlOptions {
    fn default() -> Self {
        MhtmlOptions {
            resource_prefix: MHTML_RESOURCE_PREFIX.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MhtmlOptions {
    /// Loads options from `MHTML_*` environment variables, falling back to defaults
    pub fn from_env() -> std::result::Result<Self, EnvError> {
        Ok(MhtmlOptions {
            resource_prefix: env::archive::ResourcePrefix::get()?,
            max_depth: env::archive::MaxDepth::get()?,
        })
    }
}

/// Default URL path prefix for rewritten resource references
pub const MHTML_RESOURCE_PREFIX: &str = "/mhtml-resources";
pub const DEFAULT_MAX_DEPTH: usize = 16;

// Everything outside of RFC 3986 unreserved/sub-delims that would break a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Output of one archive conversion, ready to be committed to the cache
#[derive(Debug, Clone)]
pub struct ConvertedArchive {
    /// Rewritten root document, to be stored under the archive path
    pub html: Resource,
    /// Auxiliary resources keyed by their synthesized cache keys, in part order
    pub resources: Vec<(String, Resource)>,
    /// Number of element references repointed at cached resources
    pub rewritten: usize,
}

/// Returns the final segment of a path, splitting on both `/` and `\`
pub fn last_path_segment(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Returns the last path segment of an archive path with any `#` suffix removed
///
/// `#` would otherwise be read as a fragment marker once the key ends up in a URL.
pub fn uri_base(archive_path: &str) -> &str {
    let segment = last_path_segment(archive_path);
    match segment.find('#') {
        Some(idx) => &segment[..idx],
        None => segment,
    }
}

/// Synthesizes the cache key of an auxiliary part
pub fn resource_key(uri_base: &str, part_index: usize, content_location: &str) -> String {
    format!(
        "{}@{}-{}",
        uri_base,
        part_index,
        last_path_segment(content_location)
    )
}

/// Composes the URL path under which a cache key is served
pub fn resource_url(resource_prefix: &str, key: &str) -> String {
    format!(
        "{}/{}",
        resource_prefix.trim_end_matches('/'),
        utf8_percent_encode(key, PATH_SEGMENT)
    )
}

/// Maps a request path produced by [`resource_url`] back to its cache key
pub fn resource_key_from_path(resource_prefix: &str, path: &str) -> Option<String> {
    let escaped = path
        .strip_prefix(resource_prefix.trim_end_matches('/'))?
        .strip_prefix('/')?;

    if escaped.is_empty() {
        return None;
    }

    percent_decode_str(escaped)
        .decode_utf8()
        .ok()
        .map(|key| key.into_owned())
}

/// Reads and converts the archive stored at `archive_path`
///
/// The file is read in full; the cache is not touched.
pub fn parse_archive_file(archive_path: &str, options: &MhtmlOptions) -> Result<ConvertedArchive> {
    let file = File::open(archive_path)?;
    parse_archive(file, archive_path, options)
}

/// Converts an archive read from `input`
///
/// `archive_path` only names the archive: it determines the cache keys of
/// auxiliary resources.
pub fn parse_archive<R: Read>(
    input: R,
    archive_path: &str,
    options: &MhtmlOptions,
) -> Result<ConvertedArchive> {
    let mut reader = BufReader::new(TrimLeadingReader::new(input));
    let header = read_header_block(&mut reader)?;

    let mut body = Vec::new();
    reader.read_to_end(&mut body)?;

    let parts = decode_parts(header, &body, options.max_depth)?;
    debug!(archive = archive_path, parts = parts.len(), "decoded MIME parts");

    assemble_archive(parts, archive_path, options)
}

/// Separates the root document from auxiliary parts and rewrites its references
pub fn assemble_archive(
    parts: Vec<Part>,
    archive_path: &str,
    options: &MhtmlOptions,
) -> Result<ConvertedArchive> {
    let uri_base = uri_base(archive_path);
    let mut html: Option<(Part, MediaType)> = None;
    let mut resources: Vec<(String, Resource)> = Vec::new();
    let mut reference_map: HashMap<String, String> = HashMap::new();

    for (index, part) in parts.into_iter().enumerate() {
        let content_type = match part.header.get("Content-Type").map(str::trim) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => return Err(MhtmlError::MissingContentType),
        };
        let media_type: MediaType = content_type.parse()?;

        if html.is_none() && media_type.essence() == "text/html" {
            html = Some((part, media_type));
            continue;
        }

        let location = part.header.get("Content-Location").unwrap_or_default().trim();
        let key = resource_key(uri_base, index, location);
        let url = resource_url(&options.resource_prefix, &key);

        if location.is_empty() {
            warn!(
                archive = archive_path,
                index, "part has no Content-Location; cached but unreferenced"
            );
        } else {
            reference_map.insert(location.to_string(), url.clone());
        }

        if let Some(content_id) = part.header.get("Content-ID") {
            let content_id = content_id.trim().trim_start_matches('<').trim_end_matches('>');
            if !content_id.is_empty() {
                reference_map.insert(format!("cid:{content_id}"), url);
            }
        }

        if media_type.essence() == "text/html" {
            debug!(archive = archive_path, index, key = %key, "secondary html part cached as resource");
        }

        resources.push((
            key,
            Resource {
                content_type,
                content: Arc::from(part.body),
            },
        ));
    }

    let (html_part, html_media_type) = html.ok_or(MhtmlError::HtmlNotFound)?;
    let (document, rewritten) = rewrite_document(&html_part.body, &html_media_type, &reference_map)?;

    Ok(ConvertedArchive {
        html: Resource {
            content_type: "text/html".to_string(),
            content: Arc::from(document),
        },
        resources,
        rewritten,
    })
}

// 解析根文档、重写引用并以 UTF-8 序列化
fn rewrite_document(
    data: &[u8],
    media_type: &MediaType,
    reference_map: &HashMap<String, String>,
) -> Result<(Vec<u8>, usize)> {
    let mut document_encoding = media_type
        .param("charset")
        .map(str::to_string)
        .unwrap_or_default();
    let mut dom = html_to_dom(data, &document_encoding)?;

    // 未声明字符集时，参考文档内的 META 声明
    if document_encoding.is_empty() {
        if let Some(charset) = get_charset(&dom.document) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                if encoding != encoding_rs::UTF_8 {
                    dom = html_to_dom(data, &charset)?;
                }
            }
            document_encoding = charset;
        }
    }

    let is_utf8 = encoding_rs::Encoding::for_label(document_encoding.as_bytes())
        .map_or(true, |encoding| encoding == encoding_rs::UTF_8);
    if !is_utf8 {
        dom = set_charset(dom, "utf-8");
    }

    let rewritten = rewrite_references(&dom.document, reference_map);
    let serialized = serialize_document(dom)?;

    Ok((serialized, rewritten))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments() {
        assert_eq!(last_path_segment("C:\\docs\\page.mhtml"), "page.mhtml");
        assert_eq!(last_path_segment("/srv/a/b/page.mht"), "page.mht");
        assert_eq!(last_path_segment("https://x.test/img/a.png#frag"), "a.png#frag");
        assert_eq!(last_path_segment("plain"), "plain");
        assert_eq!(last_path_segment(""), "");
    }

    #[test]
    fn uri_base_drops_fragment() {
        assert_eq!(uri_base("/tmp/notes#2.mhtml"), "notes");
        assert_eq!(uri_base("D:/saved/page.mhtml"), "page.mhtml");
    }

    #[test]
    fn key_format() {
        assert_eq!(
            resource_key("page.mhtml", 3, "https://x.test/static/app.css"),
            "page.mhtml@3-app.css"
        );
        assert_eq!(resource_key("page.mhtml", 0, ""), "page.mhtml@0-");
    }

    #[test]
    fn env_errors_become_config_errors() {
        let err: MhtmlError = env::archive::MaxDepth::parse("0").unwrap_err().into();
        assert!(matches!(&err, MhtmlError::Config(e) if e.variable == "MHTML_MAX_DEPTH"));
        assert_eq!(err.kind_name(), "config");
    }

    #[test]
    fn url_roundtrip_keeps_odd_characters() {
        let key = "my page#1.mhtml@2-a b?.png";
        let url = resource_url("/mhtml-resources", key);
        assert_eq!(url, "/mhtml-resources/my%20page%231.mhtml@2-a%20b%3F.png");
        assert_eq!(
            resource_key_from_path("/mhtml-resources", &url).as_deref(),
            Some(key)
        );
        assert_eq!(resource_key_from_path("/mhtml-resources", "/other/x"), None);
        assert_eq!(resource_key_from_path("/mhtml-resources", "/mhtml-resources/"), None);
    }
}
