//! # 解析器模块
//!
//! - `mime` - MHTML 归档的 MIME 结构解析与传输编码解码
//! - `html` - HTML 文档解析、引用改写与序列化

pub mod html;
pub mod mime;

// Re-export commonly used items for convenience
pub use html::{html_to_dom, rewrite_references, serialize_document};
pub use mime::{decode_parts, read_header_block, HeaderMap, MediaType, Part, TransferEncoding};
