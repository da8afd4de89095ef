//! MIME 解析模块
//!
//! 将 MHTML 归档（RFC 2045/2046/2557 风格的多部分消息）拆解为扁平的叶子部分序列：
//!
//! - `header` - 头部集合与头部块读取
//! - `media_type` - Content-Type 解析
//! - `transfer` - 传输编码解码（base64、quoted-printable）
//! - `multipart` - 递归的多部分解码
//! - `trim` - 去除归档开头的零宽字符与空白

pub mod header;
pub mod media_type;
pub mod multipart;
pub mod transfer;
pub mod trim;

pub use header::{read_header_block, HeaderMap};
pub use media_type::MediaType;
pub use multipart::{decode_parts, split_multipart, Part, DEFAULT_CONTENT_TYPE};
pub use transfer::{decode_base64, decode_quoted_printable, TransferEncoding};
pub use trim::{trim_leading_noise, TrimLeadingReader};
