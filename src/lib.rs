//! # mhtml-view
//!
//! 将 MHTML 网页归档（把 HTML 页面与其图片、样式表、脚本打包成一个嵌套的
//! MIME 多部分消息）转换为可直接提供的 HTML 文档，以及一组可按键寻址的资源。
//!
//! ## 模块组织
//!
//! - `core` - 错误类型、转换选项与归档转换流程
//! - `session` - 持有共享缓存的会话，服务层的入口
//! - `cache` - 进程内资源缓存
//! - `parsers` - MIME 与 HTML 解析器
//! - `env` - 环境变量配置

pub mod cache;
pub mod core;
pub mod env;
pub mod parsers;
pub mod session;

// Re-export commonly used items for convenience
pub use cache::{Resource, ResourceCache};
pub use crate::core::{
    assemble_archive, last_path_segment, parse_archive, parse_archive_file, resource_key,
    resource_key_from_path, resource_url, uri_base, ConvertedArchive, DecodeError, MhtmlError,
    MhtmlOptions, ParseErrorKind, Result, MHTML_RESOURCE_PREFIX,
};
pub use session::{ArchiveReport, Session};
