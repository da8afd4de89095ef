//! HTML 处理模块
//!
//! - `dom`: 基础DOM操作
//! - `metadata`: 文档字符集声明
//! - `rewriter`: 将资源引用改写为缓存地址
//! - `serializer`: 序列化功能

pub mod dom;
pub mod metadata;
pub mod rewriter;
pub mod serializer;

pub use dom::{find_nodes, get_node_attr, get_node_name, html_to_dom, set_node_attr};
pub use metadata::{get_charset, set_charset};
pub use rewriter::{rewrite_references, rule_for, RewriteRule, REWRITE_RULES};
pub use serializer::serialize_document;
