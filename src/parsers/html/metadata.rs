//! 文档字符集元数据
//!
//! 读取并改写 `<meta charset>` 与 `<meta http-equiv="content-type">` 声明。

use std::rc::Rc;

use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::format_tendril;
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, RcDom};

use crate::parsers::mime::MediaType;

use super::dom::{find_nodes, get_node_attr, set_node_attr};

/// 获取文档声明的字符集
pub fn get_charset(node: &Handle) -> Option<String> {
    for meta_node in find_nodes(node, &["html", "head", "meta"]).iter() {
        if let Some(meta_charset_node_attr_value) = get_node_attr(meta_node, "charset") {
            // 处理 <meta charset="..." /> 格式
            return Some(meta_charset_node_attr_value);
        }

        if get_node_attr(meta_node, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
        {
            // 处理 <meta http-equiv="content-type" content="text/html; charset=..." /> 格式
            let charset = get_node_attr(meta_node, "content")
                .and_then(|content| MediaType::parse(&content).ok())
                .and_then(|media_type| media_type.param("charset").map(str::to_string));
            if charset.is_some() {
                return charset;
            }
        }
    }

    None
}

/// 设置文档字符集声明，没有声明时在 HEAD 中添加
pub fn set_charset(dom: RcDom, charset: &str) -> RcDom {
    for meta_node in find_nodes(&dom.document, &["html", "head", "meta"]).iter() {
        // 检查是否有 HTML5 格式的 charset 属性
        if get_node_attr(meta_node, "charset").is_some() {
            set_node_attr(meta_node, "charset", Some(charset.to_string()));
            return dom;
        }

        // 检查是否有 HTML4 格式的 http-equiv content-type 标签
        if get_node_attr(meta_node, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
            && get_node_attr(meta_node, "content").is_some()
        {
            set_node_attr(
                meta_node,
                "content",
                Some(format!("text/html;charset={charset}")),
            );
            return dom;
        }
    }

    // 手动在 HEAD 中添加 charset META 节点
    let meta_charset_node: Handle = create_element(
        &dom,
        QualName::new(None, ns!(), LocalName::from("meta")),
        vec![Attribute {
            name: QualName::new(None, ns!(), LocalName::from("charset")),
            value: format_tendril!("{}", charset),
        }],
    );

    if let Some(head_node) = find_nodes(&dom.document, &["html", "head"]).first() {
        meta_charset_node.parent.set(Some(Rc::downgrade(head_node)));
        head_node.children.borrow_mut().insert(0, meta_charset_node);
    }

    dom
}
