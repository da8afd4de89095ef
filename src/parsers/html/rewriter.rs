//! 资源引用改写
//!
//! 遍历文档，把 `img`、`link`、`script` 指向归档内资源的引用改写为缓存地址。
//! 每种元素的处理方式由 [`REWRITE_RULES`] 表描述：改写哪个属性、无条件删除哪些属性。

use std::collections::HashMap;

use markup5ever_rcdom::{Handle, NodeData};
use tracing::debug;

use super::dom::{get_node_attr, get_node_name, set_node_attr};

/// 单个元素的改写规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRule {
    pub element: &'static str,
    /// 保存资源地址的属性
    pub reference_attr: &'static str,
    /// 无论是否改写都要删除的属性
    pub stripped_attrs: &'static [&'static str],
}

/// `loading` 和 `srcset` 会让浏览器绕过改写后的 `src`
pub const REWRITE_RULES: &[RewriteRule] = &[
    RewriteRule {
        element: "img",
        reference_attr: "src",
        stripped_attrs: &["loading", "srcset"],
    },
    RewriteRule {
        element: "link",
        reference_attr: "href",
        stripped_attrs: &[],
    },
    RewriteRule {
        element: "script",
        reference_attr: "src",
        stripped_attrs: &[],
    },
];

pub fn rule_for(element: &str) -> Option<&'static RewriteRule> {
    REWRITE_RULES.iter().find(|rule| rule.element == element)
}

/// Repoints element references found in `reference_map` and returns how many were rewritten
///
/// Locators are matched verbatim. Elements whose locator is unknown keep their
/// reference; the stripped attributes are removed from every matching element.
pub fn rewrite_references(document: &Handle, reference_map: &HashMap<String, String>) -> usize {
    let mut rewritten = 0;
    let mut pending: Vec<Handle> = vec![document.clone()];

    while let Some(node) = pending.pop() {
        if let Some(rule) = get_node_name(&node).and_then(rule_for) {
            for attr in rule.stripped_attrs {
                set_node_attr(&node, attr, None);
            }

            if let Some(target) = get_node_attr(&node, rule.reference_attr)
                .and_then(|locator| reference_map.get(&locator))
            {
                debug!(element = rule.element, target = %target, "rewrote reference");
                set_node_attr(&node, rule.reference_attr, Some(target.clone()));
                rewritten += 1;
            }
        }

        // 逆序入栈以保持文档顺序
        pending.extend(node.children.borrow().iter().rev().cloned());

        // <template> 的内容在独立的文档片段中
        if let NodeData::Element {
            template_contents, ..
        } = &node.data
        {
            if let Some(fragment) = template_contents.borrow().as_ref() {
                pending.push(fragment.clone());
            }
        }
    }

    rewritten
}
