use std::io;
use std::rc::Rc;

use html5ever::serialize::{serialize, SerializeOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

/// 将 DOM 序列化为 UTF-8 HTML
pub fn serialize_document(dom: RcDom) -> io::Result<Vec<u8>> {
    inline_template_contents(&dom.document);

    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = dom.document.into();
    serialize(&mut buf, &serializable, SerializeOpts::default())?;
    Ok(buf)
}

/// Moves each `<template>` fragment back under its element
///
/// The serializer only follows `children`, so template content would
/// otherwise be written out as an empty element.
fn inline_template_contents(document: &Handle) {
    let mut pending: Vec<Handle> = vec![document.clone()];

    while let Some(node) = pending.pop() {
        if let NodeData::Element {
            template_contents, ..
        } = &node.data
        {
            if let Some(fragment) = template_contents.borrow_mut().take() {
                let moved = fragment.children.take();
                for child in &moved {
                    child.parent.set(Some(Rc::downgrade(&node)));
                }
                node.children.borrow_mut().extend(moved);
            }
        }

        pending.extend(node.children.borrow().iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::html_to_dom;

    #[test]
    fn keeps_template_content() {
        let dom = html_to_dom(
            br#"<body><template id="card"><p>inside</p><template><b>deep</b></template></template></body>"#,
            "utf-8",
        )
        .unwrap();

        let html = String::from_utf8(serialize_document(dom).unwrap()).unwrap();

        assert!(html.contains(
            r#"<template id="card"><p>inside</p><template><b>deep</b></template></template>"#
        ));
    }
}
