// 集成测试公共模块
//
// 构造 MHTML 测试归档并写入临时目录

#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const BOUNDARY: &str = "----MultipartBoundary--Yh0Vb4tG0wC7--";

/// 单个 MIME 部分
pub struct TestPart {
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub encoding: Option<String>,
    pub extra_headers: Vec<String>,
    pub body: String,
}

impl TestPart {
    pub fn new(content_type: &str, body: &str) -> Self {
        Self {
            content_type: Some(content_type.to_string()),
            location: None,
            encoding: None,
            extra_headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn encoding(mut self, encoding: &str) -> Self {
        self.encoding = Some(encoding.to_string());
        self
    }

    pub fn header(mut self, line: &str) -> Self {
        self.extra_headers.push(line.to_string());
        self
    }

    pub fn without_content_type(mut self) -> Self {
        self.content_type = None;
        self
    }

    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(content_type) = &self.content_type {
            out.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        if let Some(encoding) = &self.encoding {
            out.push_str(&format!("Content-Transfer-Encoding: {encoding}\r\n"));
        }
        if let Some(location) = &self.location {
            out.push_str(&format!("Content-Location: {location}\r\n"));
        }
        for line in &self.extra_headers {
            out.push_str(line);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.push_str(&self.body);
        out
    }
}

/// 多部分归档构造器
pub struct ArchiveBuilder {
    boundary: String,
    media_type: String,
    parts: Vec<TestPart>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::with_boundary(BOUNDARY)
    }

    pub fn with_boundary(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_string(),
            media_type: "multipart/related".to_string(),
            parts: Vec::new(),
        }
    }

    pub fn media_type(mut self, media_type: &str) -> Self {
        self.media_type = media_type.to_string();
        self
    }

    pub fn part(mut self, part: TestPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Content-Type 值（含 boundary 参数）
    pub fn content_type(&self) -> String {
        format!("{}; boundary=\"{}\"", self.media_type, self.boundary)
    }

    /// 仅多部分正文，可嵌入另一个归档
    pub fn body(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            out.push_str(&format!("--{}\r\n", self.boundary));
            out.push_str(&part.render());
            out.push_str("\r\n");
        }
        out.push_str(&format!("--{}--\r\n", self.boundary));
        out
    }

    /// 作为嵌套部分使用
    pub fn into_part(self) -> TestPart {
        let content_type = self.content_type();
        TestPart::new(&content_type, &self.body())
    }

    /// 完整归档，带 Blink 风格的根头部
    pub fn build(&self) -> String {
        format!(
            "From: <Saved by Blink>\r\n\
             Snapshot-Content-Location: https://example.test/article\r\n\
             Subject: Test Article\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: {};\r\n\
             \ttype=\"text/html\";\r\n\
             \tboundary=\"{}\"\r\n\
             \r\n\
             \r\n\
             {}",
            self.media_type,
            self.boundary,
            self.body()
        )
    }
}

/// 典型的网页归档：HTML + 样式表 + 图片 + 脚本
pub fn sample_archive() -> ArchiveBuilder {
    ArchiveBuilder::new()
        .part(
            TestPart::new("text/html", SAMPLE_HTML_QP)
                .encoding("quoted-printable")
                .location("https://example.test/article"),
        )
        .part(
            TestPart::new("text/css", "body { color: red; }")
                .location("https://example.test/static/site.css"),
        )
        .part(
            TestPart::new("image/png", "iVBORw0KGgo=")
                .encoding("base64")
                .location("https://example.test/img/logo.png"),
        )
        .part(
            TestPart::new("application/javascript", "console.log(1);")
                .location("https://example.test/js/app.js"),
        )
}

pub const SAMPLE_HTML_QP: &str = "<!DOCTYPE html><html><head>\
<link rel=3D\"stylesheet\" href=3D\"https://example.test/static/site.css\">\
<script src=3D\"https://example.test/js/app.js\"></script>\
<script src=3D\"https://cdn.example.test/missing.js\"></script>\
</head><body><h1>Caf=C3=A9</h1>=\r\n\
<img src=3D\"https://example.test/img/logo.png\" loading=3D\"lazy\" srcset=3D\"https://example.test/img/logo@2x.png 2x\">\
<img src=3D\"https://example.test/img/elsewhere.png\">\
</body></html>";

/// 将归档写入目录并返回路径字符串
pub fn write_archive(dir: &Path, name: &str, contents: &[u8]) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write test archive");
    path.to_str().expect("utf-8 temp path").to_string()
}
