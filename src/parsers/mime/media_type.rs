use std::str::FromStr;

use crate::core::ParseErrorKind;

/// 解析后的 Content-Type：小写的 `type/subtype` 加参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    essence: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    /// Parses a Content-Type value such as `multipart/related; boundary="----x"`
    ///
    /// Type, subtype and parameter names are lowercased; parameter values are
    /// kept verbatim (quoted strings are unquoted). Duplicate parameters and
    /// parameters without a value are rejected.
    pub fn parse(value: &str) -> Result<Self, ParseErrorKind> {
        let invalid = || ParseErrorKind::InvalidContentType(value.to_string());

        let (essence, mut rest) = match value.find(';') {
            Some(idx) => (&value[..idx], &value[idx..]),
            None => (value, ""),
        };
        let (main_type, sub_type) = essence.trim().split_once('/').ok_or_else(invalid)?;
        if !is_token(main_type) || !is_token(sub_type) {
            return Err(invalid());
        }

        let mut params: Vec<(String, String)> = Vec::new();
        loop {
            rest = rest.trim_start_matches(|c: char| c == ';' || c.is_ascii_whitespace());
            if rest.is_empty() {
                break;
            }

            let eq = rest.find('=').ok_or_else(invalid)?;
            let name = rest[..eq].trim();
            if !is_token(name) {
                return Err(invalid());
            }
            rest = rest[eq + 1..].trim_start();

            let param_value = if let Some(quoted) = rest.strip_prefix('"') {
                let (unquoted, consumed) = read_quoted(quoted).ok_or_else(invalid)?;
                rest = &quoted[consumed..];
                unquoted
            } else {
                let end = rest
                    .find(|c: char| c == ';' || c.is_ascii_whitespace())
                    .unwrap_or(rest.len());
                let token = &rest[..end];
                if !is_token(token) {
                    return Err(invalid());
                }
                rest = &rest[end..];
                token.to_string()
            };

            // Only whitespace may separate a value from the next `;`
            let trimmed = rest.trim_start();
            if !trimmed.is_empty() && !trimmed.starts_with(';') {
                return Err(invalid());
            }

            let name = name.to_ascii_lowercase();
            if params.iter().any(|(existing, _)| *existing == name) {
                return Err(invalid());
            }
            params.push((name, param_value));
        }

        Ok(MediaType {
            essence: format!(
                "{}/{}",
                main_type.to_ascii_lowercase(),
                sub_type.to_ascii_lowercase()
            ),
            params,
        })
    }

    /// 小写的 `type/subtype`
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// 参数值（参数名不区分大小写）
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(param, _)| param.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_multipart(&self) -> bool {
        self.essence.starts_with("multipart/")
    }
}

impl FromStr for MediaType {
    type Err = ParseErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::parse(s)
    }
}

// Returns the unescaped content and the number of bytes consumed, closing quote included
fn read_quoted(input: &str) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut chars = input.char_indices();

    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Some((value, idx + 1)),
            '\\' => value.push(chars.next()?.1),
            _ => value.push(c),
        }
    }

    None
}

// RFC 2045 token: any printable ASCII except SPACE and tspecials
fn is_token(s: &str) -> bool {
    const TSPECIALS: &[u8] = b"()<>@,;:\\\"/[]?=";
    !s.is_empty()
        && s
            .bytes()
            .all(|b| (33..=126).contains(&b) && !TSPECIALS.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_and_params() {
        let media_type: MediaType =
            "Multipart/Related; type=\"text/html\"; BOUNDARY=\"----MultipartBoundary--abc----\""
                .parse()
                .unwrap();

        assert_eq!(media_type.essence(), "multipart/related");
        assert!(media_type.is_multipart());
        assert_eq!(media_type.param("type"), Some("text/html"));
        assert_eq!(
            media_type.param("boundary"),
            Some("----MultipartBoundary--abc----")
        );
    }

    #[test]
    fn token_values_and_trailing_semicolon() {
        let media_type = MediaType::parse("text/html; charset=GBK;").unwrap();
        assert_eq!(media_type.essence(), "text/html");
        assert_eq!(media_type.param("Charset"), Some("GBK"));
        assert!(!media_type.is_multipart());
    }

    #[test]
    fn quoted_escapes() {
        let media_type = MediaType::parse(r#"text/plain; name="a \"b\" c""#).unwrap();
        assert_eq!(media_type.param("name"), Some(r#"a "b" c"#));
    }

    #[test]
    fn rejects_malformed() {
        for value in [
            "",
            "text",
            "text/",
            "/html",
            "text html",
            "text/html; charset",
            "text/html; charset=\"utf-8",
            "text/html; charset=utf-8 junk",
            "text/html; a=1; A=2",
        ] {
            assert_eq!(
                MediaType::parse(value),
                Err(ParseErrorKind::InvalidContentType(value.to_string())),
                "{value:?} should be rejected"
            );
        }
    }
}
