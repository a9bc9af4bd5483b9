//! YAML frontmatter split and join.
//!
//! A document has frontmatter when it starts with `---\n` and a later line
//! is exactly `---`. Everything between the fences is YAML; everything after
//! the closing fence, trimmed, is the body. Without both fences the whole
//! content is the body.

use strata_types::{JsonObject, JsonValue};

use crate::error::{ResourceError, ResourceResult};

const FENCE: &str = "---";
const OPEN_FENCE: &str = "---\n";

/// A markdown document split into frontmatter and body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkdownDoc {
    pub frontmatter: JsonObject,
    pub body: String,
}

impl MarkdownDoc {
    /// `frontmatter[key]` if it is a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.frontmatter.get(key).and_then(JsonValue::as_str)
    }
}

/// Splits resource content into frontmatter and body.
pub trait FrontmatterParser: Send + Sync {
    fn parse(&self, content: &str) -> ResourceResult<MarkdownDoc>;

    fn serialize(&self, doc: &MarkdownDoc) -> String {
        serialize_markdown(doc)
    }
}

/// Default parser, backed by `serde_yaml`.
#[derive(Clone, Copy, Debug, Default)]
pub struct YamlFrontmatter;

impl FrontmatterParser for YamlFrontmatter {
    fn parse(&self, content: &str) -> ResourceResult<MarkdownDoc> {
        let Some((yaml, after)) = split_fences(content) else {
            return Ok(MarkdownDoc {
                frontmatter: JsonObject::new(),
                body: content.to_string(),
            });
        };

        let frontmatter = if yaml.trim().is_empty() {
            JsonObject::new()
        } else {
            match serde_yaml::from_str::<JsonValue>(yaml) {
                Ok(JsonValue::Object(map)) => map,
                Ok(JsonValue::Null) => JsonObject::new(),
                Ok(_) => return Err(ResourceError::Frontmatter("expected a mapping".into())),
                Err(e) => return Err(ResourceError::Frontmatter(e.to_string())),
            }
        };

        Ok(MarkdownDoc {
            frontmatter,
            body: after.trim().to_string(),
        })
    }
}

/// Locate the fences. Returns `(yaml, rest_after_closing_fence)`.
fn split_fences(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix(OPEN_FENCE)?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let end = offset + line.len();
        if line.strip_suffix('\n').unwrap_or(line) == FENCE {
            return Some((&rest[..offset], &rest[end..]));
        }
        offset = end;
    }
    None
}

/// Join frontmatter and body back into markdown.
///
/// Empty frontmatter yields the body unchanged; otherwise
/// `---\n<yaml>---\n<body>`.
pub fn serialize_markdown(doc: &MarkdownDoc) -> String {
    if doc.frontmatter.is_empty() {
        return doc.body.clone();
    }
    match serde_yaml::to_string(&doc.frontmatter) {
        Ok(yaml) => format!("{OPEN_FENCE}{yaml}{OPEN_FENCE}{}", doc.body),
        Err(_) => doc.body.clone(),
    }
}

/// Keep at most `max_lines` lines of `body`, marking a cut with `\n...`.
pub fn truncate_body(body: &str, max_lines: usize) -> String {
    if max_lines == 0 {
        return String::new();
    }
    let lines: Vec<&str> = body.split('\n').collect();
    if lines.len() <= max_lines {
        return body.to_string();
    }
    format!("{}\n...", lines[..max_lines].join("\n"))
}
