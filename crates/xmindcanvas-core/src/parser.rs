use crate::model::{ImageResource, Sheet, TopicImage, TopicNode, Workbook};
use crate::{Error, Result};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::io::{Cursor, Read};
use uuid::Uuid;
use zip::ZipArchive;

const CONTENT_JSON: &str = "content.json";
const CONTENT_XML: &str = "content.xml";
const RESOURCES_PREFIX: &str = "resources/";

fn image_src_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:xap:)?resources/(.+)$").expect("valid regex"))
}

/// Ordered child-list shape matchers, tried at fixed precedence (first match
/// wins). A topic using none of these shapes yields zero children; that is a
/// documented limitation of the tolerated format, not an error.
type ChildShapeMatcher = fn(&Value) -> Option<&Vec<Value>>;

const CHILD_SHAPES: &[(&str, ChildShapeMatcher)] = &[
    ("children.attached", |topic| {
        topic.get("children")?.get("attached")?.as_array()
    }),
    ("children", |topic| topic.get("children")?.as_array()),
    ("attached", |topic| topic.get("attached")?.as_array()),
    ("topics", |topic| topic.get("topics")?.as_array()),
];

pub(crate) fn child_topics(topic: &Value) -> Option<(&'static str, &[Value])> {
    for (shape, matcher) in CHILD_SHAPES {
        if let Some(children) = matcher(topic) {
            return Some((shape, children.as_slice()));
        }
    }
    None
}

/// Coerces a scalar JSON value to text. Objects and arrays are not titles.
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Notes are accepted as `{ "plain": "..." }` (XMind Zen) or a bare string.
fn notes_value(topic: &Value) -> Option<String> {
    let notes = topic.get("notes")?;
    if let Some(plain) = notes.get("plain").and_then(Value::as_str) {
        return Some(plain.to_string());
    }
    notes.as_str().map(str::to_string)
}

/// Labels are accepted as an array of strings or a singleton string.
fn labels_value(topic: &Value) -> Option<Vec<String>> {
    let labels = topic.get("labels")?;
    if let Some(items) = labels.as_array() {
        let labels: Vec<String> = items.iter().filter_map(text_value).collect();
        return (!labels.is_empty()).then_some(labels);
    }
    labels.as_str().map(|s| vec![s.to_string()])
}

/// Markers are accepted as bare strings or `{ "markerId": "..." }` objects.
fn markers_value(topic: &Value) -> Option<Vec<String>> {
    let items = topic.get("markers")?.as_array()?;
    let markers: Vec<String> = items
        .iter()
        .filter_map(|m| {
            text_value(m).or_else(|| m.get("markerId").and_then(text_value))
        })
        .collect();
    (!markers.is_empty()).then_some(markers)
}

fn image_value(topic: &Value) -> Option<TopicImage> {
    let image = topic.get("image")?;
    let src = image.get("src")?.as_str()?;
    // Recognized only when the src points into the archive's resources folder
    // ("xap:resources/<name>" or "resources/<name>"); keep just the filename.
    let captures = image_src_regex().captures(src)?;
    Some(TopicImage {
        src: captures[1].to_string(),
        width: image.get("width").and_then(Value::as_f64),
        height: image.get("height").and_then(Value::as_f64),
    })
}

fn mime_type_for(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Parses XMind Zen archives (`content.json` + optional `resources/*`) into a
/// [`Workbook`].
///
/// Parsing is tolerant at item granularity: unreadable images, unknown image
/// extensions, and unrecognized child-list shapes are skipped with a log line.
/// Document-level problems (unreadable archive, unsupported content schema,
/// zero valid sheets) abort with an [`Error`] carrying the underlying cause.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookParser;

impl WorkbookParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Workbook> {
        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(|err| Error::Archive {
                message: err.to_string(),
            })?;

        let content = self.read_content(&mut archive)?;
        let images = self.extract_images(&mut archive);
        let sheets = self.extract_sheets(&content)?;

        Ok(Workbook { sheets, images })
    }

    fn read_content(&self, archive: &mut ZipArchive<Cursor<&[u8]>>) -> Result<Value> {
        let text = match read_entry_string(archive, CONTENT_JSON) {
            Some(text) => text,
            None => {
                // The legacy XML variant is recognized so the caller gets a
                // distinct message instead of a generic "nothing found".
                let message = if archive.by_name(CONTENT_XML).is_ok() {
                    format!(
                        "legacy {CONTENT_XML} document is not supported; re-save as XMind Zen ({CONTENT_JSON})"
                    )
                } else {
                    format!("no {CONTENT_JSON} or {CONTENT_XML} found in archive")
                };
                return Err(Error::UnsupportedFormat { message });
            }
        };

        serde_json::from_str(&text).map_err(|err| Error::UnsupportedFormat {
            message: format!("{CONTENT_JSON} is not valid JSON: {err}"),
        })
    }

    fn extract_sheets(&self, content: &Value) -> Result<Vec<Sheet>> {
        let Some(sheet_values) = content.as_array() else {
            return Err(Error::UnsupportedFormat {
                message: format!("{CONTENT_JSON} is not an array of sheets"),
            });
        };

        let mut sheets = Vec::new();
        for sheet in sheet_values {
            // Sheets without a root topic carry nothing to convert.
            let Some(root_topic) = sheet.get("rootTopic") else {
                tracing::debug!("skipping sheet without rootTopic");
                continue;
            };
            sheets.push(Sheet {
                id: sheet
                    .get("id")
                    .and_then(text_value)
                    .unwrap_or_else(generate_id),
                title: sheet
                    .get("title")
                    .and_then(text_value)
                    .unwrap_or_else(|| "Untitled Sheet".to_string()),
                root_topic: extract_topic(root_topic),
            });
        }

        if sheets.is_empty() {
            return Err(Error::EmptyDocument {
                message: "no valid sheets found in XMind file".to_string(),
            });
        }
        Ok(sheets)
    }

    fn extract_images(
        &self,
        archive: &mut ZipArchive<Cursor<&[u8]>>,
    ) -> IndexMap<String, ImageResource> {
        let mut images = IndexMap::new();

        let entry_names: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with(RESOURCES_PREFIX) && !name.ends_with('/'))
            .map(str::to_string)
            .collect();

        for entry_name in entry_names {
            let name = entry_name[RESOURCES_PREFIX.len()..].to_string();
            let Some(mime_type) = mime_type_for(&name) else {
                tracing::debug!(entry = %entry_name, "skipping resource with unrecognized extension");
                continue;
            };
            let Some(data) = read_entry_bytes(archive, &entry_name) else {
                tracing::warn!(entry = %entry_name, "failed to extract image resource");
                continue;
            };
            images.insert(
                name.clone(),
                ImageResource {
                    name,
                    data,
                    mime_type: mime_type.to_string(),
                },
            );
        }

        images
    }
}

/// Extracts one topic and its children from a raw JSON topic object.
///
/// Title precedence is `title` > `label` > `name` > `"Untitled"`.
fn extract_topic(topic: &Value) -> TopicNode {
    let title = ["title", "label", "name"]
        .iter()
        .find_map(|field| topic.get(*field).and_then(text_value))
        .unwrap_or_else(|| "Untitled".to_string());

    let children = match child_topics(topic) {
        Some((_, children)) => children.iter().map(extract_topic).collect(),
        None => {
            if topic.get("children").is_some() {
                tracing::debug!("topic has a children field in an unrecognized shape; treating as childless");
            }
            Vec::new()
        }
    };

    TopicNode {
        id: topic
            .get("id")
            .and_then(text_value)
            .unwrap_or_else(generate_id),
        title,
        children,
        notes: notes_value(topic),
        labels: labels_value(topic),
        markers: markers_value(topic),
        image: image_value(topic),
    }
}

/// Unique within one parse call (and beyond): a v4 UUID allocator.
fn generate_id() -> String {
    format!("node-{}", Uuid::new_v4().simple())
}

fn read_entry_string(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Option<String> {
    let mut entry = archive.by_name(name).ok()?;
    let mut text = String::new();
    entry.read_to_string(&mut text).ok()?;
    Some(text)
}

fn read_entry_bytes(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Option<Vec<u8>> {
    let mut entry = archive.by_name(name).ok()?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data).ok()?;
    Some(data)
}
