//! Structured text components.
//!
//! Messages on most surfaces travel as a serialized component tree. The
//! pipeline only parses a tree when it has to (plain-text rendering,
//! attaching edit affordances); classification is just "does it parse".
//! Unknown keys survive round trips through a flattened map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::text::color;

/// A node inside a component's `extra` list: either bare text or a child
/// component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Text(String),
    Component(Component),
}

/// One structured text component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Component {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlined: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obfuscated: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<Node>,
    #[serde(rename = "hoverEvent", skip_serializing_if = "Option::is_none")]
    pub hover_event: Option<HoverEvent>,
    #[serde(rename = "clickEvent", skip_serializing_if = "Option::is_none")]
    pub click_event: Option<ClickEvent>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverEvent {
    pub action: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub action: String,
    pub value: String,
}

impl Component {
    /// A plain text component.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Concatenated plain text of this component and its children.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        if let Some(ref text) = self.text {
            out.push_str(text);
        }
        for node in &self.extra {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Component(child) => out.push_str(&child.plain_text()),
            }
        }
        out
    }
}

/// Parse serialized structured text into its top-level segments.
///
/// A top-level array yields one segment per element; a single object or
/// bare string yields one segment. Any other shape is rejected.
pub fn parse_components(raw: &str) -> Result<Vec<Component>, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    match value {
        Value::Array(items) => items.into_iter().map(component_from_value).collect(),
        other => Ok(vec![component_from_value(other)?]),
    }
}

fn component_from_value(value: Value) -> Result<Component, serde_json::Error> {
    match value {
        Value::String(text) => Ok(Component::text(text)),
        object @ Value::Object(_) => serde_json::from_value(object),
        other => Err(serde::de::Error::custom(format!(
            "expected a text component, got {}",
            other
        ))),
    }
}

/// Serialize top-level segments back to their wire form.
///
/// A single segment serializes as one object. Multiple segments serialize
/// as an array of independently serialized segments — never wrapped into a
/// parent component, which would shift the indices downstream consumers
/// rely on.
pub fn serialize_components(segments: &[Component]) -> Result<String, serde_json::Error> {
    if segments.len() == 1 {
        serde_json::to_string(&segments[0])
    } else {
        serde_json::to_string(segments)
    }
}

/// Convert legacy color-coded text into components.
///
/// Each color change starts a fresh segment and resets formatting; format
/// codes accumulate onto the current segment. Unknown codes pass through as
/// literal text.
pub fn from_legacy(text: &str) -> Vec<Component> {
    let chars: Vec<char> = text.chars().collect();
    let mut segments: Vec<Component> = Vec::new();
    let mut current = Component::default();
    let mut buf = String::new();
    let mut i = 0;

    let flush = |current: &Component, buf: &mut String, segments: &mut Vec<Component>| {
        if !buf.is_empty() {
            let mut segment = current.clone();
            segment.text = Some(std::mem::take(buf));
            segments.push(segment);
        }
    };

    while i < chars.len() {
        let c = chars[i];
        if c == color::SECTION && i + 1 < chars.len() {
            let code = chars[i + 1].to_ascii_lowercase();
            let recognized = match code {
                'k' | 'l' | 'm' | 'n' | 'o' | 'r' => true,
                _ => color::color_name(code).is_some(),
            };
            if !recognized {
                buf.push(c);
                buf.push(chars[i + 1]);
                i += 2;
                continue;
            }
            flush(&current, &mut buf, &mut segments);
            match code {
                'k' => current.obfuscated = Some(true),
                'l' => current.bold = Some(true),
                'm' => current.strikethrough = Some(true),
                'n' => current.underlined = Some(true),
                'o' => current.italic = Some(true),
                'r' => current = Component::default(),
                _ => {
                    current = Component {
                        color: color::color_name(code).map(str::to_string),
                        ..Component::default()
                    };
                }
            }
            i += 2;
        } else {
            buf.push(c);
            i += 1;
        }
    }

    if !buf.is_empty() || segments.is_empty() {
        current.text = Some(buf);
        segments.push(current);
    }
    segments
}

/// Attach the interactive-edit hover and click events to every segment.
pub fn attach_edit_events(segments: &mut [Component], command: &str) {
    let hover = HoverEvent {
        action: "show_text".to_string(),
        value: serde_json::json!([{
            "text": "Click to start editing this message.",
            "color": "gray",
        }]),
    };
    for segment in segments {
        segment.hover_event = Some(hover.clone());
        segment.click_event = Some(ClickEvent {
            action: "run_command".to_string(),
            value: command.to_string(),
        });
    }
}
