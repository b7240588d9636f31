//! Outbound message formatting: color tokens, wrapping and the color envelope.

use crate::color;
use serde::Serialize;
use telnet_framing::options::mxp;

pub const DEFAULT_LINE_ENDING: &str = "\r\n";

/// How a message should be rendered for one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOptions {
    pub line_ending: String,
    /// Color directives applied to the whole message, in order
    pub colors: Vec<String>,
    pub no_wrap: bool,
}

impl Default for MessageOptions {
    fn default() -> Self {
        Self {
            line_ending: DEFAULT_LINE_ENDING.to_string(),
            colors: Vec::new(),
            no_wrap: false,
        }
    }
}

impl MessageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, name: impl Into<String>) -> Self {
        self.colors.push(name.into());
        self
    }

    pub fn colors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn line_ending(mut self, ending: impl Into<String>) -> Self {
        self.line_ending = ending.into();
        self
    }

    pub fn no_wrap(mut self) -> Self {
        self.no_wrap = true;
        self
    }
}

/// Split text into chunks of at most `width` characters
///
/// Splits on character boundaries, never inside a UTF-8 sequence. A width of
/// zero disables wrapping.
pub fn wrap(text: &str, width: usize) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    if width == 0 {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    for (count, (index, _)) in text.char_indices().enumerate() {
        if count > 0 && count % width == 0 {
            chunks.push(&text[start..index]);
            start = index;
        }
    }
    chunks.push(&text[start..]);
    chunks
}

/// Render a message into the exact string sent to a client
pub fn format_message(
    text: &str,
    options: &MessageOptions,
    color_enabled: bool,
    wrap_width: usize,
) -> String {
    let text = color::substitute(text, color_enabled);
    let body = if options.no_wrap {
        text
    } else {
        wrap(&text, wrap_width).join(&options.line_ending)
    };

    if !color_enabled {
        return format!("{body}{}", options.line_ending);
    }

    let prefix: String = options
        .colors
        .iter()
        .filter_map(|name| color::color_code(name))
        .collect();
    format!("{prefix}{body}{}{}", options.line_ending, color::reset())
}

/// Room description pushed over GMCP as `Room.Info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomInfo {
    pub num: i64,
    pub name: String,
    pub zone: String,
    pub terrain: String,
    pub details: String,
    pub exits: serde_json::Value,
    #[serde(rename = "coord")]
    pub coords: serde_json::Value,
}

/// MXP `<send>` links for a list of items, joined by ", "
pub fn mxp_item_links(items: &[impl AsRef<str>], command: &str) -> String {
    items
        .iter()
        .map(|item| {
            let item = item.as_ref();
            mxp::send_link(command, mxp::link_target(item), item)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
