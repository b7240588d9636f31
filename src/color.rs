use crossterm::style::{Attribute, SetAttribute};

/// Every name usable as a `%name` token or a color directive
pub const COLOR_NAMES: &[&str] = &[
    "resetall",
    "reset",
    "bold",
    "boldoff",
    "underline",
    "underlineoff",
    "blink",
    "blinkoff",
    "reverse",
    "reverseoff",
    "black",
    "red",
    "green",
    "yellow",
    "blue",
    "magenta",
    "cyan",
    "white",
];

/// Escape sequence for a color or attribute name, `None` if unknown
pub fn color_code(name: &str) -> Option<String> {
    let attribute = match name {
        "resetall" | "reset" => Attribute::Reset,
        "bold" => Attribute::Bold,
        "boldoff" => Attribute::NormalIntensity,
        "underline" => Attribute::Underlined,
        "underlineoff" => Attribute::NoUnderline,
        "blink" => Attribute::SlowBlink,
        "blinkoff" => Attribute::NoBlink,
        "reverse" => Attribute::Reverse,
        "reverseoff" => Attribute::NoReverse,
        _ => return foreground(name).map(|code| format!("\x1b[{code}m")),
    };
    Some(SetAttribute(attribute).to_string())
}

/// Basic 8-color SGR foreground parameter (30-37)
///
/// crossterm renders its named colors as 256-color `38;5;N`, which older MUD
/// clients do not understand.
fn foreground(name: &str) -> Option<u8> {
    Some(match name {
        "black" => 30,
        "red" => 31,
        "green" => 32,
        "yellow" => 33,
        "blue" => 34,
        "magenta" => 35,
        "cyan" => 36,
        "white" => 37,
        _ => return None,
    })
}

/// The sequence that clears all colors and attributes
pub fn reset() -> String {
    SetAttribute(Attribute::Reset).to_string()
}

/// Replace inline `%name` tokens
///
/// With `enabled` the token becomes its escape sequence, otherwise it is
/// removed. A single space directly after a token is part of the token, so
/// `"Welcome %bold Bob"` reads naturally either way. A `%` that does not
/// start a known name is left alone.
pub fn substitute(text: &str, enabled: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let word_len = after
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(after.len());

        match longest_name(&after[..word_len]) {
            Some(name) => {
                if enabled {
                    out.push_str(&color_code(name).unwrap_or_default());
                }
                let mut tail = &after[name.len()..];
                if name.len() == word_len {
                    tail = tail.strip_prefix(' ').unwrap_or(tail);
                }
                rest = tail;
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn longest_name(word: &str) -> Option<&'static str> {
    COLOR_NAMES
        .iter()
        .copied()
        .filter(|name| word.starts_with(name))
        .max_by_key(|name| name.len())
}
