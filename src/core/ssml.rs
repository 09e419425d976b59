//! SSML text engine.
//!
//! Pure string functions that escape plain text, inspect the `<speak>` root
//! and embed prosody (volume, pitch, rate) into markup. Only the `<speak>`
//! root and `<prosody>` children are manipulated; no SSML grammar is parsed.
//!
//! Attribute values are always written with exactly three decimals:
//! `<prosody volume="6.000dB" pitch="-5.000%" rate="110.000%">`.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::options::{Prosody, TextType};

/// Root element opening-tag prefix (attributes may follow).
pub const ROOT_OPEN_PREFIX: &str = "<speak";

/// Root element closing tag.
pub const ROOT_CLOSE: &str = "</speak>";

const PROSODY_OPEN_PREFIX: &str = "<prosody";
const PROSODY_CLOSE: &str = "</prosody>";

// =============================================================================
// Strategy
// =============================================================================

/// How prosody is embedded into text that is already SSML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProsodyStrategy {
    /// Wrap the existing body in a new `<prosody>` element
    #[default]
    #[serde(rename = "nested")]
    Nested,
    /// Fuse values into a leading `<prosody>` element's attributes,
    /// falling back to nesting when the body does not start with one
    #[serde(rename = "fused")]
    Fused,
}

impl ProsodyStrategy {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nested => "nested",
            Self::Fused => "fused",
        }
    }

    /// Parse from string, with fallback to Nested.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fused" | "fuse" | "attributes" => Self::Fused,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for ProsodyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Escaping and Tag Inspection
// =============================================================================

/// Escape the five XML reserved characters.
///
/// `&` goes first so entities produced by later substitutions are not
/// escaped twice.
pub fn escape_for_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// True when the trimmed text starts with a `<speak>` opening tag and ends
/// with `</speak>`.
pub fn has_root_tag(text: &str) -> bool {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(ROOT_OPEN_PREFIX) else {
        return false;
    };
    let opens_root = rest
        .chars()
        .next()
        .is_some_and(|c| c == '>' || c.is_whitespace());
    opens_root && trimmed.ends_with(ROOT_CLOSE)
}

/// The text from the start through the first `>`, inclusive.
///
/// Callers must pass text that contains a tag; without a `>` the input is
/// returned unchanged.
pub fn opening_tag(text: &str) -> &str {
    match text.find('>') {
        Some(end) => &text[..=end],
        None => text,
    }
}

/// Remove a trailing `</speak>`.
pub fn strip_closing_root_tag(text: &str) -> &str {
    text.trim_end().strip_suffix(ROOT_CLOSE).unwrap_or(text)
}

/// Remove everything through the first `>`.
pub fn strip_opening_tag(text: &str) -> &str {
    match text.find('>') {
        Some(end) => &text[end + 1..],
        None => text,
    }
}

// =============================================================================
// Composition
// =============================================================================

/// Build the `<prosody>` opening tag. Pitch and rate are converted to
/// percentages; volume stays in dB.
pub fn compose_prosody_tag(prosody: &Prosody) -> String {
    format!(
        r#"<prosody volume="{:.3}dB" pitch="{:.3}%" rate="{:.3}%">"#,
        prosody.volume,
        prosody.pitch * 100.0,
        prosody.speaking_rate * 100.0
    )
}

/// Escape plain text and wrap it in `<speak><prosody ...>`.
pub fn wrap_plain_text_as_markup(text: &str, prosody: &Prosody) -> String {
    format!(
        "<speak>{}{}{}{}",
        compose_prosody_tag(prosody),
        escape_for_markup(text),
        PROSODY_CLOSE,
        ROOT_CLOSE
    )
}

/// Nest the body of existing markup inside a new `<prosody>` element.
///
/// The root opening tag (with its attributes) is preserved. Inner markup,
/// including earlier `<prosody>` elements, is kept verbatim.
pub fn merge_prosody_into_existing_markup(text: &str, prosody: &Prosody) -> String {
    let text = text.trim();
    let root = opening_tag(text);
    let body = strip_opening_tag(strip_closing_root_tag(text));
    format!(
        "{}{}{}{}{}",
        root,
        compose_prosody_tag(prosody),
        body,
        PROSODY_CLOSE,
        ROOT_CLOSE
    )
}

/// Fuse prosody into the attributes of a `<prosody>` element that opens the
/// body of existing markup. Falls back to nesting otherwise.
///
/// Volume and pitch are offsets and accumulate onto existing values. Rate is
/// a multiplier: an existing percentage moves by `(rate - 1) * 100`, a missing
/// one is written as `rate * 100`. Attributes left at their default are not
/// touched.
pub fn fuse_prosody_into_existing_markup(text: &str, prosody: &Prosody) -> String {
    let text = text.trim();
    let root = opening_tag(text);
    let body = strip_opening_tag(strip_closing_root_tag(text));
    let leading = body.trim_start();
    if !leading.starts_with(PROSODY_OPEN_PREFIX) || !leading.contains('>') {
        return merge_prosody_into_existing_markup(text, prosody);
    }

    let defaults = Prosody::default();
    let mut fused = opening_tag(leading).to_string();
    let rest = strip_opening_tag(leading);
    if prosody.volume != defaults.volume {
        fused = merge_attribute_into_tag(&fused, prosody.volume, "volume", "dB");
    }
    if prosody.pitch != defaults.pitch {
        fused = merge_attribute_into_tag(&fused, prosody.pitch * 100.0, "pitch", "%");
    }
    if prosody.speaking_rate != defaults.speaking_rate {
        let rate = match numeric_attribute(&fused, "rate", "%") {
            Some(_) => (prosody.speaking_rate - 1.0) * 100.0,
            None => prosody.speaking_rate * 100.0,
        };
        fused = merge_attribute_into_tag(&fused, rate, "rate", "%");
    }

    format!("{root}{fused}{rest}{ROOT_CLOSE}")
}

/// Embed prosody into request text of the given (resolved) type.
///
/// Plain text is escaped and wrapped; SSML is rewritten per `strategy`.
/// Default prosody leaves the text untouched.
pub fn apply_prosody(
    text: &str,
    text_type: TextType,
    prosody: &Prosody,
    strategy: ProsodyStrategy,
) -> String {
    if prosody.is_default() {
        return text.to_string();
    }
    match (text_type, strategy) {
        (TextType::Ssml, ProsodyStrategy::Nested) => {
            merge_prosody_into_existing_markup(text, prosody)
        }
        (TextType::Ssml, ProsodyStrategy::Fused) => fuse_prosody_into_existing_markup(text, prosody),
        _ => wrap_plain_text_as_markup(text, prosody),
    }
}

// =============================================================================
// Attribute Merge
// =============================================================================

/// Merge a numeric value into one attribute of a single opening tag.
///
/// 1. `name="<number><unit>"` exists: the number is accumulated with `value`.
/// 2. `name="<anything>"` exists: it is overwritten with `value` + `unit`.
/// 3. Otherwise the attribute is appended right before the closing `>`.
///
/// Values are written with three decimals.
pub fn merge_attribute_into_tag(tag: &str, value: f64, name: &str, unit: &str) -> String {
    if let Some((re, existing)) = numeric_attribute_regex(tag, name, unit) {
        let merged = format_attribute(name, existing + value, unit);
        return re
            .replace(tag, |caps: &Captures| format!("{}{merged}", &caps[1]))
            .into_owned();
    }

    let any_value = format!(r#"(^|\s){}="[^"]*""#, regex::escape(name));
    if let Ok(re) = Regex::new(&any_value)
        && re.is_match(tag)
    {
        let replaced = format_attribute(name, value, unit);
        return re
            .replace(tag, |caps: &Captures| format!("{}{replaced}", &caps[1]))
            .into_owned();
    }

    let attribute = format_attribute(name, value, unit);
    match tag.rfind('>') {
        Some(end) => format!("{} {}{}", &tag[..end], attribute, &tag[end..]),
        None => format!("{tag} {attribute}"),
    }
}

/// Value of `name="<number><unit>"` in `tag`, if present.
fn numeric_attribute(tag: &str, name: &str, unit: &str) -> Option<f64> {
    numeric_attribute_regex(tag, name, unit).map(|(_, value)| value)
}

// Names must follow whitespace so `data-volume` never matches `volume`
fn numeric_attribute_regex(tag: &str, name: &str, unit: &str) -> Option<(Regex, f64)> {
    let pattern = format!(
        r#"(^|\s){}="\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))\s*{}""#,
        regex::escape(name),
        regex::escape(unit)
    );
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(tag)?[2].parse::<f64>().ok()?;
    Some((re, value))
}

fn format_attribute(name: &str, value: f64, unit: &str) -> String {
    format!(r#"{name}="{value:.3}{unit}""#)
}
