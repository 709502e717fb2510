//! `@media` condition parsing and evaluation
//!
//! Conditions look like
//! `only screen and (min-device-width: 320) and (max-device-width: 480)`,
//! `(orientation: landscape), (prefers-color-scheme: dark)` or `(300 < width <= 900)`.
//! Queries are separated by `,` or ` or ` and match if any of them matches; features are
//! joined by ` and ` and must all match.

use log::warn;

const ORIENTATION_PORTRAIT: i32 = 0;
const ORIENTATION_LANDSCAPE: i32 = 1;
const COLOR_SCHEME_LIGHT: i32 = 0;
const COLOR_SCHEME_DARK: i32 = 1;
const ASPECT_RATIO_SCALE: i64 = 100_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
    NoPreference,
}

/// Device and viewport properties media conditions are evaluated against.
///
/// Lengths are in density-independent pixels, resolution in dpi.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaEnvironment {
    pub viewport_width: i32,
    pub viewport_height: i32,
    pub screen_width: i32,
    pub screen_height: i32,
    pub resolution: i32,
    pub orientation: Orientation,
    pub color_scheme: ColorScheme,
    /// Cards may be laid out before their viewport is known; a zero viewport dimension
    /// then makes `width`/`height` features unusable.
    pub card_mode: bool,
}

impl Default for MediaEnvironment {
    fn default() -> Self {
        Self {
            viewport_width: 360,
            viewport_height: 640,
            screen_width: 360,
            screen_height: 640,
            resolution: 480,
            orientation: Orientation::Portrait,
            color_scheme: ColorScheme::Light,
            card_mode: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaFeature {
    Width,
    Height,
    DeviceWidth,
    DeviceHeight,
    Resolution,
    AspectRatio,
    Orientation,
    PrefersColorScheme,
}

impl MediaFeature {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "width" => Some(MediaFeature::Width),
            "height" => Some(MediaFeature::Height),
            "device-width" => Some(MediaFeature::DeviceWidth),
            "device-height" => Some(MediaFeature::DeviceHeight),
            "resolution" => Some(MediaFeature::Resolution),
            "aspect-ratio" => Some(MediaFeature::AspectRatio),
            "orientation" => Some(MediaFeature::Orientation),
            "prefers-color-scheme" => Some(MediaFeature::PrefersColorScheme),
            _ => None,
        }
    }

    /// Current value of the feature, or `None` when it cannot be evaluated.
    fn current_value(&self, env: &MediaEnvironment) -> Option<i64> {
        match self {
            MediaFeature::Width => {
                if env.card_mode && env.viewport_width == 0 {
                    None
                } else {
                    Some(env.viewport_width as i64)
                }
            }
            MediaFeature::Height => {
                if env.card_mode && env.viewport_height == 0 {
                    None
                } else {
                    Some(env.viewport_height as i64)
                }
            }
            MediaFeature::DeviceWidth => Some(env.screen_width as i64),
            MediaFeature::DeviceHeight => Some(env.screen_height as i64),
            MediaFeature::Resolution => Some(env.resolution as i64),
            MediaFeature::AspectRatio => {
                if env.viewport_height == 0 {
                    None
                } else {
                    Some(ASPECT_RATIO_SCALE * env.viewport_width as i64 / env.viewport_height as i64)
                }
            }
            MediaFeature::Orientation => Some(match env.orientation {
                Orientation::Portrait => ORIENTATION_PORTRAIT as i64,
                Orientation::Landscape => ORIENTATION_LANDSCAPE as i64,
            }),
            MediaFeature::PrefersColorScheme => Some(match env.color_scheme {
                ColorScheme::Dark => COLOR_SCHEME_DARK as i64,
                ColorScheme::Light | ColorScheme::NoPreference => COLOR_SCHEME_LIGHT as i64,
            }),
        }
    }

    /// Target value for a comparison; `None` when the value does not fit.
    fn parse_value(&self, text: &str) -> Option<i64> {
        let text = text.trim();
        match self {
            MediaFeature::Orientation => Some(match text {
                "landscape" => ORIENTATION_LANDSCAPE as i64,
                _ => ORIENTATION_PORTRAIT as i64,
            }),
            MediaFeature::PrefersColorScheme => Some(match text {
                "dark" => COLOR_SCHEME_DARK as i64,
                _ => COLOR_SCHEME_LIGHT as i64,
            }),
            MediaFeature::Resolution => parse_resolution(text),
            MediaFeature::AspectRatio => parse_aspect_ratio(text),
            _ => Some(parse_int(text)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    Less,
    LessEqual,
    More,
    MoreEqual,
}

impl CompareOp {
    fn parse(op: &str) -> Option<Self> {
        match op {
            ":" | "==" => Some(CompareOp::Equal),
            "<" => Some(CompareOp::Less),
            "<=" => Some(CompareOp::LessEqual),
            ">" => Some(CompareOp::More),
            ">=" => Some(CompareOp::MoreEqual),
            _ => None,
        }
    }

    /// The operator seen from the other operand (`a < b` is `b > a`).
    fn reverse(self) -> Self {
        match self {
            CompareOp::Equal => CompareOp::Equal,
            CompareOp::Less => CompareOp::More,
            CompareOp::LessEqual => CompareOp::MoreEqual,
            CompareOp::More => CompareOp::Less,
            CompareOp::MoreEqual => CompareOp::LessEqual,
        }
    }

    fn is_less(self) -> bool {
        matches!(self, CompareOp::Less | CompareOp::LessEqual)
    }

    fn is_more(self) -> bool {
        matches!(self, CompareOp::More | CompareOp::MoreEqual)
    }

    fn apply(self, value: i64, target: i64) -> bool {
        match self {
            CompareOp::Equal => value == target,
            CompareOp::Less => value < target,
            CompareOp::LessEqual => value <= target,
            CompareOp::More => value > target,
            CompareOp::MoreEqual => value >= target,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub op: CompareOp,
    pub target: i64,
}

/// One parenthesized feature test, with one or two comparisons.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaCondition {
    pub feature: MediaFeature,
    pub comparisons: Vec<Comparison>,
}

impl MediaCondition {
    fn evaluate(&self, env: &MediaEnvironment) -> bool {
        match self.feature.current_value(env) {
            Some(value) => self
                .comparisons
                .iter()
                .all(|cmp| cmp.op.apply(value, cmp.target)),
            None => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MediaQuery {
    pub negated: bool,
    pub conditions: Vec<MediaCondition>,
    /// False when a feature could not be parsed; such a query never matches.
    pub valid: bool,
}

impl MediaQuery {
    pub fn evaluate(&self, env: &MediaEnvironment) -> bool {
        if !self.valid {
            return false;
        }
        let result = self.conditions.iter().all(|c| c.evaluate(env));
        result != self.negated
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MediaList {
    text: String,
    queries: Vec<MediaQuery>,
}

impl MediaList {
    pub fn parse(text: &str) -> Self {
        let mut queries = Vec::new();
        for group in text.trim().split(',') {
            for query_text in split_keyword(group, "or") {
                let query = parse_query(query_text);
                if !query.valid {
                    warn!(target: "css", "Unsupported media query '{}' in '{}'", query_text.trim(), text);
                }
                queries.push(query);
            }
        }
        Self {
            text: text.trim().to_string(),
            queries,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn queries(&self) -> &[MediaQuery] {
        &self.queries
    }

    /// Evaluated fresh on every call; results are never cached.
    pub fn evaluate(&self, env: &MediaEnvironment) -> bool {
        self.queries.iter().any(|q| q.evaluate(env))
    }
}

fn parse_query(text: &str) -> MediaQuery {
    let mut text = text.trim();
    let mut negated = false;
    if let Some(rest) = strip_word(text, "not") {
        negated = true;
        text = rest;
    } else if let Some(rest) = strip_word(text, "only") {
        text = rest;
    }

    let mut parts = split_keyword(text.trim(), "and").into_iter().peekable();
    if let Some(first) = parts.peek() {
        if matches!(first.trim(), "screen" | "all") {
            parts.next();
        }
    }

    let mut conditions = Vec::new();
    let mut valid = true;
    for part in parts {
        match parse_condition(part) {
            Some(condition) => conditions.push(condition),
            None => valid = false,
        }
    }
    MediaQuery {
        negated,
        conditions,
        valid,
    }
}

fn parse_condition(text: &str) -> Option<MediaCondition> {
    let mut text = text.trim();
    if text.starts_with('(') && text.ends_with(')') && text.len() >= 2 {
        text = &text[1..text.len() - 1];
    }
    let ops = find_operators(text);
    match ops.as_slice() {
        [(pos1, op1), (pos2, op2)] => {
            let (op1, op2) = (CompareOp::parse(op1)?, CompareOp::parse(op2)?);
            let ranged = (op1.is_less() && op2.is_less()) || (op1.is_more() && op2.is_more());
            if !ranged {
                return None;
            }
            let value1 = &text[..*pos1];
            let name = &text[pos1 + ops[0].1.len()..*pos2];
            let value2 = &text[pos2 + ops[1].1.len()..];
            let feature = MediaFeature::from_name(name)?;
            Some(MediaCondition {
                feature,
                comparisons: vec![
                    Comparison {
                        op: op1.reverse(),
                        target: feature.parse_value(value1)?,
                    },
                    Comparison {
                        op: op2,
                        target: feature.parse_value(value2)?,
                    },
                ],
            })
        }
        [(pos, op_text)] => {
            let op = CompareOp::parse(op_text)?;
            let left = text[..*pos].trim();
            let right = text[pos + op_text.len()..].trim();
            parse_single_comparison(left, op, right)
        }
        _ => None,
    }
}

fn parse_single_comparison(left: &str, mut op: CompareOp, right: &str) -> Option<MediaCondition> {
    let (mut left, mut right) = (left, right);
    if op == CompareOp::Equal {
        if let Some(rest) = left.strip_prefix("min-") {
            left = rest;
            op = CompareOp::MoreEqual;
        } else if let Some(rest) = left.strip_prefix("max-") {
            left = rest;
            op = CompareOp::LessEqual;
        } else if let Some(rest) = right.strip_prefix("min-") {
            right = rest;
            op = CompareOp::MoreEqual;
        } else if let Some(rest) = right.strip_prefix("max-") {
            right = rest;
            op = CompareOp::LessEqual;
        }
    }

    let (feature, compare_to) = match MediaFeature::from_name(left) {
        Some(feature) => (feature, right),
        None => {
            let feature = MediaFeature::from_name(right)?;
            op = op.reverse();
            (feature, left)
        }
    };
    if feature == MediaFeature::Orientation {
        op = CompareOp::Equal;
    }
    Some(MediaCondition {
        feature,
        comparisons: vec![Comparison {
            op,
            target: feature.parse_value(compare_to)?,
        }],
    })
}

fn find_operators(text: &str) -> Vec<(usize, &'static str)> {
    let mut ops = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let two = if i + 1 < bytes.len() { &bytes[i..i + 2] } else { &bytes[i..i + 1] };
        let op: Option<&'static str> = match two {
            b">=" => Some(">="),
            b"<=" => Some("<="),
            b"==" => Some("=="),
            _ => match bytes[i] {
                b'<' => Some("<"),
                b'>' => Some(">"),
                b':' => Some(":"),
                _ => None,
            },
        };
        match op {
            Some(op) => {
                ops.push((i, op));
                i += op.len();
            }
            None => i += 1,
        }
    }
    ops
}

/// Splits on `keyword` when it stands alone between whitespace.
fn split_keyword<'a>(text: &'a str, keyword: &str) -> Vec<&'a str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut from = 0;
    while let Some(pos) = text[from..].find(keyword) {
        let at = from + pos;
        let end = at + keyword.len();
        let spaced_before = at > 0 && bytes[at - 1].is_ascii_whitespace();
        let spaced_after = end < bytes.len() && bytes[end].is_ascii_whitespace();
        if spaced_before && spaced_after {
            parts.push(&text[start..at]);
            start = end;
        }
        from = end;
    }
    parts.push(&text[start..]);
    parts
}

fn strip_word<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(word)?;
    if rest.starts_with(|c: char| c.is_whitespace() || c == '(') {
        Some(rest)
    } else {
        None
    }
}

fn parse_int(text: &str) -> i64 {
    let number = text
        .trim()
        .trim_end_matches("px")
        .trim_end_matches("dp")
        .trim();
    match number.parse::<i64>() {
        Ok(value) => value,
        Err(_) => match number.parse::<f64>() {
            Ok(value) => value as i64,
            Err(_) => {
                warn!(target: "css", "Invalid media value '{}'", text);
                0
            }
        },
    }
}

fn parse_resolution(text: &str) -> Option<i64> {
    if let Some(value) = text.strip_suffix("dpi") {
        Some(parse_int(value))
    } else if let Some(value) = text.strip_suffix("dpcm") {
        let dpi = parse_int(value) as f64 * 2.54;
        (dpi.abs() < i64::MAX as f64).then_some(dpi as i64)
    } else if let Some(value) = text.strip_suffix("dppx") {
        // Baseline density is 160dpi.
        parse_int(value).checked_mul(160)
    } else {
        Some(0)
    }
}

fn parse_aspect_ratio(text: &str) -> Option<i64> {
    match text.split_once('/') {
        Some((w, h)) => match parse_int(h) {
            0 => Some(0),
            h => ASPECT_RATIO_SCALE.checked_mul(parse_int(w))?.checked_div(h),
        },
        None => Some(0),
    }
}
