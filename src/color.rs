//! Color literal extraction from CSS value text.
//!
//! [`extract_colors`] finds hex literals, named color keywords,
//! `transparent`, `currentColor` and `rgb()`/`hsl()` calls. Function calls
//! whose channels do not parse as numbers are skipped.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use tracing::trace;

use crate::design_system::RuleEntry;

static COLOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<hex>#[0-9a-fA-F]+)|(?P<func>(?i:rgba?|hsla?)\((?:[^()]|\([^()]*\))*\))|(?P<ident>[A-Za-z][A-Za-z0-9-]*)",
    )
    .unwrap()
});

static VAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var\(\s*--[\w-]+\s*(?:,[^()]*)?\)").unwrap());

static NAMED_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let pairs: &[(&str, &str)] = &[
        ("aliceblue", "#f0f8ff"),
        ("antiquewhite", "#faebd7"),
        ("aqua", "#00ffff"),
        ("aquamarine", "#7fffd4"),
        ("azure", "#f0ffff"),
        ("beige", "#f5f5dc"),
        ("bisque", "#ffe4c4"),
        ("black", "#000000"),
        ("blanchedalmond", "#ffebcd"),
        ("blue", "#0000ff"),
        ("blueviolet", "#8a2be2"),
        ("brown", "#a52a2a"),
        ("burlywood", "#deb887"),
        ("cadetblue", "#5f9ea0"),
        ("chartreuse", "#7fff00"),
        ("chocolate", "#d2691e"),
        ("coral", "#ff7f50"),
        ("cornflowerblue", "#6495ed"),
        ("cornsilk", "#fff8dc"),
        ("crimson", "#dc143c"),
        ("cyan", "#00ffff"),
        ("darkblue", "#00008b"),
        ("darkcyan", "#008b8b"),
        ("darkgoldenrod", "#b8860b"),
        ("darkgray", "#a9a9a9"),
        ("darkgreen", "#006400"),
        ("darkgrey", "#a9a9a9"),
        ("darkkhaki", "#bdb76b"),
        ("darkmagenta", "#8b008b"),
        ("darkolivegreen", "#556b2f"),
        ("darkorange", "#ff8c00"),
        ("darkorchid", "#9932cc"),
        ("darkred", "#8b0000"),
        ("darksalmon", "#e9967a"),
        ("darkseagreen", "#8fbc8f"),
        ("darkslateblue", "#483d8b"),
        ("darkslategray", "#2f4f4f"),
        ("darkslategrey", "#2f4f4f"),
        ("darkturquoise", "#00ced1"),
        ("darkviolet", "#9400d3"),
        ("deeppink", "#ff1493"),
        ("deepskyblue", "#00bfff"),
        ("dimgray", "#696969"),
        ("dimgrey", "#696969"),
        ("dodgerblue", "#1e90ff"),
        ("firebrick", "#b22222"),
        ("floralwhite", "#fffaf0"),
        ("forestgreen", "#228b22"),
        ("fuchsia", "#ff00ff"),
        ("gainsboro", "#dcdcdc"),
        ("ghostwhite", "#f8f8ff"),
        ("gold", "#ffd700"),
        ("goldenrod", "#daa520"),
        ("gray", "#808080"),
        ("green", "#008000"),
        ("greenyellow", "#adff2f"),
        ("grey", "#808080"),
        ("honeydew", "#f0fff0"),
        ("hotpink", "#ff69b4"),
        ("indianred", "#cd5c5c"),
        ("indigo", "#4b0082"),
        ("ivory", "#fffff0"),
        ("khaki", "#f0e68c"),
        ("lavender", "#e6e6fa"),
        ("lavenderblush", "#fff0f5"),
        ("lawngreen", "#7cfc00"),
        ("lemonchiffon", "#fffacd"),
        ("lightblue", "#add8e6"),
        ("lightcoral", "#f08080"),
        ("lightcyan", "#e0ffff"),
        ("lightgoldenrodyellow", "#fafad2"),
        ("lightgray", "#d3d3d3"),
        ("lightgreen", "#90ee90"),
        ("lightgrey", "#d3d3d3"),
        ("lightpink", "#ffb6c1"),
        ("lightsalmon", "#ffa07a"),
        ("lightseagreen", "#20b2aa"),
        ("lightskyblue", "#87cefa"),
        ("lightslategray", "#778899"),
        ("lightslategrey", "#778899"),
        ("lightsteelblue", "#b0c4de"),
        ("lightyellow", "#ffffe0"),
        ("lime", "#00ff00"),
        ("limegreen", "#32cd32"),
        ("linen", "#faf0e6"),
        ("magenta", "#ff00ff"),
        ("maroon", "#800000"),
        ("mediumaquamarine", "#66cdaa"),
        ("mediumblue", "#0000cd"),
        ("mediumorchid", "#ba55d3"),
        ("mediumpurple", "#9370db"),
        ("mediumseagreen", "#3cb371"),
        ("mediumslateblue", "#7b68ee"),
        ("mediumspringgreen", "#00fa9a"),
        ("mediumturquoise", "#48d1cc"),
        ("mediumvioletred", "#c71585"),
        ("midnightblue", "#191970"),
        ("mintcream", "#f5fffa"),
        ("mistyrose", "#ffe4e1"),
        ("moccasin", "#ffe4b5"),
        ("navajowhite", "#ffdead"),
        ("navy", "#000080"),
        ("oldlace", "#fdf5e6"),
        ("olive", "#808000"),
        ("olivedrab", "#6b8e23"),
        ("orange", "#ffa500"),
        ("orangered", "#ff4500"),
        ("orchid", "#da70d6"),
        ("palegoldenrod", "#eee8aa"),
        ("palegreen", "#98fb98"),
        ("paleturquoise", "#afeeee"),
        ("palevioletred", "#db7093"),
        ("papayawhip", "#ffefd5"),
        ("peachpuff", "#ffdab9"),
        ("peru", "#cd853f"),
        ("pink", "#ffc0cb"),
        ("plum", "#dda0dd"),
        ("powderblue", "#b0e0e6"),
        ("purple", "#800080"),
        ("rebeccapurple", "#663399"),
        ("red", "#ff0000"),
        ("rosybrown", "#bc8f8f"),
        ("royalblue", "#4169e1"),
        ("saddlebrown", "#8b4513"),
        ("salmon", "#fa8072"),
        ("sandybrown", "#f4a460"),
        ("seagreen", "#2e8b57"),
        ("seashell", "#fff5ee"),
        ("sienna", "#a0522d"),
        ("silver", "#c0c0c0"),
        ("skyblue", "#87ceeb"),
        ("slateblue", "#6a5acd"),
        ("slategray", "#708090"),
        ("slategrey", "#708090"),
        ("snow", "#fffafa"),
        ("springgreen", "#00ff7f"),
        ("steelblue", "#4682b4"),
        ("tan", "#d2b48c"),
        ("teal", "#008080"),
        ("thistle", "#d8bfd8"),
        ("tomato", "#ff6347"),
        ("turquoise", "#40e0d0"),
        ("violet", "#ee82ee"),
        ("wheat", "#f5deb3"),
        ("white", "#ffffff"),
        ("whitesmoke", "#f5f5f5"),
        ("yellow", "#ffff00"),
        ("yellowgreen", "#9acd32"),
    ];
    pairs.iter().copied().collect()
});

/// Hex value of a CSS named color, case-insensitively.
pub fn named_color(keyword: &str) -> Option<&'static str> {
    NAMED_COLORS.get(keyword.to_ascii_lowercase().as_str()).copied()
}

/// A color literal found in value text.
///
/// Function channels are stored as written: `rgb` channels in `0..=255`,
/// `hsl` as hue degrees and saturation/lightness percentages, and alpha in
/// `0..=1` when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorDescriptor {
    Hex { hex: String },
    Keyword { keyword: String },
    Transparent,
    CurrentColor,
    Function { name: String, channels: Vec<f64> },
}

impl ColorDescriptor {
    /// Normalized `[r, g, b, a]` in `0..=1`. `currentColor` has no value.
    pub fn to_rgba(&self) -> Option<[f64; 4]> {
        match self {
            ColorDescriptor::Hex { hex } => parse_hex(hex),
            ColorDescriptor::Keyword { keyword } => named_color(keyword).and_then(parse_hex),
            ColorDescriptor::Transparent => Some([0.0, 0.0, 0.0, 0.0]),
            ColorDescriptor::CurrentColor => None,
            ColorDescriptor::Function { name, channels } => {
                let (x, y, z) = (*channels.first()?, *channels.get(1)?, *channels.get(2)?);
                let alpha = channels.get(3).copied().unwrap_or(1.0).clamp(0.0, 1.0);
                if name.starts_with("rgb") {
                    let c = |v: f64| (v / 255.0).clamp(0.0, 1.0);
                    Some([c(x), c(y), c(z), alpha])
                } else {
                    let [r, g, b] = hsl_to_rgb(x, y / 100.0, z / 100.0);
                    Some([r, g, b, alpha])
                }
            }
        }
    }

    /// `#rrggbb`, ignoring alpha.
    pub fn to_hex(&self) -> Option<String> {
        let [r, g, b, _] = self.to_rgba()?;
        let byte = |v: f64| (v * 255.0).round() as u8;
        Some(format!("#{:02x}{:02x}{:02x}", byte(r), byte(g), byte(b)))
    }
}

fn parse_hex(hex: &str) -> Option<[f64; 4]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    let expanded: String = match digits.len() {
        3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => digits.to_string(),
        _ => return None,
    };
    let channel = |i: usize| {
        u8::from_str_radix(expanded.get(i * 2..i * 2 + 2)?, 16)
            .ok()
            .map(|v| f64::from(v) / 255.0)
    };
    let alpha = if expanded.len() == 8 { channel(3)? } else { 1.0 };
    Some([channel(0)?, channel(1)?, channel(2)?, alpha])
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [f64; 3] {
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    let h = h.rem_euclid(360.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m]
}

/// One color literal and its byte range in the scanned value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMatch {
    pub range: Range<usize>,
    pub descriptor: ColorDescriptor,
}

/// Scan `value` for color literals, in source order.
pub fn extract_colors(value: &str) -> Vec<ColorMatch> {
    let bytes = value.as_bytes();
    let mut matches = Vec::new();

    for caps in COLOR_REGEX.captures_iter(value) {
        if let Some(m) = caps.name("hex") {
            let next = bytes.get(m.end()).copied();
            let boundary = !matches!(next, Some(b) if b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
            if boundary && matches!(m.as_str().len() - 1, 3 | 4 | 6 | 8) {
                matches.push(ColorMatch {
                    range: m.range(),
                    descriptor: ColorDescriptor::Hex {
                        hex: m.as_str().to_string(),
                    },
                });
            }
        } else if let Some(m) = caps.name("func") {
            match parse_function(m.as_str()) {
                Some(descriptor) => matches.push(ColorMatch {
                    range: m.range(),
                    descriptor,
                }),
                None => trace!(value = m.as_str(), "Skipped color function with non-numeric channels"),
            }
        } else if let Some(m) = caps.name("ident") {
            let prev = m.start().checked_sub(1).map(|i| bytes[i]);
            if matches!(prev, Some(b'-') | Some(b'_') | Some(b'.') | Some(b'#') | Some(b'$') | Some(b'@')) {
                continue;
            }
            if bytes.get(m.end()) == Some(&b'(') {
                continue;
            }
            let word = m.as_str();
            let descriptor = if word.eq_ignore_ascii_case("transparent") {
                ColorDescriptor::Transparent
            } else if word.eq_ignore_ascii_case("currentcolor") {
                ColorDescriptor::CurrentColor
            } else if named_color(word).is_some() {
                ColorDescriptor::Keyword {
                    keyword: word.to_string(),
                }
            } else {
                continue;
            };
            matches.push(ColorMatch {
                range: m.range(),
                descriptor,
            });
        }
    }
    matches
}

fn parse_function(call: &str) -> Option<ColorDescriptor> {
    let open = call.find('(')?;
    let name = call[..open].to_ascii_lowercase();
    // A variable is only accepted in the alpha slot; it reads as opaque there.
    let args = VAR_REGEX.replace_all(&call[open + 1..call.len() - 1], "var");
    let hsl = name.starts_with("hsl");

    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    if !(3..=4).contains(&parts.len()) {
        return None;
    }

    let mut channels = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        if *part == "var" {
            if i < 3 {
                return None;
            }
            channels.push(1.0);
            continue;
        }
        let (number, percent) = match part.strip_suffix('%') {
            Some(n) => (n, true),
            None => (part.strip_suffix("deg").unwrap_or(part), false),
        };
        let v: f64 = number.parse().ok()?;
        if !v.is_finite() {
            return None;
        }
        let channel = match (i, hsl, percent) {
            (3, _, true) => v / 100.0,
            (3, _, false) => v,
            (_, false, true) => v * 255.0 / 100.0,
            _ => v,
        };
        channels.push(channel);
    }

    Some(ColorDescriptor::Function { name, channels })
}

/// Colors a class name paints, for swatches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorDesc {
    pub color: Option<String>,
    pub background_color: Option<String>,
    pub border_color: Option<String>,
    /// Whether the value can be drawn as a concrete swatch
    pub can_render: bool,
}

impl ColorDesc {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.background_color.is_none() && self.border_color.is_none()
    }

    /// Derive the description of `class_name` from its single rule.
    ///
    /// Class names expanding to several rules, or touching no color
    /// property, have no description.
    pub fn from_rules(class_name: &str, rules: &[RuleEntry]) -> Option<Self> {
        let [rule] = rules else {
            return None;
        };
        let decls: &IndexMap<String, Vec<String>> = &rule.decls;
        if !decls.keys().any(|p| is_foreground(p) || is_background(p) || is_border(p)) {
            return None;
        }

        let mut desc = ColorDesc::default();
        for (prop, values) in decls {
            if desc.color.is_none() && is_foreground(prop) {
                if let Some((can_render, value)) = color_value(class_name, values) {
                    desc.color = Some(value);
                    desc.can_render = can_render;
                }
            }
            if desc.border_color.is_none() && is_border(prop) {
                if let Some((can_render, value)) = color_value(class_name, values) {
                    desc.border_color = Some(value);
                    desc.can_render = can_render;
                }
            }
            if desc.background_color.is_none() && is_background(prop) {
                if let Some((can_render, value)) = color_value(class_name, values) {
                    desc.background_color = Some(value);
                    desc.can_render = can_render;
                }
            }
        }
        Some(desc)
    }
}

fn is_foreground(prop: &str) -> bool {
    matches!(prop, "color" | "fill" | "stroke")
}

fn is_background(prop: &str) -> bool {
    prop.contains("background") || prop.contains("gradient")
}

fn is_border(prop: &str) -> bool {
    (prop.contains("border") || prop.contains("divide") || prop.contains("outline") || prop.contains("ring"))
        && prop.contains("color")
}

fn color_value(class_name: &str, values: &[String]) -> Option<(bool, String)> {
    if class_name.ends_with("-current") {
        return Some((false, "currentColor".to_string()));
    } else if class_name.ends_with("-inherit") {
        return Some((false, "inherit".to_string()));
    } else if class_name.ends_with("-auto") {
        return Some((false, "auto".to_string()));
    } else if class_name.ends_with("-transparent") {
        return Some((true, "transparent".to_string()));
    }

    for value in values {
        let Some(first) = extract_colors(value).into_iter().next() else {
            continue;
        };
        return Some(match first.descriptor {
            ColorDescriptor::Transparent => (true, "transparent".to_string()),
            ColorDescriptor::CurrentColor => (false, value.clone()),
            ref descriptor => match descriptor.to_hex() {
                Some(hex) => (true, hex),
                None => (false, value.clone()),
            },
        });
    }
    None
}
