use serde::Serialize;
use tracing::debug;

use crate::model::Theme;

pub const DEFAULT_ACCENT: &str = "#C2A676";
pub const DEFAULT_BACKGROUND: &str = "#FAFAF8";
pub const DEFAULT_TEXT: &str = "#111111";

/// A theme color referenced by section markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Accent,
    Background,
    Text,
}

impl Token {
    pub const ALL: [Token; 3] = [Token::Accent, Token::Background, Token::Text];

    pub fn variable(self) -> &'static str {
        match self {
            Token::Accent => "--vt-accent",
            Token::Background => "--vt-background",
            Token::Text => "--vt-text",
        }
    }
}

/// Validated colors, ready to be emitted as CSS custom properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeTokens {
    pub accent: String,
    pub background: String,
    pub text: String,
}

impl Default for ThemeTokens {
    fn default() -> Self {
        Self::resolve(&Theme::default())
    }
}

impl ThemeTokens {
    pub fn resolve(theme: &Theme) -> Self {
        Self {
            accent: checked(&theme.accent, DEFAULT_ACCENT, "accent"),
            background: checked(&theme.background, DEFAULT_BACKGROUND, "background"),
            text: checked(&theme.text, DEFAULT_TEXT, "text"),
        }
    }

    pub fn get(&self, token: Token) -> &str {
        match token {
            Token::Accent => &self.accent,
            Token::Background => &self.background,
            Token::Text => &self.text,
        }
    }

    /// `var(--vt-accent)` and friends, for use inside section markup.
    pub fn var(&self, token: Token) -> String {
        format!("var({})", token.variable())
    }

    /// The `:root` rule declaring every token. Emitted once per document.
    pub fn root_rule(&self) -> String {
        let declarations: String = Token::ALL
            .iter()
            .map(|token| format!("{}:{};", token.variable(), self.get(*token)))
            .collect();
        format!(":root{{{declarations}}}")
    }
}

fn checked(value: &str, fallback: &str, name: &str) -> String {
    let value = value.trim();
    if is_valid_color(value) {
        value.to_string()
    } else {
        debug!(token = name, value, "invalid theme color, using default");
        fallback.to_string()
    }
}

/// Permissive CSS color check: hex, `rgb()/rgba()/hsl()/hsla()` and named colors.
pub fn is_valid_color(value: &str) -> bool {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }

    let lower = value.to_ascii_lowercase();
    if let Some(open) = lower.find('(') {
        let function = &lower[..open];
        let Some(args) = lower[open + 1..].strip_suffix(')') else {
            return false;
        };
        return matches!(function, "rgb" | "rgba" | "hsl" | "hsla")
            && !args.trim().is_empty()
            && args.chars().all(|c| {
                c.is_ascii_alphanumeric() || matches!(c, ' ' | ',' | '.' | '%' | '/' | '-' | '+')
            })
            && args
                .split(|c: char| !c.is_ascii_alphabetic())
                .filter(|word| !word.is_empty())
                .all(|word| ARG_KEYWORDS.contains(&word));
    }

    NAMED_COLORS.binary_search(&lower.as_str()).is_ok()
}

/// Angle units and the `none` keyword allowed inside color functions.
const ARG_KEYWORDS: &[&str] = &["deg", "grad", "rad", "turn", "none"];

// Sorted, for binary search.
const NAMED_COLORS: &[&str] = &[
    "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque", "black",
    "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue", "chartreuse",
    "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "currentcolor", "cyan", "darkblue",
    "darkcyan", "darkgoldenrod", "darkgray", "darkgreen", "darkgrey", "darkkhaki",
    "darkmagenta", "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon",
    "darkseagreen", "darkslateblue", "darkslategray", "darkslategrey", "darkturquoise",
    "darkviolet", "deeppink", "deepskyblue", "dimgray", "dimgrey", "dodgerblue", "firebrick",
    "floralwhite", "forestgreen", "fuchsia", "gainsboro", "ghostwhite", "gold", "goldenrod",
    "gray", "green", "greenyellow", "grey", "honeydew", "hotpink", "indianred", "indigo",
    "ivory", "khaki", "lavender", "lavenderblush", "lawngreen", "lemonchiffon", "lightblue",
    "lightcoral", "lightcyan", "lightgoldenrodyellow", "lightgray", "lightgreen", "lightgrey",
    "lightpink", "lightsalmon", "lightseagreen", "lightskyblue", "lightslategray",
    "lightslategrey", "lightsteelblue", "lightyellow", "lime", "limegreen", "linen", "magenta",
    "maroon", "mediumaquamarine", "mediumblue", "mediumorchid", "mediumpurple",
    "mediumseagreen", "mediumslateblue", "mediumspringgreen", "mediumturquoise",
    "mediumvioletred", "midnightblue", "mintcream", "mistyrose", "moccasin", "navajowhite",
    "navy", "oldlace", "olive", "olivedrab", "orange", "orangered", "orchid", "palegoldenrod",
    "palegreen", "paleturquoise", "palevioletred", "papayawhip", "peachpuff", "peru", "pink",
    "plum", "powderblue", "purple", "rebeccapurple", "red", "rosybrown", "royalblue",
    "saddlebrown", "salmon", "sandybrown", "seagreen", "seashell", "sienna", "silver",
    "skyblue", "slateblue", "slategray", "slategrey", "snow", "springgreen", "steelblue", "tan",
    "teal", "thistle", "tomato", "transparent", "turquoise", "violet", "wheat", "white",
    "whitesmoke", "yellow", "yellowgreen",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_colors_are_sorted() {
        assert!(NAMED_COLORS.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn accepts_common_color_syntax() {
        for color in [
            "#fff",
            "#FFFA",
            "#C2A676",
            "#c2a67680",
            "navy",
            "RebeccaPurple",
            "rgb(10, 20, 30)",
            "rgba(10,20,30,0.5)",
            "hsl(120 50% 50%)",
            "hsl(120deg 50% 50%)",
            "hsl(0.25turn 50% 50% / 0.4)",
            "rgb(0 0 0 / 50%)",
            "rgb(none 0 0 / 50%)",
            "currentColor",
            " #123456 ",
        ] {
            assert!(is_valid_color(color), "{color} should be valid");
        }
    }

    #[test]
    fn rejects_garbage() {
        for color in [
            "",
            "#12",
            "#ggg",
            "notacolor",
            "red;background:url(x)",
            "rgb()",
            "url(http://x)",
            "rgb(1,2,3",
            "expression(alert(1))",
            "rgb(1 2 3 foo)",
            "hsl(var(--x) 50% 50%)",
        ] {
            assert!(!is_valid_color(color), "{color} should be rejected");
        }
    }

    #[test]
    fn invalid_values_fall_back_per_token() {
        let tokens = ThemeTokens::resolve(&Theme {
            accent: "tomato".into(),
            background: "}body{display:none".into(),
            text: String::new(),
        });
        assert_eq!(tokens.accent, "tomato");
        assert_eq!(tokens.background, DEFAULT_BACKGROUND);
        assert_eq!(tokens.text, DEFAULT_TEXT);
    }

    #[test]
    fn root_rule_declares_every_token() {
        let rule = ThemeTokens::default().root_rule();
        assert_eq!(
            rule,
            ":root{--vt-accent:#C2A676;--vt-background:#FAFAF8;--vt-text:#111111;}"
        );
        assert_eq!(ThemeTokens::default().var(Token::Accent), "var(--vt-accent)");
    }
}
