/// Colour names as the server sends them (CSS-style) mapped to terminal
/// colours. Accepts named colours, `#rgb`, `#rrggbb` and `rgb(r, g, b)`.

use crossterm::style::Color;

/// Fallback for names we do not know.
pub const UNKNOWN: Color = Color::Grey;

pub fn parse(name: &str) -> Color {
    try_parse(name).unwrap_or(UNKNOWN)
}

pub fn try_parse(name: &str) -> Option<Color> {
    let name = name.trim().to_ascii_lowercase();

    if let Some(hex) = name.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = name.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
        let mut parts = args.split(',').map(|p| p.trim().parse::<u8>().ok());
        let (r, g, b) = (parts.next()??, parts.next()??, parts.next()??);
        return parts.next().is_none().then_some(Color::Rgb { r, g, b });
    }

    let rgb = |r, g, b| Some(Color::Rgb { r, g, b });
    match name.as_str() {
        "black" => rgb(0, 0, 0),
        "white" => rgb(255, 255, 255),
        "red" => rgb(255, 0, 0),
        "darkred" => rgb(139, 0, 0),
        "green" => rgb(0, 128, 0),
        "darkgreen" => rgb(0, 100, 0),
        "lime" => rgb(0, 255, 0),
        "blue" => rgb(0, 0, 255),
        "darkblue" | "navy" => rgb(0, 0, 139),
        "yellow" => rgb(255, 255, 0),
        "orange" => rgb(255, 165, 0),
        "brown" => rgb(165, 42, 42),
        "purple" => rgb(128, 0, 128),
        "magenta" | "fuchsia" => rgb(255, 0, 255),
        "cyan" | "aqua" => rgb(0, 255, 255),
        "gray" | "grey" => rgb(128, 128, 128),
        "darkgray" | "darkgrey" => rgb(169, 169, 169),
        "lightgray" | "lightgrey" => rgb(211, 211, 211),
        "dimgray" | "dimgrey" => rgb(105, 105, 105),
        "silver" => rgb(192, 192, 192),
        "gold" => rgb(255, 215, 0),
        "pink" => rgb(255, 192, 203),
        _ => None,
    }
}

/// Digits are decoded per char, so non-ASCII input is rejected rather
/// than sliced.
fn parse_hex(hex: &str) -> Option<Color> {
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    match digits[..] {
        [r1, r2, g1, g2, b1, b2] => Some(Color::Rgb { r: r1 * 16 + r2, g: g1 * 16 + g2, b: b1 * 16 + b2 }),
        [r, g, b] => Some(Color::Rgb { r: r * 17, g: g * 17, b: b * 17 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_colours() {
        assert_eq!(parse("red"), Color::Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(parse(" DarkGray "), Color::Rgb { r: 169, g: 169, b: 169 });
        assert_eq!(parse("grey"), parse("gray"));
    }

    #[test]
    fn hex_colours() {
        assert_eq!(parse("#102030"), Color::Rgb { r: 0x10, g: 0x20, b: 0x30 });
        assert_eq!(parse("#f0a"), Color::Rgb { r: 255, g: 0, b: 170 });
        assert_eq!(try_parse("#12345"), None);
        assert_eq!(try_parse("#zzzzzz"), None);
    }

    #[test]
    fn rgb_function() {
        assert_eq!(parse("rgb(1, 2, 3)"), Color::Rgb { r: 1, g: 2, b: 3 });
        assert_eq!(try_parse("rgb(1,2)"), None);
        assert_eq!(try_parse("rgb(1,2,3,4)"), None);
        assert_eq!(try_parse("rgb(300,2,3)"), None);
    }

    #[test]
    fn non_ascii_hex_is_rejected() {
        // six bytes, but the euro sign straddles the channel boundaries
        assert_eq!("a\u{20ac}bc".len(), 6);
        assert_eq!(try_parse("#a\u{20ac}bc"), None);
        assert_eq!(parse("#a\u{20ac}bc"), UNKNOWN);
        assert_eq!(try_parse("#\u{e9}\u{e9}\u{e9}"), None);
        assert_eq!(try_parse("#\u{ff10}\u{ff10}\u{ff10}"), None);
        assert_eq!(parse("rgb(\u{20ac}, 1, 2)"), UNKNOWN);
    }

    #[test]
    fn unknown_falls_back() {
        assert_eq!(parse("octarine"), UNKNOWN);
    }
}
