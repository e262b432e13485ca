/// Chat markup: the server colours names with
/// `<span style="color: X;">name</span>`. This turns such text into
/// coloured segments for the terminal. `<br>` becomes a line break, other
/// tags are dropped and the common HTML entities are decoded.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub color: Option<String>,
}

pub fn parse(input: &str) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut colors: Vec<Option<String>> = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        let Some(open) = rest.find('<') else {
            push_text(&mut segments, rest, &colors);
            break;
        };
        push_text(&mut segments, &rest[..open], &colors);

        let Some(close) = rest[open..].find('>') else {
            push_text(&mut segments, &rest[open..], &colors);
            break;
        };
        let tag = rest[open + 1..open + close].trim();
        rest = &rest[open + close + 1..];

        let lower = tag.to_ascii_lowercase();
        if lower.starts_with("/span") {
            colors.pop();
        } else if lower.starts_with("span") {
            colors.push(style_color(tag));
        } else if lower.trim_end_matches('/').trim() == "br" {
            append(&mut segments, "\n", None);
        }
    }

    segments
}

/// `style="color: red;"` → `red`.
fn style_color(tag: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let at = lower.find("color:")? + "color:".len();
    let value: String = tag[at..]
        .chars()
        .take_while(|&c| c != ';' && c != '"' && c != '\'')
        .collect();
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn push_text(segments: &mut Vec<Segment>, raw: &str, colors: &[Option<String>]) {
    if raw.is_empty() {
        return;
    }
    let color = colors.iter().rev().flatten().next().cloned();
    append(segments, &decode_entities(raw), color);
}

/// Append, merging with the previous segment when the colour matches.
fn append(segments: &mut Vec<Segment>, text: &str, color: Option<String>) {
    match segments.last_mut() {
        Some(last) if last.color == color => last.text.push_str(text),
        _ => segments.push(Segment { text: text.to_string(), color }),
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Plain text without colours.
#[cfg(test)]
pub fn plain(input: &str) -> String {
    parse(input).into_iter().map(|s| s.text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, color: Option<&str>) -> Segment {
        Segment { text: text.into(), color: color.map(Into::into) }
    }

    #[test]
    fn plain_text_is_one_segment() {
        assert_eq!(parse("hello there"), vec![seg("hello there", None)]);
    }

    #[test]
    fn coloured_name() {
        let text = r#"<span style="color: red;">bob</span> joined the game"#;
        assert_eq!(parse(text), vec![seg("bob", Some("red")), seg(" joined the game", None)]);
    }

    #[test]
    fn two_names() {
        let text = r#"<span style="color: green;">rat</span> was killed by <span style="color: blue;">ann</span>"#;
        assert_eq!(
            parse(text),
            vec![
                seg("rat", Some("green")),
                seg(" was killed by ", None),
                seg("ann", Some("blue")),
            ]
        );
    }

    #[test]
    fn break_and_unknown_tags() {
        assert_eq!(plain("a<br>b<b>c</b><br/>"), "a\nbc\n");
    }

    #[test]
    fn entities_and_stray_brackets() {
        assert_eq!(plain("1 &lt; 2 &amp;&amp; x"), "1 < 2 && x");
        assert_eq!(plain("a < b"), "a < b");
    }

    #[test]
    fn multibyte_colour_values_pass_through() {
        let text = "<span style=\"color: #a\u{20ac}bc;\">boom</span> \u{263a}";
        assert_eq!(parse(text), vec![seg("boom", Some("#a\u{20ac}bc")), seg(" \u{263a}", None)]);
        assert_eq!(plain("<span style=\"c\u{f6}lor: \u{20ac};\">x</span>"), "x");
    }

    #[test]
    fn span_without_colour_inherits() {
        let text = r#"<span style="color: red;">a<span class="x">b</span></span>c"#;
        assert_eq!(parse(text), vec![seg("ab", Some("red")), seg("c", None)]);
    }
}
