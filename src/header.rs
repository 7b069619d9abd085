// ABOUTME: Parses the optional `#`-prefixed header line on the first line of a source file

/// Attempts to parse `line` (with its leading `#` already stripped and
/// trimmed) as the header dict described in SPEC_FULL.md §6: strict JSON
/// first, then a permissive rewrite of single-quoted keys/strings and
/// trailing commas, retried as JSON. Returns `None` if neither succeeds.
pub fn parse_header_line(line: &str) -> Option<serde_json::Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(line) {
        return Some(value);
    }
    let normalized = normalize_permissive(line);
    serde_json::from_str(&normalized).ok()
}

/// If `source`'s first line starts with `#`, tries to parse the remainder as
/// a header dict.
pub fn extract_header(source: &str) -> Option<serde_json::Value> {
    let first_line = source.lines().next()?;
    let rest = first_line.strip_prefix('#')?;
    parse_header_line(rest)
}

fn normalize_permissive(line: &str) -> String {
    let single_quotes_to_double = replace_single_quotes(line);
    strip_trailing_commas(&single_quotes_to_double)
}

fn replace_single_quotes(line: &str) -> String {
    line.chars()
        .map(|c| if c == '\'' { '"' } else { c })
        .collect()
}

fn strip_trailing_commas(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ',' {
            let mut lookahead = chars.clone();
            while let Some(&next) = lookahead.peek() {
                if next.is_whitespace() {
                    lookahead.next();
                } else {
                    break;
                }
            }
            if matches!(lookahead.peek(), Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_json_header_parses() {
        let header = parse_header_line(r#"{"pk": "abc", "pow_bits": 4}"#).unwrap();
        assert_eq!(header["pk"], "abc");
        assert_eq!(header["pow_bits"], 4);
    }

    #[test]
    fn test_single_quotes_and_trailing_comma_are_tolerated() {
        let header = parse_header_line("{'pk': 'abc', 'show_json': true,}").unwrap();
        assert_eq!(header["pk"], "abc");
        assert_eq!(header["show_json"], true);
    }

    #[test]
    fn test_extract_header_requires_leading_hash() {
        assert!(extract_header("var x = 1\nshow(x)").is_none());
        let header = extract_header("#{\"pk\": \"k\"}\nvar x = 1").unwrap();
        assert_eq!(header["pk"], "k");
    }

    #[test]
    fn test_garbage_header_yields_none() {
        assert!(parse_header_line("not json at all {{{").is_none());
    }
}
