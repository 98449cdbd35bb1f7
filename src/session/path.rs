//! Dotted sub-path lookup over session text without a full YAML parse.
//!
//! Paths look like `DriverInfo.Drivers.{0}.CarNumber`. Each `.`-separated segment
//! selects a mapping key at the current indentation. A braced segment `{n}` selects the
//! n-th `- ` item when the current node is a list, and otherwise names a key, so
//! `{Key With.Dot}` reaches keys containing dots. The simulator writes list items at the
//! same indentation as their parent key; both that style and indented lists resolve.

use crate::{Result, TelemetryError};

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    indent: usize,
    text: &'a str,
}

#[derive(Debug)]
enum Segment<'a> {
    Key(&'a str),
    Braced(&'a str),
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    text.lines()
        .filter_map(|raw| {
            let trimmed = raw.trim_end();
            let text = trimmed.trim_start_matches(' ');
            (!text.is_empty()).then(|| Line { indent: trimmed.len() - text.len(), text })
        })
        .collect()
}

/// Split on `.` outside braces.
fn split_path(path: &str) -> Option<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (at, ch) in path.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.checked_sub(1)?,
            '.' if depth == 0 => {
                segments.push(parse_segment(&path[start..at])?);
                start = at + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return None;
    }
    segments.push(parse_segment(&path[start..])?);
    Some(segments)
}

fn parse_segment(raw: &str) -> Option<Segment<'_>> {
    if raw.is_empty() {
        return None;
    }
    match raw.strip_prefix('{').and_then(|inner| inner.strip_suffix('}')) {
        Some(inner) => Some(Segment::Braced(inner)),
        None => Some(Segment::Key(raw)),
    }
}

fn is_list_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

/// `key: value` or `key:`; list items are never keys.
fn split_key(text: &str) -> Option<(&str, &str)> {
    if text.starts_with('-') {
        return None;
    }
    match text.find(": ") {
        Some(at) => Some((unquote(&text[..at]), text[at + 2..].trim())),
        None => text.strip_suffix(':').map(|key| (unquote(key), "")),
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Items of a list scope, each with its first line re-indented past the dash.
fn list_items<'a>(scope: &[Line<'a>]) -> Vec<Vec<Line<'a>>> {
    let base = scope[0].indent;
    let mut items: Vec<Vec<Line<'a>>> = Vec::new();

    for line in scope {
        if line.indent == base && is_list_item(line.text) {
            let rest = line.text[1..].trim_start();
            let mut item = Vec::new();
            if !rest.is_empty() {
                item.push(Line { indent: base + 2, text: rest });
            }
            items.push(item);
        } else if let Some(item) = items.last_mut() {
            item.push(*line);
        }
    }

    items
}

enum Step<'a> {
    Descend(Vec<Line<'a>>),
    Scalar(&'a str),
}

fn select_key<'a>(scope: &[Line<'a>], key: &str) -> Option<Step<'a>> {
    let base = scope.first()?.indent;
    let at = scope
        .iter()
        .position(|line| line.indent == base && split_key(line.text).is_some_and(|(k, _)| k == key))?;
    let (_, value) = split_key(scope[at].text)?;

    let children: Vec<Line<'a>> = scope[at + 1..]
        .iter()
        .take_while(|line| line.indent > base || (line.indent == base && is_list_item(line.text)))
        .copied()
        .collect();

    if children.is_empty() { Some(Step::Scalar(value)) } else { Some(Step::Descend(children)) }
}

fn select_item<'a>(scope: &[Line<'a>], index: usize) -> Option<Step<'a>> {
    let item = list_items(scope).into_iter().nth(index)?;
    match item.as_slice() {
        [only] if split_key(only.text).is_none() => Some(Step::Scalar(only.text)),
        [] => Some(Step::Scalar("")),
        _ => Some(Step::Descend(item)),
    }
}

fn resolve<'a>(text: &'a str, path: &str) -> Option<&'a str> {
    let segments = split_path(path)?;
    let mut scope = split_lines(text);

    for (position, segment) in segments.iter().enumerate() {
        let is_list = scope.first().is_some_and(|line| is_list_item(line.text));

        let step = match segment {
            Segment::Braced(inner) if is_list => select_item(&scope, inner.parse().ok()?)?,
            Segment::Braced(key) | Segment::Key(key) => select_key(&scope, key)?,
        };

        let last = position + 1 == segments.len();
        match step {
            Step::Scalar(value) if last => return Some(unquote(value)),
            Step::Descend(children) if !last => scope = children,
            _ => return None,
        }
    }

    None
}

/// Resolve `path` against `text` to a scalar.
///
/// Fails with [`TelemetryError::PathNotFound`] when a segment is missing or the path
/// ends on a mapping or list.
pub fn lookup(text: &str, path: &str) -> Result<String> {
    resolve(text, path).map(str::to_string).ok_or_else(|| TelemetryError::path_not_found(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = "\
WeekendInfo:
 TrackName: spa 2024 up
 TrackDisplayName: Circuit de Spa-Francorchamps
 TrackLength: 6.93 km
 WeekendOptions:
  NumStarters: 20
  TimeOfDay: 2:00 pm
DriverInfo:
 DriverCarIdx: 1
 Drivers:
 - CarIdx: 0
   UserName: Pace Car
   CarNumber: \"0\"
 - CarIdx: 1
   UserName: Jane O'Driver
   CarNumber: \"42\"
SplitTimeInfo:
 Sectors:
 - SectorNum: 0
   SectorStartPct: 0.000000
 - SectorNum: 1
   SectorStartPct: 0.452000
Tags:
  - first
  - second
Odd:
 Key With.Dot: 7
 '3': three
";

    #[test]
    fn resolves_nested_keys() {
        assert_eq!(lookup(SESSION, "WeekendInfo.TrackName").unwrap(), "spa 2024 up");
        assert_eq!(lookup(SESSION, "WeekendInfo.WeekendOptions.NumStarters").unwrap(), "20");
        assert_eq!(lookup(SESSION, "WeekendInfo.WeekendOptions.TimeOfDay").unwrap(), "2:00 pm");
    }

    #[test]
    fn resolves_list_items_at_parent_indentation() {
        assert_eq!(lookup(SESSION, "DriverInfo.Drivers.{0}.CarNumber").unwrap(), "0");
        assert_eq!(lookup(SESSION, "DriverInfo.Drivers.{1}.CarNumber").unwrap(), "42");
        assert_eq!(lookup(SESSION, "DriverInfo.Drivers.{1}.UserName").unwrap(), "Jane O'Driver");
        assert_eq!(lookup(SESSION, "SplitTimeInfo.Sectors.{1}.SectorStartPct").unwrap(), "0.452000");
    }

    #[test]
    fn sibling_keys_after_a_list_still_resolve() {
        assert_eq!(lookup(SESSION, "DriverInfo.DriverCarIdx").unwrap(), "1");
    }

    #[test]
    fn resolves_scalar_list_items() {
        assert_eq!(lookup(SESSION, "Tags.{0}").unwrap(), "first");
        assert_eq!(lookup(SESSION, "Tags.{1}").unwrap(), "second");
    }

    #[test]
    fn braced_segments_name_keys_in_mappings() {
        assert_eq!(lookup(SESSION, "Odd.{Key With.Dot}").unwrap(), "7");
        assert_eq!(lookup(SESSION, "Odd.{3}").unwrap(), "three");
    }

    #[test]
    fn missing_paths_are_errors() {
        for path in [
            "WeekendInfo.TrackLength.Units",
            "WeekendInfo.Nope",
            "DriverInfo.Drivers.{9}.CarNumber",
            "DriverInfo.Drivers.{x}",
            "Nope",
            "",
            "WeekendInfo..TrackName",
            "WeekendInfo.{TrackName",
        ] {
            let result = lookup(SESSION, path);
            assert!(
                matches!(result, Err(TelemetryError::PathNotFound { .. })),
                "{path:?} resolved to {result:?}"
            );
        }
    }

    #[test]
    fn mappings_and_lists_are_not_scalars() {
        assert!(lookup(SESSION, "WeekendInfo").is_err());
        assert!(lookup(SESSION, "DriverInfo.Drivers").is_err());
        assert!(lookup(SESSION, "DriverInfo.Drivers.{0}").is_err());
    }

    #[test]
    fn keys_are_matched_at_the_scope_indentation_only() {
        // NumStarters lives one level deeper
        assert!(lookup(SESSION, "WeekendInfo.NumStarters").is_err());
    }

    #[test]
    fn empty_values_resolve_to_empty_text() {
        let text = "WeekendInfo:\n TrackName:\n TrackID: 3\n";
        assert_eq!(lookup(text, "WeekendInfo.TrackName").unwrap(), "");
    }

    #[test]
    fn crlf_line_endings_are_tolerated() {
        let text = "WeekendInfo:\r\n TrackName: monza\r\n";
        assert_eq!(lookup(text, "WeekendInfo.TrackName").unwrap(), "monza");
    }
}
