use crate::formats::Segment;

/// Parses a bilingual subtitle text into segments.
///
/// Blocks are separated by blank (or whitespace-only) lines. A block becomes
/// a segment when its first line is a bare positive integer and it has at
/// least three non-empty lines; anything else is dropped. Lines past the
/// third are ignored.
pub fn parse_transcript(text: &str) -> Vec<Segment> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let text = text.replace("\r\n", "\n");

    let mut segments = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            segments.extend(parse_block(&block));
            block.clear();
            continue;
        }
        block.push(line);
    }
    segments.extend(parse_block(&block));

    segments
}

fn parse_block(lines: &[&str]) -> Option<Segment> {
    let [first, primary, secondary, ..] = lines else {
        return None;
    };
    let id = parse_sequence_id(first)?;
    Some(Segment {
        id,
        primary: (*primary).to_owned(),
        secondary: (*secondary).to_owned(),
    })
}

fn parse_sequence_id(line: &str) -> Option<u64> {
    if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    line.parse::<u64>().ok().filter(|id| *id > 0)
}
