pub const NAME_LINE_LEN: usize = 24;
pub const ELEMENT_LINE_LEN: usize = 69;

pub const REQUIRED_SATELLITES: [&str; 3] = ["NOAA 15", "NOAA 18", "NOAA 19"];

pub fn is_keplers(data: &str) -> bool {
    match scan(data) {
        Some(found) => found.iter().all(|seen| *seen),
        None => false,
    }
}

pub fn missing_satellites(data: &str) -> Vec<&'static str> {
    let found = scan(data).unwrap_or([false; 3]);
    REQUIRED_SATELLITES
        .iter()
        .zip(found)
        .filter(|(_, seen)| !seen)
        .map(|(name, _)| *name)
        .collect()
}

fn scan(data: &str) -> Option<[bool; 3]> {
    if data.is_empty() {
        return None;
    }

    let lines = split_lines(data);
    let mut found = [false; 3];
    for record in lines.chunks(3) {
        if char_len(record[0]) != NAME_LINE_LEN {
            return None;
        }
        let [name, line1, line2] = record else {
            return None;
        };
        if char_len(line1) != ELEMENT_LINE_LEN || char_len(line2) != ELEMENT_LINE_LEN {
            return None;
        }

        let name = name.trim_end();
        if let Some(index) = REQUIRED_SATELLITES.iter().position(|sat| *sat == name) {
            found[index] = true;
        }
    }
    Some(found)
}

/// Splits on `\n`, `\r\n` and a lone `\r`. A trailing terminator does not
/// start another line.
fn split_lines(data: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        match rest.find(['\n', '\r']) {
            Some(pos) => {
                lines.push(&rest[..pos]);
                let skip = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[pos + skip..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}
