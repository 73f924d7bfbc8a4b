// Line decoder - turns one raw anemometer line into ordered key/value fields
use crate::domain::frame::FieldMap;

/// Decode a raw line. Two encodings are understood:
/// comma-separated `key value` pairs (`S 1.2, D 90`) and a flat
/// whitespace-separated token run consumed two at a time (`S 1.2 D 90`).
/// Malformed pairs are skipped; the result may be empty.
pub fn decode_line(line: &str) -> FieldMap {
    let line = line.trim();
    let mut fields = FieldMap::new();

    if line.contains(',') {
        for pair in line.split(',') {
            if let Some((key, value)) = pair.trim().split_once(' ') {
                let key = key.trim();
                if !key.is_empty() {
                    fields.insert(key, value.trim());
                }
            }
        }
    } else {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        for pair in tokens.chunks_exact(2) {
            fields.insert(pair[0], pair[1]);
        }
    }

    fields
}
