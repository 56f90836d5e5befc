/// Metric key derived from a `host:port` address.
///
/// `.` becomes `_` and `:` becomes `-`, since Mackerel treats `.` as a
/// path separator in metric names: `10.0.0.1:6379` → `10_0_0_1-6379`.
pub fn address_key(address: &str) -> String {
    address
        .chars()
        .map(|c| match c {
            '.' => '_',
            ':' => '-',
            other => other,
        })
        .collect()
}

/// Upper-case the first letter of every word.
///
/// Letters, digits and `_` continue a word; anything else starts a new one,
/// so `redis latency` → `Redis Latency` and `pub-sub` → `Pub-Sub`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;

    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }
    out
}
