use std::time::Duration;

/// Parse a Go-style duration such as `2s`, `1500ms`, `1m30s` or `1h`.
///
/// A bare number is rejected; the unit is mandatory so `10` can never be
/// mistaken for ten milliseconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let input = raw.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = input;

    while !rest.is_empty() {
        let digits = rest.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("expected a number in `{input}`"));
        }
        let value: f64 =
            rest[..digits].parse().map_err(|_| format!("bad number in `{input}`"))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(rest.len());
        let seconds = match &rest[..unit_len] {
            "ms" => value / 1000.0,
            "s" => value,
            "m" => value * 60.0,
            "h" => value * 3600.0,
            "" => return Err(format!("missing unit in `{input}`")),
            other => return Err(format!("unknown unit `{other}` in `{input}`")),
        };
        rest = &rest[unit_len..];

        let part = Duration::try_from_secs_f64(seconds)
            .map_err(|e| format!("`{input}` is out of range: {e}"))?;
        total = total.checked_add(part).ok_or_else(|| format!("`{input}` is out of range"))?;
    }

    Ok(total)
}
