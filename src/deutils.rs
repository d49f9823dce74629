// src/deutils.rs
use arrayvec::ArrayString;
use core::fmt::Write;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// OctoPrint reports sizes and times as ints, floats, strings or null depending on version.
pub fn deserialize_opt_u64_from_anything<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f.round() as u64),
        _ => None,
    })
}

/// Null-tolerant float, used for temperatures and completion.
pub fn deserialize_opt_f64_from_anything<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite()))
}

/// Celsius to whole Fahrenheit, rounded half away from zero.
pub fn c_to_f(celsius: f64) -> i32 {
    (celsius * 9.0 / 5.0 + 32.0).round() as i32
}

/// Splits a second count into (days, hours, minutes); leftover seconds are dropped.
pub fn seconds_to_dhm(total_seconds: u64) -> (u64, u64, u64) {
    let days = total_seconds / 86_400;
    let rem = total_seconds % 86_400;
    (days, rem / 3600, (rem % 3600) / 60)
}

/// "DD:HH:MM" for the ETA line, zeros when unknown.
pub fn format_eta(total_seconds: Option<u64>) -> ArrayString<16> {
    let (d, h, m) = seconds_to_dhm(total_seconds.unwrap_or(0));
    let mut s = ArrayString::<16>::new();
    // days beyond 99 are clamped so the string always fits
    let _ = write!(s, "{:02}:{:02}:{:02}", d.min(99), h, m);
    s
}

/// 1234567 -> "1,234,567"
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// "benchy_v2.gcode" -> "benchy v2"
pub fn pretty_file_name(name: &str) -> String {
    name.replace('_', " ").replace(".gcode", "")
}
