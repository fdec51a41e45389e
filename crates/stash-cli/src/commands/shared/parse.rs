use serde::de::DeserializeOwned;
use stash_core::enums::TimeEstimate;

/// Parse an enum value by its serialized name.
///
/// Capture statuses and activity types are kebab-case, the rest snake_case;
/// either separator is accepted for both.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let trimmed = raw.trim().to_ascii_lowercase();
    let candidates = [
        trimmed.clone(),
        trimmed.replace('_', "-"),
        trimmed.replace('-', "_"),
    ];
    candidates
        .iter()
        .find_map(|candidate| {
            serde_json::from_value::<T>(serde_json::Value::String(candidate.clone())).ok()
        })
        .ok_or_else(|| anyhow::anyhow!("invalid {field} '{raw}'"))
}

/// Parse a time estimate from `5`, `15`, `30`, `60` or their full labels.
pub fn parse_time(raw: &str) -> anyhow::Result<TimeEstimate> {
    let compact: String = raw
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    match compact.trim_end_matches("min+").trim_end_matches("min") {
        "5" => Ok(TimeEstimate::FiveMin),
        "15" => Ok(TimeEstimate::FifteenMin),
        "30" => Ok(TimeEstimate::ThirtyMin),
        "60" | "60+" => Ok(TimeEstimate::SixtyPlus),
        _ => anyhow::bail!("invalid time '{raw}': expected 5, 15, 30 or 60"),
    }
}
