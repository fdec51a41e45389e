/// Compute effective limit: the global `--limit` flag, else the configured default.
#[must_use]
pub fn effective_limit(flag: Option<u32>, default_limit: u32) -> u32 {
    flag.filter(|limit| *limit > 0).unwrap_or(default_limit)
}

#[cfg(test)]
mod tests {
    use super::effective_limit;

    #[test]
    fn flag_takes_precedence() {
        assert_eq!(effective_limit(Some(5), 20), 5);
    }

    #[test]
    fn default_used_when_flag_missing_or_zero() {
        assert_eq!(effective_limit(None, 20), 20);
        assert_eq!(effective_limit(Some(0), 20), 20);
    }
}
