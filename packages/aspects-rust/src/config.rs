/// Settings shared by the stock interceptors.
#[derive(Debug, Clone)]
pub struct AspectConfig {
    /// Include the parameter snapshot in call logs.
    pub log_parameters: bool,
    /// Include the return value in completion logs.
    pub log_return_values: bool,
    /// Calls taking at least this long are logged at `warn`.
    pub slow_call_threshold_ms: u64,
    /// Rendered parameters and return values longer than this many
    /// characters are cut and suffixed with `…`.
    pub max_logged_value_len: usize,
}

impl Default for AspectConfig {
    fn default() -> Self {
        Self {
            log_parameters: true,
            log_return_values: true,
            slow_call_threshold_ms: 500,
            max_logged_value_len: 256,
        }
    }
}

impl AspectConfig {
    /// Render `value` for a log line, honoring `max_logged_value_len`.
    #[must_use]
    pub fn truncate(&self, value: String) -> String {
        if value.chars().count() <= self.max_logged_value_len {
            return value;
        }
        let mut cut: String = value.chars().take(self.max_logged_value_len).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_values_are_untouched() {
        let config = AspectConfig::default();
        assert_eq!(config.truncate("abc".into()), "abc");
    }

    #[test]
    fn long_values_are_cut_on_char_boundary() {
        let config = AspectConfig {
            max_logged_value_len: 3,
            ..AspectConfig::default()
        };
        assert_eq!(config.truncate("héllo".into()), "hél…");
    }
}
