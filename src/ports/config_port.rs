//! Configuration access port trait.

use chrono::NaiveDate;

use crate::domain::error::SigtraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Number, or `default` when the key is absent or blank. A value that
    /// does not parse is `ConfigInvalid`.
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SigtraderError> {
        match self.get_string(section, key) {
            Some(s) if !s.trim().is_empty() => {
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| SigtraderError::ConfigInvalid {
                        section: section.to_string(),
                        key: key.to_string(),
                        reason: format!("expected a number, got '{}'", s.trim()),
                    })
            }
            _ => Ok(default),
        }
    }

    /// `YYYY-MM-DD` date; `Ok(None)` when the key is absent or blank.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, SigtraderError> {
        match self.get_string(section, key) {
            Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| SigtraderError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: "invalid date format (expected YYYY-MM-DD)".to_string(),
                }),
            _ => Ok(None),
        }
    }
}
