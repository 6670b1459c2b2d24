use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Validation failures for timer commands.
///
/// Always synchronous; a failed command leaves the machine untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// Command not allowed while the countdown is running.
    #[error("cannot {operation} while the timer is running")]
    InvalidOperation { operation: String },

    /// A value violates its invariant.
    #[error("invalid value for '{field}': {message}")]
    InvalidArgument { field: String, message: String },
}

/// Phase of the Pomodoro cycle.
///
/// Serialized kebab-case (`work`, `short-break`, `long-break`), which is
/// also the form accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    /// Human-readable label for display surfaces.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Work => "work",
            Phase::ShortBreak => "short-break",
            Phase::LongBreak => "long-break",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Phase {
    type Err = TimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(Phase::Work),
            "short-break" => Ok(Phase::ShortBreak),
            "long-break" => Ok(Phase::LongBreak),
            other => Err(TimerError::InvalidArgument {
                field: "phase".into(),
                message: format!("expected work, short-break or long-break, got '{other}'"),
            }),
        }
    }
}

/// Interval lengths for each phase plus the long-break cadence.
///
/// Doubles as the `[timer]` section of `config.toml`; per-field serde
/// defaults let a partial section deserialize to a complete config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_cycles_per_long_break")]
    pub cycles_per_long_break: u32,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_cycles_per_long_break() -> u32 {
    4
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            cycles_per_long_break: default_cycles_per_long_break(),
        }
    }
}

impl DurationConfig {
    /// All four values must be at least 1.
    pub fn validate(&self) -> Result<(), TimerError> {
        let fields = [
            ("work_minutes", self.work_minutes),
            ("short_break_minutes", self.short_break_minutes),
            ("long_break_minutes", self.long_break_minutes),
            ("cycles_per_long_break", self.cycles_per_long_break),
        ];
        for (field, value) in fields {
            if value < 1 {
                return Err(TimerError::InvalidArgument {
                    field: field.into(),
                    message: format!("must be at least 1, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Countdown length in seconds for the given phase.
    pub fn phase_secs(&self, phase: Phase) -> u64 {
        let minutes = match phase {
            Phase::Work => self.work_minutes,
            Phase::ShortBreak => self.short_break_minutes,
            Phase::LongBreak => self.long_break_minutes,
        };
        u64::from(minutes) * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_classic_pomodoro() {
        let cfg = DurationConfig::default();
        assert_eq!(cfg.work_minutes, 25);
        assert_eq!(cfg.short_break_minutes, 5);
        assert_eq!(cfg.long_break_minutes, 15);
        assert_eq!(cfg.cycles_per_long_break, 4);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_fields() {
        let cfg = DurationConfig {
            work_minutes: 0,
            ..DurationConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, TimerError::InvalidArgument { ref field, .. } if field == "work_minutes"));

        let cfg = DurationConfig {
            cycles_per_long_break: 0,
            ..DurationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn phase_secs_selects_the_right_duration() {
        let cfg = DurationConfig::default();
        assert_eq!(cfg.phase_secs(Phase::Work), 25 * 60);
        assert_eq!(cfg.phase_secs(Phase::ShortBreak), 5 * 60);
        assert_eq!(cfg.phase_secs(Phase::LongBreak), 15 * 60);
    }

    #[test]
    fn phase_parses_kebab_case() {
        assert_eq!("work".parse::<Phase>().unwrap(), Phase::Work);
        assert_eq!("short-break".parse::<Phase>().unwrap(), Phase::ShortBreak);
        assert_eq!("long-break".parse::<Phase>().unwrap(), Phase::LongBreak);
        assert!("coffee".parse::<Phase>().is_err());
    }

    #[test]
    fn phase_display_matches_serde_form() {
        assert_eq!(Phase::ShortBreak.to_string(), "short-break");
        let json = serde_json::to_string(&Phase::ShortBreak).unwrap();
        assert_eq!(json, "\"short-break\"");
    }

    #[test]
    fn partial_toml_section_fills_defaults() {
        let cfg: DurationConfig = toml::from_str("work_minutes = 50").unwrap();
        assert_eq!(cfg.work_minutes, 50);
        assert_eq!(cfg.short_break_minutes, 5);
        assert_eq!(cfg.cycles_per_long_break, 4);
    }
}
