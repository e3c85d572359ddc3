use std::fmt;

use crate::config::ReportConfig;
use crate::error::{Result, RubricError};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Low,
    Mid,
    High,
}

/// Achievement derived from a score: one level, or the two adjacent levels a
/// score falls between (always low-to-high).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Achievement {
    Single(Level),
    Between(Level, Level),
}

impl Achievement {
    pub fn from_score(score: f64) -> Result<Self> {
        if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(RubricError::ScoreOutOfRange { score });
        }

        let achievement = if score <= 1.0 {
            Achievement::Single(Level::Low)
        } else if score < 2.0 {
            Achievement::Between(Level::Low, Level::Mid)
        } else if score == 2.0 {
            Achievement::Single(Level::Mid)
        } else if score < 3.0 {
            Achievement::Between(Level::Mid, Level::High)
        } else {
            Achievement::Single(Level::High)
        };
        Ok(achievement)
    }

    /// Label such as `middels måloppnåelse` or `lav-middels måloppnåelse`.
    pub fn label(&self, config: &ReportConfig) -> String {
        match *self {
            Achievement::Single(level) => format!(
                "{}{}",
                config.combine_single_prefix,
                config.levels.get(level).to_lowercase()
            ),
            Achievement::Between(low, high) => {
                let low_label = config.levels.get(low);
                let first_word = low_label.split_whitespace().next().unwrap_or(low_label);
                format!(
                    "{}{}{}{}",
                    config.combine_start,
                    first_word.to_lowercase(),
                    config.combine_separator,
                    config.levels.get(high).to_lowercase()
                )
            }
        }
    }
}

/// LaTeX `dvipsnames` colour for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreColor {
    Brown,
    Red,
    RedOrange,
    Orange,
    YellowOrange,
    Green,
    Aquamarine,
}

impl ScoreColor {
    /// Scores are expected to be validated first; anything that fails every
    /// bucket (NaN) lands in the last one.
    pub fn from_score(score: f64) -> Self {
        if score < 1.0 {
            ScoreColor::Brown
        } else if score == 1.0 {
            ScoreColor::Red
        } else if score < 2.0 {
            ScoreColor::RedOrange
        } else if score == 2.0 {
            ScoreColor::Orange
        } else if score < 3.0 {
            ScoreColor::YellowOrange
        } else if score == 3.0 {
            ScoreColor::Green
        } else {
            ScoreColor::Aquamarine
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoreColor::Brown => "Brown",
            ScoreColor::Red => "Red",
            ScoreColor::RedOrange => "RedOrange",
            ScoreColor::Orange => "Orange",
            ScoreColor::YellowOrange => "YellowOrange",
            ScoreColor::Green => "Green",
            ScoreColor::Aquamarine => "Aquamarine",
        }
    }

    pub fn paint(&self, text: &str) -> String {
        format!("\\textcolor{{{}}}{{{}}}", self.name(), text)
    }
}

impl fmt::Display for ScoreColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
