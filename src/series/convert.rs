use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Binary byte unit used when rescaling counters for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ByteUnit {
    B,
    Kib,
    Mib,
    Gib,
}

impl ByteUnit {
    pub fn divisor(self) -> f64 {
        match self {
            Self::B => 1.0,
            Self::Kib => 1024.0,
            Self::Mib => 1024.0 * 1024.0,
            Self::Gib => 1024.0 * 1024.0 * 1024.0,
        }
    }

    pub fn scale(self, bytes: f64) -> f64 {
        bytes / self.divisor()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::B => "B",
            Self::Kib => "KiB",
            Self::Mib => "MiB",
            Self::Gib => "GiB",
        }
    }
}

/// Shift a stored timestamp by the fixed display offset and format it.
pub fn display_time(ts: NaiveDateTime, offset: chrono::Duration) -> String {
    let shifted = ts.checked_add_signed(offset).unwrap_or(ts);
    shifted.format(DISPLAY_TIME_FORMAT).to_string()
}
