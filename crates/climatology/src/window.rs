//! Date-window resolution.
//!
//! Birth and death events can straddle midnight: a storm born at 23:55 on
//! one SPC date has its first mature row on the next. Each working date is
//! therefore processed together with the neighbour that can hold the other
//! half of its tracks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use storm_common::DateIndex;

/// Largest number of dates a window ever holds.
pub const MAX_WINDOW_SIZE: usize = 2;

/// Which life-cycle event a climatology counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClimatologyMode {
    /// First row of each storm.
    Birth,
    /// Last row of each storm.
    Death,
    /// Every mature row.
    #[default]
    Passage,
}

impl ClimatologyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Birth => "birth",
            Self::Death => "death",
            Self::Passage => "passage",
        }
    }
}

impl fmt::Display for ClimatologyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClimatologyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "birth" | "births" => Ok(Self::Birth),
            "death" | "deaths" => Ok(Self::Death),
            "passage" | "passages" => Ok(Self::Passage),
            other => Err(format!(
                "unknown climatology mode '{}' (expected birth, death or passage)",
                other
            )),
        }
    }
}

/// Date indices that must be loaded together to process `working_index`.
///
/// The caller keeps `working_index` in `[0, total_dates)`; out-of-range
/// input is not an error.
pub fn resolve(
    working_index: DateIndex,
    total_dates: usize,
    mode: ClimatologyMode,
) -> BTreeSet<DateIndex> {
    let mut window = BTreeSet::new();
    window.insert(working_index);

    match mode {
        ClimatologyMode::Passage => {}
        ClimatologyMode::Birth => {
            if working_index > 0 {
                window.insert(working_index - 1);
            }
        }
        ClimatologyMode::Death => {
            if working_index + 1 < total_dates {
                window.insert(working_index + 1);
            }
        }
    }

    window
}
