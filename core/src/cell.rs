use serde::{Deserialize, Serialize};

use crate::MinePayload;

/// Canonical player-visible state of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Hidden,
    Revealed(u8),
    Flagged,
}

impl CellState {
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }

    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed(_))
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::Hidden
    }
}

/// What lies under a cell, fixed when the board is populated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellContent {
    Mine { payload: MinePayload },
    Safe { adjacent: u8 },
}

impl CellContent {
    pub const fn is_mine(&self) -> bool {
        matches!(self, Self::Mine { .. })
    }

    /// Adjacent mine count, `None` for mines.
    pub const fn adjacent(&self) -> Option<u8> {
        match self {
            Self::Safe { adjacent } => Some(*adjacent),
            Self::Mine { .. } => None,
        }
    }

    pub const fn payload(&self) -> Option<&MinePayload> {
        match self {
            Self::Mine { payload } => Some(payload),
            Self::Safe { .. } => None,
        }
    }
}

impl Default for CellContent {
    fn default() -> Self {
        Self::Safe { adjacent: 0 }
    }
}
