use core::fmt;
use core::ops::RangeInclusive;
use serde::{Deserialize, Serialize};

use crate::*;

pub const BOARD_SIZE_RANGE: RangeInclusive<Coord> = 5..=20;
pub const TILE_SIZE_RANGE: RangeInclusive<u16> = 18..=48;
pub const MAX_HINTS: u8 = 10;

/// Smallest size the large mine image is rendered at.
pub const MIN_LARGE_IMAGE_SIZE: u16 = 72;

/// Cells always kept clear around the first opened cell.
pub const START_BLOCK_CELLS: CellCount = 9;

/// Per-game settings, fixed while a game is in progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Side length of the square board.
    pub board_size: Coord,
    pub mine_count: CellCount,
    /// Rendered tile size in pixels.
    pub tile_size: u16,
    pub hint_budget: u8,
    /// Countdown in seconds, `None` or zero disables the timer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_limit: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: 10,
            mine_count: 15,
            tile_size: 24,
            hint_budget: 3,
            timer_limit: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigField {
    BoardSize,
    MineCount,
    TileSize,
    HintBudget,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BoardSize => "board size",
            Self::MineCount => "mine count",
            Self::TileSize => "tile size",
            Self::HintBudget => "hint budget",
        })
    }
}

/// A configuration value that was adjusted to fit the allowed range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigClamp {
    pub field: ConfigField,
    pub requested: u32,
    pub clamped: u32,
}

/// Most mines a board of `board_size` can hold with a clear start block, at least 1.
pub const fn max_mines(board_size: Coord) -> CellCount {
    let cells = square(board_size);
    if cells > START_BLOCK_CELLS + 1 {
        cells - START_BLOCK_CELLS
    } else {
        1
    }
}

fn clamp_field<T>(
    field: ConfigField,
    value: T,
    range: RangeInclusive<T>,
    clamps: &mut Vec<ConfigClamp>,
) -> T
where
    T: Copy + Ord + Into<u32>,
{
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        let clamp = ConfigClamp {
            field,
            requested: value.into(),
            clamped: clamped.into(),
        };
        log::warn!("Adjusted {} from {} to {}", field, clamp.requested, clamp.clamped);
        clamps.push(clamp);
    }
    clamped
}

impl GameConfig {
    /// Copy of this configuration with every field inside its allowed range,
    /// plus one entry per adjusted field.
    pub fn normalized(&self) -> (Self, Vec<ConfigClamp>) {
        let mut clamps = Vec::new();

        let board_size = clamp_field(
            ConfigField::BoardSize,
            self.board_size,
            BOARD_SIZE_RANGE,
            &mut clamps,
        );
        let mine_count = clamp_field(
            ConfigField::MineCount,
            self.mine_count,
            1..=max_mines(board_size),
            &mut clamps,
        );
        let tile_size = clamp_field(
            ConfigField::TileSize,
            self.tile_size,
            TILE_SIZE_RANGE,
            &mut clamps,
        );
        let hint_budget = clamp_field(
            ConfigField::HintBudget,
            self.hint_budget,
            0..=MAX_HINTS,
            &mut clamps,
        );
        let timer_limit = self.timer_limit.filter(|&secs| secs > 0);

        let config = Self {
            board_size,
            mine_count,
            tile_size,
            hint_budget,
            timer_limit,
        };
        (config, clamps)
    }

    pub const fn total_cells(&self) -> CellCount {
        square(self.board_size)
    }

    /// Size of the enlarged mine image shown when a game is lost.
    pub fn large_image_size(&self) -> u16 {
        self.tile_size.saturating_mul(3).max(MIN_LARGE_IMAGE_SIZE)
    }

    /// One themed asset per mine, rendered at the tile and loss-popup sizes.
    pub fn asset_request(&self) -> AssetRequest {
        AssetRequest {
            count: self.mine_count.into(),
            small_size: self.tile_size,
            large_size: self.large_image_size(),
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|err| GameError::InvalidConfig(err.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|err| GameError::InvalidConfig(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_already_normalized() {
        let config = GameConfig::default();
        let (normalized, clamps) = config.normalized();

        assert_eq!(normalized, config);
        assert!(clamps.is_empty());
    }

    #[test]
    fn mines_capped_by_start_block() {
        assert_eq!(max_mines(5), 16);
        assert_eq!(max_mines(10), 91);
        assert_eq!(max_mines(3), 1);
        assert_eq!(max_mines(1), 1);
    }

    #[test]
    fn out_of_range_fields_are_clamped_and_reported() {
        let config = GameConfig {
            board_size: 30,
            mine_count: 500,
            tile_size: 10,
            hint_budget: 12,
            timer_limit: Some(0),
        };

        let (normalized, clamps) = config.normalized();

        assert_eq!(
            normalized,
            GameConfig {
                board_size: 20,
                mine_count: 391,
                tile_size: 18,
                hint_budget: 10,
                timer_limit: None,
            }
        );
        assert_eq!(
            clamps,
            vec![
                ConfigClamp {
                    field: ConfigField::BoardSize,
                    requested: 30,
                    clamped: 20
                },
                ConfigClamp {
                    field: ConfigField::MineCount,
                    requested: 500,
                    clamped: 391
                },
                ConfigClamp {
                    field: ConfigField::TileSize,
                    requested: 10,
                    clamped: 18
                },
                ConfigClamp {
                    field: ConfigField::HintBudget,
                    requested: 12,
                    clamped: 10
                },
            ]
        );
    }

    #[test]
    fn zero_mines_raised_to_one() {
        let config = GameConfig {
            mine_count: 0,
            ..Default::default()
        };
        let (normalized, clamps) = config.normalized();

        assert_eq!(normalized.mine_count, 1);
        assert_eq!(clamps.len(), 1);
    }

    #[test]
    fn large_image_size_has_floor() {
        let mut config = GameConfig::default();
        assert_eq!(config.large_image_size(), 72);
        config.tile_size = 32;
        assert_eq!(config.large_image_size(), 96);
    }

    #[test]
    fn asset_request_follows_tile_size() {
        let config = GameConfig {
            mine_count: 12,
            tile_size: 40,
            ..Default::default()
        };

        assert_eq!(
            config.asset_request(),
            AssetRequest {
                count: 12,
                small_size: 40,
                large_size: 120,
            }
        );
    }

    #[test]
    fn parses_partial_toml() {
        let config = GameConfig::from_toml_str(
            r#"
            board_size = 12
            mine_count = 200
            timer_limit = 90
            "#,
        )
        .unwrap();

        assert_eq!(config.board_size, 12);
        assert_eq!(config.tile_size, 24);
        assert_eq!(config.timer_limit, Some(90));
        assert_eq!(config.normalized().0.mine_count, 135);
    }

    #[test]
    fn rejects_malformed_toml() {
        let result = GameConfig::from_toml_str("board_size = \"big\"");
        assert!(matches!(result, Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn toml_output_reads_back() {
        let config = GameConfig {
            timer_limit: Some(120),
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();

        assert!(text.contains("timer_limit = 120"));
        assert_eq!(GameConfig::from_toml_str(&text).unwrap(), config);
    }
}
