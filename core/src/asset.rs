use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AssetError;

/// Text drawn on a mine when no themed image is available.
pub const FALLBACK_MARKER: char = 'P';

/// Display name used for mines without a themed asset.
pub const FALLBACK_NAME: &str = "Pokémon";

const SPRITE_BASE_URL: &str = concat!(
    "https://raw.githubusercontent.com",
    "/PokeAPI/sprites/master/sprites/pokemon"
);

/// Opaque reference to an image resolved by the presentation layer, plus the
/// square size in pixels it should be rendered at.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub size_px: u16,
}

impl ImageRef {
    pub fn new(url: impl Into<String>, size_px: u16) -> Self {
        Self {
            url: url.into(),
            size_px,
        }
    }

    /// Sprite of the catalog entry `catalog_id`.
    pub fn sprite(catalog_id: u16, size_px: u16) -> Self {
        Self::new(format!("{SPRITE_BASE_URL}/{catalog_id}.png"), size_px)
    }
}

/// Display identity of one themed mine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineAsset {
    pub display_name: String,
    pub small_image: ImageRef,
    pub large_image: ImageRef,
}

impl MineAsset {
    pub fn new(
        display_name: impl Into<String>,
        small_image: ImageRef,
        large_image: ImageRef,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            small_image,
            large_image,
        }
    }

    /// Asset for catalog entry `catalog_id` using one sprite at both render sizes.
    pub fn from_catalog(
        catalog_id: u16,
        display_name: impl Into<String>,
        tile_size: u16,
        large_size: u16,
    ) -> Self {
        Self::new(
            display_name,
            ImageRef::sprite(catalog_id, tile_size),
            ImageRef::sprite(catalog_id, large_size),
        )
    }
}

/// What a mine shows once uncovered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MinePayload {
    Themed(Arc<MineAsset>),
    Fallback,
}

impl MinePayload {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Themed(asset) => &asset.display_name,
            Self::Fallback => FALLBACK_NAME,
        }
    }

    pub fn small_image(&self) -> Option<&ImageRef> {
        match self {
            Self::Themed(asset) => Some(&asset.small_image),
            Self::Fallback => None,
        }
    }

    pub fn large_image(&self) -> Option<&ImageRef> {
        match self {
            Self::Themed(asset) => Some(&asset.large_image),
            Self::Fallback => None,
        }
    }

    /// Textual marker for payloads without an image.
    pub fn marker(&self) -> Option<char> {
        match self {
            Self::Themed(_) => None,
            Self::Fallback => Some(FALLBACK_MARKER),
        }
    }

    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

impl From<MineAsset> for MinePayload {
    fn from(asset: MineAsset) -> Self {
        Self::Themed(Arc::new(asset))
    }
}

/// What to fetch for one board: how many assets and at which render sizes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AssetRequest {
    pub count: usize,
    /// Tile size in pixels.
    pub small_size: u16,
    /// Size of the image shown when a mine ends the game.
    pub large_size: u16,
}

/// Source of themed mine assets, typically backed by a remote catalog.
///
/// Fetching is best effort: implementations may return fewer than
/// `request.count` entries or fail outright.
pub trait AssetProvider {
    fn fetch_mine_asset_pool(
        &mut self,
        request: &AssetRequest,
    ) -> Result<Vec<MineAsset>, AssetError>;
}

/// Provider serving a fixed in-memory list, or failing every request.
#[derive(Clone, Debug, Default)]
pub struct StaticAssetProvider {
    assets: Option<Vec<MineAsset>>,
}

impl StaticAssetProvider {
    pub fn new(assets: Vec<MineAsset>) -> Self {
        Self {
            assets: Some(assets),
        }
    }

    pub fn unavailable() -> Self {
        Self { assets: None }
    }
}

impl AssetProvider for StaticAssetProvider {
    fn fetch_mine_asset_pool(
        &mut self,
        request: &AssetRequest,
    ) -> Result<Vec<MineAsset>, AssetError> {
        let Some(assets) = &self.assets else {
            return Err(AssetError::CatalogUnavailable("no assets configured".into()));
        };

        Ok(assets
            .iter()
            .take(request.count)
            .map(|asset| {
                let mut asset = asset.clone();
                asset.small_image.size_px = request.small_size;
                asset.large_image.size_px = request.large_size;
                asset
            })
            .collect())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AssetReport {
    pub requested: usize,
    pub received: usize,
}

impl AssetReport {
    pub const fn is_degraded(&self) -> bool {
        self.received < self.requested
    }
}

/// Fetches the requested mine assets, turning any failure into a shorter pool.
pub fn resolve_mine_pool<P>(
    provider: &mut P,
    request: &AssetRequest,
) -> (Vec<MineAsset>, AssetReport)
where
    P: AssetProvider + ?Sized,
{
    let count = request.count;
    let mut pool = match provider.fetch_mine_asset_pool(request) {
        Ok(pool) => pool,
        Err(err) => {
            log::warn!("Mine assets unavailable, mines use fallback markers: {}", err);
            Vec::new()
        }
    };
    pool.truncate(count);

    let report = AssetReport {
        requested: count,
        received: pool.len(),
    };
    if report.is_degraded() && report.received > 0 {
        log::warn!(
            "Only {} of {} mine assets loaded, mines will use fallback markers",
            report.received,
            report.requested
        );
    }
    (pool, report)
}

#[cfg(test)]
pub(crate) fn sample_assets(count: u16) -> Vec<MineAsset> {
    (1..=count)
        .map(|id| MineAsset::from_catalog(id, format!("Critter #{id}"), 24, 72))
        .collect()
}
