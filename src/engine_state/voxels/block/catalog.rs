//! # Block Catalog
//!
//! Data-driven description of every block the engine knows about. Records are plain
//! data loaded from JSON (the built-in set ships in `assets/blocks.json`); there is no
//! per-block code. Behaviour that differs between blocks is expressed through a small
//! closed set of tags such as [`DropBehavior`].
//!
//! Lighting only needs `opacity` and `emissive_color`, face culling needs the
//! transparency flags, and the mesher additionally reads textures and tint.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use super::block_side::BlockSide;
use super::{BlockId, AIR, UNKNOWN_BLOCK};

/// Highest value a light nibble (and therefore an opacity) can take.
pub const MAX_NIBBLE: u8 = 15;

const BUILTIN_CATALOG: &str = include_str!("../../../../assets/blocks.json");

/// Errors produced while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse block catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("block id {0} is reserved")]
    ReservedId(BlockId),
    #[error("block id {id} is registered twice (`{first}` and `{second}`)")]
    DuplicateId {
        id: BlockId,
        first: String,
        second: String,
    },
    #[error("block name `{0}` is registered twice")]
    DuplicateName(String),
    #[error("block `{name}` has opacity {opacity}, expected 0..=15")]
    OpacityOutOfRange { name: String, opacity: u8 },
    #[error("block `{name}` has emission channel value {value}, expected 0..=15")]
    EmissionOutOfRange { name: String, value: u8 },
    #[error("block `{name}` has no texture for its {side:?} face")]
    MissingTexture { name: String, side: BlockSide },
}

/// A rectangle in the texture atlas: `[u0, v0, u1, v1]`.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(transparent)]
pub struct UvRect(pub [f32; 4]);

impl UvRect {
    /// Marks "no mask texture". Lies outside the `0..=1` atlas range on purpose.
    pub const UNUSED: UvRect = UvRect([-1.0, -1.0, -1.0, -1.0]);

    /// `true` for the [`UvRect::UNUSED`] sentinel.
    pub fn is_unused(&self) -> bool {
        self.0.iter().any(|coordinate| *coordinate < 0.0)
    }

    pub fn u0(&self) -> f32 {
        self.0[0]
    }

    pub fn v0(&self) -> f32 {
        self.0[1]
    }

    pub fn u1(&self) -> f32 {
        self.0[2]
    }

    pub fn v1(&self) -> f32 {
        self.0[3]
    }
}

/// Per-face atlas rectangles. `top`/`bottom`/`side` override `all`.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct FaceTextures {
    #[serde(default)]
    pub all: Option<UvRect>,
    #[serde(default)]
    pub top: Option<UvRect>,
    #[serde(default)]
    pub bottom: Option<UvRect>,
    #[serde(default)]
    pub side: Option<UvRect>,
}

impl FaceTextures {
    /// Uses the same rectangle for every face.
    pub fn uniform(rect: UvRect) -> Self {
        FaceTextures {
            all: Some(rect),
            ..Default::default()
        }
    }

    /// Resolves the rectangle used by one face.
    pub fn resolve(&self, side: BlockSide) -> Option<UvRect> {
        match side {
            BlockSide::TOP => self.top.or(self.all),
            BlockSide::BOTTOM => self.bottom.or(self.all),
            _ => self.side.or(self.all),
        }
    }
}

/// How a block participates in meshing.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockCategory {
    /// Culls every face behind it.
    #[default]
    Solid,
    /// Lets faces behind it show through (glass, leaves).
    Transparent,
    /// Transparent, and emitted into the separate unlit liquid buffer.
    Liquid,
}

/// Where the per-vertex tint color of a block comes from.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TintSource {
    /// Plain white.
    #[default]
    None,
    /// Sampled from the biome color field at the block's world position.
    Biome,
    /// A constant RGBA color.
    Fixed([f32; 4]),
}

/// What breaking a block yields.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DropBehavior {
    /// The block drops itself.
    #[default]
    #[serde(rename = "self")]
    DropsSelf,
    /// The block drops nothing.
    Nothing,
    /// The block drops a different block.
    Block(BlockId),
}

/// Light emitted by a block, one nibble per channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EmissiveColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// One validated catalog record.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockCatalogEntry {
    pub id: BlockId,
    pub name: String,
    /// Light attenuation when passing through the block; 15 blocks light completely.
    pub opacity: u8,
    pub category: BlockCategory,
    /// When set, two neighbouring cells of this block hide their shared faces.
    pub transparency_culls_self: bool,
    pub emissive_color: Option<EmissiveColor>,
    pub textures: FaceTextures,
    pub mask: Option<FaceTextures>,
    pub tint: TintSource,
    pub drops: DropBehavior,
}

impl BlockCatalogEntry {
    /// A fully opaque solid block using one atlas rectangle on every face.
    pub fn solid(id: BlockId, name: &str, texture: UvRect) -> Self {
        BlockCatalogEntry {
            id,
            name: name.to_string(),
            opacity: MAX_NIBBLE,
            category: BlockCategory::Solid,
            transparency_culls_self: false,
            emissive_color: None,
            textures: FaceTextures::uniform(texture),
            mask: None,
            tint: TintSource::None,
            drops: DropBehavior::DropsSelf,
        }
    }

    pub fn with_category(mut self, category: BlockCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_self_culling(mut self, culls_self: bool) -> Self {
        self.transparency_culls_self = culls_self;
        self
    }

    pub fn with_emission(mut self, red: u8, green: u8, blue: u8) -> Self {
        self.emissive_color = Some(EmissiveColor { red, green, blue });
        self
    }

    pub fn with_tint(mut self, tint: TintSource) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_drops(mut self, drops: DropBehavior) -> Self {
        self.drops = drops;
        self
    }

    /// Transparent and liquid blocks both let neighbouring faces show.
    pub fn is_transparent(&self) -> bool {
        self.category != BlockCategory::Solid
    }

    pub fn is_liquid(&self) -> bool {
        self.category == BlockCategory::Liquid
    }

    pub fn is_emissive(&self) -> bool {
        self.emissive_color.is_some()
    }

    /// Atlas rectangle for one face. Validation guarantees every face resolves.
    pub fn texture(&self, side: BlockSide) -> UvRect {
        self.textures.resolve(side).unwrap_or(UvRect::UNUSED)
    }

    /// Mask overlay rectangle for one face, or [`UvRect::UNUSED`].
    pub fn mask_texture(&self, side: BlockSide) -> UvRect {
        self.mask
            .and_then(|mask| mask.resolve(side))
            .unwrap_or(UvRect::UNUSED)
    }

    /// The block id produced when this block is destroyed, if any.
    pub fn resolve_drop(&self) -> Option<BlockId> {
        match self.drops {
            DropBehavior::DropsSelf => Some(self.id),
            DropBehavior::Nothing => None,
            DropBehavior::Block(id) => Some(id),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.id <= AIR {
            return Err(CatalogError::ReservedId(self.id));
        }
        if self.opacity > MAX_NIBBLE {
            return Err(CatalogError::OpacityOutOfRange {
                name: self.name.clone(),
                opacity: self.opacity,
            });
        }
        if let Some(color) = self.emissive_color {
            for value in [color.red, color.green, color.blue] {
                if value > MAX_NIBBLE {
                    return Err(CatalogError::EmissionOutOfRange {
                        name: self.name.clone(),
                        value,
                    });
                }
            }
        }
        for side in BlockSide::all() {
            if self.textures.resolve(side).is_none() {
                return Err(CatalogError::MissingTexture {
                    name: self.name.clone(),
                    side,
                });
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct BlockRecord {
    id: BlockId,
    name: String,
    #[serde(default = "opaque")]
    opacity: u8,
    #[serde(default)]
    category: BlockCategory,
    #[serde(default)]
    transparency_culls_self: bool,
    #[serde(default)]
    emission: Option<[u8; 3]>,
    textures: FaceTextures,
    #[serde(default)]
    mask: Option<FaceTextures>,
    #[serde(default)]
    tint: TintSource,
    #[serde(default)]
    drops: DropBehavior,
}

fn opaque() -> u8 {
    MAX_NIBBLE
}

#[derive(Deserialize)]
struct CatalogFile {
    blocks: Vec<BlockRecord>,
}

impl From<BlockRecord> for BlockCatalogEntry {
    fn from(record: BlockRecord) -> Self {
        BlockCatalogEntry {
            id: record.id,
            name: record.name,
            opacity: record.opacity,
            category: record.category,
            transparency_culls_self: record.transparency_culls_self,
            emissive_color: record.emission.map(|[red, green, blue]| EmissiveColor {
                red,
                green,
                blue,
            }),
            textures: record.textures,
            mask: record.mask,
            tint: record.tint,
            drops: record.drops,
        }
    }
}

/// Read-only lookup from block id to its catalog record.
///
/// Ids index a dense table, so lookups on the lighting and meshing hot paths are a
/// bounds check and a load.
#[derive(Debug)]
pub struct BlockCatalog {
    entries: Vec<Option<BlockCatalogEntry>>,
    by_name: HashMap<String, BlockId>,
    missing: BlockCatalogEntry,
}

impl BlockCatalog {
    /// Builds a catalog from already constructed records.
    pub fn from_entries(
        entries: impl IntoIterator<Item = BlockCatalogEntry>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = BlockCatalog {
            entries: Vec::new(),
            by_name: HashMap::new(),
            missing: BlockCatalogEntry::solid(
                UNKNOWN_BLOCK,
                "missing",
                UvRect([0.9375, 0.9375, 1.0, 1.0]),
            )
            .with_drops(DropBehavior::Nothing),
        };

        for entry in entries {
            catalog.register(entry)?;
        }

        Ok(catalog)
    }

    /// Parses a catalog from its JSON form: `{ "blocks": [ { "id": 1, ... } ] }`.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_entries(file.blocks.into_iter().map(BlockCatalogEntry::from))
    }

    /// The catalog bundled with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    fn register(&mut self, entry: BlockCatalogEntry) -> Result<(), CatalogError> {
        entry.validate()?;

        let index = entry.id as usize;
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        if let Some(existing) = &self.entries[index] {
            return Err(CatalogError::DuplicateId {
                id: entry.id,
                first: existing.name.clone(),
                second: entry.name,
            });
        }
        if self.by_name.contains_key(&entry.name) {
            return Err(CatalogError::DuplicateName(entry.name));
        }

        self.by_name.insert(entry.name.clone(), entry.id);
        self.entries[index] = Some(entry);
        Ok(())
    }

    /// Looks up a registered block. Air, the unknown sentinel and unregistered ids
    /// have no record.
    #[inline]
    pub fn lookup(&self, id: BlockId) -> Option<&BlockCatalogEntry> {
        if id <= AIR {
            return None;
        }
        self.entries.get(id as usize).and_then(Option::as_ref)
    }

    /// Like [`lookup`](Self::lookup) but falls back to an opaque placeholder record.
    #[inline]
    pub fn entry_or_missing(&self, id: BlockId) -> &BlockCatalogEntry {
        self.lookup(id).unwrap_or(&self.missing)
    }

    /// Opacity as seen by light propagation: air is 0, anything unknown is 15.
    #[inline]
    pub fn opacity(&self, id: BlockId) -> u8 {
        match id {
            AIR => 0,
            UNKNOWN_BLOCK => MAX_NIBBLE,
            _ => self.lookup(id).map_or(MAX_NIBBLE, |entry| entry.opacity),
        }
    }

    #[inline]
    pub fn emission(&self, id: BlockId) -> Option<EmissiveColor> {
        self.lookup(id).and_then(|entry| entry.emissive_color)
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Number of registered blocks (air excluded).
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &BlockCatalogEntry> {
        self.entries.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: UvRect = UvRect([0.0, 0.0, 0.0625, 0.0625]);

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = BlockCatalog::builtin().expect("bundled catalog is valid");
        assert!(!catalog.is_empty());

        let stone = catalog.id_by_name("stone").expect("stone is built in");
        let entry = catalog.lookup(stone).expect("stone has a record");
        assert_eq!(entry.opacity, 15);
        assert!(!entry.is_transparent());

        let water = catalog.id_by_name("water").expect("water is built in");
        let water = catalog.lookup(water).expect("water has a record");
        assert!(water.is_liquid());
        assert!(water.is_transparent());
        assert!(water.transparency_culls_self);
    }

    #[test]
    fn test_air_and_unknown_opacity() {
        let catalog = BlockCatalog::from_entries([]).unwrap();
        assert_eq!(catalog.opacity(AIR), 0);
        assert_eq!(catalog.opacity(UNKNOWN_BLOCK), 15);
        assert_eq!(catalog.opacity(42), 15);
        assert!(catalog.lookup(AIR).is_none());
        assert_eq!(catalog.entry_or_missing(42).name, "missing");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = BlockCatalog::from_entries([
            BlockCatalogEntry::solid(3, "a", TILE),
            BlockCatalogEntry::solid(3, "b", TILE),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicateId { id: 3, .. })));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let result = BlockCatalog::from_entries([BlockCatalogEntry::solid(1, "a", TILE)
            .with_opacity(16)]);
        assert!(matches!(result, Err(CatalogError::OpacityOutOfRange { .. })));

        let result = BlockCatalog::from_entries([BlockCatalogEntry::solid(1, "a", TILE)
            .with_emission(15, 16, 0)]);
        assert!(matches!(result, Err(CatalogError::EmissionOutOfRange { value: 16, .. })));

        let result = BlockCatalog::from_entries([BlockCatalogEntry::solid(0, "air", TILE)]);
        assert!(matches!(result, Err(CatalogError::ReservedId(0))));
    }

    #[test]
    fn test_json_tags_and_face_resolution() {
        let json = r#"{
            "blocks": [
                {
                    "id": 5,
                    "name": "grassy",
                    "textures": { "all": [0.0, 0.0, 0.1, 0.1], "top": [0.5, 0.5, 0.6, 0.6] },
                    "mask": { "side": [0.2, 0.2, 0.3, 0.3] },
                    "tint": "biome",
                    "drops": { "block": 7 }
                },
                {
                    "id": 7,
                    "name": "pebble",
                    "opacity": 3,
                    "category": "transparent",
                    "textures": { "all": [0.0, 0.0, 0.1, 0.1] },
                    "tint": { "fixed": [1.0, 0.5, 0.5, 1.0] },
                    "drops": "nothing"
                }
            ]
        }"#;
        let catalog = BlockCatalog::from_json_str(json).expect("valid json");

        let grassy = catalog.lookup(5).unwrap();
        assert_eq!(grassy.texture(BlockSide::TOP), UvRect([0.5, 0.5, 0.6, 0.6]));
        assert_eq!(grassy.texture(BlockSide::LEFT), UvRect([0.0, 0.0, 0.1, 0.1]));
        assert_eq!(grassy.mask_texture(BlockSide::LEFT), UvRect([0.2, 0.2, 0.3, 0.3]));
        assert!(grassy.mask_texture(BlockSide::TOP).is_unused());
        assert_eq!(grassy.tint, TintSource::Biome);
        assert_eq!(grassy.resolve_drop(), Some(7));

        let pebble = catalog.lookup(7).unwrap();
        assert_eq!(pebble.opacity, 3);
        assert!(pebble.is_transparent());
        assert_eq!(pebble.tint, TintSource::Fixed([1.0, 0.5, 0.5, 1.0]));
        assert_eq!(pebble.resolve_drop(), None);
    }

    #[test]
    fn test_missing_texture_rejected() {
        let json = r#"{ "blocks": [ { "id": 2, "name": "bare", "textures": { "top": [0.0, 0.0, 0.1, 0.1] } } ] }"#;
        let result = BlockCatalog::from_json_str(json);
        assert!(matches!(result, Err(CatalogError::MissingTexture { .. })));
    }
}
