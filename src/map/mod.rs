
//! The logical map model. Everything a map file contains, fully
//! decompressed and cross-referenced by plain indices: no pointers,
//! so maps clone and diff cheaply.

pub mod tiles;

use std::path::Path;

use crate::error::{Result, UnitResult};
use crate::io::{Read, Write};
use self::tiles::{Tile, TeleTile, SpeedupTile, SwitchTile, TuneTile};


/// A complete map. Constructed by the decoder or
/// [`Map::default_map`], mutated freely, consumed by the encoder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Map {

    /// Free-text metadata, absent in many maps.
    pub info: Option<Info>,

    /// All tileset and quad images, referenced by index.
    pub images: Vec<Image>,

    /// All groups with their layers, in render order.
    pub groups: Vec<Group>,

    /// All animation envelopes. Each slices [`Map::envpoints`].
    pub envelopes: Vec<Envelope>,

    /// The flat keyframe list shared by all envelopes.
    pub envpoints: Vec<Envpoint>,
}

impl Map {

    /// Read a map from a file. A path without extension gets `.map`
    /// appended; any extension other than `.map` is rejected.
    /// The returned map always passes [`Map::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        crate::decode::read_map_from_file(path.as_ref())
    }

    /// Read a map from an in-memory reader.
    /// The whole stream is consumed before parsing begins.
    pub fn read_from_buffered(read: impl Read) -> Result<Self> {
        crate::decode::read_map_from_buffered(read)
    }

    /// Validate this map and write it to a file,
    /// with the same extension rule as [`Map::load`].
    pub fn save(&self, path: impl AsRef<Path>) -> UnitResult {
        crate::encode::write_map_to_file(self, path.as_ref())
    }

    /// Validate this map and write it to the byte stream.
    pub fn write_to_buffered(&self, write: impl Write) -> UnitResult {
        crate::encode::write_map_to_buffered(self, write)
    }

    /// Check the structural invariants that every saved map must hold.
    pub fn validate(&self) -> UnitResult {
        crate::validate::validate_map(self)
    }

    /// All layers of all groups, in render order.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.groups.iter().flat_map(|group| group.layers.iter())
    }

    /// All tile layers of all groups, in render order.
    pub fn tile_layers(&self) -> impl Iterator<Item = &TileLayer> {
        self.layers().filter_map(Layer::as_tile_layer)
    }

    /// The unique layer with `game_flag == 1`.
    pub fn game_layer(&self) -> Option<&TileLayer> {
        self.tile_layers().find(|layer| matches!(layer.kind, TileLayerKind::Game))
    }

    /// The tele layer, if the map has one.
    pub fn tele_layer(&self) -> Option<&TileLayer> {
        self.tile_layers().find(|layer| matches!(layer.kind, TileLayerKind::Tele(_)))
    }

    /// The speedup layer, if the map has one.
    pub fn speedup_layer(&self) -> Option<&TileLayer> {
        self.tile_layers().find(|layer| matches!(layer.kind, TileLayerKind::Speedup(_)))
    }

    /// The front layer, if the map has one.
    pub fn front_layer(&self) -> Option<&TileLayer> {
        self.tile_layers().find(|layer| matches!(layer.kind, TileLayerKind::Front))
    }

    /// The switch layer, if the map has one.
    pub fn switch_layer(&self) -> Option<&TileLayer> {
        self.tile_layers().find(|layer| matches!(layer.kind, TileLayerKind::Switch(_)))
    }

    /// The tune layer, if the map has one.
    pub fn tune_layer(&self) -> Option<&TileLayer> {
        self.tile_layers().find(|layer| matches!(layer.kind, TileLayerKind::Tune(_)))
    }

    /// The group holding the game layer.
    pub fn game_group(&self) -> Option<&Group> {
        self.groups.iter().find(|group| group.is_game_group)
    }

    /// Width of the game layer, the playable width of the map.
    pub fn width(&self) -> Option<u32> {
        self.game_layer().map(|layer| layer.width)
    }

    /// Height of the game layer, the playable height of the map.
    pub fn height(&self) -> Option<u32> {
        self.game_layer().map(|layer| layer.height)
    }

    /// The keyframes an envelope animates over.
    pub fn envelope_points(&self, envelope: &Envelope) -> &[Envpoint] {
        envelope.start_point.checked_add(envelope.num_points)
            .and_then(|end| self.envpoints.get(envelope.start_point .. end))
            .unwrap_or(&[])
    }

    /// The default map: a background group with a single sky quad, and
    /// a game group with an all-air 50x50 game layer.
    pub fn default_map() -> Self {
        let background_layer = QuadLayer {
            detail: false,
            name: None,
            image_id: -1,
            quads: vec![Quad::background()],
        };

        let background = Group {
            parallax_x: 0,
            parallax_y: 0,
            .. Group::default()
        };

        let game_layer = TileLayer::empty(50, 50, TileLayerKind::Game);

        let game_group = Group {
            is_game_group: true,
            .. Group::default()
        };

        Map {
            groups: vec![
                Group { layers: vec![Layer::Quads(background_layer)], .. background },
                Group { layers: vec![Layer::Tiles(game_layer)], .. game_group },
            ],
            .. Map::default()
        }
    }
}

/// Free-text metadata of a map. Raw byte strings:
/// the format does not promise any encoding here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Info {

    /// Who built the map.
    pub author: Option<Vec<u8>>,

    /// The mapper's own version string, unrelated to format versions.
    pub map_version: Option<Vec<u8>>,

    /// Credits for tilesets, testers and the like.
    pub credits: Option<Vec<u8>>,

    /// License of the map.
    pub license: Option<Vec<u8>>,

    /// Server configuration commands shipped with the map,
    /// one command per entry.
    pub settings: Option<Vec<Vec<u8>>>,
}

/// A tileset or quad texture. External images are looked up by name
/// in the client's data directory and carry no pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {

    /// Whether the pixel data lives outside the map file.
    pub external: bool,

    /// Image name, also the lookup key for external images.
    pub name: String,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Raw RGBA bytes, `width * height * 4` of them.
    /// Present exactly when the image is not external.
    pub data: Option<Vec<u8>>,
}

/// A render group: layers sharing offset, parallax and clipping.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {

    /// Group name. The game group is always saved as `Game`.
    pub name: Option<String>,

    /// Horizontal render offset.
    pub offset_x: i32,

    /// Vertical render offset.
    pub offset_y: i32,

    /// Horizontal parallax in percent. 100 moves with the camera.
    pub parallax_x: i32,

    /// Vertical parallax in percent.
    pub parallax_y: i32,

    /// Whether the clip rectangle applies.
    pub use_clipping: bool,

    /// Clip rectangle x.
    pub clip_x: i32,

    /// Clip rectangle y.
    pub clip_y: i32,

    /// Clip rectangle width.
    pub clip_w: i32,

    /// Clip rectangle height.
    pub clip_h: i32,

    /// The layers of this group, in render order.
    pub layers: Vec<Layer>,

    /// Whether this is the unique group holding the game layers.
    pub is_game_group: bool,
}

impl Default for Group {
    fn default() -> Self {
        Group {
            name: None,
            offset_x: 0, offset_y: 0,
            parallax_x: 100, parallax_y: 100,
            use_clipping: false,
            clip_x: 0, clip_y: 0, clip_w: 0, clip_h: 0,
            layers: Vec::new(),
            is_game_group: false,
        }
    }
}

/// A single layer of a group.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {

    /// A grid of tiles, possibly carrying an aux grid.
    Tiles(TileLayer),

    /// Free-floating textured quads.
    Quads(QuadLayer),

    /// Positional audio sources.
    Sounds(SoundLayer),
}

impl Layer {

    /// The name common to all layer variants.
    pub fn name(&self) -> Option<&str> {
        match self {
            Layer::Tiles(layer) => layer.name.as_deref(),
            Layer::Quads(layer) => layer.name.as_deref(),
            Layer::Sounds(layer) => layer.name.as_deref(),
        }
    }

    /// The high-detail flag common to all layer variants.
    pub fn detail(&self) -> bool {
        match self {
            Layer::Tiles(layer) => layer.detail,
            Layer::Quads(layer) => layer.detail,
            Layer::Sounds(layer) => layer.detail,
        }
    }

    /// This layer as a tile layer, if it is one.
    pub fn as_tile_layer(&self) -> Option<&TileLayer> {
        match self {
            Layer::Tiles(layer) => Some(layer),
            _ => None,
        }
    }
}

/// What role a tile layer plays, and the aux grid that role carries.
/// The wire format encodes this as the game flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileLayerKind {

    /// A plain design layer, flag 0.
    Normal,

    /// The game layer defining the playable tiles, flag 1.
    Game,

    /// The tele layer, flag 2, two aux bytes per cell.
    Tele(Vec<TeleTile>),

    /// The speedup layer, flag 4, six aux bytes per cell.
    Speedup(Vec<SpeedupTile>),

    /// The front layer, flag 8. Its tiles use the primary grid,
    /// stored at the front slot of the layer item.
    Front,

    /// The switch layer, flag 16, four aux bytes per cell.
    Switch(Vec<SwitchTile>),

    /// The tune layer, flag 32, two aux bytes per cell.
    Tune(Vec<TuneTile>),
}

impl TileLayerKind {

    /// The game flag as stored in the layer item.
    pub fn game_flag(&self) -> i32 {
        match self {
            TileLayerKind::Normal => 0,
            TileLayerKind::Game => 1,
            TileLayerKind::Tele(_) => 2,
            TileLayerKind::Speedup(_) => 4,
            TileLayerKind::Front => 8,
            TileLayerKind::Switch(_) => 16,
            TileLayerKind::Tune(_) => 32,
        }
    }

    /// The canonical layer name saved for this kind,
    /// or `None` for plain design layers.
    pub fn canonical_name(&self) -> Option<&'static str> {
        match self {
            TileLayerKind::Normal => None,
            TileLayerKind::Game => Some("Game"),
            TileLayerKind::Tele(_) => Some("Tele"),
            TileLayerKind::Speedup(_) => Some("Speedup"),
            TileLayerKind::Front => Some("Front"),
            TileLayerKind::Switch(_) => Some("Switch"),
            TileLayerKind::Tune(_) => Some("Tune"),
        }
    }
}

/// A grid of tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {

    /// Whether the layer only renders in high detail mode.
    pub detail: bool,

    /// Layer name as shown in the editor.
    pub name: Option<String>,

    /// Number of columns. Never zero in a valid map.
    pub width: u32,

    /// Number of rows. Never zero in a valid map.
    pub height: u32,

    /// RGBA color modulation applied to the whole layer.
    pub color: [u8; 4],

    /// Envelope animating the color, -1 for none.
    pub color_env: i32,

    /// Time offset into the color envelope.
    pub color_env_offset: i32,

    /// Index into [`Map::images`], -1 for none.
    pub image_id: i32,

    /// The primary grid, row-major, `width * height` cells.
    pub tiles: Vec<Tile>,

    /// The role of this layer and its aux grid.
    pub kind: TileLayerKind,
}

impl TileLayer {

    /// An all-air layer of the specified size and kind,
    /// with empty aux grids where the kind carries one.
    pub fn empty(width: u32, height: u32, kind: TileLayerKind) -> Self {
        let cell_count = width as usize * height as usize;

        let kind = match kind {
            TileLayerKind::Tele(_) => TileLayerKind::Tele(vec![TeleTile::default(); cell_count]),
            TileLayerKind::Speedup(_) => TileLayerKind::Speedup(vec![SpeedupTile::default(); cell_count]),
            TileLayerKind::Switch(_) => TileLayerKind::Switch(vec![SwitchTile::default(); cell_count]),
            TileLayerKind::Tune(_) => TileLayerKind::Tune(vec![TuneTile::default(); cell_count]),
            other => other,
        };

        TileLayer {
            detail: false,
            name: None,
            width, height,
            color: [255, 255, 255, 255],
            color_env: -1,
            color_env_offset: 0,
            image_id: -1,
            tiles: vec![Tile::default(); cell_count],
            kind,
        }
    }

    /// Number of cells of this layer's grids.
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The game flag as stored in the layer item.
    pub fn game_flag(&self) -> i32 {
        self.kind.game_flag()
    }

    /// Whether this is the game layer.
    pub fn is_game_layer(&self) -> bool {
        matches!(self.kind, TileLayerKind::Game)
    }

    /// The tele grid, if this is the tele layer.
    pub fn tele_tiles(&self) -> Option<&[TeleTile]> {
        match &self.kind {
            TileLayerKind::Tele(tiles) => Some(tiles),
            _ => None,
        }
    }

    /// The speedup grid, if this is the speedup layer.
    pub fn speedup_tiles(&self) -> Option<&[SpeedupTile]> {
        match &self.kind {
            TileLayerKind::Speedup(tiles) => Some(tiles),
            _ => None,
        }
    }

    /// The switch grid, if this is the switch layer.
    pub fn switch_tiles(&self) -> Option<&[SwitchTile]> {
        match &self.kind {
            TileLayerKind::Switch(tiles) => Some(tiles),
            _ => None,
        }
    }

    /// The tune grid, if this is the tune layer.
    pub fn tune_tiles(&self) -> Option<&[TuneTile]> {
        match &self.kind {
            TileLayerKind::Tune(tiles) => Some(tiles),
            _ => None,
        }
    }
}

/// Byte count of one quad record.
pub const QUAD_BYTE_SIZE: usize = 152;

/// One textured quad: five points, four corner colors, four texture
/// coordinates and two envelope references, packed in 152 bytes.
/// Passed through verbatim; this crate never interprets the fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quad(pub [u8; QUAD_BYTE_SIZE]);

impl Default for Quad {
    fn default() -> Self {
        Quad([0; QUAD_BYTE_SIZE])
    }
}

impl Quad {

    /// The sky quad of the default map: a screen-filling rectangle
    /// fading from dusk blue at the top to near-white at the bottom.
    pub fn background() -> Self {
        let ints: [i32; QUAD_BYTE_SIZE / 4] = [
            // corner points and pivot, in fixed-point map units
            -819200, -614400,  819200, -614400,
            -819200,  614400,  819200,  614400,
            0, 0,
            // corner colors, top pair then bottom pair
            94, 132, 174, 255,  94, 132, 174, 255,
            204, 232, 255, 255,  204, 232, 255, 255,
            // texture coordinates
            0, 0,  1024, 0,  0, 1024,  1024, 1024,
            // position and color envelopes with offsets
            -1, 0, -1, 0,
        ];

        let mut bytes = [0_u8; QUAD_BYTE_SIZE];
        for (index, value) in ints.iter().enumerate() {
            bytes[index * 4 .. index * 4 + 4].copy_from_slice(&value.to_le_bytes());
        }

        Quad(bytes)
    }
}

/// A layer of free-floating textured quads.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadLayer {

    /// Whether the layer only renders in high detail mode.
    pub detail: bool,

    /// Layer name as shown in the editor.
    pub name: Option<String>,

    /// Index into [`Map::images`], -1 for none.
    pub image_id: i32,

    /// The quad records, passed through verbatim.
    pub quads: Vec<Quad>,
}

/// A layer of positional audio sources. The source payloads are not
/// modeled; only the count survives a load.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundLayer {

    /// Whether the layer only renders in high detail mode.
    pub detail: bool,

    /// Layer name as shown in the editor.
    pub name: Option<String>,

    /// Number of audio sources the layer declared.
    pub num_sources: i32,
}

/// An animation curve over a contiguous slice of [`Map::envpoints`].
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {

    /// Envelope name as shown in the editor.
    pub name: String,

    /// Envelope item version, 1 to 3. Versions before 2
    /// have no synced flag and always behave synced.
    pub version: i32,

    /// Number of animated channels: 1 (volume), 3 (position) or 4 (color).
    pub channels: i32,

    /// Index of the first keyframe in [`Map::envpoints`].
    pub start_point: usize,

    /// Number of keyframes.
    pub num_points: usize,

    /// Whether the animation clock starts with the round
    /// instead of the envelope becoming visible.
    pub synced: bool,
}

/// One keyframe of an animation curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Envpoint {

    /// Keyframe time in milliseconds.
    pub time: i32,

    /// Interpolation towards the next keyframe:
    /// step, linear, slow, fast or smooth.
    pub curvetype: i32,

    /// One value per channel; unused channels stay zero.
    pub values: [i32; 4],
}
