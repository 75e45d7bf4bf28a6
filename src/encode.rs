
//! Encoding a map into bytes: validate the model, lay out items and
//! blobs in canonical order, then let the container layer recompute
//! every offset table and header size.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::datafile::write_datafile;
use crate::datafile::items::{item_type, layer_type, DatafileItem};
use crate::datafile::blobs::DatafileBlob;
use crate::decode::{resolve_map_path, TELE_SLOT, SPEEDUP_SLOT, FRONT_SLOT, SWITCH_SLOT, TUNE_SLOT};
use crate::io::{Write, usize_to_i32};
use crate::error::UnitResult;
use crate::map::*;
use crate::map::tiles::{CellData, Tile, grid_to_bytes};
use crate::text::{string_to_ints, write_nul_terminated, LAYER_NAME_INTS, ENVELOPE_NAME_INTS};

/// Validate a map and write it to the specified path, applying the
/// `.map` extension rule. The file is only created once the map
/// has passed validation.
pub fn write_map_to_file(map: &Map, path: &Path) -> UnitResult {
    let path = resolve_map_path(path)?;
    map.validate()?;

    let mut write = BufWriter::new(File::create(path)?);
    write_unvalidated(map, &mut write)?;
    write.flush()?;
    Ok(())
}

/// Validate a map and write it to the byte stream.
pub fn write_map_to_buffered(map: &Map, mut write: impl Write) -> UnitResult {
    map.validate()?;
    write_unvalidated(map, &mut write)
}

fn write_unvalidated(map: &Map, write: &mut impl Write) -> UnitResult {
    let mut emitter = Emitter::default();

    emitter.add_item(item_type::VERSION, 0, vec![1]);
    emit_info(&mut emitter, map);
    emit_images(&mut emitter, map);
    emit_groups(&mut emitter, map);
    emit_envelopes(&mut emitter, map);
    emit_envpoints(&mut emitter, map);

    write_datafile(emitter.items, &emitter.blobs, write)
}

/// Collects items and blobs; indices into the blob pool are handed
/// out in emission order.
#[derive(Default)]
struct Emitter {
    items: Vec<DatafileItem>,
    blobs: Vec<DatafileBlob>,
}

impl Emitter {
    fn add_item(&mut self, type_id: i32, id: i32, ints: Vec<i32>) {
        self.items.push(DatafileItem { type_id, id, ints });
    }

    fn add_blob(&mut self, bytes: &[u8]) -> i32 {
        let index = usize_to_i32(self.blobs.len());
        self.blobs.push(DatafileBlob::compress(bytes));
        index
    }
}

fn emit_info(emitter: &mut Emitter, map: &Map) {
    let info = match &map.info {
        Some(info) => info,
        None => return,
    };

    let mut text_field = |bytes: &Option<Vec<u8>>| -> i32 {
        match bytes {
            Some(bytes) => {
                let mut blob = Vec::with_capacity(bytes.len() + 1);
                write_nul_terminated(bytes, &mut blob);
                emitter.add_blob(&blob)
            },
            None => -1,
        }
    };

    let author = text_field(&info.author);
    let map_version = text_field(&info.map_version);
    let credits = text_field(&info.credits);
    let license = text_field(&info.license);

    let settings = match &info.settings {
        Some(commands) => {
            let mut blob = Vec::new();
            for command in commands {
                write_nul_terminated(command, &mut blob);
            }
            emitter.add_blob(&blob)
        },
        None => -1,
    };

    emitter.add_item(item_type::INFO, 0, vec![1, author, map_version, credits, license, settings]);
}

fn emit_images(emitter: &mut Emitter, map: &Map) {
    for (index, image) in map.images.iter().enumerate() {
        let mut name_blob = Vec::with_capacity(image.name.len() + 1);
        write_nul_terminated(image.name.as_bytes(), &mut name_blob);
        let name_index = emitter.add_blob(&name_blob);

        let data_index = match &image.data {
            Some(data) if !image.external => emitter.add_blob(data),
            _ => -1,
        };

        emitter.add_item(item_type::IMAGE, usize_to_i32(index), vec![
            1,
            image.width as i32,
            image.height as i32,
            image.external as i32,
            name_index, data_index,
        ]);
    }
}

/// The integer count shared by every tile layer item of the file:
/// 18 plain, 20 with tele or speedup aux slots, 23 with the
/// front, switch and tune slots as well.
fn tile_layer_int_count(map: &Map) -> usize {
    let mut int_count = TELE_SLOT;

    for layer in map.tile_layers() {
        match layer.kind {
            TileLayerKind::Tele(_) | TileLayerKind::Speedup(_) =>
                int_count = int_count.max(SPEEDUP_SLOT + 1),

            TileLayerKind::Front | TileLayerKind::Switch(_) | TileLayerKind::Tune(_) =>
                int_count = int_count.max(TUNE_SLOT + 1),

            TileLayerKind::Normal | TileLayerKind::Game => {},
        }
    }

    int_count
}

fn emit_groups(emitter: &mut Emitter, map: &Map) {
    let int_count = tile_layer_int_count(map);
    let mut layer_count = 0;

    for (group_index, group) in map.groups.iter().enumerate() {
        let start_layer = layer_count;

        for layer in &group.layers {
            match layer {
                Layer::Tiles(tile_layer) => {
                    emit_tile_layer(emitter, tile_layer, layer_count, int_count);
                    layer_count += 1;
                },

                Layer::Quads(quad_layer) => {
                    emit_quad_layer(emitter, quad_layer, layer_count);
                    layer_count += 1;
                },

                // the model keeps no sample data, so sound layers
                // cannot be written back
                Layer::Sounds(_) => {},
            }
        }

        let name = if group.is_game_group { "Game" }
            else { group.name.as_deref().unwrap_or("") };

        let mut ints = vec![
            3,
            group.offset_x, group.offset_y,
            group.parallax_x, group.parallax_y,
            usize_to_i32(start_layer),
            usize_to_i32(layer_count - start_layer),
            group.use_clipping as i32,
            group.clip_x, group.clip_y,
            group.clip_w, group.clip_h,
        ];
        ints.extend(string_to_ints(name, LAYER_NAME_INTS));

        emitter.add_item(item_type::GROUP, usize_to_i32(group_index), ints);
    }
}

fn emit_tile_layer(emitter: &mut Emitter, layer: &TileLayer, layer_id: usize, int_count: usize) {
    // special layers keep the legacy convention alive: their data index
    // points to a zero-filled grid while the real bytes sit in an aux slot
    let zero_grid = vec![0_u8; layer.cell_count() * Tile::BYTE_SIZE];

    let (data_index, aux) = match &layer.kind {
        TileLayerKind::Normal | TileLayerKind::Game =>
            (emitter.add_blob(&grid_to_bytes(&layer.tiles)), None),

        TileLayerKind::Tele(aux_tiles) => (
            emitter.add_blob(&zero_grid),
            Some((TELE_SLOT, emitter.add_blob(&grid_to_bytes(aux_tiles)))),
        ),

        TileLayerKind::Speedup(aux_tiles) => (
            emitter.add_blob(&zero_grid),
            Some((SPEEDUP_SLOT, emitter.add_blob(&grid_to_bytes(aux_tiles)))),
        ),

        TileLayerKind::Front => (
            emitter.add_blob(&zero_grid),
            Some((FRONT_SLOT, emitter.add_blob(&grid_to_bytes(&layer.tiles)))),
        ),

        TileLayerKind::Switch(aux_tiles) => (
            emitter.add_blob(&zero_grid),
            Some((SWITCH_SLOT, emitter.add_blob(&grid_to_bytes(aux_tiles)))),
        ),

        TileLayerKind::Tune(aux_tiles) => (
            emitter.add_blob(&zero_grid),
            Some((TUNE_SLOT, emitter.add_blob(&grid_to_bytes(aux_tiles)))),
        ),
    };

    let name = layer.kind.canonical_name()
        .or(layer.name.as_deref())
        .unwrap_or("Tiles");

    let mut ints = vec![
        0, layer_type::TILES, layer.detail as i32,
        3,
        layer.width as i32,
        layer.height as i32,
        layer.game_flag(),
        i32::from(layer.color[0]), i32::from(layer.color[1]),
        i32::from(layer.color[2]), i32::from(layer.color[3]),
        layer.color_env, layer.color_env_offset,
        layer.image_id,
        data_index,
    ];
    ints.extend(string_to_ints(name, LAYER_NAME_INTS));

    while ints.len() < int_count {
        ints.push(-1);
    }

    if let Some((slot, index)) = aux {
        ints[slot] = index;
    }

    emitter.add_item(item_type::LAYER, usize_to_i32(layer_id), ints);
}

fn emit_quad_layer(emitter: &mut Emitter, layer: &QuadLayer, layer_id: usize) {
    let mut blob = Vec::with_capacity(layer.quads.len() * QUAD_BYTE_SIZE);
    for quad in &layer.quads {
        blob.extend_from_slice(&quad.0);
    }
    let data_index = emitter.add_blob(&blob);

    let mut ints = vec![
        7, layer_type::QUADS, layer.detail as i32,
        2,
        usize_to_i32(layer.quads.len()),
        data_index,
        layer.image_id,
    ];
    ints.extend(string_to_ints(layer.name.as_deref().unwrap_or(""), LAYER_NAME_INTS));

    emitter.add_item(item_type::LAYER, usize_to_i32(layer_id), ints);
}

fn emit_envelopes(emitter: &mut Emitter, map: &Map) {
    let mut start_point = 0;

    for (index, envelope) in map.envelopes.iter().enumerate() {
        let mut ints = vec![
            envelope.version,
            envelope.channels,
            usize_to_i32(start_point),
            usize_to_i32(envelope.num_points),
        ];
        ints.extend(string_to_ints(&envelope.name, ENVELOPE_NAME_INTS));
        ints.push(envelope.synced as i32);

        emitter.add_item(item_type::ENVELOPE, usize_to_i32(index), ints);
        start_point += envelope.num_points;
    }
}

/// All envpoints flatten into the single type 6 item,
/// which is present even when the map has no envelopes.
fn emit_envpoints(emitter: &mut Emitter, map: &Map) {
    let mut ints = Vec::with_capacity(map.envpoints.len() * 6);

    for point in &map.envpoints {
        ints.extend_from_slice(&[
            point.time, point.curvetype,
            point.values[0], point.values[1],
            point.values[2], point.values[3],
        ]);
    }

    emitter.add_item(item_type::ENVPOINT, 0, ints);
}
