
//! Decoding a map file into the logical model: resolve the container
//! tables, then walk the typed items in dependency order. The variant
//! logic of tile layers lives here, including the legacy offsets of
//! maps written before layer version 3.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::datafile::Datafile;
use crate::datafile::items::{item_type, layer_type};
use crate::io::{Read, i32_to_usize};
use crate::error::{Error, Result, UnitResult};
use crate::map::*;
use crate::map::tiles::{CellData, Tile, grid_from_bytes};
use crate::text;

/// Positions of the aux blob indices in a version 3 tile layer item.
/// Legacy items (version < 3) have no name ints, which shifts
/// the tele and speedup slots down by three.
pub(crate) const TELE_SLOT: usize = 18;
pub(crate) const SPEEDUP_SLOT: usize = 19;
pub(crate) const FRONT_SLOT: usize = 20;
pub(crate) const SWITCH_SLOT: usize = 21;
pub(crate) const TUNE_SLOT: usize = 22;

/// Apply the map extension rule: no extension means `.map` is
/// appended, any extension other than `.map` is rejected.
pub(crate) fn resolve_map_path(path: &Path) -> Result<PathBuf> {
    match path.extension() {
        None => Ok(path.with_extension("map")),
        Some(extension) if extension == "map" => Ok(path.to_path_buf()),
        Some(_) => Err(Error::InvalidPath(path.to_path_buf())),
    }
}

/// Read a map from the file at the specified path.
pub fn read_map_from_file(path: &Path) -> Result<Map> {
    let path = resolve_map_path(path)?;
    read_map_from_buffered(BufReader::new(File::open(path)?))
}

/// Read a map from a byte stream. The whole stream is consumed
/// and indexed before any item is interpreted.
pub fn read_map_from_buffered(mut read: impl Read) -> Result<Map> {
    let file = Datafile::read(&mut read)?;
    decode_map(&file)
}

/// Interpret an indexed container as a map.
/// The returned map always passes validation.
fn decode_map(file: &Datafile) -> Result<Map> {
    decode_version(file)?;

    let info = decode_info(file)?;
    let images = decode_images(file)?;
    let groups = decode_groups(file)?;
    let envpoints = decode_envpoints(file)?;
    let envelopes = decode_envelopes(file, envpoints.len())?;

    let map = Map { info, images, groups, envelopes, envpoints };
    map.validate()?;
    Ok(map)
}

/// The version item must exist and contain exactly the value 1.
fn decode_version(file: &Datafile) -> UnitResult {
    let item = file.items.find(item_type::VERSION, 0)?
        .ok_or(Error::UnsupportedVersion(0))?;

    match item.first() {
        Some(&1) => Ok(()),
        Some(&other) => Err(Error::UnsupportedVersion(other)),
        None => Err(Error::UnsupportedVersion(0)),
    }
}

/// The optional info item: five blob indices for the text fields,
/// and a sixth for the map settings where the item carries one.
fn decode_info(file: &Datafile) -> Result<Option<Info>> {
    let item = match file.items.find(item_type::INFO, 0)? {
        Some(item) => item,
        None => return Ok(None),
    };

    let text_field = |slot: usize| -> Result<Option<Vec<u8>>> {
        match item.get(slot) {
            Some(&index) if index >= 0 => {
                let blob = file.blobs.decompressed(index)?;
                Ok(Some(text::bytes_until_nul(&blob).to_vec()))
            },
            _ => Ok(None),
        }
    };

    let settings = match item.get(5) {
        Some(&index) if index >= 0 => {
            let blob = file.blobs.decompressed(index)?;
            let mut commands: Vec<Vec<u8>> = blob.split(|&byte| byte == 0)
                .map(<[u8]>::to_vec).collect();

            commands.pop(); // the trailing terminator produces one empty entry
            Some(commands)
        },
        _ => None,
    };

    Ok(Some(Info {
        author: text_field(1)?,
        map_version: text_field(2)?,
        credits: text_field(3)?,
        license: text_field(4)?,
        settings,
    }))
}

fn decode_images(file: &Datafile) -> Result<Vec<Image>> {
    let (start, count) = file.items.range(item_type::IMAGE);
    let mut images = Vec::with_capacity(count);

    for index in 0 .. count {
        let item = file.items.payload_ints(start + index)?;
        if item.len() < 6 {
            return Err(Error::TruncatedFile);
        }

        let (width, height) = image_dimensions(item[1], item[2])?;
        let external = item[3] != 0;

        let name_blob = file.blobs.decompressed(item[4])?;
        let name = text::decode_text(text::bytes_until_nul(&name_blob));

        let data = if external { None }
            else { Some(file.blobs.decompressed(item[5])?) };

        images.push(Image { external, name, width, height, data });
    }

    Ok(images)
}

fn image_dimensions(width: i32, height: i32) -> Result<(u32, u32)> {
    if width < 0 || height < 0 {
        return Err(Error::InvalidDimensions { width, height });
    }

    Ok((width as u32, height as u32))
}

/// Which special layers a group already contains.
/// Only one layer of each role is allowed per map.
#[derive(Default)]
struct SpecialLayers {
    game: bool,
    tele: bool,
    speedup: bool,
    front: bool,
    switch: bool,
    tune: bool,
}

fn decode_groups(file: &Datafile) -> Result<Vec<Group>> {
    let (group_start, group_count) = file.items.range(item_type::GROUP);
    let (layer_start, layer_count) = file.items.range(item_type::LAYER);

    let mut groups = Vec::with_capacity(group_count);
    let mut has_game_group = false;

    for group_index in 0 .. group_count {
        let item = file.items.payload_ints(group_start + group_index)?;
        if item.len() < 12 {
            return Err(Error::TruncatedFile);
        }

        let version = item[0];
        let start_layer = i32_to_usize(item[5])?;
        let num_layers = i32_to_usize(item[6])?;

        let name = if version >= 3 {
            item.get(12 .. 15).and_then(text::ints_to_name)
        }
        else { None };

        let mut group = Group {
            name,
            offset_x: item[1], offset_y: item[2],
            parallax_x: item[3], parallax_y: item[4],
            use_clipping: item[7] != 0,
            clip_x: item[8], clip_y: item[9],
            clip_w: item[10], clip_h: item[11],
            layers: Vec::new(),
            is_game_group: false,
        };

        let mut present = SpecialLayers::default();

        for layer_offset in 0 .. num_layers {
            let layer_index = start_layer + layer_offset;
            if layer_index >= layer_count {
                return Err(Error::ItemIndexOutOfRange {
                    index: layer_start + layer_index,
                    count: file.items.item_count(),
                });
            }

            decode_layer(
                file, &file.items.payload_ints(layer_start + layer_index)?,
                &mut group, &mut present, &mut has_game_group,
            )?;
        }

        if group.is_game_group && !present.game {
            return Err(Error::MissingGameLayer);
        }

        groups.push(group);
    }

    if !has_game_group {
        return Err(Error::MissingGameGroup);
    }

    Ok(groups)
}

/// Dispatch one layer item on its type tag.
/// Unknown layouts are skipped, not rejected: the deprecated sound
/// layout still appears in old maps.
fn decode_layer(
    file: &Datafile, item: &[i32],
    group: &mut Group, present: &mut SpecialLayers, has_game_group: &mut bool,
) -> UnitResult {
    if item.len() < 3 {
        return Err(Error::TruncatedFile);
    }

    let detail = item[2] != 0;

    match item[1] {
        layer_type::TILES => {
            let layer = decode_tile_layer(file, item, detail, group, present, has_game_group)?;
            group.layers.push(Layer::Tiles(layer));
        },

        layer_type::QUADS => {
            let layer = decode_quad_layer(file, item, detail)?;
            group.layers.push(Layer::Quads(layer));
        },

        layer_type::SOUNDS => {
            let layer = decode_sound_layer(item, detail)?;
            group.layers.push(Layer::Sounds(layer));
        },

        // the deprecated sound layout and any future tags are skipped
        _ => {},
    }

    Ok(())
}

fn decode_tile_layer(
    file: &Datafile, item: &[i32], detail: bool,
    group: &mut Group, present: &mut SpecialLayers, has_game_group: &mut bool,
) -> Result<TileLayer> {
    if item.len() < 15 {
        return Err(Error::TruncatedFile);
    }

    let version = item[3];
    let (width, height) = layer_dimensions(item[4], item[5])?;
    let game_flag = item[6];
    let color = [item[7] as u8, item[8] as u8, item[9] as u8, item[10] as u8];
    let data_index = item[14];
    let name = item.get(15 .. 18).and_then(text::ints_to_name);

    // membership first: a game-flagged layer outside the unique game
    // group invalidates the file before any blob is touched
    let named_game = group.name.as_deref() == Some("Game");
    if named_game || (game_flag != 0 && version < 3) {
        if !group.is_game_group && *has_game_group {
            return Err(Error::MultipleGameGroups);
        }

        *has_game_group = true;
        group.is_game_group = true;
    }

    if game_flag != 0 && !group.is_game_group {
        return Err(Error::GameLayerOutsideGameGroup);
    }

    let cell_count = width as usize * height as usize;

    // the front layer keeps its real tiles at the front slot, because
    // its data index holds the conventional zero-filled grid
    let tile_bytes = if game_flag == 8 {
        let front_index = aux_blob_index(file, item, FRONT_SLOT)
            .ok_or(Error::MissingAuxTiles("front"))?;
        file.blobs.decompressed(front_index)?
    }
    else {
        file.blobs.decompressed(data_index)?
    };

    let tiles = grid_from_bytes::<Tile>(&tile_bytes, cell_count, "tiles")?;

    let kind = match game_flag {
        0 => TileLayerKind::Normal,
        1 => TileLayerKind::Game,
        8 => TileLayerKind::Front,

        2 => {
            let slot = if version >= 3 { TELE_SLOT } else { TELE_SLOT - 3 };
            TileLayerKind::Tele(decode_aux_grid(file, item, slot, cell_count, "tele")?)
        },

        4 => {
            let slot = if version >= 3 { SPEEDUP_SLOT } else { SPEEDUP_SLOT - 3 };
            TileLayerKind::Speedup(decode_aux_grid(file, item, slot, cell_count, "speedup")?)
        },

        16 => TileLayerKind::Switch(decode_aux_grid(file, item, SWITCH_SLOT, cell_count, "switch")?),
        32 => TileLayerKind::Tune(decode_aux_grid(file, item, TUNE_SLOT, cell_count, "tune")?),

        other => return Err(Error::UnknownGameFlag(other)),
    };

    match &kind {
        TileLayerKind::Normal => {},
        TileLayerKind::Game => {
            if present.game { return Err(Error::MultipleGameLayers); }
            present.game = true;
        },
        TileLayerKind::Tele(_) => {
            if present.tele { return Err(Error::MultipleTeleLayers); }
            present.tele = true;
        },
        TileLayerKind::Speedup(_) => {
            if present.speedup { return Err(Error::MultipleSpeedupLayers); }
            present.speedup = true;
        },
        TileLayerKind::Front => {
            if present.front { return Err(Error::MultipleFrontLayers); }
            present.front = true;
        },
        TileLayerKind::Switch(_) => {
            if present.switch { return Err(Error::MultipleSwitchLayers); }
            present.switch = true;
        },
        TileLayerKind::Tune(_) => {
            if present.tune { return Err(Error::MultipleTuneLayers); }
            present.tune = true;
        },
    }

    Ok(TileLayer {
        detail, name, width, height, color,
        color_env: item[11],
        color_env_offset: item[12],
        image_id: item[13],
        tiles, kind,
    })
}

fn layer_dimensions(width: i32, height: i32) -> Result<(u32, u32)> {
    if width < 0 || height < 0 {
        return Err(Error::InvalidDimensions { width, height });
    }

    Ok((width as u32, height as u32))
}

/// The blob index stored at an aux slot, if the item is long enough
/// and the index actually references the pool. Legacy maps leave
/// stale values in unused slots, so out-of-pool indices count as absent.
fn aux_blob_index(file: &Datafile, item: &[i32], slot: usize) -> Option<i32> {
    item.get(slot).copied().filter(|&index| file.blobs.contains(index))
}

fn decode_aux_grid<T: CellData>(
    file: &Datafile, item: &[i32], slot: usize,
    cell_count: usize, array: &'static str,
) -> Result<Vec<T>> {
    let index = aux_blob_index(file, item, slot)
        .ok_or(Error::MissingAuxTiles(array))?;

    grid_from_bytes(&file.blobs.decompressed(index)?, cell_count, array)
}

fn decode_quad_layer(file: &Datafile, item: &[i32], detail: bool) -> Result<QuadLayer> {
    if item.len() < 7 {
        return Err(Error::TruncatedFile);
    }

    let version = item[3];
    let num_quads = i32_to_usize(item[4])?;

    let name = if version >= 2 {
        item.get(7 .. 10).and_then(text::ints_to_name)
    }
    else { None };

    let blob = file.blobs.decompressed(item[5])?;
    if blob.len() != num_quads * QUAD_BYTE_SIZE {
        return Err(Error::InvalidLayerSize {
            array: "quads", expected: num_quads,
            actual: blob.len() / QUAD_BYTE_SIZE,
        });
    }

    let quads = blob.chunks_exact(QUAD_BYTE_SIZE).map(|chunk| {
        let mut bytes = [0_u8; QUAD_BYTE_SIZE];
        bytes.copy_from_slice(chunk);
        Quad(bytes)
    }).collect();

    Ok(QuadLayer { detail, name, image_id: item[6], quads })
}

fn decode_sound_layer(item: &[i32], detail: bool) -> Result<SoundLayer> {
    if item.len() < 7 {
        return Err(Error::TruncatedFile);
    }

    if item[3] != 2 {
        return Err(Error::UnsupportedVersion(item[3]));
    }

    Ok(SoundLayer {
        detail,
        name: item.get(7 .. 10).and_then(text::ints_to_name),
        num_sources: item[4],
    })
}

/// The single envpoint item, a flat array of six-integer keyframes.
/// Maps without envelopes may omit it entirely.
fn decode_envpoints(file: &Datafile) -> Result<Vec<Envpoint>> {
    let ints = file.items.find(item_type::ENVPOINT, 0)?.unwrap_or_default();

    Ok(ints.chunks_exact(6).map(|point| Envpoint {
        time: point[0],
        curvetype: point[1],
        values: [point[2], point[3], point[4], point[5]],
    }).collect())
}

fn decode_envelopes(file: &Datafile, envpoint_count: usize) -> Result<Vec<Envelope>> {
    let (start, count) = file.items.range(item_type::ENVELOPE);
    let mut envelopes = Vec::with_capacity(count);

    for index in 0 .. count {
        let item = file.items.payload_ints(start + index)?;
        if item.len() < 12 {
            return Err(Error::TruncatedFile);
        }

        let version = item[0];
        let (start_point, num_points) = envelope_slice(item[2], item[3], envpoint_count)?;

        envelopes.push(Envelope {
            name: text::ints_to_string(&item[4 .. 12]),
            version,
            channels: item[1],
            start_point, num_points,
            // envelopes predating the synced flag always behave synced
            synced: version < 2 || item.get(12).map_or(false, |&synced| synced != 0),
        });
    }

    Ok(envelopes)
}

fn envelope_slice(start: i32, count: i32, available: usize) -> Result<(usize, usize)> {
    let out_of_range = Error::EnvelopePointsOutOfRange { start, count, available };

    if start < 0 || count < 0 {
        return Err(out_of_range);
    }

    if (start as usize) + (count as usize) > available {
        return Err(out_of_range);
    }

    Ok((start as usize, count as usize))
}
