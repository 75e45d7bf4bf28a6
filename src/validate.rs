
//! Structural validation of a map. This is the single aggregation
//! point for model invariants: the decoder runs it before returning
//! a map, the encoder refuses any map that fails it.

use crate::error::{Error, UnitResult};
use crate::map::*;

/// Layer occurrences that must stay unique across the whole map.
#[derive(Default)]
struct LayerCensus {
    game: usize,
    tele: usize,
    speedup: usize,
    front: usize,
    switch: usize,
    tune: usize,
}

/// Check every structural invariant of the map.
/// The first violated invariant aborts the check.
pub fn validate_map(map: &Map) -> UnitResult {
    let mut census = LayerCensus::default();
    let mut game_groups = 0;

    for group in &map.groups {
        if group.is_game_group {
            game_groups += 1;
        }

        for layer in &group.layers {
            match layer {
                Layer::Tiles(tile_layer) =>
                    validate_tile_layer(tile_layer, group, &mut census, map.images.len())?,

                Layer::Quads(quad_layer) =>
                    validate_image_id(quad_layer.image_id, map.images.len())?,

                Layer::Sounds(_) => {},
            }
        }
    }

    if census.game == 0 {
        return Err(Error::MissingGameLayer);
    }

    if game_groups == 0 {
        return Err(Error::MissingGameGroup);
    }

    if game_groups > 1 {
        return Err(Error::MultipleGameGroups);
    }

    for image in &map.images {
        validate_image(image)?;
    }

    for envelope in &map.envelopes {
        let in_range = envelope.start_point.checked_add(envelope.num_points)
            .map_or(false, |end| end <= map.envpoints.len());

        if !in_range {
            return Err(Error::EnvelopePointsOutOfRange {
                start: envelope.start_point as i32,
                count: envelope.num_points as i32,
                available: map.envpoints.len(),
            });
        }
    }

    Ok(())
}

fn validate_tile_layer(
    layer: &TileLayer, group: &Group,
    census: &mut LayerCensus, image_count: usize,
) -> UnitResult {
    if layer.width == 0 || layer.height == 0 {
        return Err(Error::InvalidDimensions {
            width: layer.width as i32,
            height: layer.height as i32,
        });
    }

    let cell_count = layer.cell_count();
    if layer.tiles.len() != cell_count {
        return Err(Error::InvalidLayerSize {
            array: "tiles", expected: cell_count, actual: layer.tiles.len(),
        });
    }

    if layer.game_flag() != 0 && !group.is_game_group {
        return Err(Error::GameLayerOutsideGameGroup);
    }

    validate_image_id(layer.image_id, image_count)?;

    let mis_sized = |array: &'static str, actual: usize| Error::InvalidLayerSize {
        array, expected: cell_count, actual,
    };

    match &layer.kind {
        TileLayerKind::Normal => {},

        TileLayerKind::Game => {
            census.game += 1;
            if census.game > 1 { return Err(Error::MultipleGameLayers); }
        },

        TileLayerKind::Tele(aux) => {
            if aux.len() != cell_count { return Err(mis_sized("tele", aux.len())); }
            census.tele += 1;
            if census.tele > 1 { return Err(Error::MultipleTeleLayers); }
        },

        TileLayerKind::Speedup(aux) => {
            if aux.len() != cell_count { return Err(mis_sized("speedup", aux.len())); }
            census.speedup += 1;
            if census.speedup > 1 { return Err(Error::MultipleSpeedupLayers); }
        },

        TileLayerKind::Front => {
            census.front += 1;
            if census.front > 1 { return Err(Error::MultipleFrontLayers); }
        },

        TileLayerKind::Switch(aux) => {
            if aux.len() != cell_count { return Err(mis_sized("switch", aux.len())); }
            census.switch += 1;
            if census.switch > 1 { return Err(Error::MultipleSwitchLayers); }
        },

        TileLayerKind::Tune(aux) => {
            if aux.len() != cell_count { return Err(mis_sized("tune", aux.len())); }
            census.tune += 1;
            if census.tune > 1 { return Err(Error::MultipleTuneLayers); }
        },
    }

    Ok(())
}

fn validate_image_id(image_id: i32, image_count: usize) -> UnitResult {
    if image_id == -1 || (image_id >= 0 && (image_id as usize) < image_count) {
        Ok(())
    }
    else {
        Err(Error::ImageIndexOutOfRange { index: image_id, count: image_count })
    }
}

fn validate_image(image: &Image) -> UnitResult {
    if image.external {
        return Ok(());
    }

    let expected = (image.width as u64)
        .checked_mul(image.height as u64)
        .and_then(|pixels| pixels.checked_mul(4));

    let actual = image.data.as_ref().map_or(0, Vec::len);

    if expected != Some(actual as u64) {
        return Err(Error::InvalidImageSize {
            expected: expected.unwrap_or(u64::MAX) as usize,
            actual,
        });
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::tiles::TeleTile;

    #[test]
    fn default_map_passes() {
        assert!(validate_map(&Map::default_map()).is_ok());
    }

    #[test]
    fn missing_game_layer() {
        let mut map = Map::default_map();
        map.groups[1].layers.clear();
        assert!(matches!(validate_map(&map), Err(Error::MissingGameLayer)));
    }

    #[test]
    fn missing_game_group() {
        let mut map = Map::default_map();
        map.groups[1].is_game_group = false;
        // the game layer is now outside any game group
        assert!(matches!(validate_map(&map), Err(Error::GameLayerOutsideGameGroup)));
    }

    #[test]
    fn two_game_layers() {
        let mut map = Map::default_map();
        let extra = map.groups[1].layers[0].clone();
        map.groups[1].layers.push(extra);
        assert!(matches!(validate_map(&map), Err(Error::MultipleGameLayers)));
    }

    #[test]
    fn tile_count_mismatch() {
        let mut map = Map::default_map();
        if let Layer::Tiles(layer) = &mut map.groups[1].layers[0] {
            layer.tiles.pop();
        }
        assert!(matches!(
            validate_map(&map),
            Err(Error::InvalidLayerSize { array: "tiles", .. })
        ));
    }

    #[test]
    fn mis_sized_aux_array() {
        let mut map = Map::default_map();
        let mut tele = TileLayer::empty(50, 50, TileLayerKind::Tele(Vec::new()));
        tele.kind = TileLayerKind::Tele(vec![TeleTile::default(); 7]);
        map.groups[1].layers.push(Layer::Tiles(tele));

        assert!(matches!(
            validate_map(&map),
            Err(Error::InvalidLayerSize { array: "tele", actual: 7, .. })
        ));
    }

    #[test]
    fn dangling_image_id() {
        let mut map = Map::default_map();
        if let Layer::Tiles(layer) = &mut map.groups[1].layers[0] {
            layer.image_id = 2;
        }
        assert!(matches!(
            validate_map(&map),
            Err(Error::ImageIndexOutOfRange { index: 2, count: 0 })
        ));
    }

    #[test]
    fn embedded_image_needs_sized_data() {
        let mut map = Map::default_map();
        map.images.push(Image {
            external: false,
            name: "grass_main".into(),
            width: 4, height: 4,
            data: Some(vec![0; 10]),
        });

        assert!(matches!(
            validate_map(&map),
            Err(Error::InvalidImageSize { expected: 64, actual: 10 })
        ));
    }

    #[test]
    fn envelope_slice_out_of_range() {
        let mut map = Map::default_map();
        map.envelopes.push(Envelope {
            name: String::new(), version: 1, channels: 4,
            start_point: 0, num_points: 2, synced: true,
        });

        assert!(matches!(
            validate_map(&map),
            Err(Error::EnvelopePointsOutOfRange { available: 0, .. })
        ));
    }
}
