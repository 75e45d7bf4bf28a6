
//! End-to-end tests: encode maps, decode them again, and feed the
//! decoder handcrafted files the encoder would refuse to produce.

use teemap::prelude::*;
use teemap::datafile::write_datafile;
use teemap::datafile::items::DatafileItem;
use teemap::datafile::blobs::DatafileBlob;
use teemap::text::string_to_ints;
use teemap::entities;

fn encode(map: &Map) -> Vec<u8> {
    let mut bytes = Vec::new();
    map.write_to_buffered(&mut bytes).unwrap();
    bytes
}

fn decode(bytes: &[u8]) -> Result<Map> {
    Map::read_from_buffered(bytes)
}

/// The smallest valid map: one game group holding
/// one 2x2 all-air game layer.
fn minimal_map() -> Map {
    let game_layer = TileLayer::empty(2, 2, TileLayerKind::Game);

    Map {
        groups: vec![Group {
            name: Some("Game".to_owned()),
            is_game_group: true,
            layers: vec![Layer::Tiles(game_layer)],
            .. Group::default()
        }],
        .. Map::default()
    }
}

/// A map exercising every feature the format has: info with settings,
/// embedded and external images, a quad background, every special
/// layer kind, and envelopes slicing a shared envpoint list.
fn maximal_map() -> Map {
    let mut game_layer = TileLayer::empty(4, 3, TileLayerKind::Game);
    game_layer.name = Some("Game".to_owned());
    game_layer.tiles[0] = Tile::with_index(entities::TILE_SOLID);
    game_layer.tiles[11] = Tile::with_index(entities::ENTITY_OFFSET + entities::ENTITY_SPAWN);

    let mut front_layer = TileLayer::empty(4, 3, TileLayerKind::Front);
    front_layer.name = Some("Front".to_owned());
    front_layer.tiles[5] = Tile::with_index(entities::TILE_THROUGH_CUT);

    let mut tele_layer = TileLayer::empty(4, 3, TileLayerKind::Tele(Vec::new()));
    tele_layer.name = Some("Tele".to_owned());
    if let TileLayerKind::Tele(tiles) = &mut tele_layer.kind {
        tiles[2] = TeleTile { number: 1, kind: entities::TILE_TELEIN };
        tiles[7] = TeleTile { number: 1, kind: entities::TILE_TELEOUT };
    }

    let mut speedup_layer = TileLayer::empty(4, 3, TileLayerKind::Speedup(Vec::new()));
    speedup_layer.name = Some("Speedup".to_owned());
    if let TileLayerKind::Speedup(tiles) = &mut speedup_layer.kind {
        tiles[4] = SpeedupTile { force: 12, max_speed: 0, kind: entities::TILE_BOOST, angle: 270 };
    }

    let mut switch_layer = TileLayer::empty(4, 3, TileLayerKind::Switch(Vec::new()));
    switch_layer.name = Some("Switch".to_owned());
    if let TileLayerKind::Switch(tiles) = &mut switch_layer.kind {
        tiles[9] = SwitchTile { number: 3, kind: entities::TILE_SWITCHOPEN, flags: 0, delay: 5 };
    }

    let mut tune_layer = TileLayer::empty(4, 3, TileLayerKind::Tune(Vec::new()));
    tune_layer.name = Some("Tune".to_owned());
    if let TileLayerKind::Tune(tiles) = &mut tune_layer.kind {
        tiles[1] = TuneTile { number: 1, kind: entities::TILE_TUNE };
    }

    let mut design_layer = TileLayer::empty(6, 2, TileLayerKind::Normal);
    design_layer.name = Some("Design".to_owned());
    design_layer.detail = true;
    design_layer.image_id = 0;
    design_layer.color = [128, 200, 255, 192];
    design_layer.color_env = 1;
    design_layer.color_env_offset = 500;
    design_layer.tiles[3] = Tile { index: 16, flags: 0b1000, skip: 0, reserved: 0 };

    let background_layer = QuadLayer {
        detail: false,
        name: Some("Sky".to_owned()),
        image_id: 1,
        quads: vec![Quad::background(), Quad::default()],
    };

    Map {
        info: Some(Info {
            author: Some(b"patternauthor".to_vec()),
            map_version: Some(b"1.0".to_vec()),
            credits: None,
            license: Some(b"CC0".to_vec()),
            settings: Some(vec![
                b"sv_gametype ddrace".to_vec(),
                b"tune gravity 0.25".to_vec(),
            ]),
        }),

        images: vec![
            Image {
                external: false,
                name: "embedded".to_owned(),
                width: 2, height: 2,
                data: Some((0 .. 16).collect()),
            },
            Image {
                external: true,
                name: "grass_main".to_owned(),
                width: 1024, height: 1024,
                data: None,
            },
        ],

        groups: vec![
            Group {
                name: Some("Background".to_owned()),
                parallax_x: 0, parallax_y: 0,
                layers: vec![Layer::Quads(background_layer)],
                .. Group::default()
            },
            Group {
                name: Some("Game".to_owned()),
                is_game_group: true,
                offset_x: -16, offset_y: 32,
                use_clipping: true,
                clip_x: 0, clip_y: 0, clip_w: 128, clip_h: 96,
                layers: vec![
                    Layer::Tiles(game_layer),
                    Layer::Tiles(front_layer),
                    Layer::Tiles(tele_layer),
                    Layer::Tiles(speedup_layer),
                    Layer::Tiles(switch_layer),
                    Layer::Tiles(tune_layer),
                    Layer::Tiles(design_layer),
                ],
                .. Group::default()
            },
        ],

        envelopes: vec![
            Envelope {
                name: "sunrise".to_owned(),
                version: 2, channels: 4,
                start_point: 0, num_points: 2,
                synced: true,
            },
            Envelope {
                name: "wobble".to_owned(),
                version: 3, channels: 3,
                start_point: 2, num_points: 1,
                synced: false,
            },
        ],

        envpoints: vec![
            Envpoint { time: 0, curvetype: 0, values: [0, 0, 0, 1024] },
            Envpoint { time: 1000, curvetype: 1, values: [1024, 512, 0, 1024] },
            Envpoint { time: 0, curvetype: 4, values: [32, -32, 0, 0] },
        ],
    }
}

#[test]
fn minimal_map_roundtrip() {
    let map = minimal_map();

    let first = decode(&encode(&map)).unwrap();
    assert!(first.validate().is_ok());

    let game = first.game_layer().unwrap();
    assert_eq!((game.width, game.height), (2, 2));
    assert_eq!(game.tiles, vec![Tile::default(); 4]);
    assert_eq!(first.groups.len(), 1);
    assert!(first.groups[0].is_game_group);
    assert_eq!(first.groups[0].name.as_deref(), Some("Game"));

    // once canonicalized, encoding is a fixpoint
    let second = decode(&encode(&first)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn maximal_map_roundtrip_is_exact() {
    let map = maximal_map();
    let decoded = decode(&encode(&map)).unwrap();
    assert_eq!(decoded, map);

    // and stays a fixpoint on the second trip
    let again = decode(&encode(&decoded)).unwrap();
    assert_eq!(again, decoded);
}

#[test]
fn aux_arrays_survive_the_file() {
    let decoded = decode(&encode(&maximal_map())).unwrap();

    let tele = decoded.tele_layer().unwrap().tele_tiles().unwrap();
    assert_eq!(tele[2], TeleTile { number: 1, kind: entities::TILE_TELEIN });

    let speedup = decoded.speedup_layer().unwrap().speedup_tiles().unwrap();
    assert_eq!(speedup[4].angle, 270);

    let switch = decoded.switch_layer().unwrap().switch_tiles().unwrap();
    assert_eq!(switch[9].delay, 5);

    let tune = decoded.tune_layer().unwrap().tune_tiles().unwrap();
    assert_eq!(tune[1].number, 1);

    let front = decoded.front_layer().unwrap();
    assert_eq!(front.tiles[5].index, entities::TILE_THROUGH_CUT);
    assert_eq!(front.name.as_deref(), Some("Front"));
}

#[test]
fn envelope_slices_partition_the_points() {
    let decoded = decode(&encode(&maximal_map())).unwrap();

    assert_eq!(decoded.envpoints.len(), 3);
    assert_eq!(decoded.envelope_points(&decoded.envelopes[0]).len(), 2);
    assert_eq!(decoded.envelope_points(&decoded.envelopes[1])[0].values[0], 32);

    assert_eq!(decoded.envelopes[0].version, 2);
    assert!(decoded.envelopes[0].synced);
    assert_eq!(decoded.envelopes[1].version, 3);
    assert!(!decoded.envelopes[1].synced);
}

#[test]
fn missing_game_layer_refused_on_save() {
    let map = Map {
        groups: vec![Group {
            name: Some("Background".to_owned()),
            layers: vec![Layer::Quads(QuadLayer {
                detail: false, name: None, image_id: -1,
                quads: vec![Quad::background()],
            })],
            .. Group::default()
        }],
        .. Map::default()
    };

    let mut bytes = Vec::new();
    assert!(matches!(
        map.write_to_buffered(&mut bytes),
        Err(Error::MissingGameLayer)
    ));
    assert!(bytes.is_empty());
}

#[test]
fn sound_layers_are_dropped_on_save() {
    let mut map = minimal_map();
    map.groups[0].layers.push(Layer::Sounds(SoundLayer {
        detail: false,
        name: Some("birds".to_owned()),
        num_sources: 3,
    }));

    let decoded = decode(&encode(&map)).unwrap();
    assert_eq!(decoded.groups[0].layers.len(), 1);
    assert!(decoded.game_layer().is_some());
}

#[test]
fn empty_quad_layers_survive() {
    let mut map = minimal_map();
    map.groups[0].layers.push(Layer::Quads(QuadLayer {
        detail: false, name: Some("Overlay".to_owned()),
        image_id: -1, quads: Vec::new(),
    }));

    let decoded = decode(&encode(&map)).unwrap();
    assert_eq!(decoded.groups[0].layers.len(), 2);
    match &decoded.groups[0].layers[1] {
        Layer::Quads(layer) => assert!(layer.quads.is_empty()),
        other => panic!("expected a quad layer, got {:?}", other),
    }
}

// ---- handcrafted files the encoder refuses to produce ----

fn game_layer_item(id: i32, data_index: i32) -> DatafileItem {
    let mut ints = vec![
        0, 2, 0, // layer preamble: version, tiles, no detail
        3, 2, 2, 1, // tile layer version 3, 2x2, game flag 1
        255, 255, 255, 255, -1, 0, -1,
        data_index,
    ];
    ints.extend(string_to_ints("Game", 3));
    DatafileItem { type_id: 5, id, ints }
}

fn group_item(id: i32, start_layer: i32, num_layers: i32, name: &str) -> DatafileItem {
    let mut ints = vec![3, 0, 0, 100, 100, start_layer, num_layers, 0, 0, 0, 0, 0];
    ints.extend(string_to_ints(name, 3));
    DatafileItem { type_id: 4, id, ints }
}

fn craft(items: Vec<DatafileItem>, blobs: &[DatafileBlob]) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_datafile(items, blobs, &mut bytes).unwrap();
    bytes
}

#[test]
fn mis_sized_tele_blob_fails_decode() {
    let mut tele_ints = vec![
        0, 2, 0,
        3, 2, 2, 2, // game flag 2: tele
        255, 255, 255, 255, -1, 0, -1,
        0, // data index: the conventional zero grid
    ];
    tele_ints.extend(string_to_ints("Tele", 3));
    tele_ints.push(1); // tele slot

    let items = vec![
        DatafileItem { type_id: 0, id: 0, ints: vec![1] },
        group_item(0, 0, 2, "Game"),
        game_layer_item(0, 0),
        DatafileItem { type_id: 5, id: 1, ints: tele_ints },
        DatafileItem { type_id: 6, id: 0, ints: vec![] },
    ];

    let blobs = [
        DatafileBlob::compress(&[0; 16]),
        DatafileBlob::compress(&[0; 6]), // 3 tele cells, the layer needs 4
    ];

    assert!(matches!(
        decode(&craft(items, &blobs)),
        Err(Error::InvalidLayerSize { array: "tele", expected: 4, actual: 3 })
    ));
}

#[test]
fn two_game_layers_fail_decode() {
    let items = vec![
        DatafileItem { type_id: 0, id: 0, ints: vec![1] },
        group_item(0, 0, 2, "Game"),
        game_layer_item(0, 0),
        game_layer_item(1, 0),
        DatafileItem { type_id: 6, id: 0, ints: vec![] },
    ];

    let blobs = [DatafileBlob::compress(&[0; 16])];

    assert!(matches!(
        decode(&craft(items, &blobs)),
        Err(Error::MultipleGameLayers)
    ));
}

#[test]
fn two_game_groups_fail_decode() {
    let items = vec![
        DatafileItem { type_id: 0, id: 0, ints: vec![1] },
        group_item(0, 0, 1, "Game"),
        group_item(1, 1, 1, "Game"),
        game_layer_item(0, 0),
        game_layer_item(1, 0),
        DatafileItem { type_id: 6, id: 0, ints: vec![] },
    ];

    let blobs = [DatafileBlob::compress(&[0; 16])];

    assert!(matches!(
        decode(&craft(items, &blobs)),
        Err(Error::MultipleGameGroups)
    ));
}

#[test]
fn game_layer_outside_game_group_fails_decode() {
    let items = vec![
        DatafileItem { type_id: 0, id: 0, ints: vec![1] },
        group_item(0, 0, 1, "Scenery"),
        game_layer_item(0, 0),
        DatafileItem { type_id: 6, id: 0, ints: vec![] },
    ];

    let blobs = [DatafileBlob::compress(&[0; 16])];

    assert!(matches!(
        decode(&craft(items, &blobs)),
        Err(Error::GameLayerOutsideGameGroup)
    ));
}

#[test]
fn unknown_game_flag_fails_decode() {
    let mut ints = vec![
        0, 2, 0,
        3, 2, 2, 3, // game flag 3 does not exist
        255, 255, 255, 255, -1, 0, -1,
        0,
    ];
    ints.extend(string_to_ints("Broken", 3));

    let items = vec![
        DatafileItem { type_id: 0, id: 0, ints: vec![1] },
        group_item(0, 0, 1, "Game"),
        DatafileItem { type_id: 5, id: 0, ints },
        DatafileItem { type_id: 6, id: 0, ints: vec![] },
    ];

    let blobs = [DatafileBlob::compress(&[0; 16])];

    assert!(matches!(
        decode(&craft(items, &blobs)),
        Err(Error::UnknownGameFlag(3))
    ));
}

#[test]
fn missing_game_group_fails_decode() {
    let items = vec![
        DatafileItem { type_id: 0, id: 0, ints: vec![1] },
        group_item(0, 0, 0, "Scenery"),
        DatafileItem { type_id: 6, id: 0, ints: vec![] },
    ];

    assert!(matches!(
        decode(&craft(items, &[])),
        Err(Error::MissingGameGroup)
    ));
}

#[test]
fn legacy_tile_layer_offsets() {
    // a layer item from before version 3: no name ints,
    // the tele blob index sits directly after the data index
    let legacy_tele_ints = vec![
        0, 2, 0,
        2, 2, 2, 2, // tile layer version 2, game flag 2
        255, 255, 255, 255, -1, 0, -1,
        0, // data index
        1, // legacy tele slot
    ];

    let items = vec![
        DatafileItem { type_id: 0, id: 0, ints: vec![1] },
        // group version 1: unnamed, the legacy game flag marks the group
        DatafileItem { type_id: 4, id: 0, ints: vec![1, 0, 0, 100, 100, 0, 2, 0, 0, 0, 0, 0] },
        DatafileItem { type_id: 5, id: 0, ints: legacy_tele_ints },
        game_layer_item(1, 0),
        // one envelope from before the synced flag, slicing one point
        DatafileItem { type_id: 3, id: 0, ints: {
            let mut ints = vec![1, 1, 0, 1];
            ints.extend(string_to_ints("fade", 8));
            ints
        }},
        DatafileItem { type_id: 6, id: 0, ints: vec![500, 0, 64, 0, 0, 0] },
    ];

    let tele_bytes: Vec<u8> = vec![2, entities::TILE_TELEOUT, 0, 0, 0, 0, 0, 0];
    let blobs = [
        DatafileBlob::compress(&[0; 16]),
        DatafileBlob::compress(&tele_bytes),
    ];

    let map = decode(&craft(items, &blobs)).unwrap();

    assert!(map.groups[0].is_game_group);
    assert_eq!(map.groups[0].name, None);

    let tele = map.tele_layer().unwrap().tele_tiles().unwrap();
    assert_eq!(tele[0], TeleTile { number: 2, kind: entities::TILE_TELEOUT });

    // envelopes older than version 2 always behave synced
    assert!(map.envelopes[0].synced);
    assert_eq!(map.envelope_points(&map.envelopes[0]), &[
        Envpoint { time: 500, curvetype: 0, values: [64, 0, 0, 0] },
    ]);
}

#[test]
fn tele_layer_without_blob_fails_decode() {
    let mut ints = vec![
        0, 2, 0,
        3, 2, 2, 2,
        255, 255, 255, 255, -1, 0, -1,
        0,
    ];
    ints.extend(string_to_ints("Tele", 3));
    ints.push(-1); // no tele blob

    let items = vec![
        DatafileItem { type_id: 0, id: 0, ints: vec![1] },
        group_item(0, 0, 2, "Game"),
        game_layer_item(0, 0),
        DatafileItem { type_id: 5, id: 1, ints },
        DatafileItem { type_id: 6, id: 0, ints: vec![] },
    ];

    let blobs = [DatafileBlob::compress(&[0; 16])];

    assert!(matches!(
        decode(&craft(items, &blobs)),
        Err(Error::MissingAuxTiles("tele"))
    ));
}

// ---- path handling ----

#[test]
fn save_rejects_foreign_extensions() {
    let map = minimal_map();
    assert!(matches!(
        map.save("somewhere/foo.txt"),
        Err(Error::InvalidPath(_))
    ));
}

#[test]
fn save_appends_the_map_extension() {
    let map = minimal_map();

    let mut base = std::env::temp_dir();
    base.push(format!("teemap-test-{}", std::process::id()));
    let with_extension = base.with_extension("map");

    map.save(&base).unwrap();
    let reloaded = Map::load(&with_extension).unwrap();
    assert!(reloaded.game_layer().is_some());

    // loading may also omit the extension
    let reloaded_short = Map::load(&base).unwrap();
    assert_eq!(reloaded, reloaded_short);

    std::fs::remove_file(&with_extension).unwrap();
}

#[test]
fn info_settings_roundtrip() {
    let decoded = decode(&encode(&maximal_map())).unwrap();
    let info = decoded.info.unwrap();

    assert_eq!(info.author.as_deref(), Some(&b"patternauthor"[..]));
    assert_eq!(info.credits, None);
    assert_eq!(info.settings.unwrap(), vec![
        b"sv_gametype ddrace".to_vec(),
        b"tune gravity 0.25".to_vec(),
    ]);
}

#[test]
fn images_roundtrip() {
    let decoded = decode(&encode(&maximal_map())).unwrap();

    assert_eq!(decoded.images.len(), 2);
    assert!(!decoded.images[0].external);
    assert_eq!(decoded.images[0].data.as_ref().unwrap().len(), 16);
    assert!(decoded.images[1].external);
    assert_eq!(decoded.images[1].name, "grass_main");
    assert_eq!(decoded.images[1].data, None);
}
