
//! Tile index semantics: the constants of the game tileset and the
//! predicates deciding which indices are legal on the game and front
//! layers. The predicates are total over `u8`, stateless and cheap;
//! external checking tools build directly on them.

/// Entity indices start this far into the tileset.
pub const ENTITY_OFFSET: u8 = 255 - 16 * 4;

pub const ENTITY_SPAWN: u8 = 1;
pub const ENTITY_SPAWN_RED: u8 = 2;
pub const ENTITY_SPAWN_BLUE: u8 = 3;
pub const ENTITY_FLAGSTAND_RED: u8 = 4;
pub const ENTITY_FLAGSTAND_BLUE: u8 = 5;
pub const ENTITY_ARMOR: u8 = 6;
pub const ENTITY_HEALTH: u8 = 7;
pub const ENTITY_WEAPON_SHOTGUN: u8 = 8;
pub const ENTITY_WEAPON_GRENADE: u8 = 9;
pub const ENTITY_POWERUP_NINJA: u8 = 10;
pub const ENTITY_WEAPON_RIFLE: u8 = 11;
pub const ENTITY_LASER_FAST_CW: u8 = 12;
pub const ENTITY_LASER_NORMAL_CW: u8 = 13;
pub const ENTITY_LASER_SLOW_CW: u8 = 14;
pub const ENTITY_LASER_STOP: u8 = 15;
pub const ENTITY_LASER_SLOW_CCW: u8 = 16;
pub const ENTITY_LASER_NORMAL_CCW: u8 = 17;
pub const ENTITY_LASER_FAST_CCW: u8 = 18;
pub const ENTITY_LASER_SHORT: u8 = 19;
pub const ENTITY_LASER_MEDIUM: u8 = 20;
pub const ENTITY_LASER_LONG: u8 = 21;
pub const ENTITY_LASER_C_SLOW: u8 = 22;
pub const ENTITY_LASER_C_NORMAL: u8 = 23;
pub const ENTITY_LASER_C_FAST: u8 = 24;
pub const ENTITY_LASER_O_SLOW: u8 = 25;
pub const ENTITY_LASER_O_NORMAL: u8 = 26;
pub const ENTITY_LASER_O_FAST: u8 = 27;
pub const ENTITY_PLASMAE: u8 = 29;
pub const ENTITY_PLASMAF: u8 = 30;
pub const ENTITY_PLASMA: u8 = 31;
pub const ENTITY_PLASMAU: u8 = 32;
pub const ENTITY_CRAZY_SHOTGUN_EX: u8 = 33;
pub const ENTITY_CRAZY_SHOTGUN: u8 = 34;
pub const ENTITY_DRAGGER_WEAK: u8 = 42;
pub const ENTITY_DRAGGER_NORMAL: u8 = 43;
pub const ENTITY_DRAGGER_STRONG: u8 = 44;
pub const ENTITY_DRAGGER_WEAK_NW: u8 = 45;
pub const ENTITY_DRAGGER_NORMAL_NW: u8 = 46;
pub const ENTITY_DRAGGER_STRONG_NW: u8 = 47;
pub const ENTITY_DOOR: u8 = 49;

pub const TILE_AIR: u8 = 0;
pub const TILE_SOLID: u8 = 1;
pub const TILE_DEATH: u8 = 2;
pub const TILE_NOHOOK: u8 = 3;
pub const TILE_NOLASER: u8 = 4;
pub const TILE_THROUGH_CUT: u8 = 5;
pub const TILE_THROUGH: u8 = 6;
pub const TILE_JUMP: u8 = 7;
pub const TILE_FREEZE: u8 = 9;
pub const TILE_TELEINEVIL: u8 = 10;
pub const TILE_UNFREEZE: u8 = 11;
pub const TILE_DFREEZE: u8 = 12;
pub const TILE_DUNFREEZE: u8 = 13;
pub const TILE_TELEINWEAPON: u8 = 14;
pub const TILE_TELEINHOOK: u8 = 15;
pub const TILE_WALLJUMP: u8 = 16;
pub const TILE_EHOOK_START: u8 = 17;
pub const TILE_EHOOK_END: u8 = 18;
pub const TILE_HIT_START: u8 = 19;
pub const TILE_HIT_END: u8 = 20;
pub const TILE_SOLO_START: u8 = 21;
pub const TILE_SOLO_END: u8 = 22;
// shares its index with TILE_SOLO_END; the walljump..solo range covers both
pub const TILE_SWITCHTIMEDOPEN: u8 = 22;
pub const TILE_SWITCHTIMEDCLOSE: u8 = 23;
pub const TILE_SWITCHOPEN: u8 = 24;
pub const TILE_SWITCHCLOSE: u8 = 25;
pub const TILE_TELEIN: u8 = 26;
pub const TILE_TELEOUT: u8 = 27;
pub const TILE_BOOST: u8 = 28;
pub const TILE_TELECHECK: u8 = 29;
pub const TILE_TELECHECKOUT: u8 = 30;
pub const TILE_TELECHECKIN: u8 = 31;
pub const TILE_REFILL_JUMPS: u8 = 32;
pub const TILE_BEGIN: u8 = 33;
pub const TILE_END: u8 = 34;
pub const TILE_STOP: u8 = 60;
pub const TILE_STOPS: u8 = 61;
pub const TILE_STOPA: u8 = 62;
pub const TILE_TELECHECKINEVIL: u8 = 63;
pub const TILE_CP: u8 = 64;
pub const TILE_CP_F: u8 = 65;
pub const TILE_THROUGH_ALL: u8 = 66;
pub const TILE_THROUGH_DIR: u8 = 67;
pub const TILE_TUNE: u8 = 68;
pub const TILE_OLDLASER: u8 = 71;
pub const TILE_NPC: u8 = 72;
pub const TILE_EHOOK: u8 = 73;
pub const TILE_NOHIT: u8 = 74;
pub const TILE_NPH: u8 = 75;
pub const TILE_UNLOCK_TEAM: u8 = 76;
pub const TILE_PENALTY: u8 = 79;
pub const TILE_NPC_END: u8 = 88;
pub const TILE_SUPER_END: u8 = 89;
pub const TILE_JETPACK_END: u8 = 90;
pub const TILE_NPH_END: u8 = 91;
pub const TILE_BONUS: u8 = 95;
pub const TILE_NPC_START: u8 = 104;
pub const TILE_SUPER_START: u8 = 105;
pub const TILE_JETPACK_START: u8 = 106;
pub const TILE_NPH_START: u8 = 107;
pub const TILE_ENTITIES_OFF_1: u8 = 190;
pub const TILE_ENTITIES_OFF_2: u8 = 191;

/// Whether the index, shifted into the entity range, names an entity:
/// spawns, pickups, lasers, plasma turrets, draggers or the door.
pub fn is_valid_entity(index: u8) -> bool {
    let index = index.wrapping_sub(ENTITY_OFFSET);

    (ENTITY_SPAWN ..= ENTITY_LASER_O_FAST).contains(&index)
        || (ENTITY_PLASMAE ..= ENTITY_CRAZY_SHOTGUN).contains(&index)
        || (ENTITY_DRAGGER_WEAK ..= ENTITY_DRAGGER_STRONG_NW).contains(&index)
        || index == ENTITY_DOOR
}

/// Whether the index is legal on the game layer.
pub fn is_valid_game_tile(index: u8) -> bool {
    index == TILE_AIR
        || (TILE_SOLID ..= TILE_NOLASER).contains(&index)
        || index == TILE_THROUGH
        || index == TILE_FREEZE
        || (TILE_UNFREEZE ..= TILE_DUNFREEZE).contains(&index)
        || (TILE_WALLJUMP ..= TILE_SOLO_END).contains(&index)
        || (TILE_REFILL_JUMPS ..= TILE_STOPA).contains(&index)
        || (TILE_CP ..= TILE_THROUGH_DIR).contains(&index)
        || (TILE_OLDLASER ..= TILE_UNLOCK_TEAM).contains(&index)
        || (TILE_NPC_END ..= TILE_NPH_END).contains(&index)
        || (TILE_NPC_START ..= TILE_NPH_START).contains(&index)
        || (TILE_ENTITIES_OFF_1 ..= TILE_ENTITIES_OFF_2).contains(&index)
        || is_valid_entity(index)
}

/// Whether the index is legal on the front layer. A tightened variant
/// of [`is_valid_game_tile`]: no solid tiles, but cut-through is allowed.
pub fn is_valid_front_tile(index: u8) -> bool {
    index == TILE_AIR
        || index == TILE_DEATH
        || (TILE_NOLASER ..= TILE_THROUGH).contains(&index)
        || index == TILE_FREEZE
        || (TILE_UNFREEZE ..= TILE_DUNFREEZE).contains(&index)
        || (TILE_WALLJUMP ..= TILE_SOLO_END).contains(&index)
        || (TILE_REFILL_JUMPS ..= TILE_STOPA).contains(&index)
        || (TILE_CP ..= TILE_THROUGH_DIR).contains(&index)
        || (TILE_OLDLASER ..= TILE_UNLOCK_TEAM).contains(&index)
        || (TILE_NPC_END ..= TILE_NPH_END).contains(&index)
        || (TILE_NPC_START ..= TILE_NPH_START).contains(&index)
        || is_valid_entity(index)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn entity_spot_checks() {
        assert!(is_valid_entity(ENTITY_OFFSET + ENTITY_SPAWN)); // 192
        assert!(is_valid_entity(ENTITY_OFFSET + ENTITY_DOOR)); // 240
        assert!(!is_valid_entity(ENTITY_OFFSET + 28)); // 219, the gap between lasers and plasma
        assert!(!is_valid_entity(ENTITY_OFFSET)); // the null entity
        assert!(!is_valid_entity(ENTITY_OFFSET + 35));
        assert!(!is_valid_entity(ENTITY_OFFSET + 48));
        assert!(!is_valid_entity(ENTITY_OFFSET + 50));
        assert!(!is_valid_entity(TILE_AIR));
    }

    #[test]
    fn game_tile_spot_checks() {
        assert!(is_valid_game_tile(TILE_AIR));
        assert!(is_valid_game_tile(TILE_SOLID));
        assert!(is_valid_game_tile(TILE_NOHOOK));
        assert!(is_valid_game_tile(TILE_FREEZE));
        assert!(is_valid_game_tile(TILE_BEGIN));
        assert!(is_valid_game_tile(TILE_ENTITIES_OFF_1));
        assert!(is_valid_game_tile(192));

        assert!(!is_valid_game_tile(TILE_THROUGH_CUT));
        assert!(!is_valid_game_tile(TILE_JUMP));
        assert!(!is_valid_game_tile(8));
        assert!(!is_valid_game_tile(TILE_TUNE));
        assert!(!is_valid_game_tile(TILE_PENALTY));
        assert!(!is_valid_game_tile(TILE_BONUS));
        assert!(!is_valid_game_tile(255));
    }

    #[test]
    fn front_tile_spot_checks() {
        assert!(is_valid_front_tile(TILE_AIR));
        assert!(is_valid_front_tile(TILE_DEATH));
        assert!(is_valid_front_tile(TILE_THROUGH_CUT));
        assert!(is_valid_front_tile(TILE_UNLOCK_TEAM));

        assert!(!is_valid_front_tile(TILE_SOLID));
        assert!(!is_valid_front_tile(TILE_NOHOOK));
        assert!(!is_valid_front_tile(TILE_ENTITIES_OFF_1));
        assert!(!is_valid_front_tile(TILE_ENTITIES_OFF_2));
    }

    #[test]
    fn predicates_are_total() {
        // no index may panic, and the counts pin the accepted sets
        let game_count = (0 ..= 255_u8).filter(|&index| is_valid_game_tile(index)).count();
        let front_count = (0 ..= 255_u8).filter(|&index| is_valid_front_tile(index)).count();
        let entity_count = (0 ..= 255_u8).filter(|&index| is_valid_entity(index)).count();

        assert_eq!(entity_count, 27 + 6 + 6 + 1);
        assert!(game_count > entity_count);
        assert!(front_count > entity_count);
    }

    #[test]
    fn front_differs_from_game_only_at_the_edges() {
        for index in 0 ..= 255_u8 {
            let game = is_valid_game_tile(index);
            let front = is_valid_front_tile(index);

            match index {
                TILE_SOLID | TILE_NOHOOK => assert!(game && !front, "index {}", index),
                TILE_THROUGH_CUT => assert!(!game && front),
                TILE_ENTITIES_OFF_1 | TILE_ENTITIES_OFF_2 => assert!(game && !front),
                _ => assert_eq!(game, front, "index {}", index),
            }
        }
    }
}
