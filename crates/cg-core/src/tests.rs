//! Unit tests for cg-core primitives.

#[cfg(test)]
mod ids {
    use crate::AgentId;

    #[test]
    fn index_roundtrip() {
        let id = AgentId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(AgentId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinel_is_max() {
        assert_eq!(AgentId::INVALID.0, u32::MAX);
    }

    #[test]
    fn display() {
        assert_eq!(AgentId(7).to_string(), "AgentId(7)");
    }
}

#[cfg(test)]
mod time {
    use crate::Tick;

    #[test]
    fn since_saturates() {
        assert_eq!(Tick(10).since(Tick(4)), 6);
        assert_eq!(Tick(4).since(Tick(10)), 0);
    }

    #[test]
    fn offset_and_add_agree() {
        assert_eq!(Tick(3).offset(5), Tick(3) + 5);
        assert_eq!(Tick(3).next(), Tick(4));
    }
}

#[cfg(test)]
mod codec {
    use crate::codec::{Codec, Depth, MAX_DEPTH};
    use crate::CoreError;

    #[test]
    fn scalar_roundtrip() {
        let c = Codec::scalar(30).unwrap();
        for v in [0u64, 1, 123_456_789, (1 << 30) - 1] {
            assert_eq!(c.decode_one(&c.encode_one(v).unwrap()).unwrap(), v);
        }
    }

    #[test]
    fn widest_depth_roundtrip() {
        let c = Codec::scalar(MAX_DEPTH).unwrap();
        let v = (1u64 << MAX_DEPTH) - 1;
        let s = c.encode_one(v).unwrap();
        assert_eq!(s.chars().count(), 4);
        assert_eq!(c.decode_one(&s).unwrap(), v);
    }

    #[test]
    fn per_element_packs_tightly() {
        let c = Codec::per_element(&[8, 8, 6, 6]).unwrap();
        let s = c.encode(&[255, 0, 49, 17]).unwrap();
        assert_eq!(s.chars().count(), 2);
        assert_eq!(c.decode(&s).unwrap(), vec![255, 0, 49, 17]);
    }

    #[test]
    fn fixed_array_keeps_length() {
        let c = Codec::new(Depth::Fixed(6), true, false).unwrap();
        // Five 6-bit values leave padding that must not decode as a sixth.
        let values = vec![1, 2, 3, 4, 5];
        let s = c.encode(&values).unwrap();
        assert_eq!(s.chars().count(), c.encoded_len(values.len()));
        assert_eq!(c.decode(&s).unwrap(), values);
        assert_eq!(c.decode(&c.encode(&[]).unwrap()).unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn metadata_is_self_describing() {
        let writer = Codec::new(Depth::Fixed(12), true, true).unwrap();
        let s = writer.encode(&[4000, 7, 0]).unwrap();
        // A reader configured with a different depth still decodes it.
        let reader = Codec::new(Depth::Fixed(3), false, true).unwrap();
        assert_eq!(reader.decode(&s).unwrap(), vec![4000, 7, 0]);
    }

    #[test]
    fn characters_stay_printable() {
        let c = Codec::new(Depth::Fixed(15), true, false).unwrap();
        let s = c.encode(&[0, 0x7FFF, 0x1234]).unwrap();
        assert!(s.chars().all(|ch| (0x100..=0x80FF).contains(&(ch as u32))));
    }

    #[test]
    fn bad_depth_fails_fast() {
        assert!(matches!(Codec::scalar(0), Err(CoreError::CodecConfig(_))));
        assert!(matches!(Codec::scalar(MAX_DEPTH + 1), Err(CoreError::CodecConfig(_))));
        assert!(matches!(Codec::per_element(&[]), Err(CoreError::CodecConfig(_))));
        assert!(Codec::new(Depth::PerElement(vec![4]), false, false).is_err());
        assert!(Codec::new(Depth::PerElement(vec![4]), true, true).is_err());
    }

    #[test]
    fn value_out_of_range_is_rejected() {
        let c = Codec::scalar(4).unwrap();
        assert_eq!(c.encode_one(16), Err(CoreError::CodecRange { value: 16, depth: 4 }));
    }

    #[test]
    fn foreign_characters_are_malformed() {
        let c = Codec::scalar(15).unwrap();
        assert!(matches!(c.decode_one("a"), Err(CoreError::Malformed(_))));
        assert!(matches!(c.decode_one(""), Err(CoreError::Malformed(_))));
    }
}

#[cfg(test)]
mod room {
    use crate::{ExitDir, RoomName};

    fn room(s: &str) -> RoomName {
        s.parse().unwrap()
    }

    #[test]
    fn quadrant_coordinates() {
        assert_eq!((room("W0N0").x(), room("W0N0").y()), (-1, -1));
        assert_eq!((room("E0S0").x(), room("E0S0").y()), (0, 0));
        assert_eq!((room("W3S7").x(), room("W3S7").y()), (-4, 7));
        assert_eq!(room("E0S0").packed(), (128 << 8) | 128);
    }

    #[test]
    fn display_roundtrip() {
        for name in ["W0N0", "E12S3", "W127N127", "E127S127", "W5N45"] {
            assert_eq!(room(name).to_string(), name);
        }
    }

    #[test]
    fn malformed_names_error() {
        for bad in ["", "X1N1", "W1", "W1N", "WN1", "W128N0", "w1n1", "W1N1x", "W-1N1"] {
            assert!(bad.parse::<RoomName>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn classification() {
        assert!(room("W10N5").is_highway());
        assert!(room("E3S20").is_highway());
        assert!(!room("W11N11").is_highway());
        assert!(room("W5N5").is_center());
        assert!(room("W5N5").is_source_keeper());
        assert!(room("W4N6").is_source_keeper());
        assert!(!room("W4N6").is_center());
        assert!(!room("W3N5").is_source_keeper());
    }

    #[test]
    fn neighbours_cross_the_meridian() {
        assert_eq!(room("W0N0").neighbor(ExitDir::Right), Some(room("E0N0")));
        assert_eq!(room("W0N0").neighbor(ExitDir::Top), Some(room("W0N1")));
        assert_eq!(room("W0N0").neighbor(ExitDir::Bottom), Some(room("W0S0")));
        assert_eq!(room("W127N0").neighbor(ExitDir::Left), None);
        assert_eq!(room("W0N0").exit_to(room("E0N0")), Some(ExitDir::Right));
        assert_eq!(room("W0N0").exit_to(room("E1N0")), None);
    }

    #[test]
    fn distances() {
        assert_eq!(room("W0N0").distance(room("E0N0")), 1);
        assert_eq!(room("W2N2").distance(room("E2S2")), 10);
        assert_eq!(room("W2N2").linear_distance(room("E2S2")), 5);
    }

    #[test]
    fn exit_dir_index_and_opposite() {
        let idx: Vec<usize> = ExitDir::ALL.iter().map(|d| d.index()).collect();
        assert_eq!(idx, vec![0, 1, 2, 3]);
        assert_eq!(ExitDir::Left.opposite(), ExitDir::Right);
    }
}

#[cfg(test)]
mod pos {
    use crate::{Direction, Position, RoomName};

    fn pos(x: u8, y: u8, r: &str) -> Position {
        Position::new(r.parse::<RoomName>().unwrap(), x, y).unwrap()
    }

    #[test]
    fn packing_roundtrip() {
        let p = pos(49, 0, "W12S40");
        assert_eq!(Position::from_packed(p.packed()).unwrap(), p);
        assert_eq!((p.x(), p.y(), p.room().to_string().as_str()), (49, 0, "W12S40"));
    }

    #[test]
    fn out_of_room_rejected() {
        let r: RoomName = "W0N0".parse().unwrap();
        assert!(Position::new(r, 50, 0).is_err());
        assert!(Position::new(r, 0, 50).is_err());
        assert!(Position::from_packed(0x8080_3232).is_err());
    }

    #[test]
    fn world_coordinates() {
        assert_eq!(pos(25, 25, "W0N0").world_coords(), (-25, -25));
        assert_eq!(pos(0, 0, "E0S0").world_coords(), (0, 0));
        assert_eq!(Position::from_world(-25, -25), Some(pos(25, 25, "W0N0")));
    }

    #[test]
    fn steps_cross_room_edges() {
        let edge = pos(49, 10, "W0N0");
        assert_eq!(edge.step(Direction::Right), Some(pos(0, 10, "E0N0")));
        assert_eq!(edge.range_to(pos(0, 10, "E0N0")), 1);
        assert_eq!(pos(5, 0, "W0N0").step(Direction::Top), Some(pos(5, 49, "W0N1")));
    }

    #[test]
    fn ranges_and_directions() {
        let a = pos(25, 25, "W0N0");
        assert_eq!(a.range_to(pos(30, 27, "W0N0")), 5);
        assert!(a.in_range_to(pos(30, 27, "W0N0"), 5));
        assert!(!a.in_range_to(pos(30, 27, "W0N0"), 4));
        assert_eq!(a.direction_to(pos(30, 25, "W0N0")), Some(Direction::Right));
        assert_eq!(a.direction_to(pos(24, 24, "W0N0")), Some(Direction::TopLeft));
        assert_eq!(a.direction_to(a), None);
        assert_eq!(Direction::TopRight.reverse(), Direction::BottomLeft);
        assert_eq!(Direction::Top.reverse(), Direction::Bottom);
    }

    #[test]
    fn adjacency_drops_off_grid_tiles() {
        assert_eq!(pos(25, 25, "W0N0").adjacent().len(), 8);
        assert_eq!(pos(0, 0, "W0N0").adjacent().len(), 3);
        assert_eq!(pos(49, 20, "W0N0").adjacent().len(), 5);
        assert!(!pos(25, 25, "W0N0").adjacent().contains(&pos(25, 25, "W0N0")));
        assert_eq!(pos(25, 25, "W0N0").nearby(2, true).len(), 25);
    }

    #[test]
    fn ring_at_range() {
        let ring = pos(25, 25, "W0N0").positions_at_range(2);
        assert_eq!(ring.len(), 16);
        assert!(ring.iter().all(|p| p.range_to(pos(25, 25, "W0N0")) == 2));

        let corner = pos(0, 0, "W0N0").positions_at_range(1);
        assert_eq!(corner, vec![pos(1, 0, "W0N0"), pos(0, 1, "W0N0"), pos(1, 1, "W0N0")]);
    }

    #[test]
    fn exits() {
        assert!(pos(0, 10, "W0N0").is_exit());
        assert!(pos(10, 49, "W0N0").is_exit());
        assert!(!pos(1, 48, "W0N0").is_exit());
    }
}

#[cfg(test)]
mod target {
    use crate::{MoveTarget, Position, RoomName};

    fn pos(x: u8, y: u8) -> Position {
        Position::new("W1N1".parse::<RoomName>().unwrap(), x, y).unwrap()
    }

    #[test]
    fn interior_target_untouched() {
        let t = MoveTarget::new(pos(25, 25), 3);
        assert_eq!(t.fix_edge_position(), vec![t]);
    }

    #[test]
    fn edge_target_splits_into_interior_quadrants() {
        let split = MoveTarget::new(pos(2, 25), 5).fix_edge_position();
        assert_eq!(
            split,
            vec![MoveTarget::new(pos(4, 23), 3), MoveTarget::new(pos(4, 27), 3)]
        );
        for t in &split {
            assert!(t.pos.x() as u32 >= 1 + t.range);
        }
    }

    #[test]
    fn edge_tile_target_moves_inside() {
        let split = MoveTarget::new(pos(0, 25), 1).fix_edge_position();
        assert_eq!(split, vec![MoveTarget::exact(pos(1, 24)), MoveTarget::exact(pos(1, 26))]);
    }

    #[test]
    fn contains() {
        let t = MoveTarget::near(pos(10, 10));
        assert!(t.contains(pos(11, 9)));
        assert!(!t.contains(pos(12, 10)));
    }
}

#[cfg(test)]
mod body {
    use crate::{BodyInfo, TerrainCosts};

    fn body(move_parts: u32, carry_parts: u32, other_parts: u32, used: u32) -> BodyInfo {
        BodyInfo { move_parts, carry_parts, other_parts, used_capacity: used }
    }

    #[test]
    fn empty_carry_parts_weigh_nothing() {
        assert_eq!(body(1, 3, 1, 0).weight(), 1);
        assert_eq!(body(1, 3, 1, 51).weight(), 3);
        assert_eq!(body(1, 3, 1, 500).weight(), 4);
    }

    #[test]
    fn balanced_body_gets_standard_costs() {
        assert_eq!(
            body(1, 1, 1, 50).terrain_costs(),
            Some(TerrainCosts { road: 1, plain: 2, swamp: 10 })
        );
        assert_eq!(
            body(1, 0, 10, 0).terrain_costs(),
            Some(TerrainCosts { road: 1, plain: 2, swamp: 10 })
        );
    }

    #[test]
    fn light_body_flattens_costs() {
        assert_eq!(
            body(1, 1, 1, 0).terrain_costs(),
            Some(TerrainCosts { road: 1, plain: 1, swamp: 5 })
        );
        assert_eq!(
            body(5, 0, 0, 0).terrain_costs(),
            Some(TerrainCosts { road: 1, plain: 1, swamp: 1 })
        );
    }

    #[test]
    fn immobile_body_has_no_costs() {
        assert_eq!(body(0, 0, 3, 0).terrain_costs(), None);
    }
}

#[cfg(test)]
mod keys {
    use crate::{agent_key, object_key, room_key, AgentId, CoreError, RoomName};

    #[test]
    fn object_key_groups_hex_triplets() {
        let k = object_key("abc", "_p").unwrap();
        let mut chars = k.chars();
        assert_eq!(chars.next().map(|c| c as u32), Some(0x100 + 0xabc));
        assert_eq!(chars.as_str(), "_p");
    }

    #[test]
    fn object_key_pads_to_triplets() {
        assert_eq!(object_key("1abc", "").unwrap(), object_key("001abc", "").unwrap());
        assert_eq!(object_key("1abc", "").unwrap().chars().count(), 2);
    }

    #[test]
    fn bad_ids_are_errors() {
        assert!(matches!(object_key("", "x"), Err(CoreError::InvalidId(_))));
        assert!(matches!(object_key("xyz", "x"), Err(CoreError::InvalidId(_))));
    }

    #[test]
    fn agent_key_matches_object_key() {
        for id in [0u32, 1, 0x1234_5678, u32::MAX - 1] {
            assert_eq!(
                agent_key(AgentId(id), "_cp"),
                object_key(&format!("{id:08x}"), "_cp").unwrap()
            );
        }
    }

    #[test]
    fn room_keys_are_distinct() {
        let a: RoomName = "W0N0".parse().unwrap();
        let b: RoomName = "E127S127".parse().unwrap();
        let c: RoomName = "E127N0".parse().unwrap();
        assert_ne!(room_key(a, "_ck"), room_key(b, "_ck"));
        assert_ne!(room_key(b, "_ck"), room_key(c, "_ck"));
    }
}

#[cfg(test)]
mod status {
    use crate::MoveStatus;

    #[test]
    fn host_codes() {
        assert_eq!(MoveStatus::Ok.code(), 0);
        assert_eq!(MoveStatus::NoPath.code(), -2);
        assert_eq!(MoveStatus::NotFound.code(), -5);
        assert_eq!(MoveStatus::InvalidArgs.code(), -10);
        assert!(MoveStatus::Ok.is_ok());
        assert!(!MoveStatus::Tired.is_ok());
    }
}
