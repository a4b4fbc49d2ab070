//! Unit tests for oht-core.

mod ids {
    use crate::{EdgeId, NodeId, VehicleId};

    #[test]
    fn invalid_sentinels() {
        assert_eq!(VehicleId::default(), VehicleId::INVALID);
        assert_eq!(NodeId::default(), NodeId::INVALID);
        // EdgeId is 1-based: default is the NONE sentinel, not MAX.
        assert_eq!(EdgeId::default(), EdgeId::NONE);
        assert!(EdgeId::NONE.is_none());
        assert!(EdgeId(1).is_some());
    }

    #[test]
    fn edge_id_indexes_one_based_tables() {
        // Slot 0 is the dead row; EdgeId(3) addresses table[3].
        let table = vec![0.0_f32, 10.0, 20.0, 30.0];
        assert_eq!(table[EdgeId(3).index()], 30.0);
    }

    #[test]
    fn ids_sort_and_hash() {
        let mut v = vec![VehicleId(3), VehicleId(1), VehicleId(2)];
        v.sort();
        assert_eq!(v, vec![VehicleId(1), VehicleId(2), VehicleId(3)]);

        use std::collections::HashSet;
        let s: HashSet<EdgeId> = [EdgeId(1), EdgeId(1), EdgeId(2)].into_iter().collect();
        assert_eq!(s.len(), 2);
    }
}

mod checkpoint {
    use crate::{Checkpoint, CheckpointFlags, EdgeId};

    #[test]
    fn none_slot_is_recognizable() {
        let cp = Checkpoint::NONE;
        assert!(cp.is_none());
        assert!(cp.flags.is_empty());
    }

    #[test]
    fn flags_combine_and_clear() {
        let mut flags = CheckpointFlags::MOVE_PREPARE | CheckpointFlags::LOCK_REQUEST;
        assert!(flags.contains(CheckpointFlags::MOVE_PREPARE));

        flags.remove(CheckpointFlags::MOVE_PREPARE);
        assert!(!flags.contains(CheckpointFlags::MOVE_PREPARE));
        assert!(flags.contains(CheckpointFlags::LOCK_REQUEST));

        flags.remove(CheckpointFlags::LOCK_REQUEST);
        assert!(flags.is_empty());
    }

    #[test]
    fn checkpoint_carries_target() {
        let cp = Checkpoint {
            edge:   EdgeId(4),
            ratio:  0.75,
            flags:  CheckpointFlags::LOCK_WAIT,
            target: EdgeId(7),
        };
        assert_eq!(cp.target, EdgeId(7));
        assert!(!cp.is_none());
    }
}

mod params {
    use crate::SimParams;

    #[test]
    fn defaults_match_documented_values() {
        let p = SimParams::default();
        assert_eq!(p.straight_request_distance, 5.1);
        assert_eq!(p.curve_request_distance, 1.0);
        assert_eq!(p.release_ratio, 0.01);
        assert_eq!(p.default_waiting_offset, 1.89);
        assert_eq!(p.max_path_finds_per_frame, 10);
        assert_eq!(p.max_attempts, 5);
        assert_eq!(p.max_path_length, 100);
        assert_eq!(p.max_checkpoints_per_vehicle, 256);
    }
}

mod rng {
    use crate::SimRng;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SimRng::new(99);
        let mut b = SimRng::new(99);
        for _ in 0..32 {
            assert_eq!(a.gen_range(0_u32..1000), b.gen_range(0_u32..1000));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        let seq_a: Vec<u32> = (0..16).map(|_| a.gen_range(0..u32::MAX)).collect();
        let seq_b: Vec<u32> = (0..16).map(|_| b.gen_range(0..u32::MAX)).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn choose_is_deterministic() {
        let items = [10, 20, 30, 40];
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        for _ in 0..8 {
            assert_eq!(a.choose(&items), b.choose(&items));
        }
        assert_eq!(SimRng::new(0).choose::<u32>(&[]), None);
    }
}
