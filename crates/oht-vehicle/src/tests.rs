//! Unit tests for oht-vehicle.

mod path_buffer {
    use crate::PathBuffer;
    use oht_core::EdgeId;

    fn ids(raw: &[u32]) -> Vec<EdgeId> {
        raw.iter().copied().map(EdgeId).collect()
    }

    #[test]
    fn assign_and_read_back() {
        let mut p = PathBuffer::new(8);
        p.assign(&ids(&[3, 4, 5]));
        assert_eq!(p.len(), 3);
        assert_eq!(p.first(), EdgeId(3));
        assert_eq!(p.last(), EdgeId(5));
        assert_eq!(p.as_slice(), ids(&[3, 4, 5]).as_slice());
    }

    #[test]
    fn shift_left_consumes_front() {
        let mut p = PathBuffer::new(8);
        p.assign(&ids(&[3, 4, 5]));
        assert_eq!(p.shift_left(), EdgeId(3));
        assert_eq!(p.first(), EdgeId(4));
        assert_eq!(p.len(), 2);
        p.shift_left();
        p.shift_left();
        assert!(p.is_empty());
        // Shifting an empty buffer is a no-op.
        assert_eq!(p.shift_left(), EdgeId::NONE);
    }

    #[test]
    fn assign_truncates_at_capacity() {
        let mut p = PathBuffer::new(2);
        p.assign(&ids(&[1, 2, 3, 4]));
        assert_eq!(p.len(), 2);
        assert_eq!(p.as_slice(), ids(&[1, 2]).as_slice());
    }

    #[test]
    fn push_respects_capacity() {
        let mut p = PathBuffer::new(2);
        assert!(p.push(EdgeId(1)));
        assert!(p.push(EdgeId(2)));
        assert!(!p.push(EdgeId(3)));
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn reassign_shorter_clears_stale_tail() {
        let mut p = PathBuffer::new(8);
        p.assign(&ids(&[1, 2, 3, 4]));
        p.assign(&ids(&[9]));
        assert_eq!(p.len(), 1);
        assert!(!p.contains(EdgeId(4)));
    }

    #[test]
    fn position_of_first_occurrence() {
        let mut p = PathBuffer::new(8);
        p.assign(&ids(&[7, 8, 7]));
        assert_eq!(p.position_of(EdgeId(7)), Some(0));
        assert_eq!(p.position_of(EdgeId(8)), Some(1));
        assert_eq!(p.position_of(EdgeId(9)), None);
    }
}

mod store {
    use crate::{MovingStatus, NextEdgeState, VehicleStore, LOOKAHEAD_SLOTS};
    use oht_core::{Checkpoint, CheckpointFlags, EdgeId, VehicleId};

    #[test]
    fn columns_are_sized_to_count() {
        let s = VehicleStore::new(4, 16);
        assert_eq!(s.count, 4);
        assert_eq!(s.velocity.len(), 4);
        assert_eq!(s.path.len(), 4);
        assert_eq!(s.path[0].capacity(), 16);
        assert!(s.contains(VehicleId(3)));
        assert!(!s.contains(VehicleId(4)));
    }

    #[test]
    fn vehicle_ids_ascend() {
        let s = VehicleStore::new(3, 4);
        let ids: Vec<u32> = s.vehicle_ids().map(|v| v.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn place_sets_position_and_stops() {
        let mut s = VehicleStore::new(2, 4);
        s.velocity[1] = 3.0;
        s.place(VehicleId(1), EdgeId(5), 0.25);
        assert_eq!(s.current_edge[1], EdgeId(5));
        assert_eq!(s.edge_ratio[1], 0.25);
        assert_eq!(s.velocity[1], 0.0);
        assert_eq!(s.moving_status[1], MovingStatus::Stopped);
    }

    #[test]
    fn clear_route_wipes_route_but_not_position() {
        let mut s = VehicleStore::new(1, 4);
        s.place(VehicleId(0), EdgeId(2), 0.5);
        s.path[0].assign(&[EdgeId(3), EdgeId(4)]);
        s.next_edges[0][0] = EdgeId(3);
        s.next_edge_state[0] = NextEdgeState::Ready;
        s.checkpoints[0].push(Checkpoint {
            edge: EdgeId(2),
            ratio: 0.9,
            flags: CheckpointFlags::MOVE_PREPARE,
            target: EdgeId(3),
        });
        s.cp_head[0] = 1;
        s.destination_edge[0] = EdgeId(4);

        s.clear_route(VehicleId(0));

        assert!(s.path[0].is_empty());
        assert_eq!(s.next_edges[0], [EdgeId::NONE; LOOKAHEAD_SLOTS]);
        assert_eq!(s.next_edge_state[0], NextEdgeState::Empty);
        assert!(s.checkpoints[0].is_empty());
        assert_eq!(s.cp_head[0], 0);
        assert!(s.current_cp[0].is_none());
        assert_eq!(s.destination_edge[0], EdgeId::NONE);
        // Position survives.
        assert_eq!(s.current_edge[0], EdgeId(2));
        assert_eq!(s.edge_ratio[0], 0.5);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut s = VehicleStore::new(2, 4);
        s.place(VehicleId(0), EdgeId(1), 0.7);
        s.velocity[0] = 2.0;
        s.reset();
        assert_eq!(s.current_edge[0], EdgeId::NONE);
        assert_eq!(s.velocity[0], 0.0);
        assert_eq!(s.edge_ratio[0], 0.0);
    }
}
