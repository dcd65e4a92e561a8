//! ArenaClient scenario tests

#[cfg(test)]
mod tests {
    use petal_arena::{
        input::{InputEvent, SlotRef},
        protocol::SnapshotRecord,
        ActionError, ArenaClient, ArenaEvent, ClientConfig, ClientMessage, ContainerId, DrawList,
        MemoryConnection,
    };
    use serde_json::{json, Value};
    use tokio_test::{assert_err, assert_ok};

    const DT: f32 = 1.0 / 60.0;

    fn snapshot(v: Value) -> ArenaEvent {
        let rec: SnapshotRecord = serde_json::from_value(v).unwrap();
        ArenaEvent::Snapshot(rec)
    }

    /// Client that has connected, been welcomed as "me" and received `world`.
    fn client_with(world: Value) -> ArenaClient<MemoryConnection> {
        let mut client = ArenaClient::new(ClientConfig::default(), MemoryConnection::new());
        let conn = client.connection_mut();
        conn.deliver(ArenaEvent::Connected);
        conn.deliver(ArenaEvent::Welcome {
            player_id: "me".into(),
        });
        conn.deliver(snapshot(world));
        client.pump();
        client.connection_mut().clear_sent();
        client
    }

    fn update_messages(client: &ArenaClient<MemoryConnection>) -> usize {
        client
            .connection()
            .sent()
            .iter()
            .filter(|m| matches!(m, ClientMessage::UpdateInventory { .. }))
            .count()
    }

    // -----------------------------------------------------------------------
    // Pickup
    // -----------------------------------------------------------------------

    #[test]
    fn three_pickups_fill_lowest_inventory_slots() {
        let mut client = client_with(json!({
            "seq": 1,
            "players": [{"id": "me", "x": 0.0, "y": 0.0}],
            "groundItems": [
                {"id": "g1", "x": 5.0, "y": 0.0, "petal": {"id": "p1", "type": "rock"}},
                {"id": "g2", "x": 0.0, "y": 10.0, "petal": {"id": "p2"}},
                {"id": "g3", "x": -20.0, "y": 0.0, "petal": {"id": "p3", "type": "fire"}}
            ]
        }));

        let report = client.tick(DT, &mut DrawList::new());

        assert_eq!(report.picked_up, vec!["g1", "g2", "g3"]);
        let store = client.equipment();
        for slot in 0..3 {
            assert!(store.get(ContainerId::Inventory, slot).is_some());
        }
        assert!(store.get(ContainerId::Inventory, 3).is_none());
        assert!(store.hotbar().iter().all(Option::is_none));
        assert_eq!(client.world().ground_item_count(), 0);
        assert_eq!(update_messages(&client), 1);
    }

    #[test]
    fn pickup_outside_radius_is_ignored() {
        let mut client = client_with(json!({
            "players": [{"id": "me"}],
            "groundItems": [{"id": "far", "x": 31.0, "y": 0.0}]
        }));
        let report = client.tick(DT, &mut DrawList::new());
        assert!(report.picked_up.is_empty());
        assert_eq!(client.world().ground_item_count(), 1);
        assert_eq!(update_messages(&client), 0);
    }

    #[test]
    fn full_inventory_leaves_ground_item_untouched() {
        let inventory: Vec<Value> = (0..10).map(|i| json!({"id": format!("i{i}")})).collect();
        let mut client = client_with(json!({
            "players": [{"id": "me", "inventory": inventory}],
            "groundItems": [{"id": "g", "x": 1.0, "y": 1.0}]
        }));
        let before = client.equipment().clone();

        let report = client.tick(DT, &mut DrawList::new());

        assert!(report.picked_up.is_empty());
        assert!(client.world().ground_items().contains_key("g"));
        assert_eq!(client.equipment().hotbar(), before.hotbar());
        assert_eq!(client.equipment().inventory(), before.inventory());
        assert_eq!(update_messages(&client), 0);
    }

    // -----------------------------------------------------------------------
    // Combine
    // -----------------------------------------------------------------------

    #[test]
    fn combine_with_two_selected_is_rejected_locally() {
        let mut client = client_with(json!({"players": [{"id": "me"}]}));
        client.handle_input(InputEvent::Select(SlotRef::inventory(0))).unwrap();
        client.handle_input(InputEvent::Select(SlotRef::inventory(1))).unwrap();

        let err = assert_err!(client.handle_input(InputEvent::Combine));
        assert!(matches!(err, ActionError::CombineSelection { selected: 2 }));
        assert!(client.connection().sent().is_empty());
        assert_eq!(client.interaction().selected_inventory().len(), 2);
    }

    #[test]
    fn combine_with_three_selected_sends_indices_and_clears_selection() {
        let mut client = client_with(json!({"players": [{"id": "me"}]}));
        for slot in [4, 0, 7] {
            client.queue_input(InputEvent::Select(SlotRef::inventory(slot)));
        }
        client.queue_input(InputEvent::Combine);
        client.process_inputs();

        assert_eq!(
            client.connection().sent(),
            &[ClientMessage::CombinePetals { indices: [0, 4, 7] }]
        );
        assert!(client.interaction().selected_inventory().is_empty());
        assert!(client.notice().is_none());
    }

    // -----------------------------------------------------------------------
    // Drag / drop
    // -----------------------------------------------------------------------

    #[test]
    fn drag_inventory_to_empty_hotbar_slot_sends_one_update() {
        let mut client = client_with(json!({
            "players": [{"id": "me", "inventory": [null, null, {"id": "x", "type": "ice", "tier": 2}]}]
        }));

        assert_ok!(client.handle_input(InputEvent::DragStart(SlotRef::inventory(2))));
        assert_ok!(client.handle_input(InputEvent::Drop(SlotRef::hotbar(1))));

        let store = client.equipment();
        assert!(store.get(ContainerId::Inventory, 2).is_none());
        assert_eq!(store.get(ContainerId::Hotbar, 1).unwrap().id, "x");
        assert_eq!(store.item_count(), 1);
        assert_eq!(client.connection().sent_actions().len(), 1);
        assert_eq!(update_messages(&client), 1);
        assert!(!store.is_dirty());
    }

    #[test]
    fn drop_on_occupied_slot_changes_nothing_and_sends_nothing() {
        let mut client = client_with(json!({
            "players": [{"id": "me", "hotbar": [{"id": "h"}], "inventory": [{"id": "i"}]}]
        }));
        let before = client.equipment().clone();

        client.queue_input(InputEvent::DragStart(SlotRef::inventory(0)));
        client.queue_input(InputEvent::Drop(SlotRef::hotbar(0)));
        client.process_inputs();

        assert_eq!(client.equipment().hotbar(), before.hotbar());
        assert_eq!(client.equipment().inventory(), before.inventory());
        assert!(client.connection().sent().is_empty());
        assert!(client.notice().unwrap().contains("occupied"));
    }

    #[test]
    fn same_container_drop_is_ignored() {
        let mut client = client_with(json!({
            "players": [{"id": "me", "inventory": [{"id": "i"}]}]
        }));
        client.handle_input(InputEvent::DragStart(SlotRef::inventory(0))).unwrap();
        client.handle_input(InputEvent::Drop(SlotRef::inventory(4))).unwrap();
        assert_eq!(client.equipment().get(ContainerId::Inventory, 0).unwrap().id, "i");
        assert!(client.connection().sent().is_empty());
    }

    // -----------------------------------------------------------------------
    // Snapshot ordering
    // -----------------------------------------------------------------------

    #[test]
    fn older_snapshot_is_discarded() {
        let mut client = client_with(json!({
            "seq": 7,
            "players": [{"id": "me", "x": 70.0, "inventory": [{"id": "seven"}]}]
        }));

        client.connection_mut().deliver(snapshot(json!({
            "seq": 5,
            "players": [{"id": "me", "x": 50.0, "inventory": [{"id": "five"}]}],
            "enemies": [{"id": "e"}]
        })));
        client.pump();

        assert_eq!(client.world().seq(), 7);
        assert_eq!(client.world().player("me").unwrap().position.x, 70.0);
        assert_eq!(client.world().hostile_count(), 0);
        assert_eq!(
            client.equipment().get(ContainerId::Inventory, 0).unwrap().id,
            "seven"
        );
        assert_eq!(client.stats().snapshots_discarded, 1);
        assert_eq!(client.stats().last_seq, Some(7));
    }

    #[test]
    fn server_wins_over_local_edit() {
        let mut client = client_with(json!({
            "seq": 1,
            "players": [{"id": "me", "inventory": [{"id": "a"}]}]
        }));
        client.handle_input(InputEvent::DragStart(SlotRef::inventory(0))).unwrap();
        client.handle_input(InputEvent::Drop(SlotRef::hotbar(0))).unwrap();
        assert!(client.equipment().get(ContainerId::Hotbar, 0).is_some());

        client.connection_mut().deliver(snapshot(json!({
            "seq": 2,
            "players": [{"id": "me", "inventory": [null, {"id": "a"}]}]
        })));
        client.pump();

        assert!(client.equipment().get(ContainerId::Hotbar, 0).is_none());
        assert_eq!(client.equipment().get(ContainerId::Inventory, 1).unwrap().id, "a");
    }

    // -----------------------------------------------------------------------
    // Degraded ticks
    // -----------------------------------------------------------------------

    #[test]
    fn missing_local_player_keeps_ticking_without_movement_or_pickup() {
        let mut client = client_with(json!({
            "players": [{"id": "someone-else"}],
            "groundItems": [{"id": "g", "x": 0.0, "y": 0.0}]
        }));
        let mut dl = DrawList::new();

        for frame in 1..=5 {
            let report = client.frame(DT, &mut dl);
            assert_eq!(report.frame, frame);
            assert!(!report.local_player_present);
            assert!(!report.movement_sent);
            assert!(report.picked_up.is_empty());
        }

        assert!(client.connection().sent().is_empty());
        assert_eq!(client.world().ground_item_count(), 1);
        assert!(!dl.is_empty());
        assert!(client.hud_line().is_none());
    }

    #[test]
    fn disconnected_client_keeps_drawing_frozen_world() {
        let mut client = client_with(json!({
            "players": [{"id": "me"}],
            "enemies": [{"id": "e", "x": 10.0}]
        }));
        client.connection_mut().close("server restart");

        let mut dl = DrawList::new();
        let report = client.frame(DT, &mut dl);

        assert!(report.local_player_present);
        assert!(!report.movement_sent);
        assert!(!dl.is_empty());
        assert_eq!(client.world().hostile_count(), 1);
        assert!(client.connection().sent().is_empty());
    }
}
