use std::sync::Arc;

use anyhow::Result;
use roombook::error::BookingError;
use roombook::models::Room;
use roombook::notify::NotifyHub;
use roombook::rooms::{room_statuses_now, sort_rooms, RoomDraft, RoomStore};

mod common;
use common::{d, dt, setup_memory_db, t, BookingBuilder, RoomBuilder};

async fn store() -> Result<RoomStore> {
    let db = setup_memory_db().await?;
    Ok(RoomStore::new(db, Arc::new(NotifyHub::new())))
}

fn named(names: &[&str]) -> Vec<Room> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Room {
            id: i as i64 + 1,
            name: name.to_string(),
            capacity: None,
            borrowable_items: None,
            dynamic_labels: None,
            is_available: true,
            is_open: true,
            created_at: dt(2024, 1, 1, 0, 0),
            updated_at: dt(2024, 1, 1, 0, 0),
        })
        .collect()
}

#[test]
fn test_numeric_then_alphabetic_room_order() {
    let sorted = sort_rooms(named(&["Studio B", "Room 10", "Annex", "room 1", "Room 2"]));
    let names: Vec<&str> = sorted.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["room 1", "Room 2", "Room 10", "Annex", "Studio B"]);
}

#[test]
fn test_room_prefix_without_number_sorts_alphabetically() {
    let sorted = sort_rooms(named(&["Room B", "Room 2", "Roomba"]));
    let names: Vec<&str> = sorted.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Room 2", "Room B", "Roomba"]);
}

#[tokio::test]
async fn test_available_filters_and_orders() -> Result<()> {
    let db = setup_memory_db().await?;
    let rooms = RoomStore::new(db.clone(), Arc::new(NotifyHub::new()));
    rooms
        .create(&RoomDraft {
            name: "Room 2".into(),
            capacity: Some(6),
            is_available: true,
            is_open: true,
            ..Default::default()
        })
        .await?;
    rooms
        .create(&RoomDraft {
            name: "Room 1".into(),
            capacity: Some(4),
            is_available: true,
            is_open: true,
            ..Default::default()
        })
        .await?;
    RoomBuilder::new("Storage").unavailable().build(&db).await?;

    let available = rooms.available().await?;
    let names: Vec<&str> = available.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Room 1", "Room 2"]);

    assert_eq!(rooms.all().await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_room_crud_and_labels() -> Result<()> {
    let rooms = store().await?;
    let created = rooms
        .create(&RoomDraft {
            name: "Room 1".into(),
            capacity: Some(8),
            borrowable_items: vec!["HDMI cable".into(), "Projector".into()],
            dynamic_labels: vec!["needs cleaning".into()],
            is_available: true,
            is_open: true,
        })
        .await?;
    assert_eq!(
        created.borrowable_item_list(),
        vec!["HDMI cable".to_string(), "Projector".to_string()]
    );
    assert_eq!(created.dynamic_label_list(), vec!["needs cleaning".to_string()]);

    let updated = rooms
        .update(
            created.id,
            &RoomDraft {
                name: "Room 1".into(),
                capacity: Some(10),
                is_available: false,
                is_open: true,
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.capacity, Some(10));
    assert!(!updated.is_available);
    assert!(updated.borrowable_item_list().is_empty());

    rooms.delete(created.id).await?;
    assert!(matches!(
        rooms.get(created.id).await,
        Err(BookingError::NotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn test_blank_room_name_is_rejected() -> Result<()> {
    let rooms = store().await?;
    let err = rooms
        .create(&RoomDraft {
            name: "   ".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn test_room_statuses_at_now() -> Result<()> {
    let db = setup_memory_db().await?;
    let now = dt(2024, 3, 4, 9, 20);
    let day = d(2024, 3, 4);

    let busy = RoomBuilder::new("Room 1")
        .with_borrowable_items(&["Projector"])
        .build(&db)
        .await?;
    assert_eq!(busy.borrowable_item_list(), vec!["Projector".to_string()]);
    let overdue = RoomBuilder::new("Room 2").build(&db).await?;
    let late = RoomBuilder::new("Room 3").build(&db).await?;
    let free = RoomBuilder::new("Room 4").build(&db).await?;

    let mut bookings = Vec::new();
    bookings.push(
        BookingBuilder::new(busy.id, day, t(9, 0), t(10, 0))
            .with_status("Active")
            .build(&db)
            .await?,
    );
    bookings.push(
        BookingBuilder::new(overdue.id, day, t(8, 0), t(9, 0))
            .with_status("Overdue")
            .build(&db)
            .await?,
    );
    // reserved for 09:00 and nobody showed up: twenty minutes late
    bookings.push(
        BookingBuilder::new(late.id, day, t(9, 0), t(10, 0))
            .with_status("Reserved")
            .build(&db)
            .await?,
    );

    let statuses = room_statuses_now(vec![busy, overdue, late, free], &bookings, now);

    assert!(statuses[0].busy);
    assert!(!statuses[0].selectable());

    assert!(statuses[1].overdue);
    assert!(statuses[1].selectable());

    assert_eq!(statuses[2].reserved_late_minutes, Some(20));
    assert!(statuses[2].selectable());

    assert!(!statuses[3].busy);
    assert!(statuses[3].selectable());
    Ok(())
}
