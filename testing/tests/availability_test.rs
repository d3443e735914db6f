//! Weekly and admin listings.

#![allow(clippy::unwrap_used)]

use slotbook_core::{BookingError, CategoryFilter, SlotFilter, SlotStatus, Viewer};
use slotbook_testing::TestServices;
use slotbook_testing::fixtures::{WEEK_START, admin, alice, bob, date, viewer};

#[tokio::test]
async fn empty_week_still_has_seven_ascending_days() {
    let services = TestServices::new();

    let week = services
        .availability
        .week(date(WEEK_START), CategoryFilter::All, &Viewer::Anonymous)
        .await
        .unwrap();

    assert_eq!(week.len(), 7);
    assert_eq!(week[0].date, date(WEEK_START));
    assert_eq!(week[6].date, date("2024-06-16"));
    assert!(week.windows(2).all(|pair| pair[0].date < pair[1].date));
    assert!(week.iter().all(|day| day.slots.is_empty()));
}

#[tokio::test]
async fn slots_outside_the_window_are_excluded() {
    let services = TestServices::new();
    services.slots.seed("Yoga", "2024-06-09", "09:00", "10:00").unwrap();
    services.slots.seed("Yoga", "2024-06-16", "09:00", "10:00").unwrap();
    services.slots.seed("Yoga", "2024-06-17", "09:00", "10:00").unwrap();

    let week = services
        .availability
        .week(date(WEEK_START), CategoryFilter::All, &Viewer::Anonymous)
        .await
        .unwrap();

    let total: usize = week.iter().map(|day| day.slots.len()).sum();
    assert_eq!(total, 1);
    assert_eq!(week[6].slots.len(), 1);
}

#[tokio::test]
async fn slots_are_grouped_by_day_in_start_order() {
    let services = TestServices::new();
    let late = services.slots.seed("Yoga", "2024-06-11", "02:00 PM", "03:00 PM").unwrap();
    let early = services.slots.seed("Yoga", "2024-06-11", "08:00", "09:00").unwrap();

    let week = services
        .availability
        .week(date(WEEK_START), CategoryFilter::All, &Viewer::Anonymous)
        .await
        .unwrap();

    let tuesday: Vec<_> = week[1].slots.iter().map(|slot| slot.id).collect();
    assert_eq!(tuesday, vec![early.id, late.id]);
    assert_eq!(week[1].slots[1].time, "02:00 PM \u{2013} 03:00 PM");
}

#[tokio::test]
async fn category_filter_is_exact() {
    let services = TestServices::new();
    services.slots.seed("Yoga", "2024-06-10", "09:00", "10:00").unwrap();
    services.slots.seed("Pilates", "2024-06-10", "10:00", "11:00").unwrap();

    let week = services
        .availability
        .week(
            date(WEEK_START),
            CategoryFilter::from_param(Some("Pilates")),
            &Viewer::Anonymous,
        )
        .await
        .unwrap();

    assert_eq!(week[0].slots.len(), 1);
    assert_eq!(week[0].slots[0].category, "Pilates");
}

#[tokio::test]
async fn status_is_viewer_relative_after_claim() {
    let services = TestServices::new();
    let slot = services.slots.seed("Yoga", "2024-06-10", "09:00", "10:00").unwrap();
    services.booking.claim(slot.id, &alice()).await.unwrap();

    let status_for = |who: Viewer| {
        let availability = services.availability.clone();
        async move {
            availability
                .week(date(WEEK_START), CategoryFilter::All, &who)
                .await
                .unwrap()[0]
                .slots[0]
                .status
        }
    };

    assert_eq!(status_for(viewer(&alice())).await, SlotStatus::Mine);
    assert_eq!(status_for(viewer(&bob())).await, SlotStatus::Booked);
    assert_eq!(status_for(Viewer::Anonymous).await, SlotStatus::Booked);

    let admin_rows = services
        .availability
        .admin_list(&viewer(&admin()), &SlotFilter::default())
        .await
        .unwrap();
    assert_eq!(admin_rows[0].status, SlotStatus::Booked);
    assert_eq!(admin_rows[0].booked_by.as_deref(), Some("alice"));
}

#[tokio::test]
async fn admin_list_rejects_non_admins_before_querying() {
    let services = TestServices::new();
    // An outage would surface as Unavailable if the store were reached.
    services.slots.set_unavailable(true);

    let err = services
        .availability
        .admin_list(&viewer(&alice()), &SlotFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::PermissionDenied(_)));

    let err = services
        .availability
        .admin_list(&Viewer::Anonymous, &SlotFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Unauthenticated(_)));
}

#[tokio::test]
async fn admin_list_honours_open_ended_ranges() {
    let services = TestServices::new();
    for day in ["2024-01-01", "2024-06-10", "2025-03-01"] {
        services.slots.seed("Yoga", day, "09:00", "10:00").unwrap();
    }
    let admin = viewer(&admin());

    let from_june = SlotFilter::from_params(Some("2024-06-01"), None, None).unwrap();
    let rows = services.availability.admin_list(&admin, &from_june).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.windows(2).all(|pair| pair[0].date <= pair[1].date));

    let everything = services
        .availability
        .admin_list(&admin, &SlotFilter::default())
        .await
        .unwrap();
    assert_eq!(everything.len(), 3);
    assert!(everything.iter().all(|row| row.status == SlotStatus::Available));
}
