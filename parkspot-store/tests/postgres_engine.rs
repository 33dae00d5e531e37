//! Runs against a live Postgres when `DATABASE_URL` is set; otherwise every
//! test returns immediately.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use parkspot_core::memory::sample_spot;
use parkspot_core::{DomainError, Pagination, SellerFilter};
use parkspot_shared::pii::Masked;
use parkspot_shared::{Car, CarEntry, Listing, ListingEntry, TimeRange, TimeSlot};
use parkspot_store::{DbClient, Engine};
use rust_decimal_macros::dec;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn engine() -> Option<Engine> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    let db = DbClient::from_pool(pool);
    db.migrate().await.expect("migrations apply");
    Some(Engine::new(db.pool, Pagination::default()))
}

/// Fresh user id per test run, so runs against the same database don't collide.
fn user() -> i64 {
    ((Uuid::new_v4().as_u128() >> 65) as i64).max(1)
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    day().and_hms_opt(hour, minute, 0).unwrap()
}

async fn published_listing(engine: &Engine, seller: i64) -> ListingEntry {
    let spot = engine.spots.create(seller, &sample_spot(dec!(4.00))).await.unwrap();
    let listing = engine
        .listings
        .create(seller, spot.uuid, &Listing { price_per_hour: dec!(4.00), active: true })
        .await
        .unwrap();
    engine
        .availability
        .create(seller, listing.uuid, &[TimeSlot::new(day(), (16..24).collect())])
        .await
        .unwrap();
    listing
}

async fn car(engine: &Engine, owner: i64) -> CarEntry {
    let car = Car { licence_plate: Masked("PK-1234".to_string()), make: Some("Skoda".into()), model: None };
    engine.cars.create_car(owner, &car).await.unwrap()
}

#[tokio::test]
async fn test_booking_lifecycle() {
    let Some(engine) = engine().await else { return };
    let (seller, buyer) = (user(), user());
    let listing = published_listing(&engine, seller).await;
    let car = car(&engine, buyer).await;

    let booking = engine
        .bookings
        .create(buyer, listing.uuid, car.uuid, &[TimeRange::new(at(9, 0), at(10, 0))])
        .await
        .unwrap();
    assert_eq!(booking.paid_amount, dec!(4.00));
    assert_eq!(booking.booked_times, vec![TimeSlot::new(day(), vec![18, 19])]);

    let unbooked = engine.availability.get_unbooked(seller, listing.uuid).await.unwrap();
    assert_eq!(unbooked, vec![TimeSlot::new(day(), vec![16, 17, 20, 21, 22, 23])]);

    let err = engine
        .bookings
        .create(buyer, listing.uuid, car.uuid, &[TimeRange::new(at(9, 30), at(10, 30))])
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::AlreadyBooked);
    let unbooked = engine.availability.get_unbooked(seller, listing.uuid).await.unwrap();
    assert_eq!(unbooked[0].unit_count(), 6);

    let fetched = engine.bookings.get_by_uuid(seller, booking.uuid).await.unwrap();
    assert_eq!(fetched.booked_times, booking.booked_times);
    assert_eq!(fetched.listing_uuid, listing.uuid);
    assert_eq!(
        engine.bookings.get_by_uuid(user(), booking.uuid).await.unwrap_err(),
        DomainError::NotFound
    );

    let page = engine
        .bookings
        .get_many_for_seller(seller, 10, None, SellerFilter { listing_uuid: Some(listing.uuid) })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert!(page.next_cursor.is_none());

    let err = engine.listings.delete(seller, listing.uuid).await.unwrap_err();
    assert!(matches!(err, DomainError::InUse(_)));
}

#[tokio::test]
async fn test_availability_rejects_duplicates_atomically() {
    let Some(engine) = engine().await else { return };
    let seller = user();
    let listing = published_listing(&engine, seller).await;

    let err = engine
        .availability
        .create(seller, listing.uuid, &[TimeSlot::new(day(), vec![10, 16])])
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::DuplicatedTimeUnit);

    let all = engine.availability.get(seller, listing.uuid).await.unwrap();
    assert_eq!(all, vec![TimeSlot::new(day(), (16..24).collect())]);

    engine
        .availability
        .delete(seller, listing.uuid, &[TimeSlot::new(day(), vec![16, 17])])
        .await
        .unwrap();
    let err = engine
        .availability
        .delete(seller, listing.uuid, &[TimeSlot::new(day(), vec![16, 17])])
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);
}

#[tokio::test]
async fn test_delete_on_fully_booked_listing_changes_nothing() {
    let Some(engine) = engine().await else { return };
    let (seller, buyer) = (user(), user());
    let listing = published_listing(&engine, seller).await;
    let car = car(&engine, buyer).await;
    engine
        .bookings
        .create(buyer, listing.uuid, car.uuid, &[TimeRange::new(at(8, 0), at(12, 0))])
        .await
        .unwrap();
    assert!(engine.availability.get_unbooked(seller, listing.uuid).await.unwrap().is_empty());

    let err = engine
        .availability
        .delete(seller, listing.uuid, &[TimeSlot::new(day(), (16..24).collect())])
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);

    let all = engine.availability.get(seller, listing.uuid).await.unwrap();
    assert_eq!(all, vec![TimeSlot::new(day(), (16..24).collect())]);
}

#[tokio::test]
async fn test_stranger_booking_lookup_matches_missing() {
    let Some(engine) = engine().await else { return };
    let (seller, buyer, stranger) = (user(), user(), user());
    let listing = published_listing(&engine, seller).await;
    let car = car(&engine, buyer).await;
    let booking = engine
        .bookings
        .create(buyer, listing.uuid, car.uuid, &[TimeRange::new(at(11, 0), at(11, 30))])
        .await
        .unwrap();

    let hidden = engine.bookings.get_by_uuid(stranger, booking.uuid).await.unwrap_err();
    let missing = engine.bookings.get_by_uuid(stranger, Uuid::new_v4()).await.unwrap_err();
    assert_eq!(hidden, DomainError::NotFound);
    assert_eq!(hidden, missing);
    assert_eq!(
        engine.bookings.get_booked_times_by_uuid(stranger, booking.uuid).await.unwrap_err(),
        DomainError::NotFound
    );

    let times = engine.bookings.get_booked_times_by_uuid(buyer, booking.uuid).await.unwrap();
    assert_eq!(times, vec![TimeSlot::new(day(), vec![22])]);
}

#[tokio::test]
async fn test_preferred_spot_hidden_after_deactivation() {
    let Some(engine) = engine().await else { return };
    let (seller, fan) = (user(), user());
    let listing = published_listing(&engine, seller).await;
    engine.preferences.create(fan, listing.spot_uuid).await.unwrap();

    engine.listings.set_active(seller, listing.uuid, false).await.unwrap();

    assert_eq!(engine.spots.get(fan, listing.spot_uuid).await.unwrap_err(), DomainError::NotFound);
    assert!(engine.preferences.get_many(fan, 10, None).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn test_preferences_and_spot_pages() {
    let Some(engine) = engine().await else { return };
    let (seller, fan) = (user(), user());
    for _ in 0..3 {
        published_listing(&engine, seller).await;
    }

    let first = engine.spots.get_many(seller, 2, None).await.unwrap();
    assert_eq!(first.items.len(), 2);
    let cursor = first.next_cursor.clone().unwrap();
    let second = engine.spots.get_many(seller, 2, Some(&cursor)).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(second.next_cursor.is_none());

    let spot = &first.items[0];
    engine.preferences.create(fan, spot.uuid).await.unwrap();
    assert!(engine.preferences.exists(fan, spot.uuid).await.unwrap());
    assert_eq!(
        engine.preferences.create(fan, spot.uuid).await.unwrap_err(),
        DomainError::DuplicatedPreference
    );

    let preferred = engine.preferences.get_many(fan, 10, None).await.unwrap();
    assert_eq!(preferred.items.len(), 1);
    assert_eq!(preferred.items[0].uuid, spot.uuid);

    engine.preferences.delete(fan, spot.uuid).await.unwrap();
    engine.preferences.delete(fan, spot.uuid).await.unwrap();
    assert!(!engine.preferences.exists(fan, spot.uuid).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_claims() {
    let Some(engine) = engine().await else { return };
    let engine = Arc::new(engine);
    let seller = user();
    let listing = published_listing(&engine, seller).await;

    let listing_uuid = listing.uuid;
    let mut handles = Vec::new();
    for i in 0..8 {
        let buyer = user();
        let car = car(&engine, buyer).await;
        let engine = engine.clone();
        let start = if i % 2 == 0 { at(8, 0) } else { at(9, 0) };
        handles.push(tokio::spawn(async move {
            engine
                .bookings
                .create(buyer, listing_uuid, car.uuid, &[TimeRange::new(start, at(10, 0))])
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert_eq!(e, DomainError::AlreadyBooked),
        }
    }
    assert_eq!(winners, 1);
}
