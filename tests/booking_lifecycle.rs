mod common;

use std::collections::HashSet;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use marquee_server::models::{BookingStatus, PaymentMethod, PaymentStatus, ShowtimeStatus};
use marquee_server::services::NewBooking;
use marquee_server::store::CinemaStore;
use marquee_server::utils::error::AppError;

use common::{booking_env, make_showtime, make_user};

fn seats(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

fn new_booking(env: &common::TestEnv, seat_labels: &[&str], paid: bool) -> NewBooking {
    NewBooking {
        user_id: env.user.id,
        showtime_id: env.showtime.id,
        seats: seats(seat_labels),
        payment_method: PaymentMethod::CreditCard,
        payment_ref: paid.then(|| "pi_12345".to_string()),
    }
}

fn seat_set(labels: &[String]) -> HashSet<String> {
    labels.iter().cloned().collect()
}

#[tokio::test]
async fn confirmed_booking_moves_seats_and_prices_premium() {
    let env = booking_env().await;

    let booking = env
        .bookings
        .create_booking(new_booking(&env, &["A1", "A2"], true))
        .await
        .unwrap();

    assert_eq!(booking.booking_status, BookingStatus::Confirmed);
    assert_eq!(booking.payment_status, PaymentStatus::Completed);
    assert_eq!(booking.number_of_tickets, 2);
    // A1 is premium: round(200 * 1.3) + 200
    assert_eq!(booking.total_amount, Decimal::from(460));
    assert!(booking.booking_reference.starts_with("BK"));

    let showtime = env.store.get_showtime(env.showtime.id).await.unwrap().unwrap();
    assert_eq!(seat_set(&showtime.booked_seats), seat_set(&seats(&["A1", "A2"])));
    assert!(!showtime.available_seats.contains(&"A1".to_string()));
    assert_eq!(showtime.available_seats.len(), 98);
    let overlap: Vec<_> = showtime
        .available_seats
        .iter()
        .filter(|s| showtime.booked_seats.contains(s))
        .collect();
    assert!(overlap.is_empty(), "seat partition must stay disjoint");

    assert_eq!(env.notifier.confirmed_count(), 1);
    assert_eq!(env.reminders.jobs_info().len(), 1);
}

#[tokio::test]
async fn unpaid_booking_stays_pending_without_side_effects() {
    let env = booking_env().await;

    let booking = env
        .bookings
        .create_booking(new_booking(&env, &["C4"], false))
        .await
        .unwrap();

    assert_eq!(booking.booking_status, BookingStatus::Pending);
    assert_eq!(booking.payment_status, PaymentStatus::Pending);
    assert_eq!(env.notifier.confirmed_count(), 0);
    assert!(env.reminders.jobs_info().is_empty());
}

#[tokio::test]
async fn taken_seats_are_reported_exactly() {
    let env = booking_env().await;
    env.bookings
        .create_booking(new_booking(&env, &["A1"], true))
        .await
        .unwrap();

    let other = make_user("Bob");
    env.store.insert_user(&other).await.unwrap();

    let err = env
        .bookings
        .create_booking(NewBooking {
            user_id: other.id,
            showtime_id: env.showtime.id,
            seats: seats(&["A1", "B1"]),
            payment_method: PaymentMethod::Upi,
            payment_ref: None,
        })
        .await
        .unwrap_err();

    match err {
        AppError::SeatsUnavailable(unavailable) => {
            assert_eq!(unavailable, seats(&["A1"]));
        }
        other => panic!("expected SeatsUnavailable, got {other:?}"),
    }

    // The losing request must not have touched B1
    let showtime = env.store.get_showtime(env.showtime.id).await.unwrap().unwrap();
    assert!(showtime.available_seats.contains(&"B1".to_string()));
}

#[tokio::test]
async fn empty_or_duplicate_seat_selections_are_rejected() {
    let env = booking_env().await;

    let err = env
        .bookings
        .create_booking(new_booking(&env, &[], true))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = env
        .bookings
        .create_booking(new_booking(&env, &["A2", "A2"], true))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn dangling_movie_reference_is_not_bookable() {
    let env = booking_env().await;
    let orphan = make_showtime(
        Uuid::new_v4(),
        env.theater.id,
        env.screen.id,
        Duration::hours(24),
        vec![],
    );
    env.store.insert_showtime(&orphan).await.unwrap();

    let err = env
        .bookings
        .create_booking(NewBooking {
            user_id: env.user.id,
            showtime_id: orphan.id,
            seats: seats(&["A1"]),
            payment_method: PaymentMethod::Wallet,
            payment_ref: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DataIntegrity(_)));
}

#[tokio::test]
async fn contended_seat_has_exactly_one_winner() {
    let env = booking_env().await;
    let other = make_user("Bob");
    env.store.insert_user(&other).await.unwrap();

    let first = env.bookings.create_booking(NewBooking {
        user_id: env.user.id,
        showtime_id: env.showtime.id,
        seats: seats(&["A5", "A6"]),
        payment_method: PaymentMethod::CreditCard,
        payment_ref: Some("pi_one".to_string()),
    });
    let second = env.bookings.create_booking(NewBooking {
        user_id: other.id,
        showtime_id: env.showtime.id,
        seats: seats(&["A5"]),
        payment_method: PaymentMethod::DebitCard,
        payment_ref: Some("pi_two".to_string()),
    });

    let (first, second) = tokio::join!(first, second);
    let outcomes = [first, second];

    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one contended booking may win");
    let loser = outcomes.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser.as_ref().unwrap_err(),
        AppError::SeatsUnavailable(_)
    ));

    // A5 is booked exactly once and the partition stayed disjoint
    let showtime = env.store.get_showtime(env.showtime.id).await.unwrap().unwrap();
    assert_eq!(
        showtime.booked_seats.iter().filter(|s| *s == "A5").count(),
        1
    );
    assert!(!showtime.available_seats.contains(&"A5".to_string()));
}

#[tokio::test]
async fn cancellation_round_trips_the_seat_set() {
    let env = booking_env().await;
    let other = make_user("Bob");
    env.store.insert_user(&other).await.unwrap();

    let before = env.store.get_showtime(env.showtime.id).await.unwrap().unwrap();

    let booking = env
        .bookings
        .create_booking(new_booking(&env, &["D4", "D5"], true))
        .await
        .unwrap();

    // Unrelated booking on disjoint seats stays untouched throughout
    env.bookings
        .create_booking(NewBooking {
            user_id: other.id,
            showtime_id: env.showtime.id,
            seats: seats(&["E1"]),
            payment_method: PaymentMethod::Upi,
            payment_ref: Some("pi_other".to_string()),
        })
        .await
        .unwrap();

    let cancelled = env
        .bookings
        .cancel_booking(booking.id, env.user.id, None)
        .await
        .unwrap();

    assert_eq!(cancelled.booking_status, BookingStatus::Cancelled);
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some("User requested cancellation")
    );
    assert!(cancelled.cancellation_date.is_some());
    assert_eq!(env.notifier.cancelled_count(), 1);

    let after = env.store.get_showtime(env.showtime.id).await.unwrap().unwrap();
    let expected: HashSet<String> = seat_set(&before.available_seats)
        .difference(&seat_set(&seats(&["E1"])))
        .cloned()
        .collect();
    assert_eq!(seat_set(&after.available_seats), expected);
    assert_eq!(seat_set(&after.booked_seats), seat_set(&seats(&["E1"])));
}

#[tokio::test]
async fn only_the_owner_may_cancel() {
    let env = booking_env().await;
    let other = make_user("Mallory");
    env.store.insert_user(&other).await.unwrap();

    let booking = env
        .bookings
        .create_booking(new_booking(&env, &["F1"], true))
        .await
        .unwrap();

    let err = env
        .bookings
        .cancel_booking(booking.id, other.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let stored = env.store.get_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.booking_status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn second_cancellation_fails_and_changes_nothing() {
    let env = booking_env().await;

    let booking = env
        .bookings
        .create_booking(new_booking(&env, &["G1", "G2"], true))
        .await
        .unwrap();
    env.bookings
        .cancel_booking(booking.id, env.user.id, Some("change of plans".to_string()))
        .await
        .unwrap();

    let snapshot = env.store.get_showtime(env.showtime.id).await.unwrap().unwrap();

    let err = env
        .bookings
        .cancel_booking(booking.id, env.user.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyCancelled(_)));

    let unchanged = env.store.get_showtime(env.showtime.id).await.unwrap().unwrap();
    assert_eq!(seat_set(&unchanged.available_seats), seat_set(&snapshot.available_seats));
    assert_eq!(seat_set(&unchanged.booked_seats), seat_set(&snapshot.booked_seats));
    assert_eq!(unchanged.version, snapshot.version);
}

#[tokio::test]
async fn showtime_fills_and_reopens_with_availability() {
    let env = booking_env().await;

    // Take everything except A1, then A1: the showtime goes full
    let all_but_one: Vec<String> = env
        .showtime
        .available_seats
        .iter()
        .filter(|s| *s != "A1")
        .cloned()
        .collect();
    env.bookings
        .create_booking(NewBooking {
            user_id: env.user.id,
            showtime_id: env.showtime.id,
            seats: all_but_one,
            payment_method: PaymentMethod::CreditCard,
            payment_ref: None,
        })
        .await
        .unwrap();
    let last = env
        .bookings
        .create_booking(new_booking(&env, &["A1"], true))
        .await
        .unwrap();

    let full = env.store.get_showtime(env.showtime.id).await.unwrap().unwrap();
    assert_eq!(full.status, ShowtimeStatus::Full);

    // Cancelling any booking makes it available again
    env.bookings
        .cancel_booking(last.id, env.user.id, None)
        .await
        .unwrap();
    let reopened = env.store.get_showtime(env.showtime.id).await.unwrap().unwrap();
    assert_eq!(reopened.status, ShowtimeStatus::Available);
}

#[tokio::test]
async fn unmaterialized_seat_universe_heals_on_first_booking() {
    let env = booking_env().await;
    let mut legacy = make_showtime(
        env.movie.id,
        env.theater.id,
        env.screen.id,
        Duration::hours(72),
        vec![],
    );
    legacy.available_seats = Vec::new();
    legacy.booked_seats = Vec::new();
    legacy.total_seats = 100;
    env.store.insert_showtime(&legacy).await.unwrap();

    let booking = env
        .bookings
        .create_booking(NewBooking {
            user_id: env.user.id,
            showtime_id: legacy.id,
            seats: seats(&["A1", "J10"]),
            payment_method: PaymentMethod::CreditCard,
            payment_ref: Some("pi_legacy".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(booking.number_of_tickets, 2);

    let healed = env.store.get_showtime(legacy.id).await.unwrap().unwrap();
    assert_eq!(healed.available_seats.len(), 98);
    assert_eq!(seat_set(&healed.booked_seats), seat_set(&seats(&["A1", "J10"])));
}

#[tokio::test]
async fn reschedule_notifies_each_confirmed_booking() {
    let env = booking_env().await;
    let other = make_user("Bob");
    env.store.insert_user(&other).await.unwrap();

    env.bookings
        .create_booking(new_booking(&env, &["H1"], true))
        .await
        .unwrap();
    env.bookings
        .create_booking(NewBooking {
            user_id: other.id,
            showtime_id: env.showtime.id,
            seats: seats(&["H2"]),
            payment_method: PaymentMethod::Wallet,
            payment_ref: Some("pi_bob".to_string()),
        })
        .await
        .unwrap();
    // Pending bookings are not notified
    env.bookings
        .create_booking(new_booking(&env, &["H3"], false))
        .await
        .unwrap();

    let new_start = Utc::now() + Duration::hours(96);
    let new_end = new_start + Duration::hours(2);
    let notified = env
        .bookings
        .reschedule_showtime(env.showtime.id, new_start, new_end)
        .await
        .unwrap();

    assert_eq!(notified, 2);
    assert_eq!(env.notifier.showtime_change_count(), 2);

    let showtime = env.store.get_showtime(env.showtime.id).await.unwrap().unwrap();
    assert_eq!(showtime.start_time, new_start);

    let err = env
        .bookings
        .reschedule_showtime(env.showtime.id, new_start, new_start)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTimeRange));
}
