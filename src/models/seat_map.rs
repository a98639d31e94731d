use std::collections::BTreeSet;

use rust_decimal::{Decimal, RoundingStrategy};

use super::showtime::ShowtimeStatus;

/// A showtime's seat partition: every seat label is either available or
/// booked, never both. All mutation of the partition goes through `take` and
/// `release` so the disjointness invariant cannot be broken piecemeal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatMap {
    available: BTreeSet<String>,
    booked: BTreeSet<String>,
    premium: BTreeSet<String>,
    total_seats: i32,
}

impl SeatMap {
    pub fn new<I, J, K>(available: I, booked: J, premium: K, total_seats: i32) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
        K: IntoIterator<Item = String>,
    {
        Self {
            available: available.into_iter().collect(),
            booked: booked.into_iter().collect(),
            premium: premium.into_iter().collect(),
            total_seats,
        }
    }

    /// Row-major rectangular grid: rows labelled `A`, `B`, ... with seat
    /// numbers `1..=cols`, all available.
    pub fn fresh_grid(rows: u32, cols: u32, premium: Vec<String>) -> Self {
        let labels = grid_labels(rows, cols);
        let total = labels.len() as i32;
        Self::new(labels, Vec::new(), premium, total)
    }

    /// Legacy rows with empty seat sets never had their universe written.
    /// A showtime that sold out legitimately always has booked seats.
    pub fn is_unmaterialized(&self) -> bool {
        self.available.is_empty() && self.booked.is_empty() && self.total_seats > 0
    }

    /// One-time self-heal for unmaterialized rows: fill `available` with the
    /// default grid. Leaves already-materialized maps untouched.
    pub fn materialize_default_grid(&mut self, rows: u32, cols: u32) {
        if !self.is_unmaterialized() {
            return;
        }
        self.available = grid_labels(rows, cols).into_iter().collect();
    }

    /// The requested seats that are not currently bookable.
    pub fn unavailable_of(&self, seats: &[String]) -> Vec<String> {
        seats
            .iter()
            .filter(|seat| !self.available.contains(*seat))
            .cloned()
            .collect()
    }

    /// Moves `seats` from available to booked. Callers must have checked
    /// `unavailable_of` first; seats not available are ignored rather than
    /// conjured into the booked set.
    pub fn take(&mut self, seats: &[String]) {
        for seat in seats {
            if self.available.remove(seat) {
                self.booked.insert(seat.clone());
            }
        }
    }

    /// Returns `seats` from booked to available. Idempotent: releasing a seat
    /// twice leaves a single available entry.
    pub fn release(&mut self, seats: &[String]) {
        for seat in seats {
            self.booked.remove(seat);
            self.available.insert(seat.clone());
        }
    }

    /// `full` iff nothing is bookable; `archived` is terminal and sticks.
    pub fn derived_status(&self, current: ShowtimeStatus) -> ShowtimeStatus {
        if current == ShowtimeStatus::Archived {
            ShowtimeStatus::Archived
        } else if self.available.is_empty() {
            ShowtimeStatus::Full
        } else {
            ShowtimeStatus::Available
        }
    }

    pub fn is_premium(&self, seat: &str) -> bool {
        self.premium.contains(seat)
    }

    pub fn available_seats(&self) -> Vec<String> {
        self.available.iter().cloned().collect()
    }

    pub fn booked_seats(&self) -> Vec<String> {
        self.booked.iter().cloned().collect()
    }

    pub fn total_seats(&self) -> i32 {
        self.total_seats
    }

    pub fn partition_is_disjoint(&self) -> bool {
        self.available.intersection(&self.booked).next().is_none()
    }
}

/// Seat labels for a `rows` x `cols` grid: `A1..A{cols}`, `B1..`, row-major.
pub fn grid_labels(rows: u32, cols: u32) -> Vec<String> {
    let mut labels = Vec::with_capacity((rows * cols) as usize);
    for r in 0..rows.min(26) {
        let row = (b'A' + r as u8) as char;
        for c in 1..=cols {
            labels.push(format!("{row}{c}"));
        }
    }
    labels
}

/// The premium-seat surcharge rule. The two historical call sites disagreed
/// on the constant (x1.3 vs flat +50), so the rule is configured once and
/// applied everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PremiumPricing {
    /// Multiply the base price, rounding halves away from zero.
    Multiplier(Decimal),
    /// Add a flat amount to the base price.
    Surcharge(Decimal),
}

impl Default for PremiumPricing {
    fn default() -> Self {
        // 1.3
        PremiumPricing::Multiplier(Decimal::new(13, 1))
    }
}

impl PremiumPricing {
    pub fn seat_price(&self, base: Decimal, premium: bool) -> Decimal {
        if !premium {
            return base;
        }
        match self {
            PremiumPricing::Multiplier(m) => {
                (base * *m).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            }
            PremiumPricing::Surcharge(s) => base + *s,
        }
    }

    /// Sum of per-seat prices, fixed at booking time.
    pub fn total(&self, base: Decimal, seats: &[String], seat_map: &SeatMap) -> Decimal {
        seats.iter().fold(Decimal::ZERO, |sum, seat| {
            sum + self.seat_price(base, seat_map.is_premium(seat))
        })
    }
}
