//! Demo inventory loaded at startup.
//!
//! Two hotels, three room types each, the first week of April 2024, ten
//! units per (hotel, room type, day) row. Enough to exercise every saga
//! outcome from the HTTP surface without a real inventory source.

use anyhow::{Context, Result};
use booking_core::Storage;
use booking_types::{CancelToken, RoomAvailability};
use chrono::NaiveDate;

pub const FIRST_HOTEL_ID: u64 = 1;
pub const SECOND_HOTEL_ID: u64 = 2;

/// Room types seeded per hotel.
pub const ROOM_TYPES: u64 = 3;
/// Days of April 2024 seeded per room type, starting at the 1st.
pub const SEEDED_DAYS: u32 = 7;
/// Units on every seeded row.
pub const SEED_QUOTA: u32 = 10;

/// Load the demo inventory into `storage` and return the row count.
pub async fn apply(cancel: &CancelToken, storage: &Storage) -> Result<usize> {
    let mut id: u64 = 0;
    for hotel_id in [FIRST_HOTEL_ID, SECOND_HOTEL_ID] {
        for day_of_month in 1..=SEEDED_DAYS {
            for room_type_id in 1..=ROOM_TYPES {
                let day = NaiveDate::from_ymd_opt(2024, 4, day_of_month)
                    .context("Seed day out of range")?;
                let row = RoomAvailability {
                    id,
                    hotel_id,
                    room_type_id,
                    day,
                    quota: SEED_QUOTA,
                };
                storage
                    .rooms()
                    .create(cancel, id, row)
                    .await
                    .context("Failed to store seed row")?;
                id += 1;
            }
        }
    }
    Ok(id as usize)
}
