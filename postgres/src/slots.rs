//! `PostgreSQL` slot store.
//!
//! Claims lock the target row with `SELECT ... FOR UPDATE OF s` inside a
//! transaction whose `lock_timeout` bounds how long a caller queues behind the
//! current lock holder. A timed-out wait surfaces as `Unavailable`.

use crate::error::{classify, is_violation};
use chrono::{NaiveDate, NaiveTime};
use slotbook_core::{
    BookingError, CategoryId, EventCategory, Holder, Identity, NewSlot, Result, SlotFilter,
    SlotId, SlotStore, SlotTransaction, TimeSlot, UserId,
};
use sqlx::error::ErrorKind;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::time::Duration;

/// Default bound on row-lock waits.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Insert-or-fetch rounds before giving up on a category name.
const CATEGORY_UPSERT_ATTEMPTS: usize = 3;

macro_rules! select_slots {
    () => {
        r"
        SELECT s.id, s.category_id, c.name AS category_name, s.date, s.start_time, s.end_time,
               s.booked_by, u.username AS booked_by_username
        FROM time_slots s
        JOIN event_categories c ON c.id = s.category_id
        LEFT JOIN users u ON u.id = s.booked_by
        "
    };
}

#[derive(sqlx::FromRow)]
struct SlotRecord {
    id: i64,
    category_id: i64,
    category_name: String,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    booked_by: Option<i64>,
    booked_by_username: Option<String>,
}

impl From<SlotRecord> for TimeSlot {
    fn from(row: SlotRecord) -> Self {
        let holder = row.booked_by.map(|user_id| {
            let username = row.booked_by_username.unwrap_or_else(|| {
                tracing::warn!(slot_id = row.id, user_id, "Holder row missing from users join");
                String::new()
            });
            Holder {
                user_id: UserId::new(user_id),
                username,
            }
        });
        Self {
            id: SlotId::new(row.id),
            category: EventCategory {
                id: CategoryId::new(row.category_id),
                name: row.category_name,
            },
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            holder,
        }
    }
}

/// Slot store backed by a `PgPool`.
#[derive(Clone, Debug)]
pub struct PgSlotStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgSlotStore {
    /// Create a store using [`DEFAULT_LOCK_TIMEOUT`].
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Override the row-lock wait bound.
    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Open a transaction whose lock waits are bounded by the configured timeout.
    async fn begin_bounded(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await.map_err(classify)?;
        // SET does not take bind parameters; the value is an integer we format ourselves.
        // Postgres reads 0 as "no timeout", so the bound never drops below 1ms.
        let millis = self.lock_timeout.as_millis().max(1);
        let statement = format!("SET LOCAL lock_timeout = '{millis}ms'");
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        Ok(tx)
    }
}

impl SlotStore for PgSlotStore {
    type Tx = PgSlotTransaction;

    async fn begin(&self) -> Result<PgSlotTransaction> {
        let tx = self.begin_bounded().await?;
        Ok(PgSlotTransaction { tx })
    }

    async fn list_slots(&self, filter: &SlotFilter) -> Result<Vec<TimeSlot>> {
        let mut query = QueryBuilder::<Postgres>::new(select_slots!());
        query.push(" WHERE TRUE");
        if let Some(from) = filter.date_from {
            query.push(" AND s.date >= ").push_bind(from);
        }
        if let Some(to) = filter.date_to {
            query.push(" AND s.date <= ").push_bind(to);
        }
        if let Some(name) = filter.category.name() {
            query.push(" AND c.name = ").push_bind(name.to_owned());
        }
        query.push(" ORDER BY s.date, s.start_time, s.id");

        let rows: Vec<SlotRecord> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;

        Ok(rows.into_iter().map(TimeSlot::from).collect())
    }

    async fn upsert_category_by_name(&self, name: &str) -> Result<EventCategory> {
        for _ in 0..CATEGORY_UPSERT_ATTEMPTS {
            let inserted: Option<(i64,)> = sqlx::query_as(
                r"
                INSERT INTO event_categories (name) VALUES ($1)
                ON CONFLICT (name) DO NOTHING
                RETURNING id
                ",
            )
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

            let found = match inserted {
                Some(row) => Some(row),
                None => sqlx::query_as("SELECT id FROM event_categories WHERE name = $1")
                    .bind(name)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(classify)?,
            };

            if let Some((id,)) = found {
                return Ok(EventCategory {
                    id: CategoryId::new(id),
                    name: name.to_owned(),
                });
            }
            // The conflicting row was deleted between the two statements.
            tracing::debug!(category = name, "Category vanished during upsert, retrying");
        }

        Err(BookingError::Storage(format!(
            "Could not upsert category '{name}'"
        )))
    }

    async fn create_slot(&self, slot: NewSlot) -> Result<TimeSlot> {
        let inserted: std::result::Result<(i64,), sqlx::Error> = sqlx::query_as(
            r"
            INSERT INTO time_slots (category_id, date, start_time, end_time)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(slot.category.id.get())
        .bind(slot.date)
        .bind(slot.start_time)
        .bind(slot.end_time)
        .fetch_one(&self.pool)
        .await;

        let (id,) = match inserted {
            Ok(row) => row,
            Err(error) if is_violation(&error, ErrorKind::CheckViolation) => {
                return Err(BookingError::Validation(
                    "Start time must be before end time".into(),
                ));
            }
            Err(error) => return Err(classify(error)),
        };

        Ok(TimeSlot {
            id: SlotId::new(id),
            category: slot.category,
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            holder: None,
        })
    }

    async fn clear_holder(&self, id: SlotId) -> Result<TimeSlot> {
        // The UPDATE queues behind an open claim on the row, so it runs under the same bound.
        let mut tx = self.begin_bounded().await?;
        let row: Option<SlotRecord> = sqlx::query_as(
            r"
            WITH cleared AS (
                UPDATE time_slots SET booked_by = NULL
                WHERE id = $1
                RETURNING id, category_id, date, start_time, end_time, booked_by
            )
            SELECT s.id, s.category_id, c.name AS category_name, s.date, s.start_time, s.end_time,
                   s.booked_by, NULL::TEXT AS booked_by_username
            FROM cleared s
            JOIN event_categories c ON c.id = s.category_id
            ",
        )
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(classify)?;

        let Some(row) = row else {
            return Err(BookingError::slot_not_found(id));
        };
        tx.commit().await.map_err(classify)?;
        Ok(TimeSlot::from(row))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

/// A claim or restricted-cancel transaction.
///
/// Dropping it without [`commit`](SlotTransaction::commit) rolls back.
pub struct PgSlotTransaction {
    tx: Transaction<'static, Postgres>,
}

impl SlotTransaction for PgSlotTransaction {
    async fn fetch_for_update(&mut self, id: SlotId) -> Result<TimeSlot> {
        let row: Option<SlotRecord> =
            sqlx::query_as(concat!(select_slots!(), " WHERE s.id = $1 FOR UPDATE OF s"))
                .bind(id.get())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(classify)?;

        row.map(TimeSlot::from)
            .ok_or_else(|| BookingError::slot_not_found(id))
    }

    async fn set_holder(&mut self, id: SlotId, holder: Option<&Identity>) -> Result<()> {
        let updated = sqlx::query("UPDATE time_slots SET booked_by = $2 WHERE id = $1")
            .bind(id.get())
            .bind(holder.map(|identity| identity.user_id.get()))
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;

        if updated.rows_affected() == 0 {
            return Err(BookingError::slot_not_found(id));
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(classify)
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(classify)
    }
}
