use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::histories::dto::CoordinateInput;

/// Lifecycle of a usage record: created `departed` on check-out of the
/// vehicle, moved to `arrived` exactly once on check-in. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "historic_status", rename_all = "lowercase")]
pub enum HistoricStatus {
    Departed,
    Arrived,
}

#[derive(Debug, Clone, FromRow)]
pub struct Historic {
    pub id: Uuid,
    pub license_plate: String,
    pub description: String,
    pub status: HistoricStatus,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct Coordinate {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
    pub historic_id: Uuid,
}

const HISTORIC_COLUMNS: &str =
    "id, license_plate, description, status, user_id, created_at, updated_at";

impl Historic {
    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        status: Option<HistoricStatus>,
        skip: i64,
        take: i64,
    ) -> anyhow::Result<Vec<Historic>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, Historic>(&format!(
                    r#"
                    SELECT {HISTORIC_COLUMNS}
                    FROM historics
                    WHERE user_id = $1 AND status = $2
                    ORDER BY created_at DESC
                    LIMIT $3 OFFSET $4
                    "#
                ))
                .bind(user_id)
                .bind(status)
                .bind(take)
                .bind(skip)
                .fetch_all(db)
                .await?
            }
            None => {
                sqlx::query_as::<_, Historic>(&format!(
                    r#"
                    SELECT {HISTORIC_COLUMNS}
                    FROM historics
                    WHERE user_id = $1
                    ORDER BY created_at DESC
                    LIMIT $2 OFFSET $3
                    "#
                ))
                .bind(user_id)
                .bind(take)
                .bind(skip)
                .fetch_all(db)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Historic>> {
        let row = sqlx::query_as::<_, Historic>(&format!(
            "SELECT {HISTORIC_COLUMNS} FROM historics WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// The active record for a plate, if the vehicle is currently out.
    pub async fn find_departed_by_plate(
        db: &PgPool,
        license_plate: &str,
    ) -> anyhow::Result<Option<Historic>> {
        let row = sqlx::query_as::<_, Historic>(&format!(
            r#"
            SELECT {HISTORIC_COLUMNS}
            FROM historics
            WHERE license_plate = $1 AND status = $2
            LIMIT 1
            "#
        ))
        .bind(license_plate)
        .bind(HistoricStatus::Departed)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn find_departed_by_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Historic>> {
        let row = sqlx::query_as::<_, Historic>(&format!(
            r#"
            SELECT {HISTORIC_COLUMNS}
            FROM historics
            WHERE user_id = $1 AND status = $2
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(HistoricStatus::Departed)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// New record in `departed` status together with its initial coordinate
    /// trail. The plate-in-use check happens in the handler before this.
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        license_plate: &str,
        description: &str,
        coords: &[CoordinateInput],
    ) -> anyhow::Result<Historic> {
        let mut tx = db.begin().await?;
        let historic = sqlx::query_as::<_, Historic>(&format!(
            r#"
            INSERT INTO historics (license_plate, description, status, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {HISTORIC_COLUMNS}
            "#
        ))
        .bind(license_plate)
        .bind(description)
        .bind(HistoricStatus::Departed)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        insert_coords(&mut tx, historic.id, coords).await?;
        tx.commit().await?;
        Ok(historic)
    }

    /// Full overwrite plus check-in: plate, description and owner are
    /// replaced, status becomes `arrived`, and the given coordinates are
    /// appended to the existing trail. False when the id does not exist.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        license_plate: &str,
        description: &str,
        coords: &[CoordinateInput],
    ) -> anyhow::Result<bool> {
        let mut tx = db.begin().await?;
        let res = sqlx::query(
            r#"
            UPDATE historics
            SET license_plate = $2, description = $3, user_id = $4,
                status = $5, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(license_plate)
        .bind(description)
        .bind(user_id)
        .bind(HistoricStatus::Arrived)
        .execute(&mut *tx)
        .await?;

        if res.rows_affected() == 0 {
            return Ok(false);
        }
        insert_coords(&mut tx, id, coords).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Check-in only: status becomes `arrived` and coordinates are appended;
    /// plate, description and owner stay as they are.
    pub async fn check_out(
        db: &PgPool,
        id: Uuid,
        coords: &[CoordinateInput],
    ) -> anyhow::Result<bool> {
        let mut tx = db.begin().await?;
        let res = sqlx::query(
            r#"
            UPDATE historics
            SET status = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(HistoricStatus::Arrived)
        .execute(&mut *tx)
        .await?;

        if res.rows_affected() == 0 {
            return Ok(false);
        }
        insert_coords(&mut tx, id, coords).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Coordinates go with the record (FK cascade).
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM historics WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

impl Coordinate {
    /// Insertion order, never reordered.
    pub async fn list_for_historic(db: &PgPool, historic_id: Uuid) -> anyhow::Result<Vec<Coordinate>> {
        let rows = sqlx::query_as::<_, Coordinate>(
            r#"
            SELECT id, latitude, longitude, "timestamp", historic_id
            FROM coordinates
            WHERE historic_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(historic_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

async fn insert_coords(
    tx: &mut Transaction<'_, Postgres>,
    historic_id: Uuid,
    coords: &[CoordinateInput],
) -> anyhow::Result<()> {
    for c in coords {
        sqlx::query(
            r#"
            INSERT INTO coordinates (latitude, longitude, "timestamp", historic_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(c.latitude)
        .bind(c.longitude)
        .bind(c.timestamp)
        .bind(historic_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&HistoricStatus::Departed).unwrap(),
            r#""departed""#
        );
        assert_eq!(
            serde_json::to_string(&HistoricStatus::Arrived).unwrap(),
            r#""arrived""#
        );
    }

    #[test]
    fn status_parses_lowercase() {
        let s: HistoricStatus = serde_json::from_str(r#""departed""#).unwrap();
        assert_eq!(s, HistoricStatus::Departed);
        assert!(serde_json::from_str::<HistoricStatus>(r#""Departed""#).is_err());
    }
}
