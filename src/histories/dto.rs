use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::histories::repo::{Coordinate, Historic, HistoricStatus};

fn default_take() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct HistoryListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_take")]
    pub take: i64,
    pub status: Option<HistoricStatus>,
}

impl HistoryListQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.skip < 0 {
            return Err(ApiError::validation("skip must not be negative"));
        }
        if self.take < 1 {
            return Err(ApiError::validation("take must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinateInput {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
}

fn validate_coords(coords: &[CoordinateInput]) -> Result<(), ApiError> {
    for c in coords {
        if !(-90.0..=90.0).contains(&c.latitude) {
            return Err(ApiError::validation("latitude must be within -90..90"));
        }
        if !(-180.0..=180.0).contains(&c.longitude) {
            return Err(ApiError::validation("longitude must be within -180..180"));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHistoricRequest {
    pub license_plate: String,
    pub description: String,
    #[serde(default)]
    pub coords: Vec<CoordinateInput>,
}

impl CreateHistoricRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.license_plate.trim().is_empty() {
            return Err(ApiError::validation("licensePlate must not be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(ApiError::validation("description must not be empty"));
        }
        validate_coords(&self.coords)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHistoricRequest {
    pub license_plate: String,
    pub description: String,
    #[serde(default)]
    pub coords: Vec<CoordinateInput>,
}

impl UpdateHistoricRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.license_plate.trim().is_empty() {
            return Err(ApiError::validation("licensePlate must not be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(ApiError::validation("description must not be empty"));
        }
        validate_coords(&self.coords)
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckOutRequest {
    pub id: Uuid,
    #[serde(default)]
    pub coords: Vec<CoordinateInput>,
}

impl CheckOutRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_coords(&self.coords)
    }
}

#[derive(Debug, Serialize)]
pub struct CoordinateResponse {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
}

impl From<Coordinate> for CoordinateResponse {
    fn from(c: Coordinate) -> Self {
        Self {
            id: c.id,
            latitude: c.latitude,
            longitude: c.longitude,
            timestamp: c.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricResponse {
    pub id: Uuid,
    pub license_plate: String,
    pub description: String,
    pub status: HistoricStatus,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub coords: Vec<CoordinateResponse>,
}

impl HistoricResponse {
    pub fn from_parts(historic: Historic, coords: Vec<Coordinate>) -> Self {
        Self {
            id: historic.id,
            license_plate: historic.license_plate,
            description: historic.description,
            status: historic.status,
            user_id: historic.user_id,
            created_at: historic.created_at,
            updated_at: historic.updated_at,
            coords: coords.into_iter().map(CoordinateResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(latitude: f64, longitude: f64, timestamp: i64) -> CoordinateInput {
        CoordinateInput {
            latitude,
            longitude,
            timestamp,
        }
    }

    #[test]
    fn list_query_defaults() {
        let q: HistoryListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.skip, 0);
        assert_eq!(q.take, 10);
        assert!(q.status.is_none());
        assert!(q.validate().is_ok());
    }

    #[test]
    fn list_query_parses_status() {
        let q: HistoryListQuery =
            serde_json::from_str(r#"{"skip":5,"take":2,"status":"departed"}"#).unwrap();
        assert_eq!(q.skip, 5);
        assert_eq!(q.take, 2);
        assert_eq!(q.status, Some(HistoricStatus::Departed));
    }

    #[test]
    fn list_query_rejects_negative_paging() {
        let q: HistoryListQuery = serde_json::from_str(r#"{"skip":-1}"#).unwrap();
        assert!(q.validate().is_err());
        let q: HistoryListQuery = serde_json::from_str(r#"{"take":0}"#).unwrap();
        assert!(q.validate().is_err());
    }

    #[test]
    fn create_request_uses_camel_case_fields() {
        let req: CreateHistoricRequest = serde_json::from_str(
            r#"{
                "licensePlate": "ABC-1234",
                "description": "delivery run",
                "coords": [{"latitude": -23.5, "longitude": -46.6, "timestamp": 1700000000}]
            }"#,
        )
        .unwrap();
        assert_eq!(req.license_plate, "ABC-1234");
        assert_eq!(req.coords.len(), 1);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn create_request_allows_empty_coords() {
        let req: CreateHistoricRequest =
            serde_json::from_str(r#"{"licensePlate": "ABC-1234", "description": "x"}"#).unwrap();
        assert!(req.coords.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn create_request_rejects_blank_fields() {
        let req = CreateHistoricRequest {
            license_plate: "  ".into(),
            description: "x".into(),
            coords: vec![],
        };
        assert!(req.validate().is_err());

        let req = CreateHistoricRequest {
            license_plate: "ABC-1234".into(),
            description: "".into(),
            coords: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn coordinate_ranges_are_checked() {
        assert!(validate_coords(&[coord(90.0, 180.0, 0)]).is_ok());
        assert!(validate_coords(&[coord(-90.0, -180.0, 0)]).is_ok());
        assert!(validate_coords(&[coord(90.5, 0.0, 0)]).is_err());
        assert!(validate_coords(&[coord(0.0, -180.5, 0)]).is_err());
    }

    #[test]
    fn response_preserves_coordinate_order() {
        let historic_id = Uuid::new_v4();
        let historic = Historic {
            id: historic_id,
            license_plate: "ABC-1234".into(),
            description: "delivery run".into(),
            status: HistoricStatus::Departed,
            user_id: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let coords = (0..3)
            .map(|i| Coordinate {
                id: Uuid::new_v4(),
                latitude: i as f64,
                longitude: 0.0,
                timestamp: 1700000000 + i,
                historic_id,
            })
            .collect::<Vec<_>>();

        let response = HistoricResponse::from_parts(historic, coords);
        let timestamps: Vec<i64> = response.coords.iter().map(|c| c.timestamp).collect();
        assert_eq!(timestamps, vec![1700000000, 1700000001, 1700000002]);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["licensePlate"], "ABC-1234");
        assert_eq!(json["status"], "departed");
    }
}
