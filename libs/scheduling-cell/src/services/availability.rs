use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityWindow, ScheduleError};

pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// All declared availability windows, ascending by date. Dates with no
    /// row simply have no availability.
    pub async fn list_availability(
        &self,
        auth_token: &str,
    ) -> Result<Vec<AvailabilityWindow>, ScheduleError> {
        debug!("Fetching availability windows");

        let path = "/rest/v1/availability_windows?select=date,times&order=date.asc";
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::AvailabilityFetchFailed(e.to_string()))?;

        let windows: Vec<AvailabilityWindow> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<AvailabilityWindow>, _>>()
            .map_err(|e| {
                ScheduleError::AvailabilityFetchFailed(format!("Failed to parse windows: {}", e))
            })?;

        Ok(windows)
    }

    /// Upsert the declared time set for one date. An empty set deletes the
    /// row, so the date reads back as absent.
    pub async fn upsert_availability(
        &self,
        window: AvailabilityWindow,
        auth_token: &str,
    ) -> Result<AvailabilityWindow, ScheduleError> {
        debug!(
            "Upserting availability for {} ({} slots)",
            window.date,
            window.times.len()
        );

        if window.is_empty() {
            let path = format!("/rest/v1/availability_windows?date=eq.{}", window.date);
            self.supabase
                .delete(&path, Some(auth_token))
                .await
                .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;
            return Ok(window);
        }

        let mut times = window.times.clone();
        times.sort();
        times.dedup();

        let body = json!({
            "date": window.date,
            "times": times,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static(
                "resolution=merge-duplicates,return=representation",
            ),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/availability_windows?on_conflict=date",
                Some(auth_token),
                Some(body),
                Some(headers),
            )
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ScheduleError::DatabaseError(
                "Failed to upsert availability".to_string(),
            ));
        }

        serde_json::from_value(result[0].clone()).map_err(|e| {
            ScheduleError::DatabaseError(format!("Failed to parse upserted window: {}", e))
        })
    }
}
