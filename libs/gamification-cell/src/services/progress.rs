// libs/gamification-cell/src/services/progress.rs
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    DailyTasksResponse, HydrationResponse, HydrationState, ProgressCounters, ProgressError,
    RecordDailyTasksRequest, RecordHydrationRequest,
};
use crate::services::hydration::record_hydration_intake;
use crate::services::tasks::{
    evaluate_daily_task_completion, record_daily_task_completion, week_key_for,
};
use crate::services::tiers::TierTable;

/// Daily goal used before the patient has ever set one.
pub const DEFAULT_GOAL_ML: i32 = 2000;

pub struct ProgressService {
    supabase: SupabaseClient,
}

impl ProgressService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Hydration state for one day. Absent rows come back as a fresh state
    /// carrying the goal forward from the most recent recorded day.
    pub async fn get_hydration_state(
        &self,
        patient_id: Uuid,
        day: NaiveDate,
        auth_token: &str,
    ) -> Result<HydrationState, ProgressError> {
        debug!("Fetching hydration state for {} on {}", patient_id, day);

        let path = format!(
            "/rest/v1/hydration_records?patient_id=eq.{}&day=eq.{}",
            patient_id, day
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ProgressError::StateFetchFailed(e.to_string()))?;

        if let Some(row) = result.into_iter().next() {
            return serde_json::from_value(row).map_err(|e| {
                ProgressError::StateFetchFailed(format!("Failed to parse hydration state: {}", e))
            });
        }

        let goal_ml = self.latest_goal(patient_id, auth_token).await?;
        Ok(HydrationState::fresh(day, goal_ml))
    }

    pub async fn get_counters(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<ProgressCounters, ProgressError> {
        debug!("Fetching progress counters for {}", patient_id);

        let path = format!("/rest/v1/progress_counters?patient_id=eq.{}", patient_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ProgressError::StateFetchFailed(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => serde_json::from_value(row).map_err(|e| {
                ProgressError::StateFetchFailed(format!("Failed to parse counters: {}", e))
            }),
            None => Ok(ProgressCounters::default()),
        }
    }

    /// Record an intake update and run tier progression.
    ///
    /// The hydration write is the user-visible action; the counter write is
    /// secondary. If the counter write fails after the hydration write
    /// succeeded, the failure is logged and swallowed; tiers reconcile on
    /// the next load by recomputing from the persisted counters.
    pub async fn record_intake(
        &self,
        request: RecordHydrationRequest,
        auth_token: &str,
    ) -> Result<HydrationResponse, ProgressError> {
        if let Some(goal) = request.goal_ml {
            if goal <= 0 {
                return Err(ProgressError::ValidationError(
                    "Hydration goal must be positive".to_string(),
                ));
            }
        }

        let prior = self
            .get_hydration_state(request.patient_id, request.day, auth_token)
            .await?;
        let counters = self.get_counters(request.patient_id, auth_token).await?;

        let goal_ml = request.goal_ml.unwrap_or(prior.goal_ml);

        let (state, updated_counters, events) = record_hydration_intake(
            request.day,
            request.intake_ml,
            goal_ml,
            prior.goal_met,
            &counters,
        );

        self.save_hydration_state(request.patient_id, &state, auth_token)
            .await?;

        if let Err(e) = self
            .save_counters(request.patient_id, &updated_counters, auth_token)
            .await
        {
            warn!(
                "Counter update failed after hydration write for {}: {} (will reconcile on next load)",
                request.patient_id, e
            );
        }

        let current_tier = TierTable::hydration()
            .highest_for(updated_counters.total_goal_met_days)
            .name
            .to_string();

        if !events.is_empty() {
            info!(
                "Hydration progression for {}: {} event(s)",
                request.patient_id,
                events.len()
            );
        }

        Ok(HydrationResponse {
            state,
            total_goal_met_days: updated_counters.total_goal_met_days,
            current_tier,
            events,
        })
    }

    /// Evaluate and record the all-tasks-done condition for one day.
    pub async fn record_daily_tasks(
        &self,
        request: RecordDailyTasksRequest,
        auth_token: &str,
    ) -> Result<DailyTasksResponse, ProgressError> {
        let hydration = self
            .get_hydration_state(request.patient_id, request.day, auth_token)
            .await?;
        let counters = self.get_counters(request.patient_id, auth_token).await?;

        let all_tasks_done = evaluate_daily_task_completion(
            hydration.goal_met,
            request.food_diary_has_entry,
            request.all_habits_checked,
        );

        let week_key = week_key_for(request.day);
        let (updated_counters, events) =
            record_daily_task_completion(request.day, &week_key, all_tasks_done, &counters);

        self.save_counters(request.patient_id, &updated_counters, auth_token)
            .await
            .map_err(|e| ProgressError::DatabaseError(e))?;

        let current_tier = TierTable::tasks()
            .highest_for(updated_counters.total_task_tiers_completed)
            .name
            .to_string();

        Ok(DailyTasksResponse {
            all_tasks_done,
            weekly_streak_count: updated_counters.weekly_streak_count,
            total_task_tiers_completed: updated_counters.total_task_tiers_completed,
            current_tier,
            events,
        })
    }

    // Private helper methods

    /// The goal from the most recent hydration record, defaulting when the
    /// patient has never recorded anything.
    async fn latest_goal(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<i32, ProgressError> {
        let path = format!(
            "/rest/v1/hydration_records?patient_id=eq.{}&select=goal_ml&order=day.desc&limit=1",
            patient_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ProgressError::StateFetchFailed(e.to_string()))?;

        Ok(result
            .first()
            .and_then(|row| row["goal_ml"].as_i64())
            .map(|goal| goal as i32)
            .unwrap_or(DEFAULT_GOAL_ML))
    }

    async fn save_hydration_state(
        &self,
        patient_id: Uuid,
        state: &HydrationState,
        auth_token: &str,
    ) -> Result<(), ProgressError> {
        let body = json!({
            "patient_id": patient_id,
            "day": state.day,
            "intake_ml": state.intake_ml,
            "goal_ml": state.goal_ml,
            "goal_met": state.goal_met,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static(
                "resolution=merge-duplicates,return=representation",
            ),
        );

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/hydration_records?on_conflict=patient_id,day",
                Some(auth_token),
                Some(body),
                Some(headers),
            )
            .await
            .map_err(|e| ProgressError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn save_counters(
        &self,
        patient_id: Uuid,
        counters: &ProgressCounters,
        auth_token: &str,
    ) -> Result<(), String> {
        let body = json!({
            "patient_id": patient_id,
            "total_goal_met_days": counters.total_goal_met_days,
            "week_key": counters.week_key,
            "weekly_streak_count": counters.weekly_streak_count,
            "total_task_tiers_completed": counters.total_task_tiers_completed,
            "all_tasks_done_on": counters.all_tasks_done_on,
            "earned_pins": counters.earned_pins,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static(
                "resolution=merge-duplicates,return=representation",
            ),
        );

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/progress_counters?on_conflict=patient_id",
                Some(auth_token),
                Some(body),
                Some(headers),
            )
            .await
            .map_err(|e| e.to_string())?;

        Ok(())
    }
}
