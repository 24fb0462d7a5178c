// libs/gamification-cell/tests/progress_api_test.rs
//
// Progress persistence flow against a mock PostgREST server.

use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gamification_cell::models::{
    ProgressEvent, RecordDailyTasksRequest, RecordHydrationRequest,
};
use gamification_cell::services::progress::{ProgressService, DEFAULT_GOAL_ML};
use shared_utils::test_utils::TestConfig;

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

struct TestSetup {
    service: ProgressService,
    mock_server: MockServer,
    patient_id: Uuid,
    auth_token: String,
}

impl TestSetup {
    async fn new() -> Self {
        let mock_server = MockServer::start().await;
        let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();

        Self {
            service: ProgressService::new(&config),
            mock_server,
            patient_id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            auth_token: "test_token".to_string(),
        }
    }

    /// Patient with no hydration rows and no counters yet.
    async fn mount_fresh_patient(&self) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/hydration_records"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()),
            )
            .mount(&self.mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/progress_counters"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()),
            )
            .mount(&self.mock_server)
            .await;
    }

    async fn mount_write_success(&self) {
        Mock::given(method("POST"))
            .and(path("/rest/v1/hydration_records"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{}])))
            .mount(&self.mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/progress_counters"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{}])))
            .mount(&self.mock_server)
            .await;
    }

    fn day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
    }
}

// ==============================================================================
// HYDRATION FLOW TESTS
// ==============================================================================

#[tokio::test]
async fn first_goal_met_of_the_day_fires_and_persists() {
    let setup = TestSetup::new().await;
    setup.mount_fresh_patient().await;
    setup.mount_write_success().await;

    let response = setup
        .service
        .record_intake(
            RecordHydrationRequest {
                patient_id: setup.patient_id,
                day: setup.day(),
                intake_ml: DEFAULT_GOAL_ML,
                goal_ml: None,
            },
            &setup.auth_token,
        )
        .await
        .expect("record_intake should succeed");

    assert!(response.state.goal_met);
    assert_eq!(response.total_goal_met_days, 1);
    assert_eq!(response.current_tier, "first-drop");
    assert_eq!(
        response.events,
        vec![ProgressEvent::GoalMetToday { day: setup.day() }]
    );
}

#[tokio::test]
async fn repeat_update_with_latched_goal_stays_silent() {
    let setup = TestSetup::new().await;

    // Today's row already has the goal latched.
    Mock::given(method("GET"))
        .and(path("/rest/v1/hydration_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "day": "2025-07-10",
            "intake_ml": 2000,
            "goal_ml": 2000,
            "goal_met": true,
        }])))
        .mount(&setup.mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/progress_counters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "total_goal_met_days": 1,
            "week_key": "2025-W28",
            "weekly_streak_count": 0,
            "total_task_tiers_completed": 0,
            "all_tasks_done_on": null,
            "earned_pins": [],
        }])))
        .mount(&setup.mock_server)
        .await;

    setup.mount_write_success().await;

    let response = setup
        .service
        .record_intake(
            RecordHydrationRequest {
                patient_id: setup.patient_id,
                day: setup.day(),
                intake_ml: 2500,
                goal_ml: None,
            },
            &setup.auth_token,
        )
        .await
        .expect("record_intake should succeed");

    assert!(response.events.is_empty());
    assert_eq!(response.total_goal_met_days, 1);
    assert_eq!(response.state.intake_ml, 2500);
}

#[tokio::test]
async fn counter_write_failure_does_not_fail_the_intake() {
    // The hydration write lands, the counter write 500s. The user action
    // still succeeds; tiers reconcile on the next load.
    let setup = TestSetup::new().await;
    setup.mount_fresh_patient().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/hydration_records"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{}])))
        .mount(&setup.mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/progress_counters"))
        .respond_with(ResponseTemplate::new(500).set_body_string("write failed"))
        .mount(&setup.mock_server)
        .await;

    let response = setup
        .service
        .record_intake(
            RecordHydrationRequest {
                patient_id: setup.patient_id,
                day: setup.day(),
                intake_ml: 2000,
                goal_ml: Some(2000),
            },
            &setup.auth_token,
        )
        .await
        .expect("intake must survive a counter write failure");

    assert!(response.state.goal_met);
    assert_eq!(
        response.events,
        vec![ProgressEvent::GoalMetToday { day: setup.day() }]
    );
}

#[tokio::test]
async fn invalid_goal_is_rejected() {
    let setup = TestSetup::new().await;

    let result = setup
        .service
        .record_intake(
            RecordHydrationRequest {
                patient_id: setup.patient_id,
                day: setup.day(),
                intake_ml: 500,
                goal_ml: Some(0),
            },
            &setup.auth_token,
        )
        .await;

    assert!(result.is_err());
}

// ==============================================================================
// DAILY TASK FLOW TESTS
// ==============================================================================

#[tokio::test]
async fn daily_tasks_require_the_hydration_goal() {
    let setup = TestSetup::new().await;
    setup.mount_fresh_patient().await;
    setup.mount_write_success().await;

    // No hydration row: the goal is unmet, so the AND fails even with the
    // diary and checklist done.
    let response = setup
        .service
        .record_daily_tasks(
            RecordDailyTasksRequest {
                patient_id: setup.patient_id,
                day: setup.day(),
                food_diary_has_entry: true,
                all_habits_checked: true,
            },
            &setup.auth_token,
        )
        .await
        .expect("record_daily_tasks should succeed");

    assert!(!response.all_tasks_done);
    assert_eq!(response.weekly_streak_count, 0);
}

#[tokio::test]
async fn completed_day_advances_the_streak() {
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/hydration_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "day": "2025-07-10",
            "intake_ml": 2100,
            "goal_ml": 2000,
            "goal_met": true,
        }])))
        .mount(&setup.mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/progress_counters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "total_goal_met_days": 3,
            "week_key": "2025-W28",
            "weekly_streak_count": 2,
            "total_task_tiers_completed": 0,
            "all_tasks_done_on": null,
            "earned_pins": [],
        }])))
        .mount(&setup.mock_server)
        .await;

    setup.mount_write_success().await;

    let response = setup
        .service
        .record_daily_tasks(
            RecordDailyTasksRequest {
                patient_id: setup.patient_id,
                day: setup.day(),
                food_diary_has_entry: true,
                all_habits_checked: true,
            },
            &setup.auth_token,
        )
        .await
        .expect("record_daily_tasks should succeed");

    assert!(response.all_tasks_done);
    assert_eq!(response.weekly_streak_count, 3);
    assert!(response.events.is_empty());
}
