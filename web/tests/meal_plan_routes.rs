use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::{Duration, Utc};
use larder_shared::{ApiResponse, Context};
use larder_voting::{
    ElectionMethod, MealName, MealPlan, MealPlanCreationInput, MealPlanEventCreationInput,
    MealPlanOptionCreationInput, MealPlanStatus, MemoryStore, NoopPublisher, VotingEngine,
    VotingStore,
};
use larder_web::configure;
use larder_web::routes::{BallotInput, FinalizeResponse};
use std::sync::Arc;

const HOUSEHOLD: &str = "household-1";

fn creation_input() -> MealPlanCreationInput {
    let now = Utc::now();
    MealPlanCreationInput {
        notes: "week one".into(),
        voting_deadline: now + Duration::days(1),
        election_method: ElectionMethod::InstantRunoff,
        starts_at: now,
        ends_at: now + Duration::days(7),
        events: vec![MealPlanEventCreationInput {
            day: 2,
            meal_name: MealName::Dinner,
            notes: String::new(),
            starts_at: now + Duration::days(2),
            ends_at: now + Duration::days(2) + Duration::hours(1),
            options: ["lasagna", "curry"]
                .into_iter()
                .map(|meal| MealPlanOptionCreationInput {
                    meal_id: meal.into(),
                    notes: String::new(),
                })
                .collect(),
        }],
    }
}

async fn store_with_members(members: &[&str]) -> MemoryStore {
    let store = MemoryStore::new();
    for member in members {
        store.add_household_member(HOUSEHOLD, member).await;
    }
    store
}

fn engine(store: &MemoryStore) -> web::Data<VotingEngine> {
    web::Data::new(VotingEngine::new(
        Arc::new(store.clone()),
        Arc::new(NoopPublisher),
    ))
}

#[actix_web::test]
async fn test_vote_and_finalize_flow() {
    let store = store_with_members(&["alice", "bob"]).await;
    let app = test::init_service(App::new().app_data(engine(&store)).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/meal_plans")
        .insert_header(("X-Household-ID", HOUSEHOLD))
        .set_json(creation_input())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: ApiResponse<MealPlan> = test::read_body_json(resp).await;
    assert_eq!(created.details.current_household_id, HOUSEHOLD);
    let plan = created.data.unwrap();
    let event = &plan.events[0];
    let favourite = event.options[1].id.clone();

    let vote_uri = format!("/api/v1/meal_plans/{}/events/{}/vote", plan.id, event.id);
    let req = test::TestRequest::post()
        .uri(&vote_uri)
        .insert_header(("X-Household-ID", HOUSEHOLD))
        .insert_header(("X-User-ID", "alice"))
        .set_json(BallotInput {
            ranked_option_ids: vec![favourite.clone()],
        })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri(&vote_uri)
        .insert_header(("X-Household-ID", HOUSEHOLD))
        .insert_header(("X-User-ID", "mallory"))
        .set_json(BallotInput::default())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let finalize_uri = format!("/api/v1/meal_plans/{}/finalize", plan.id);
    for expected in [true, false] {
        let req = test::TestRequest::post()
            .uri(&finalize_uri)
            .insert_header(("X-Household-ID", HOUSEHOLD))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: ApiResponse<FinalizeResponse> = test::read_body_json(resp).await;
        assert_eq!(body.data, Some(FinalizeResponse { changed: expected }));
    }

    let req = test::TestRequest::post()
        .uri(&vote_uri)
        .insert_header(("X-Household-ID", HOUSEHOLD))
        .insert_header(("X-User-ID", "bob"))
        .set_json(BallotInput::default())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: ApiResponse<()> = test::read_body_json(resp).await;
    assert_eq!(body.error.unwrap().code, "E_CONFLICT");

    let stored = store
        .get_meal_plan(&Context::background(), &plan.id)
        .await
        .unwrap();
    assert_eq!(stored.status, MealPlanStatus::Finalized);
    let chosen: Vec<_> = stored.events[0]
        .options
        .iter()
        .filter(|o| o.chosen)
        .map(|o| o.id.clone())
        .collect();
    assert_eq!(chosen, vec![favourite]);
}

#[actix_web::test]
async fn test_plans_are_scoped_to_households() {
    let store = store_with_members(&["alice"]).await;
    let app = test::init_service(App::new().app_data(engine(&store)).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/meal_plans")
        .insert_header(("X-Household-ID", HOUSEHOLD))
        .set_json(creation_input())
        .to_request();
    let created: ApiResponse<MealPlan> = test::call_and_read_body_json(&app, req).await;
    let plan_id = created.data.unwrap().id;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/meal_plans/{}", plan_id))
        .insert_header(("X-Household-ID", HOUSEHOLD))
        .to_request();
    let fetched: ApiResponse<MealPlan> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.data.unwrap().id, plan_id);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/meal_plans/{}", plan_id))
        .insert_header(("X-Household-ID", "someone-else"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/v1/meal_plans?limit=10")
        .insert_header(("X-Household-ID", HOUSEHOLD))
        .to_request();
    let listed: ApiResponse<Vec<MealPlan>> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.data.map(|plans| plans.len()), Some(1));
    let pagination = listed.pagination.unwrap();
    assert_eq!(pagination.limit, 10);
    assert_eq!(pagination.total_count, 1);
}

#[actix_web::test]
async fn test_requests_without_identity_or_with_bad_json_are_rejected() {
    let store = MemoryStore::new();
    let app = test::init_service(App::new().app_data(engine(&store)).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/meal_plans")
        .set_json(creation_input())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: ApiResponse<()> = test::read_body_json(resp).await;
    assert_eq!(body.error.unwrap().code, "E_UNAUTHENTICATED");

    let req = test::TestRequest::post()
        .uri("/api/v1/meal_plans")
        .insert_header(("X-Household-ID", HOUSEHOLD))
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"notes\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse<()> = test::read_body_json(resp).await;
    assert_eq!(body.error.unwrap().code, "E_INVALID_INPUT");
}
