//! # Routes
//!
//! The caller's identity comes from the `X-User-ID` and `X-Household-ID` headers;
//! a plan is only visible to its own household.

use crate::error::{WebError, WebResult};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use larder_shared::{ApiResponse, Context, QueryFilter, ResponseDetails};
use larder_voting::{MealPlanCreationInput, VotingEngine};
use serde::{Deserialize, Serialize};

/// Header naming the acting user.
pub const USER_HEADER: &str = "X-User-ID";

/// Header naming the acting household.
pub const HOUSEHOLD_HEADER: &str = "X-Household-ID";

fn header(req: &HttpRequest, name: &'static str) -> WebResult<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(WebError::MissingHeader(name))
}

fn details(household_id: &str) -> ResponseDetails {
    ResponseDetails {
        current_household_id: household_id.to_string(),
        ..Default::default()
    }
}

/// Body of the vote route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BallotInput {
    /// Option ids, most preferred first.
    #[serde(rename = "rankedOptionIDs", default)]
    pub ranked_option_ids: Vec<String>,
}

/// Answer of the finalize route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalizeResponse {
    /// Whether this call finalized the plan.
    pub changed: bool,
}

/// Liveness probe.
#[get("/_meta_/live")]
pub async fn live() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

/// Lists the household's plans.
#[get("/api/v1/meal_plans")]
pub async fn list_meal_plans(
    req: HttpRequest,
    engine: web::Data<VotingEngine>,
) -> WebResult<HttpResponse> {
    let household_id = header(&req, HOUSEHOLD_HEADER)?;
    let filter = QueryFilter::from_query(req.query_string());
    let page = engine
        .list_meal_plans(&Context::background(), &household_id, &filter)
        .await?;
    Ok(HttpResponse::Ok()
        .json(ApiResponse::with_page(page.data, page.pagination).with_details(details(&household_id))))
}

/// Creates a plan for the caller's household.
#[post("/api/v1/meal_plans")]
pub async fn create_meal_plan(
    req: HttpRequest,
    engine: web::Data<VotingEngine>,
    input: web::Json<MealPlanCreationInput>,
) -> WebResult<HttpResponse> {
    let household_id = header(&req, HOUSEHOLD_HEADER)?;
    let plan = engine
        .create_meal_plan(&Context::background(), &household_id, input.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::with_data(plan).with_details(details(&household_id))))
}

/// The plan with its events, options and votes.
#[get("/api/v1/meal_plans/{mealPlanID}")]
pub async fn get_meal_plan(
    req: HttpRequest,
    engine: web::Data<VotingEngine>,
    path: web::Path<String>,
) -> WebResult<HttpResponse> {
    let household_id = header(&req, HOUSEHOLD_HEADER)?;
    let plan = engine
        .get_meal_plan(&Context::background(), &path.into_inner(), &household_id)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_data(plan).with_details(details(&household_id))))
}

/// Replaces the caller's ballot for one event.
#[post("/api/v1/meal_plans/{mealPlanID}/events/{mealPlanEventID}/vote")]
pub async fn submit_vote(
    req: HttpRequest,
    engine: web::Data<VotingEngine>,
    path: web::Path<(String, String)>,
    input: web::Json<BallotInput>,
) -> WebResult<HttpResponse> {
    let user_id = header(&req, USER_HEADER)?;
    let household_id = header(&req, HOUSEHOLD_HEADER)?;
    let (plan_id, event_id) = path.into_inner();
    let ctx = Context::background();

    engine.get_meal_plan(&ctx, &plan_id, &household_id).await?;
    engine
        .submit_vote(&ctx, &plan_id, &event_id, &user_id, &input.ranked_option_ids)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::<()>::empty().with_details(details(&household_id))))
}

/// Finalizes the plan now, whatever its quorum.
#[post("/api/v1/meal_plans/{mealPlanID}/finalize")]
pub async fn finalize_meal_plan(
    req: HttpRequest,
    engine: web::Data<VotingEngine>,
    path: web::Path<String>,
) -> WebResult<HttpResponse> {
    let household_id = header(&req, HOUSEHOLD_HEADER)?;
    let plan_id = path.into_inner();
    let ctx = Context::background();

    engine.get_meal_plan(&ctx, &plan_id, &household_id).await?;
    let changed = engine.finalize_plan(&ctx, &plan_id).await?;
    Ok(HttpResponse::Ok().json(
        ApiResponse::with_data(FinalizeResponse { changed }).with_details(details(&household_id)),
    ))
}

/// Registers every route plus the JSON error handler.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| WebError::BadRequest(err.to_string()).into()),
    )
    .service(live)
    .service(list_meal_plans)
    .service(create_meal_plan)
    .service(get_meal_plan)
    .service(submit_vote)
    .service(finalize_meal_plan);
}
