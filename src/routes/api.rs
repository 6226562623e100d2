//! `/api` routes.

use super::openapi::openapi_json;
use crate::handlers::{companies, login, polls, public, users};
use crate::state::AppState;
use axum::routing::{delete, get, post, put};
use axum::Router;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/openapi.json", get(openapi_json))
        .route("/login/access-token", post(login::access_token))
        .route("/password-recovery", post(login::recover_password))
        .route("/reset-password", post(login::reset_password))
        .route("/users", get(users::list).post(users::create))
        .route("/users/me", get(users::me))
        .route("/users/profile", put(users::update_profile))
        .route("/users/register", post(users::register))
        .route("/users/register/verify", post(users::verify_registration))
        .route("/users/register/complete", post(users::complete_registration))
        .route("/users/upload_avatar/:id", post(users::upload_avatar))
        .route(
            "/users/:id",
            get(users::read).put(users::update).delete(users::delete),
        )
        .route("/companies", get(companies::list).post(companies::create))
        .route(
            "/companies/:id",
            get(companies::read).put(companies::update).delete(companies::delete),
        )
        .route("/companies/:id/invitations", get(companies::invitations))
        .route("/polls", get(polls::list).post(polls::create))
        .route(
            "/polls/:id",
            get(polls::read).put(polls::update).delete(polls::delete),
        )
        .route("/polls/:id/status", post(polls::change_status))
        .route("/polls/:id/questions", post(polls::add_question))
        .route("/polls/:id/responses", get(polls::responses))
        .route("/polls/:id/results", get(polls::results))
        .route(
            "/questions/:id",
            put(polls::update_question).delete(polls::delete_question),
        )
        .route("/questions/:id/choices", post(polls::add_choice))
        .route("/choices/:id", delete(polls::delete_choice))
        .route("/public/polls/:uuid", get(public::read))
        .route("/public/polls/:uuid/responses", post(public::submit))
}
