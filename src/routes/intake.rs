//! Profile, draft and submission routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{draft, profile, submission};
use crate::state::AppState;

pub fn intake_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route(
            "/drafts",
            get(draft::get_draft)
                .put(draft::save_draft)
                .delete(draft::delete_draft),
        )
        .route(
            "/submissions",
            post(submission::create_submission).get(submission::list_submissions),
        )
        .route("/submissions/:id", get(submission::get_submission))
        .route(
            "/admin/submissions",
            get(submission::list_all_submissions),
        )
        .route(
            "/admin/submissions/:id/review",
            post(submission::review_submission),
        )
}
