//! All API endpoint setup

use axum::Router;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;

pub use current_user::CurrentUser;
pub use current_user::JwtKeys;
pub use request::Form;
pub use request::PathParameters;
pub use response::Error;
pub use response::Paginated;
pub use response::Success;

use crate::storage::Storage;

mod current_user;
mod live;
mod notes;
mod notifications;
mod request;
mod response;
mod review;
mod users;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    let users = Router::new()
        .route("/token", post(users::token::<S>))
        .route("/register", post(users::register::<S>))
        .route("/", post(users::create::<S>))
        .route("/me", get(users::me::<S>));

    let notes = Router::new()
        .route("/", get(notes::list_approved::<S>))
        .route("/", post(notes::submit::<S>))
        .route("/mine", get(notes::list_mine::<S>))
        .route("/{note}", get(notes::single::<S>))
        .route("/{note}", patch(notes::edit::<S>));

    let review = Router::new()
        .route("/", get(review::list::<S>))
        .route("/{note}", get(review::single::<S>))
        .route("/{note}", delete(review::remove::<S>))
        .route("/{note}/approve", post(review::approve::<S>))
        .route("/{note}/reject", post(review::reject::<S>));

    let notifications = Router::new()
        .route("/", get(notifications::list::<S>))
        .route("/live", get(live::upgrade::<S>))
        .route("/unread/count", get(notifications::unread_count::<S>))
        .route("/read/all", patch(notifications::mark_all_read::<S>))
        .route("/{notification}/read", patch(notifications::mark_read::<S>));

    Router::new()
        .nest("/users", users)
        .nest("/notes", notes)
        .nest("/review", review)
        .nest("/notifications", notifications)
}
