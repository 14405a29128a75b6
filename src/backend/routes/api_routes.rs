/**
 * API Routes Configuration
 *
 * Every route under `/api` sits behind `auth_middleware`.
 *
 * # Boards
 * - `GET /api/boards`, `POST /api/boards`
 * - `GET|PATCH|DELETE /api/boards/{id}`
 *
 * # Lists
 * - `GET|POST /api/boards/{id}/lists`
 * - `PUT /api/boards/{id}/lists/reorder`
 * - `PATCH|DELETE /api/lists/{id}`
 *
 * # Cards
 * - `GET|POST /api/lists/{id}/cards`
 * - `PUT /api/lists/{id}/cards/reorder`
 * - `PATCH|DELETE /api/cards/{id}`
 * - `POST /api/cards/{id}/move`
 *
 * # Members
 * - `GET|POST /api/boards/{id}/members`
 * - `PATCH|DELETE /api/boards/{id}/members/{member_id}`
 */

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use crate::backend::handlers::{boards, cards, lists, members};
use crate::backend::middleware::auth_middleware;
use crate::backend::server::state::AppState;

/// Add the authenticated REST API to `router`
pub fn configure_api_routes(router: Router<AppState>, state: AppState) -> Router<AppState> {
    let api = Router::new()
        .route("/boards", get(boards::list_boards).post(boards::create_board))
        .route(
            "/boards/{id}",
            get(boards::get_board)
                .patch(boards::update_board)
                .delete(boards::delete_board),
        )
        .route(
            "/boards/{id}/lists",
            get(lists::list_lists).post(lists::create_list),
        )
        .route("/boards/{id}/lists/reorder", put(lists::reorder_lists))
        .route(
            "/lists/{id}",
            patch(lists::update_list).delete(lists::delete_list),
        )
        .route(
            "/lists/{id}/cards",
            get(cards::list_cards).post(cards::create_card),
        )
        .route("/lists/{id}/cards/reorder", put(cards::reorder_cards))
        .route(
            "/cards/{id}",
            patch(cards::update_card).delete(cards::delete_card),
        )
        .route("/cards/{id}/move", post(cards::move_card))
        .route(
            "/boards/{id}/members",
            get(members::list_members).post(members::add_member),
        )
        .route(
            "/boards/{id}/members/{member_id}",
            patch(members::update_member_role).delete(members::remove_member),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    router.nest("/api", api)
}
