use axum::{
    extract::{Extension, Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::api::state::AppState;
use crate::auth::AuthUser;
use crate::domain::KanbanError;
use crate::services::access::Access;
use crate::services::view_cache::BoardEvent;

/// Streams invalidation events for one board as server-sent events.
pub async fn board_events(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(board_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, KanbanError> {
    let db = state.require_db()?;
    Access::require_board(db, &board_id, &user).await?;

    let stream = BroadcastStream::new(state.views.subscribe());

    let event_stream = stream.filter_map(move |result| {
        // lagged receivers skip ahead
        let payload = result.ok()?;
        let event: BoardEvent = serde_json::from_str(&payload).ok()?;
        (event.board_id() == board_id).then(|| Ok(Event::default().data(payload)))
    });

    Ok(Sse::new(event_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
