//! Read-only projections of the session state

use crate::session::SessionState;
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Stream a selected field: the current value first, then each change.
///
/// Snapshots that leave the field untouched produce nothing. A lagging
/// receiver skips straight to newer snapshots.
pub fn project<T, F>(
    initial: &SessionState,
    updates: broadcast::Receiver<Arc<SessionState>>,
    select: F,
) -> impl Stream<Item = T> + Send + 'static
where
    T: Clone + PartialEq + Send + 'static,
    F: Fn(&SessionState) -> T + Send + 'static,
{
    let first = select(initial);
    let updates = Box::pin(BroadcastStream::new(updates));

    let changes = stream::unfold(
        (updates, first.clone(), select),
        |(mut updates, mut last, select)| async move {
            while let Some(next) = updates.next().await {
                let Ok(snapshot) = next else { continue };
                let value = select(snapshot.as_ref());
                if value != last {
                    last = value.clone();
                    return Some((value, (updates, last, select)));
                }
            }
            None
        },
    );

    stream::once(async move { first }).chain(changes)
}
