use std::sync::Arc;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::events::{BatchRendered, LoadMore, ViewEvent};
use crate::feed::{GalleryFeed, PhotoApi, QuerySource};
use crate::pagination::{PageStrategy, PageTicket, PaginationController};
use crate::photo::PhotoPage;

/// Owns the controller; turns `LoadMore` triggers into at most one fetch at a time.
///
/// Triggers that arrive while a fetch is in flight are dropped, not queued.
/// The guard stays held after a page settles until the viewer acknowledges
/// the batch on `rendered`, so a trigger computed against the old grid is
/// dropped too. If the ack channel closes the guard is released right away.
pub async fn run<A, S, Q>(
    mut controller: PaginationController<S>,
    feed: Arc<GalleryFeed<A>>,
    query: Q,
    mut triggers: Receiver<LoadMore>,
    mut rendered: UnboundedReceiver<BatchRendered>,
    mut to_viewer: UnboundedSender<ViewEvent>,
    cancel: CancellationToken,
) -> Result<()>
where
    A: PhotoApi + 'static,
    S: PageStrategy,
    Q: QuerySource,
{
    let mut in_flight: JoinSet<(PageTicket, Option<PhotoPage>)> = JoinSet::new();
    let mut triggers_open = true;
    let mut rendered_open = true;

    info!(strategy = controller.strategy().name(), "pagination task started");
    loop {
        select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("cancel received; exiting pagination task");
                break;
            }

            Some(joined) = in_flight.join_next() => {
                match joined {
                    Ok((ticket, result)) => {
                        controller.settle(&ticket, result, &mut to_viewer);
                    }
                    Err(err) => {
                        error!("fetch task failed: {err}");
                        controller.abandon(&mut to_viewer);
                    }
                }
                if !rendered_open {
                    controller.release();
                }
            }

            ack = rendered.recv(), if rendered_open && controller.is_settled() => {
                if ack.is_none() {
                    debug!("render acks closed; releasing without them");
                    rendered_open = false;
                }
                if controller.release() {
                    debug!(page = controller.state().current_page, "batch rendered; guard released");
                }
            }

            maybe = triggers.recv(), if triggers_open => match maybe {
                Some(LoadMore { source }) => {
                    let term = query.search_term();
                    match controller.begin(term.as_deref(), &mut to_viewer) {
                        Some(ticket) => {
                            debug!(?source, page = ticket.page, "starting fetch");
                            let feed = Arc::clone(&feed);
                            in_flight.spawn(async move {
                                let result = feed
                                    .fetch_page(ticket.page, ticket.page_size, ticket.query.as_deref())
                                    .await;
                                (ticket, result)
                            });
                        }
                        None => debug!(?source, "trigger ignored while loading"),
                    }
                }
                None => triggers_open = false,
            },
        }

        if !triggers_open && in_flight.is_empty() {
            debug!("trigger channel closed; exiting pagination task");
            break;
        }
    }

    in_flight.shutdown().await;
    Ok(())
}
