use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Sender;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::events::InputEvent;

/// Headless stand-in for a user scrolling: one `Scroll { dy: step }` per tick.
pub async fn run(
    step: f32,
    every: Duration,
    to_viewer: Sender<InputEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut ticks = interval(every);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // first tick completes immediately
    ticks.tick().await;

    loop {
        select! {
            _ = cancel.cancelled() => break,
            _ = ticks.tick() => {
                if to_viewer.send(InputEvent::Scroll { dy: step }).await.is_err() {
                    debug!("viewer gone; stopping autoscroll");
                    break;
                }
            }
        }
    }
    Ok(())
}
