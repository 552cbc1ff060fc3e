//! Single-task event loop that owns a [`Controller`].
//!
//! Intents arrive over an mpsc channel; the loop sleeps until either the
//! next intent or the coalescer's next deadline, whichever comes first.

use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use super::controller::Controller;
use super::intent::Intent;
use super::view::NoteView;
use crate::error::{Result, StickiesError};
use crate::storage::KeyValueStore;

/// Drive `controller` until `intents` closes, then let outstanding quiet
/// windows run out and hand the controller back.
///
/// A `NoteNotFound`, from an intent or a coalesced write, ends the loop with
/// that error; other rejections are logged and skipped.
pub async fn run<S, V>(
    mut controller: Controller<S, V>,
    mut intents: mpsc::Receiver<Intent>,
) -> Result<Controller<S, V>>
where
    S: KeyValueStore,
    V: NoteView,
{
    loop {
        let deadline = controller.next_deadline();
        tokio::select! {
            intent = intents.recv() => match intent {
                Some(intent) => dispatch(&mut controller, intent)?,
                None => break,
            },
            _ = sleep_until(deadline) => flush_due(&mut controller)?,
        }
    }

    while let Some(deadline) = controller.next_deadline() {
        time::sleep_until(deadline).await;
        flush_due(&mut controller)?;
    }
    tracing::debug!("intent channel closed; pending writes drained");
    Ok(controller)
}

fn dispatch<S, V>(controller: &mut Controller<S, V>, intent: Intent) -> Result<()>
where
    S: KeyValueStore,
    V: NoteView,
{
    match controller.handle(intent) {
        Ok(()) => Ok(()),
        Err(e) => triage(e),
    }
}

/// Apply every due write; the first fatal rejection is returned once the
/// whole batch has run.
fn flush_due<S, V>(controller: &mut Controller<S, V>) -> Result<()>
where
    S: KeyValueStore,
    V: NoteView,
{
    let report = controller.flush_due(Instant::now());
    let mut fatal = None;
    for (id, e) in report.rejected {
        tracing::debug!(id, "coalesced change rejected");
        if let Err(e) = triage(e) {
            fatal.get_or_insert(e);
        }
    }
    fatal.map_or(Ok(()), Err)
}

fn triage(e: StickiesError) -> Result<()> {
    match e {
        StickiesError::NoteNotFound(_) => {
            tracing::error!(error = %e, "view referenced a note that does not exist");
            Err(e)
        }
        e => {
            tracing::warn!(error = %e, "change rejected");
            Ok(())
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
