use crate::events::PresentationEvent;
use async_channel::Receiver;

/// Headless presenter: writes every presentation event to the log.
pub async fn log_presentation(rx: Receiver<PresentationEvent>) {
    while let Ok(event) = rx.recv().await {
        match event {
            PresentationEvent::Layout(cards) => {
                log::debug!("Layout: {} cards", cards.len());
                for (i, card) in cards.iter().enumerate() {
                    let p = card.position;
                    log::trace!(
                        "  card {:>2} at ({:7.1}, {:7.1}, {:7.1}) x{:.2}",
                        i,
                        p.x,
                        p.y,
                        p.z,
                        card.scale
                    );
                }
            }
            PresentationEvent::Rotation(r) => log::trace!("Rotation {:.1}° / {:.1}°", r.x, r.y),
            PresentationEvent::Highlight(Some(i)) => log::trace!("Highlight {}", i),
            PresentationEvent::Highlight(None) => log::trace!("Highlight cleared"),
            PresentationEvent::Settled { index, display_id } => {
                log::info!("Winner: slot {} (card {})", index, display_id)
            }
            PresentationEvent::SpinRejected => log::warn!("A spin is already in progress"),
            PresentationEvent::SpinFailed { reason } => {
                log::warn!("{} (you can try again with a new code)", reason)
            }
            PresentationEvent::Verified { code, verification } => {
                match (verification.is_winner, &verification.prize_name) {
                    (true, Some(name)) => log::info!("Code '{}' won {}", code, name),
                    (true, None) => log::info!("Code '{}' won a prize", code),
                    (false, _) => log::info!("Code '{}' did not win", code),
                }
                if let Some(description) = &verification.prize_description {
                    log::debug!("  {}", description);
                }
                if let Some(message) = &verification.message {
                    log::debug!("  {}", message);
                }
            }
            PresentationEvent::VerifyFailed { code, reason } => {
                log::warn!("Could not verify '{}': {}", code, reason)
            }
        }
    }
}
