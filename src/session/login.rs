use std::time::Duration;

use tokio::time::sleep;

use crate::browser::surface::BrowserError;
use crate::domain::SessionState;
use crate::infrastructure::supervisor::Interrupt;
use crate::session::detector::SessionStateDetector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginWaitOutcome {
    Authenticated,
    Cancelled,
}

/// Suspends the automated flow until a human completes authentication in
/// the driven browser. Deliberately unbounded: the wait is human-paced, so
/// the only exits are the detector observing a logged-in session or the
/// supervisor cancelling. Callers that need a deadline wrap this in their
/// own timeout.
pub async fn wait_for_manual_login(
    detector: &SessionStateDetector,
    interrupt: &mut Interrupt,
    poll_interval: Duration,
    nudge_every: u32,
) -> Result<LoginWaitOutcome, BrowserError> {
    if interrupt.is_cancelled() {
        return Ok(LoginWaitOutcome::Cancelled);
    }

    tracing::info!(
        target: "session",
        "waiting for manual login in the driven browser (scan the QR code or sign in)"
    );

    let mut polls: u32 = 0;
    loop {
        tokio::select! {
            _ = sleep(poll_interval) => {}
            _ = interrupt.cancelled() => {
                tracing::info!(target: "session", "login wait cancelled by supervisor");
                return Ok(LoginWaitOutcome::Cancelled);
            }
        }

        polls += 1;
        match detector.check().await? {
            SessionState::LoggedIn => {
                tracing::info!(target: "session", "manual login completed, session restored");
                return Ok(LoginWaitOutcome::Authenticated);
            }
            state => {
                if nudge_every > 0 && polls % nudge_every == 0 {
                    tracing::info!(
                        target: "session",
                        ?state,
                        waited_secs = polls as u64 * poll_interval.as_secs(),
                        "still waiting for manual login"
                    );
                }
            }
        }
    }
}
