use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tracing::debug;
use tracing::info;

use crate::constants::CURRENT_SESSION_PATH;
use crate::ObjectRef;
use crate::SnapshotFetcher;

/// Decides whether the session behind the monitor can still serve requests.
///
/// A negative verdict is sticky: once the session is seen dead the probe
/// answers `false` forever without touching the service again.
pub struct LivenessProbe {
    fetcher: SnapshotFetcher,
    session_manager: ObjectRef,
    alive: AtomicBool,
}

impl LivenessProbe {
    pub fn new(
        fetcher: SnapshotFetcher,
        session_manager: ObjectRef,
    ) -> Self {
        Self {
            fetcher,
            session_manager,
            alive: AtomicBool::new(true),
        }
    }

    /// Queries the session manager's `currentSession`. Any failure, including
    /// a missing session, marks the probe dead.
    pub async fn is_alive(&self) -> bool {
        if !self.alive.load(Ordering::Acquire) {
            return false;
        }

        match self
            .fetcher
            .get_property(&self.session_manager, Some(CURRENT_SESSION_PATH))
            .await
        {
            Ok(Some(tree))
                if tree
                    .get(CURRENT_SESSION_PATH)
                    .is_some_and(|session| !session.is_null()) =>
            {
                debug!("is_alive: current session present");
            }
            Ok(_) => {
                info!("is_alive: Current session no longer exists.");
                self.mark_dead();
            }
            Err(e) => {
                info!("is_alive: Could not access connection - {}", e);
                self.mark_dead();
            }
        }

        // A concurrent probe may have failed meanwhile; never report it alive again.
        self.alive.load(Ordering::Acquire)
    }

    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Last verdict without probing.
    pub fn is_known_dead(&self) -> bool {
        !self.alive.load(Ordering::Acquire)
    }
}
