//! Snapshot point between the configuration surface and the mapping loop.
//!
//! The surface owns all writes, the loop reads a fresh snapshot every cycle.
//! Both sides use bounded try-lock retries so neither ever parks on the
//! other: under contention an operation fails with `LockTimeout` after
//! 5 attempts x 10ms, which the loop treats as a skipped cycle.

use super::Profile;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

const MAX_ATTEMPTS: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("could not acquire profile lock after maximum retry attempts")]
    LockTimeout,
}

/// Shared, consistently-readable profile.
#[derive(Debug)]
pub struct ProfilePortal {
    profile: RwLock<Profile>,
}

impl ProfilePortal {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile: RwLock::new(profile),
        }
    }

    /// Cloned snapshot of the current profile. Never observes a half-written
    /// update, the write side swaps whole profiles.
    pub fn snapshot(&self) -> Result<Profile, PortalError> {
        let mut attempts = 0;
        loop {
            match self.profile.try_read() {
                Ok(guard) => return Ok(guard.clone()),
                Err(e) => {
                    attempts += 1;
                    warn!("profile read blocked: {e} (attempt {attempts}/{MAX_ATTEMPTS})");
                    if attempts >= MAX_ATTEMPTS {
                        return Err(PortalError::LockTimeout);
                    }
                    std::thread::sleep(RETRY_DELAY);
                }
            }
        }
    }

    /// Publishes a new profile wholesale.
    pub fn replace(&self, profile: Profile) -> Result<(), PortalError> {
        let mut attempts = 0;
        loop {
            match self.profile.try_write() {
                Ok(mut guard) => {
                    *guard = profile;
                    return Ok(());
                }
                Err(e) => {
                    attempts += 1;
                    warn!("profile write blocked: {e} (attempt {attempts}/{MAX_ATTEMPTS})");
                    if attempts >= MAX_ATTEMPTS {
                        return Err(PortalError::LockTimeout);
                    }
                    std::thread::sleep(RETRY_DELAY);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PhysicalKey;
    use crate::profile::KeySlot;

    #[test]
    fn replace_is_visible_in_the_next_snapshot() {
        let portal = ProfilePortal::new(Profile::default());
        assert!(portal.snapshot().unwrap().a.is_unmapped());

        let mut edited = Profile::default();
        edited.a = KeySlot::bound(PhysicalKey::Char('j'));
        portal.replace(edited.clone()).unwrap();

        assert_eq!(portal.snapshot().unwrap(), edited);
    }
}
