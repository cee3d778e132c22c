//! Street change notifications.

use std::sync::mpsc::Sender;

use serde::Serialize;
use snow_removal_street_models::StreetSideId;

/// The resolved street side changed (`None` meaning no street).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreetChange {
    /// Street side before the update.
    pub old: Option<StreetSideId>,
    /// Street side after the update.
    pub new: Option<StreetSideId>,
}

/// Receives street changes from a [`crate::LocationResolver`].
///
/// Called synchronously, at most once per location update, and only when
/// the street side id actually changed.
pub trait StreetChangeListener: Send {
    fn on_street_change(&mut self, change: StreetChange);
}

impl<F> StreetChangeListener for F
where
    F: FnMut(StreetChange) + Send,
{
    fn on_street_change(&mut self, change: StreetChange) {
        self(change);
    }
}

impl StreetChangeListener for Sender<StreetChange> {
    fn on_street_change(&mut self, change: StreetChange) {
        if self.send(change).is_err() {
            log::debug!("Street change receiver dropped, discarding {change:?}");
        }
    }
}
