// Session provider seam.

use crate::model::Identity;

/// Supplies the current authenticated identity.
///
/// `None` (never logged in) and `Some` with `person_props == false`
/// (logged in, setup pending) are distinct states for screen selection.
pub trait SessionProvider {
    fn current_identity(&self) -> Option<Identity>;
}

/// A fixed identity, for hosts that already resolved one.
impl SessionProvider for Option<Identity> {
    fn current_identity(&self) -> Option<Identity> {
        self.clone()
    }
}
