//! ACTIVATE APPLET (`INS=0x44`, `§4.10`, ADDED).

use crate::error::Error;
use crate::keystore::{KeyStore, Lifecycle};
use crate::session::Session;

/// `INS=0x44`: transitions the card from `Creation`/`Initialization` to `Operational`. No body
/// permitted; invalidates the security environment on success, same as a reset (`§4.10`).
pub fn activate_applet(session: &mut Session, store: &mut dyn KeyStore, data: &[u8]) -> Result<(), Error> {
    if !data.is_empty() {
        return Err(Error::LcLeInconsistent);
    }

    match store.lifecycle()? {
        Lifecycle::Creation | Lifecycle::Initialization => {
            store.set_lifecycle(Lifecycle::Operational)?;
            session.invalidate();
            log::debug!("applet activated");
            Ok(())
        }
        Lifecycle::Operational | Lifecycle::Terminated => Err(Error::ConditionsNotSatisfied),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::FileKeyStore;

    #[test]
    fn activates_from_creation() {
        let mut session = Session::new();
        let mut store = FileKeyStore::new();
        activate_applet(&mut session, &mut store, &[]).unwrap();
        assert_eq!(store.lifecycle().unwrap(), Lifecycle::Operational);
    }

    #[test]
    fn rejects_nonempty_body() {
        let mut session = Session::new();
        let mut store = FileKeyStore::new();
        assert!(matches!(
            activate_applet(&mut session, &mut store, &[0x00]),
            Err(Error::LcLeInconsistent)
        ));
    }

    #[test]
    fn rejects_reactivation_when_already_operational() {
        let mut session = Session::new();
        let mut store = FileKeyStore::new();
        store.set_lifecycle(Lifecycle::Operational).unwrap();
        assert!(matches!(
            activate_applet(&mut session, &mut store, &[]),
            Err(Error::ConditionsNotSatisfied)
        ));
    }
}
