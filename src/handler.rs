//! Application callback boundary.
//!
//! The engine dispatches decoded ASDUs to an [`OutstationHandler`]; the
//! handler runs to completion before the next inbound frame on that
//! connection is processed, so no reentrancy guard is needed inside a
//! callback. Replies collected through [`Replies`] are transmitted on the
//! same connection, ahead of queued data.

use std::net::SocketAddr;

use crate::types::{Asdu, Cp56Time2a};

/// ASDUs produced by a callback, transmitted in push order on the
/// connection that received the triggering frame.
#[derive(Debug, Default)]
pub struct Replies {
    asdus: Vec<Asdu>,
}

impl Replies {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add an ASDU to send.
    pub fn push(&mut self, asdu: Asdu) {
        self.asdus.push(asdu);
    }

    /// Number of collected replies.
    pub fn len(&self) -> usize {
        self.asdus.len()
    }

    /// Check if no replies were collected.
    pub fn is_empty(&self) -> bool {
        self.asdus.is_empty()
    }

    pub(crate) fn into_inner(self) -> Vec<Asdu> {
        self.asdus
    }
}

/// Station-specific application callbacks.
///
/// All methods have permissive defaults so a handler only implements what
/// its station supports; everything else is answered negatively by the
/// engine.
pub trait OutstationHandler: Send + Sync + 'static {
    /// Decide whether to accept a new connection from `peer`. Called
    /// before any protocol bytes are exchanged.
    fn connection_request(&self, peer: SocketAddr) -> bool {
        let _ = peer;
        true
    }

    /// Clock synchronization command (C_CS_NA_1). Return true to accept
    /// the new time; the engine sends the ACT_CON either way, negative on
    /// rejection.
    fn clock_sync(&self, peer: SocketAddr, time: &Cp56Time2a) -> bool {
        let _ = (peer, time);
        true
    }

    /// Interrogation command (C_IC_NA_1) with the qualifier of
    /// interrogation (20 = station interrogation, 21-36 = groups).
    ///
    /// Push the response ASDUs (cause `InterrogatedByStation` or the
    /// matching group cause) and return true; the engine wraps them in
    /// ACT_CON and ACT_TERM. Return false to reject with a negative
    /// ACT_CON.
    fn interrogation(&self, peer: SocketAddr, qoi: u8, replies: &mut Replies) -> bool {
        let _ = (peer, qoi, replies);
        false
    }

    /// Any other ASDU (commands, read requests, counter interrogations).
    ///
    /// Return true when the ASDU was handled; responses, if any, go
    /// through `replies`. An unhandled control-direction ASDU is mirrored
    /// back by the engine with cause `UnknownTypeId` and the negative
    /// flag.
    fn handle_asdu(&self, peer: SocketAddr, asdu: &Asdu, replies: &mut Replies) -> bool {
        let _ = (peer, asdu, replies);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AsduHeader, Cot, TypeId};

    struct DefaultHandler;
    impl OutstationHandler for DefaultHandler {}

    #[test]
    fn test_default_handler_behavior() {
        let handler = DefaultHandler;
        let peer: SocketAddr = "10.0.0.1:2404".parse().unwrap();

        assert!(handler.connection_request(peer));

        let time = Cp56Time2a {
            milliseconds: 0,
            minutes: 0,
            hours: 0,
            day: 1,
            day_of_week: 1,
            month: 1,
            year: 26,
            invalid: false,
            summer_time: false,
        };
        assert!(handler.clock_sync(peer, &time));

        let mut replies = Replies::new();
        assert!(!handler.interrogation(peer, 20, &mut replies));
        assert!(replies.is_empty());

        let asdu = Asdu::new(AsduHeader::new(TypeId::ReadCommand, Cot::Request, 1));
        assert!(!handler.handle_asdu(peer, &asdu, &mut replies));
    }

    #[test]
    fn test_replies_preserve_push_order() {
        let mut replies = Replies::new();
        replies.push(Asdu::interrogation_command(1, 20));
        replies.push(Asdu::interrogation_command(2, 21));
        assert_eq!(replies.len(), 2);

        let asdus = replies.into_inner();
        assert_eq!(asdus[0].header.common_address, 1);
        assert_eq!(asdus[1].header.common_address, 2);
    }
}
