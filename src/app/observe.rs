//! Single-subscription observe support (RFC 7641).
//!
//! An observable resource remembers at most one observer at a time: a newer registration
//! replaces the previous one.  Notifications are only ever sent when the host asks for them
//! through [`crate::CoapServer::notify`].

use std::fmt::Debug;

use coap_lite::ObserveOption;
use log::debug;
use rand::RngCore;

use crate::app::u24::u24;
use crate::app::{Method, Request, Status};

#[derive(Debug, Clone)]
pub(crate) struct Subscription<Endpoint> {
    pub peer: Endpoint,
    pub token: Vec<u8>,
    pub sequence: u24,
    /// Message ID of the most recent notification, so that a Reset from the peer can be
    /// matched back to this subscription.
    pub last_message_id: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegistrationEvent {
    NoChange,
    Registered(u24),
    Unregistered,
}

#[derive(Debug)]
pub(crate) struct ObserveHandler<Endpoint> {
    subscription: Option<Subscription<Endpoint>>,
}

impl<Endpoint: Debug + Clone + PartialEq> ObserveHandler<Endpoint> {
    pub fn new() -> Self {
        Self { subscription: None }
    }

    pub fn subscriber(&self) -> Option<&Subscription<Endpoint>> {
        self.subscription.as_ref()
    }

    /// Inspect a GET request and the status its handler produced, updating the subscription
    /// accordingly.  Only successful responses may establish a registration.
    pub fn maybe_process_registration(
        &mut self,
        request: &Request<Endpoint>,
        status: &Status,
    ) -> RegistrationEvent {
        if request.method() != Method::Get {
            return RegistrationEvent::NoChange;
        }
        let option = request
            .observe()
            .and_then(|value| usize::try_from(value).ok())
            .and_then(|value| ObserveOption::try_from(value).ok());
        match option {
            Some(ObserveOption::Register) if status.is_success() => {
                let sequence = match &self.subscription {
                    Some(existing) if self.is_same_observer(existing, request) => {
                        existing.sequence.wrapping_add(u24::from(1u8))
                    }
                    _ => random_sequence(),
                };
                debug!("Observe registered by {:?}", request.peer());
                self.subscription = Some(Subscription {
                    peer: request.peer().clone(),
                    token: request.token().to_vec(),
                    sequence,
                    last_message_id: None,
                });
                RegistrationEvent::Registered(sequence)
            }
            Some(ObserveOption::Deregister) => match &self.subscription {
                Some(existing) if self.is_same_observer(existing, request) => {
                    debug!("Observe deregistered by {:?}", request.peer());
                    self.subscription = None;
                    RegistrationEvent::Unregistered
                }
                _ => RegistrationEvent::NoChange,
            },
            _ => RegistrationEvent::NoChange,
        }
    }

    /// Advance the sequence number for a new notification sent with `message_id`.
    pub fn next_notification(&mut self, message_id: u16) -> Option<Subscription<Endpoint>> {
        let subscription = self.subscription.as_mut()?;
        subscription.sequence = subscription.sequence.wrapping_add(u24::from(1u8));
        subscription.last_message_id = Some(message_id);
        Some(subscription.clone())
    }

    pub fn clear(&mut self) {
        self.subscription = None;
    }

    /// Drop the subscription if `message_id` is the last notification sent to `peer`.
    pub fn cancel_by_reset(&mut self, peer: &Endpoint, message_id: u16) -> bool {
        let matches = self.subscription.as_ref().map_or(false, |s| {
            &s.peer == peer && s.last_message_id == Some(message_id)
        });
        if matches {
            self.subscription = None;
        }
        matches
    }

    fn is_same_observer(
        &self,
        existing: &Subscription<Endpoint>,
        request: &Request<Endpoint>,
    ) -> bool {
        &existing.peer == request.peer() && existing.token == request.token()
    }
}

fn random_sequence() -> u24 {
    let mut u24_bytes = [0u8; 3];
    rand::thread_rng().fill_bytes(&mut u24_bytes);
    u24::from_le_bytes(u24_bytes)
}

#[cfg(test)]
mod tests {
    use coap_lite::MessageType;

    use super::*;

    fn get(peer: u8, token: &[u8], observe: Option<u32>) -> Request<u8> {
        Request {
            method: Method::Get,
            path: "LED".to_string(),
            payload: Vec::new(),
            message_id: 1,
            message_type: MessageType::Confirmable,
            token: token.to_vec(),
            content_format: None,
            queries: Vec::new(),
            observe,
            peer,
        }
    }

    #[test]
    fn test_register_and_deregister() {
        let mut handler = ObserveHandler::new();
        let event = handler.maybe_process_registration(&get(1, b"t1", Some(0)), &Status::ok("On"));
        assert!(matches!(event, RegistrationEvent::Registered(_)));
        assert_eq!(handler.subscriber().unwrap().peer, 1);

        // Deregistration from a different token is not ours to honor.
        let event = handler.maybe_process_registration(&get(1, b"xx", Some(1)), &Status::ok("On"));
        assert_eq!(event, RegistrationEvent::NoChange);

        let event = handler.maybe_process_registration(&get(1, b"t1", Some(1)), &Status::ok("On"));
        assert_eq!(event, RegistrationEvent::Unregistered);
        assert!(handler.subscriber().is_none());
    }

    #[test]
    fn test_failed_get_does_not_register() {
        let mut handler = ObserveHandler::new();
        let event =
            handler.maybe_process_registration(&get(1, b"t1", Some(0)), &Status::bad_request());
        assert_eq!(event, RegistrationEvent::NoChange);
        assert!(handler.subscriber().is_none());
    }

    #[test]
    fn test_other_observe_values_are_ignored() {
        let mut handler = ObserveHandler::new();
        for value in [2, 0x00ff_ffff, u32::MAX] {
            let event =
                handler.maybe_process_registration(&get(1, b"t1", Some(value)), &Status::ok(""));
            assert_eq!(event, RegistrationEvent::NoChange);
        }
        assert!(handler.subscriber().is_none());
    }

    #[test]
    fn test_newer_observer_replaces_older() {
        let mut handler = ObserveHandler::new();
        handler.maybe_process_registration(&get(1, b"a", Some(0)), &Status::ok(""));
        handler.maybe_process_registration(&get(2, b"b", Some(0)), &Status::ok(""));
        assert_eq!(handler.subscriber().unwrap().peer, 2);
    }

    #[test]
    fn test_notifications_advance_sequence_and_reset_cancels() {
        let mut handler = ObserveHandler::new();
        let initial = match handler.maybe_process_registration(&get(1, b"a", Some(0)), &Status::ok(""))
        {
            RegistrationEvent::Registered(seq) => seq,
            other => panic!("unexpected {other:?}"),
        };
        let sub = handler.next_notification(42).unwrap();
        assert_eq!(sub.sequence, initial.wrapping_add(u24::from(1u8)));

        assert!(!handler.cancel_by_reset(&1, 41));
        assert!(!handler.cancel_by_reset(&2, 42));
        assert!(handler.cancel_by_reset(&1, 42));
        assert!(handler.next_notification(43).is_none());
    }
}
