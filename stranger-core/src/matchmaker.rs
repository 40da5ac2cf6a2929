use crossbeam::channel::unbounded;
use log::{debug, error, info};
use parking_lot::Mutex;
use thiserror::Error;

use crate::{
    Clock, Config, Delivery, EventReceiver, EventSender, JoinRequest, LocalClock, Member,
    QueueEntry, Rejection, RoomError, RoomId, RoomRegistry, SessionEvent, SessionId, UsageLedger,
    WaitingQueue,
};

/// The matchmaking engine. Pairs waiting sessions, relays their messages,
/// and tears rooms down again.
///
/// All state sits behind one lock that every operation holds from start to
/// finish, so an operation touching the ledger, the queue and the rooms is
/// observed as a single step.
pub struct Matchmaker<C = LocalClock> {
    config: Config,
    clock: C,
    state: Mutex<State>,

    event_sender: EventSender,
    event_receiver: EventReceiver,
}

struct State {
    queue: WaitingQueue,
    ledger: UsageLedger,
    rooms: RoomRegistry,
}

/// What happened to a join attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A partner was waiting and a room was created.
    Matched(RoomId),
    /// No compatible partner, the session is now waiting.
    Queued,
    /// The attempt was refused and nothing was queued.
    Rejected(Rejection),
}

/// What happened to a relayed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    /// The room is gone or the sender is not in it.
    Dropped,
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Could not create room: {0}")]
    Room(#[from] RoomError),
}

impl Matchmaker<LocalClock> {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, LocalClock)
    }
}

impl<C> Matchmaker<C>
where
    C: Clock,
{
    pub fn with_clock(config: Config, clock: C) -> Self {
        let (event_sender, event_receiver) = unbounded();

        let state = State {
            queue: Default::default(),
            ledger: UsageLedger::new(config.daily_filter_limit),
            rooms: Default::default(),
        };

        Self {
            config,
            clock,
            state: Mutex::new(state),
            event_sender,
            event_receiver,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a receiver for events addressed to sessions.
    pub fn events(&self) -> EventReceiver {
        self.event_receiver.clone()
    }

    /// Starts a search for a partner. Any room or search the session
    /// already has is abandoned first.
    pub fn join_queue(
        &self,
        session_id: SessionId,
        request: JoinRequest,
    ) -> Result<JoinOutcome, MatchError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        self.leave_locked(state, session_id);
        state.queue.remove(session_id);

        if !request.gender_filter.is_any() {
            let today = self.clock.today();

            if !state.ledger.check_and_consume(&request.device_id, today) {
                info!(
                    "Device {} hit the daily limit of {} filtered searches",
                    request.device_id, self.config.daily_filter_limit
                );

                self.emit(
                    session_id,
                    SessionEvent::Rejected {
                        reason: Rejection::DailyLimitReached,
                        message: self.config.limit_reached_notice(),
                    },
                );

                return Ok(JoinOutcome::Rejected(Rejection::DailyLimitReached));
            }

            info!(
                "Device {} usage: {}/{}",
                request.device_id,
                state.ledger.usage(&request.device_id, today),
                self.config.daily_filter_limit
            );
        }

        info!(
            "{} ({}) joined. Looking for: {}",
            request.nickname, request.gender, request.gender_filter
        );

        let entry = QueueEntry::new(session_id, &request);

        let Some(partner) = state.queue.take_first_match(&entry) else {
            state.queue.push(entry);
            return Ok(JoinOutcome::Queued);
        };

        let requester = Member {
            session_id,
            nickname: request.nickname,
        };
        let partner_member = Member {
            session_id: partner.session_id,
            nickname: partner.nickname.clone(),
        };

        let room_id = match state.rooms.create(requester, partner_member) {
            Ok(room) => room.id().clone(),
            Err(err) => {
                error!("Refusing to pair {} with {}: {}", session_id, partner.session_id, err);
                state.queue.restore(partner);

                return Err(err.into());
            }
        };

        for member in [session_id, partner.session_id] {
            self.emit(
                member,
                SessionEvent::MatchFound {
                    room_id: room_id.clone(),
                },
            );
        }

        info!("Match Created: {}", room_id);
        Ok(JoinOutcome::Matched(room_id))
    }

    /// Relays a message to the sender's partner in the given room.
    pub fn send_message(
        &self,
        session_id: SessionId,
        room_id: &RoomId,
        message: String,
    ) -> RelayOutcome {
        let state = self.state.lock();

        let Some(room) = state.rooms.get(room_id) else {
            debug!("Dropped message from {} to missing room {}", session_id, room_id);
            return RelayOutcome::Dropped;
        };

        let (Some(sender), Some(partner)) = (room.member(session_id), room.partner_of(session_id))
        else {
            debug!("Dropped message from {} outside of room {}", session_id, room_id);
            return RelayOutcome::Dropped;
        };

        self.emit(
            partner.session_id,
            SessionEvent::Chat {
                sender: sender.nickname.clone(),
                message,
            },
        );

        RelayOutcome::Delivered
    }

    /// Leaves the session's room, if any. The session is not queued again.
    pub fn leave_room(&self, session_id: SessionId) -> bool {
        let mut state = self.state.lock();
        self.leave_locked(&mut state, session_id)
    }

    /// Leaves the session's room and abandons its search, if either exists.
    pub fn leave(&self, session_id: SessionId) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let left_room = self.leave_locked(state, session_id);
        let left_queue = state.queue.remove(session_id);

        if left_queue {
            info!("User {} stopped searching", session_id);
        }

        left_room || left_queue
    }

    /// Leaves the room because the partner was reported.
    pub fn report_user(&self, session_id: SessionId) -> bool {
        let mut state = self.state.lock();

        info!("User {} reported their partner.", session_id);
        self.leave_locked(&mut state, session_id)
    }

    /// Removes every trace of the session. Called when its connection ends.
    pub fn disconnect(&self, session_id: SessionId) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        self.leave_locked(state, session_id);
        state.queue.remove(session_id);

        info!("User Disconnected {}", session_id);
    }

    /// Drops usage records from previous days, returning how many were dropped.
    pub fn evict_stale_usage(&self) -> usize {
        let today = self.clock.today();
        self.state.lock().ledger.evict_stale(today)
    }

    /// Returns the room the session is in, if any
    pub fn room_of(&self, session_id: SessionId) -> Option<RoomId> {
        self.state
            .lock()
            .rooms
            .room_of(session_id)
            .map(|r| r.id().clone())
    }

    pub fn is_waiting(&self, session_id: SessionId) -> bool {
        self.state.lock().queue.contains(session_id)
    }

    /// Returns how many filtered searches the device started today.
    pub fn usage(&self, device_id: &str) -> u32 {
        let today = self.clock.today();
        self.state.lock().ledger.usage(device_id, today)
    }

    pub fn waiting_count(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn room_count(&self) -> usize {
        self.state.lock().rooms.len()
    }

    fn leave_locked(&self, state: &mut State, session_id: SessionId) -> bool {
        let Some(room) = state.rooms.remove_by_member(session_id) else {
            return false;
        };

        let partner = room
            .partner_of(session_id)
            .expect("room contains the leaving session");

        self.emit(
            partner.session_id,
            SessionEvent::System {
                message: Config::PARTNER_LEFT_NOTICE.to_string(),
            },
        );
        self.emit(partner.session_id, SessionEvent::PartnerLeft);

        info!("User {} left room {}", session_id, room.id());
        true
    }

    fn emit(&self, to: SessionId, event: SessionEvent) {
        self.event_sender
            .send(Delivery { to, event })
            .expect("event is sent");
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, thread};

    use super::{JoinOutcome, Matchmaker, RelayOutcome};
    use crate::{
        util::mock::ManualClock, Config, Delivery, GenderFilter, JoinRequest, Rejection,
        SessionEvent, SessionId,
    };

    fn matchmaker() -> (Matchmaker<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (Matchmaker::with_clock(Config::default(), clock.clone()), clock)
    }

    fn request(nickname: &str, gender: &str, filter: &str) -> JoinRequest {
        JoinRequest {
            nickname: nickname.to_string(),
            gender: gender.to_string(),
            gender_filter: GenderFilter::from(filter),
            device_id: format!("dev_{nickname}"),
        }
    }

    fn drain<C: crate::Clock>(matchmaker: &Matchmaker<C>) -> Vec<Delivery> {
        matchmaker.events().try_iter().collect()
    }

    fn events_for(deliveries: &[Delivery], session: SessionId) -> Vec<SessionEvent> {
        deliveries
            .iter()
            .filter(|d| d.to == session)
            .map(|d| d.event.clone())
            .collect()
    }

    #[test]
    fn end_to_end() {
        let (mm, _) = matchmaker();
        let (a, b) = (SessionId::new(), SessionId::new());

        let outcome = mm.join_queue(a, request("alice", "M", "Any")).unwrap();
        assert_eq!(outcome, JoinOutcome::Queued);
        assert!(mm.is_waiting(a));

        let outcome = mm.join_queue(b, request("bob", "F", "M")).unwrap();
        let JoinOutcome::Matched(room_id) = outcome else {
            panic!("expected a match, got {outcome:?}");
        };

        let events = drain(&mm);
        let found = SessionEvent::MatchFound {
            room_id: room_id.clone(),
        };
        assert_eq!(events_for(&events, a), vec![found.clone()]);
        assert_eq!(events_for(&events, b), vec![found]);
        assert_eq!(mm.waiting_count(), 0);

        let relayed = mm.send_message(b, &room_id, "hi".to_string());
        assert_eq!(relayed, RelayOutcome::Delivered);

        let events = drain(&mm);
        assert_eq!(
            events,
            vec![Delivery {
                to: a,
                event: SessionEvent::Chat {
                    sender: "bob".to_string(),
                    message: "hi".to_string(),
                },
            }]
        );

        mm.disconnect(a);

        let events = drain(&mm);
        assert_eq!(
            events_for(&events, b),
            vec![
                SessionEvent::System {
                    message: Config::PARTNER_LEFT_NOTICE.to_string()
                },
                SessionEvent::PartnerLeft
            ]
        );
        assert!(events_for(&events, a).is_empty());
        assert_eq!(mm.room_count(), 0);
        assert_eq!(mm.room_of(b), None);
    }

    #[test]
    fn rejoining_keeps_a_single_entry() {
        let (mm, _) = matchmaker();
        let a = SessionId::new();

        for _ in 0..3 {
            mm.join_queue(a, request("alice", "M", "F")).unwrap();
        }

        assert_eq!(mm.waiting_count(), 1);
        assert!(drain(&mm).is_empty());
    }

    #[test]
    fn rejoining_from_a_room_tears_it_down() {
        let (mm, _) = matchmaker();
        let (a, b) = (SessionId::new(), SessionId::new());

        mm.join_queue(a, request("alice", "M", "Any")).unwrap();
        mm.join_queue(b, request("bob", "F", "Any")).unwrap();
        drain(&mm);

        let outcome = mm.join_queue(a, request("alice", "M", "Any")).unwrap();

        assert_eq!(outcome, JoinOutcome::Queued);
        assert_eq!(mm.room_count(), 0);
        assert!(!mm.is_waiting(b));

        let events = drain(&mm);
        assert!(events_for(&events, b).contains(&SessionEvent::PartnerLeft));
    }

    #[test]
    fn matching_requires_both_filters() {
        let pairs = [
            (("M", "F"), ("F", "M"), true),
            (("M", "F"), ("M", "Any"), false),
            (("M", "Any"), ("F", "F"), false),
            (("M", "Any"), ("F", "Any"), true),
            (("F", "F"), ("F", "F"), true),
        ];

        for ((g1, f1), (g2, f2), expected) in pairs {
            // The order of joining must not matter
            for swap in [false, true] {
                let (mm, _) = matchmaker();
                let (first, second) = if swap {
                    (request("two", g2, f2), request("one", g1, f1))
                } else {
                    (request("one", g1, f1), request("two", g2, f2))
                };

                mm.join_queue(SessionId::new(), first).unwrap();
                let outcome = mm.join_queue(SessionId::new(), second).unwrap();

                assert_eq!(
                    matches!(outcome, JoinOutcome::Matched(_)),
                    expected,
                    "{g1}/{f1} with {g2}/{f2}, swapped: {swap}"
                );
            }
        }
    }

    #[test]
    fn oldest_compatible_entry_wins() {
        let (mm, _) = matchmaker();
        let (q1, q2, r) = (SessionId::new(), SessionId::new(), SessionId::new());

        // Both want a partner of gender F, so they cannot pair with each other
        mm.join_queue(q1, request("q1", "M", "F")).unwrap();
        mm.join_queue(q2, request("q2", "M", "F")).unwrap();
        assert_eq!(mm.waiting_count(), 2);

        let outcome = mm.join_queue(r, request("r", "F", "Any")).unwrap();

        let JoinOutcome::Matched(room_id) = outcome else {
            panic!("expected a match, got {outcome:?}");
        };
        assert_eq!(mm.room_of(q1), Some(room_id.clone()));
        assert_eq!(mm.room_of(r), Some(room_id));
        assert!(mm.is_waiting(q2));
        assert_eq!(mm.room_of(q2), None);
    }

    #[test]
    fn filtered_searches_are_limited_per_day() {
        let (mm, clock) = matchmaker();
        let a = SessionId::new();

        for _ in 0..10 {
            let outcome = mm.join_queue(a, request("alice", "M", "F")).unwrap();
            assert_eq!(outcome, JoinOutcome::Queued);
        }

        let outcome = mm.join_queue(a, request("alice", "M", "F")).unwrap();
        assert_eq!(outcome, JoinOutcome::Rejected(Rejection::DailyLimitReached));
        assert_eq!(mm.usage("dev_alice"), 10);
        assert!(!mm.is_waiting(a));

        let events = drain(&mm);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].to, a);
        assert!(matches!(
            events[0].event,
            SessionEvent::Rejected {
                reason: Rejection::DailyLimitReached,
                ..
            }
        ));

        // Unfiltered searches are never counted
        let outcome = mm.join_queue(a, request("alice", "M", "Any")).unwrap();
        assert_eq!(outcome, JoinOutcome::Queued);
        assert_eq!(mm.usage("dev_alice"), 10);

        clock.advance_day();

        let outcome = mm.join_queue(a, request("alice", "M", "F")).unwrap();
        assert_eq!(outcome, JoinOutcome::Queued);
        assert_eq!(mm.usage("dev_alice"), 1);
    }

    #[test]
    fn rejected_join_still_leaves_the_room() {
        let config = Config {
            daily_filter_limit: 0,
            ..Default::default()
        };
        let mm = Matchmaker::with_clock(config, ManualClock::new());
        let (a, b) = (SessionId::new(), SessionId::new());

        mm.join_queue(a, request("alice", "M", "Any")).unwrap();
        mm.join_queue(b, request("bob", "F", "Any")).unwrap();

        let outcome = mm.join_queue(a, request("alice", "M", "F")).unwrap();

        assert_eq!(outcome, JoinOutcome::Rejected(Rejection::DailyLimitReached));
        assert_eq!(mm.room_count(), 0);
        assert_eq!(mm.waiting_count(), 0);
    }

    #[test]
    fn matched_sessions_cannot_be_matched_again() {
        let (mm, _) = matchmaker();
        let (a, b, c) = (SessionId::new(), SessionId::new(), SessionId::new());

        mm.join_queue(a, request("alice", "M", "Any")).unwrap();
        mm.join_queue(b, request("bob", "F", "Any")).unwrap();

        let outcome = mm.join_queue(c, request("carol", "F", "Any")).unwrap();

        assert_eq!(outcome, JoinOutcome::Queued);
        assert_eq!(mm.room_count(), 1);
    }

    #[test]
    fn disconnect_tears_down_exactly_once() {
        let (mm, _) = matchmaker();
        let (a, b) = (SessionId::new(), SessionId::new());

        mm.join_queue(a, request("alice", "M", "Any")).unwrap();
        mm.join_queue(b, request("bob", "F", "Any")).unwrap();
        drain(&mm);

        mm.disconnect(a);
        mm.disconnect(a);

        let events = drain(&mm);
        let partner_left = events_for(&events, b)
            .into_iter()
            .filter(|e| *e == SessionEvent::PartnerLeft)
            .count();

        assert_eq!(partner_left, 1);
        assert_eq!(mm.room_count(), 0);
        assert!(!mm.is_waiting(a));
        assert!(!mm.is_waiting(b));
    }

    #[test]
    fn disconnect_removes_waiting_session() {
        let (mm, _) = matchmaker();
        let a = SessionId::new();

        mm.join_queue(a, request("alice", "M", "Any")).unwrap();
        mm.disconnect(a);

        assert_eq!(mm.waiting_count(), 0);
        assert!(drain(&mm).is_empty());
    }

    #[test]
    fn relay_is_scoped_to_the_room() {
        let (mm, _) = matchmaker();
        let (a, b, c, d) = (
            SessionId::new(),
            SessionId::new(),
            SessionId::new(),
            SessionId::new(),
        );

        mm.join_queue(a, request("alice", "M", "M")).unwrap();
        mm.join_queue(b, request("bob", "M", "M")).unwrap();
        mm.join_queue(c, request("carol", "F", "F")).unwrap();
        mm.join_queue(d, request("dana", "F", "F")).unwrap();

        let room = mm.room_of(a).unwrap();
        drain(&mm);

        // Outsiders cannot speak into the room
        assert_eq!(
            mm.send_message(c, &room, "psst".to_string()),
            RelayOutcome::Dropped
        );
        assert!(drain(&mm).is_empty());

        assert_eq!(
            mm.send_message(a, &room, "hello".to_string()),
            RelayOutcome::Delivered
        );

        let events = drain(&mm);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].to, b);
    }

    #[test]
    fn relay_to_a_stale_room_is_dropped() {
        let (mm, _) = matchmaker();
        let (a, b) = (SessionId::new(), SessionId::new());

        mm.join_queue(a, request("alice", "M", "Any")).unwrap();
        mm.join_queue(b, request("bob", "F", "Any")).unwrap();

        let room = mm.room_of(a).unwrap();
        mm.leave_room(b);
        drain(&mm);

        assert_eq!(
            mm.send_message(a, &room, "anyone?".to_string()),
            RelayOutcome::Dropped
        );
        assert!(drain(&mm).is_empty());
    }

    #[test]
    fn report_behaves_like_leave() {
        let (mm, _) = matchmaker();
        let (a, b) = (SessionId::new(), SessionId::new());

        assert!(!mm.report_user(a));

        mm.join_queue(a, request("alice", "M", "Any")).unwrap();
        mm.join_queue(b, request("bob", "F", "Any")).unwrap();
        drain(&mm);

        assert!(mm.report_user(b));

        let events = drain(&mm);
        assert_eq!(events_for(&events, a).len(), 2);
        assert!(events_for(&events, b).is_empty());
        assert_eq!(mm.room_count(), 0);
        // Neither side is queued again
        assert_eq!(mm.waiting_count(), 0);
    }

    #[test]
    fn leave_also_cancels_a_search() {
        let (mm, _) = matchmaker();
        let (a, b, c) = (SessionId::new(), SessionId::new(), SessionId::new());

        assert!(!mm.leave(a));

        mm.join_queue(a, request("alice", "M", "Any")).unwrap();

        // Leaving a room keeps the search alive, leaving outright does not
        assert!(!mm.leave_room(a));
        assert!(mm.is_waiting(a));
        assert!(mm.leave(a));
        assert!(!mm.is_waiting(a));

        let outcome = mm.join_queue(b, request("bob", "F", "Any")).unwrap();
        assert_eq!(outcome, JoinOutcome::Queued);

        mm.join_queue(c, request("carol", "M", "Any")).unwrap();
        drain(&mm);

        assert!(mm.leave(b));
        assert_eq!(mm.room_count(), 0);
        assert_eq!(mm.waiting_count(), 0);

        let events = drain(&mm);
        assert!(events_for(&events, c).contains(&SessionEvent::PartnerLeft));
    }

    #[test]
    fn every_delivery_reaches_the_dispatcher() {
        let (mm, _) = matchmaker();
        let dispatcher = mm.events();
        let (a, b) = (SessionId::new(), SessionId::new());

        mm.join_queue(a, request("alice", "M", "Any")).unwrap();
        mm.join_queue(b, request("bob", "F", "Any")).unwrap();

        let seen: Vec<_> = dispatcher.try_iter().map(|d| d.to).collect();
        assert_eq!(seen, vec![b, a]);
    }

    #[test]
    fn stale_usage_is_evicted() {
        let (mm, clock) = matchmaker();

        mm.join_queue(SessionId::new(), request("alice", "M", "F"))
            .unwrap();
        assert_eq!(mm.evict_stale_usage(), 0);

        clock.advance_day();

        assert_eq!(mm.evict_stale_usage(), 1);
        assert_eq!(mm.usage("dev_alice"), 0);
    }

    #[test]
    fn concurrent_joins_respect_the_limit() {
        let (mm, _) = matchmaker();
        let mm = Arc::new(mm);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mm = mm.clone();

                thread::spawn(move || {
                    (0..5)
                        .filter(|_| {
                            let outcome = mm
                                .join_queue(SessionId::new(), request("shared", "M", "F"))
                                .unwrap();

                            !matches!(outcome, JoinOutcome::Rejected(_))
                        })
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(admitted, 10);
        assert_eq!(mm.usage("dev_shared"), 10);
    }
}
