//! Hall transitions
//!
//! ```text
//! FadingOut -> Destroying -> Constructing -> IntroPlaying | FadingIn -> done
//! ```
//!
//! Each phase starts only after the previous one finished. The fades and
//! the intro finish when their completion group reports; destroying and
//! constructing run synchronously inside one tick. The caller of
//! `switch_scene` holds a [`TransitionTicket`], a future that resolves with
//! the new hall id or the construction error.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::error::{EngineError, EngineResult};
use crate::foundation::collections::AnimationGroupId;
use crate::hall::HallScene;

/// Where a transition is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// Outgoing hall fading to black
    FadingOut(AnimationGroupId),
    /// Outgoing hall being released
    Destroying,
    /// Incoming hall being built
    Constructing,
    /// Incoming hall running its intro; carries the hall serial
    IntroPlaying(u64),
    /// Incoming hall fading in
    FadingIn(AnimationGroupId),
}

#[derive(Debug, Default)]
struct TicketState {
    result: Option<EngineResult<String>>,
    waker: Option<Waker>,
}

/// Completion handle of one `switch_scene` call.
///
/// Resolves to the id of the hall that became active, or to the error that
/// stopped the transition. Single-threaded: the engine resolves it from
/// its own tick.
#[derive(Debug)]
pub struct TransitionTicket {
    hall_id: String,
    state: Rc<RefCell<TicketState>>,
}

impl TransitionTicket {
    /// Hall the transition leads to
    pub fn hall_id(&self) -> &str {
        &self.hall_id
    }

    /// Whether the outcome is known and not yet taken
    pub fn is_resolved(&self) -> bool {
        self.state.borrow().result.is_some()
    }

    /// Take the outcome without an executor
    pub fn try_take(&self) -> Option<EngineResult<String>> {
        self.state.borrow_mut().result.take()
    }
}

impl Future for TransitionTicket {
    type Output = EngineResult<String>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.state.borrow_mut();
        match state.result.take() {
            Some(result) => Poll::Ready(result),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Engine side of a ticket
#[derive(Debug)]
pub(crate) struct TicketResolver {
    state: Rc<RefCell<TicketState>>,
}

impl TicketResolver {
    pub(crate) fn resolve(self, result: EngineResult<String>) {
        let waker = {
            let mut state = self.state.borrow_mut();
            state.result = Some(result);
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Create a linked ticket and resolver
pub(crate) fn ticket(hall_id: &str) -> (TransitionTicket, TicketResolver) {
    let state = Rc::new(RefCell::new(TicketState::default()));
    (
        TransitionTicket {
            hall_id: hall_id.to_string(),
            state: Rc::clone(&state),
        },
        TicketResolver { state },
    )
}

/// A transition in flight
#[derive(Debug)]
pub(crate) struct Transition {
    pub(crate) from: Option<String>,
    pub(crate) to: String,
    pub(crate) phase: TransitionPhase,
    /// Incoming hall until it is constructed and becomes active
    pub(crate) incoming: Option<HallScene>,
    pub(crate) resolver: TicketResolver,
}

impl Transition {
    pub(crate) fn new(
        from: Option<String>,
        incoming: HallScene,
        phase: TransitionPhase,
        resolver: TicketResolver,
    ) -> Self {
        Self {
            from,
            to: incoming.id().to_string(),
            phase,
            incoming: Some(incoming),
            resolver,
        }
    }

    /// `'from' -> 'to'` for log lines
    pub(crate) fn route(&self) -> String {
        match &self.from {
            Some(from) => format!("'{}' -> '{}'", from, self.to),
            None => format!("-> '{}'", self.to),
        }
    }

    /// Resolve the ticket with `EngineError::TransitionCancelled`
    pub(crate) fn cancel(self) {
        log::warn!("Transition {} cancelled in {:?}", self.route(), self.phase);
        self.resolver.resolve(Err(EngineError::TransitionCancelled));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::task::Wake;

    struct CountingWake(std::sync::atomic::AtomicUsize);

    impl Wake for CountingWake {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn test_ticket_wakes_and_resolves() {
        let (mut ticket, resolver) = ticket("early");
        let wake = Arc::new(CountingWake(std::sync::atomic::AtomicUsize::new(0)));
        let waker = Waker::from(Arc::clone(&wake));
        let mut cx = Context::from_waker(&waker);

        assert!(Pin::new(&mut ticket).poll(&mut cx).is_pending());
        resolver.resolve(Ok("early".into()));
        assert_eq!(wake.0.load(std::sync::atomic::Ordering::SeqCst), 1);

        match Pin::new(&mut ticket).poll(&mut cx) {
            Poll::Ready(Ok(id)) => assert_eq!(id, "early"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_route_names_both_halls() {
        let hall = HallScene::new(crate::hall::builtin_hall("early").expect("built in"), 2).expect("valid");
        let (_ticket, resolver) = ticket("early");
        let transition = Transition::new(Some("entrance".into()), hall, TransitionPhase::Destroying, resolver);
        assert_eq!(transition.route(), "'entrance' -> 'early'");
    }

    #[test]
    fn test_try_take_without_executor() {
        let (ticket, resolver) = ticket("end");
        assert!(!ticket.is_resolved());
        resolver.resolve(Err(EngineError::TransitionCancelled));
        assert!(ticket.is_resolved());
        assert!(matches!(ticket.try_take(), Some(Err(EngineError::TransitionCancelled))));
        assert!(ticket.try_take().is_none());
    }
}
