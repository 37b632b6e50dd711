//! Call state reducer
//!
//! Maps the state carried by a `callUpdate` notification to the lifecycle
//! signal the host sees and the side effects the session must apply. Pure:
//! the bridge performs the effects.

use crate::types::CallState;

/// Lifecycle signal forwarded to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSignal {
    /// A call is ringing
    Incoming,
    /// A call became active
    Answered,
    /// A call ended, normally or not
    Rejected,
    /// Any other state, forwarded as `state:<name>`
    State(CallState),
}

impl CallSignal {
    pub fn event_name(&self) -> String {
        match self {
            Self::Incoming => "incoming".to_string(),
            Self::Answered => "incomingAnswered".to_string(),
            Self::Rejected => "incomingRejected".to_string(),
            Self::State(state) => format!("state:{}", state.as_str()),
        }
    }
}

/// Per-session switches the reducer consults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReducerPolicy {
    pub auto_answer: bool,
    pub reconnect_on_explicit_end: bool,
}

/// Outcome of one state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub signal: CallSignal,
    /// Answer the current call now
    pub answer: bool,
    /// Reset the reconnection counter
    pub reset_attempts: bool,
    pub clear_current_call: bool,
    /// Ask the reconnector whether another attempt is allowed
    pub evaluate_reconnect: bool,
}

impl Reduction {
    fn signal(signal: CallSignal) -> Self {
        Self {
            signal,
            answer: false,
            reset_attempts: false,
            clear_current_call: false,
            evaluate_reconnect: false,
        }
    }
}

pub fn reduce(state: &CallState, policy: ReducerPolicy) -> Reduction {
    match state {
        CallState::Ringing => Reduction {
            answer: policy.auto_answer,
            ..Reduction::signal(CallSignal::Incoming)
        },
        CallState::Active => Reduction {
            reset_attempts: true,
            ..Reduction::signal(CallSignal::Answered)
        },
        s if s.is_abnormal_end() => Reduction {
            clear_current_call: true,
            evaluate_reconnect: true,
            ..Reduction::signal(CallSignal::Rejected)
        },
        s if s.is_explicit_end() => Reduction {
            clear_current_call: true,
            evaluate_reconnect: policy.reconnect_on_explicit_end,
            ..Reduction::signal(CallSignal::Rejected)
        },
        other => Reduction::signal(CallSignal::State(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto_answer() -> ReducerPolicy {
        ReducerPolicy {
            auto_answer: true,
            ..Default::default()
        }
    }

    #[test]
    fn ringing_signals_incoming() {
        let reduction = reduce(&CallState::Ringing, ReducerPolicy::default());
        assert_eq!(reduction.signal, CallSignal::Incoming);
        assert!(!reduction.answer);
    }

    #[test]
    fn ringing_answers_when_auto_answer_is_on() {
        let reduction = reduce(&CallState::Ringing, auto_answer());
        assert!(reduction.answer);
        assert!(!reduction.clear_current_call);
    }

    #[test]
    fn active_resets_attempts() {
        let reduction = reduce(&CallState::Active, auto_answer());
        assert_eq!(reduction.signal, CallSignal::Answered);
        assert!(reduction.reset_attempts);
        assert!(!reduction.answer);
    }

    #[test]
    fn abnormal_end_clears_and_evaluates_reconnect() {
        for state in [CallState::Done, CallState::Disconnected] {
            let reduction = reduce(&state, ReducerPolicy::default());
            assert_eq!(reduction.signal, CallSignal::Rejected);
            assert!(reduction.clear_current_call);
            assert!(reduction.evaluate_reconnect);
        }
    }

    #[test]
    fn explicit_end_never_reconnects_by_default() {
        for state in [CallState::Hangup, CallState::Destroy, CallState::Purge] {
            let reduction = reduce(&state, ReducerPolicy::default());
            assert_eq!(reduction.signal, CallSignal::Rejected);
            assert!(reduction.clear_current_call);
            assert!(!reduction.evaluate_reconnect);
        }
    }

    #[test]
    fn explicit_end_reconnects_when_opted_in() {
        let policy = ReducerPolicy {
            reconnect_on_explicit_end: true,
            ..Default::default()
        };
        assert!(reduce(&CallState::Hangup, policy).evaluate_reconnect);
    }

    #[test]
    fn other_states_pass_through() {
        let reduction = reduce(&CallState::Trying, auto_answer());
        assert_eq!(reduction.signal.event_name(), "state:trying");
        assert!(!reduction.answer);
        assert!(!reduction.clear_current_call);

        let unknown = reduce(&CallState::parse("transferring"), ReducerPolicy::default());
        assert_eq!(unknown.signal.event_name(), "state:transferring");
    }

    #[test]
    fn event_names() {
        assert_eq!(CallSignal::Incoming.event_name(), "incoming");
        assert_eq!(CallSignal::Answered.event_name(), "incomingAnswered");
        assert_eq!(CallSignal::Rejected.event_name(), "incomingRejected");
        assert_eq!(CallSignal::State(CallState::Held).event_name(), "state:held");
    }
}
