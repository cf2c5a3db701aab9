//! Property-based tests for the session core
//!
//! These tests verify key invariants hold across all possible inputs.

use super::attachment::{Attachment, AttachmentStore};
use super::builder;
use super::controller::{SessionController, SessionState, TransitionError};
use super::log::{FinalStatus, Role, TurnStatus};
use super::reconciler::{reconcile, strip_bold, Outcome};
use crate::llm::Part;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_attachment() -> impl Strategy<Value = Attachment> {
    (
        proptest::collection::vec(any::<u8>(), 0..64),
        prop_oneof![
            Just("image/png".to_string()),
            Just("image/jpeg".to_string()),
            Just("application/pdf".to_string()),
        ],
    )
        .prop_map(|(bytes, media_type)| Attachment { bytes, media_type })
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        "[a-zA-Z ]{0,30}".prop_map(Outcome::TransportFailure),
        (400u16..600, "[a-zA-Z ]{0,30}")
            .prop_map(|(status, message)| Outcome::ApiError { status, message }),
        "[a-zA-Z *!,]{0,60}".prop_map(Outcome::ApiSuccess),
        (200u16..300).prop_map(|status| Outcome::MalformedSuccess { status }),
    ]
}

#[derive(Debug, Clone)]
enum Intent {
    Submit(String),
    Stage(Attachment),
    Cancel,
    Respond(Outcome),
}

fn arb_intent() -> impl Strategy<Value = Intent> {
    prop_oneof![
        prop_oneof![Just(String::new()), Just("  ".to_string()), "[a-z ]{1,12}"]
            .prop_map(Intent::Submit),
        arb_attachment().prop_map(Intent::Stage),
        Just(Intent::Cancel),
        arb_outcome().prop_map(Intent::Respond),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn reconcile_is_total(outcome in arb_outcome(), staged in proptest::option::of(arb_attachment())) {
        let mut store = AttachmentStore::new();
        if let Some(a) = staged {
            store.stage(a);
        }
        let expect_complete = matches!(outcome, Outcome::ApiSuccess(_));

        let update = reconcile(outcome, &mut store);

        prop_assert!(store.is_empty());
        prop_assert_eq!(update.status == FinalStatus::Complete, expect_complete);
        prop_assert_ne!(TurnStatus::from(update.status), TurnStatus::Pending);
    }

    #[test]
    fn strip_bold_removes_paired_markers(
        words in proptest::collection::vec(("[a-z,.!']{1,8}", any::<bool>()), 1..10)
    ) {
        let marked = words
            .iter()
            .map(|(w, bold)| if *bold { format!("**{w}**") } else { w.clone() })
            .collect::<Vec<_>>()
            .join(" ");
        let plain = words.iter().map(|(w, _)| w.as_str()).collect::<Vec<_>>().join(" ");

        prop_assert_eq!(strip_bold(&format!("  {marked}\n")), plain);
    }

    #[test]
    fn builder_part_layout(text in "[ a-zA-Z]{0,20}", staged in proptest::option::of(arb_attachment())) {
        let mut store = AttachmentStore::new();
        let had_attachment = staged.is_some();
        if let Some(a) = staged.clone() {
            store.stage(a);
        }

        let (turn, request) = builder::build(&text, &mut store);
        let parts = request.parts();

        prop_assert!(store.is_empty());
        prop_assert_eq!(&turn.text, text.trim());
        prop_assert_eq!(&parts[0], &Part::text(text.trim()));
        prop_assert_eq!(parts.len(), if had_attachment { 2 } else { 1 });
        if let Some(a) = staged {
            prop_assert_eq!(&parts[1], &Part::inline_data(a.to_base64(), a.media_type.clone()));
            prop_assert_eq!(turn.attachment, Some(a));
        }
    }

    #[test]
    fn session_invariants_hold(intents in proptest::collection::vec(arb_intent(), 0..40)) {
        let mut session = SessionController::new();

        for intent in intents {
            let before = session.log().len();
            match intent {
                Intent::Submit(text) => {
                    let accepted = !text.trim().is_empty() || session.staged_attachment().is_some();
                    let busy = session.state() != SessionState::Idle;
                    match session.submit(&text) {
                        Ok(result) if accepted => {
                            prop_assert!(!busy);
                            prop_assert!(result.dispatched().is_some());
                            prop_assert_eq!(session.log().len(), before + 2);
                            prop_assert!(session.staged_attachment().is_none());
                        }
                        Ok(result) => {
                            prop_assert!(result.is_noop());
                            prop_assert_eq!(session.log().len(), before);
                        }
                        Err(e) => {
                            prop_assert_eq!(e, TransitionError::Busy);
                            prop_assert!(busy && accepted);
                            prop_assert_eq!(session.log().len(), before);
                        }
                    }
                }
                Intent::Stage(a) => {
                    session.stage_attachment(a);
                }
                Intent::Cancel => {
                    session.cancel_attachment();
                    prop_assert!(session.staged_attachment().is_none());
                }
                Intent::Respond(outcome) => {
                    if let SessionState::AwaitingResponse { turn_id } = session.state() {
                        session.resolve(turn_id, outcome).unwrap();
                        prop_assert_eq!(session.state(), SessionState::Idle);
                        prop_assert!(session.staged_attachment().is_none());
                    }
                }
            }

            // at most one pending turn, and only while awaiting
            let pending = session.log().pending_count();
            prop_assert!(pending <= 1);
            prop_assert_eq!(pending == 1, session.state() != SessionState::Idle);
        }

        // turns come in user/assistant pairs
        for pair in session.log().turns().chunks(2) {
            prop_assert_eq!(pair[0].role, Role::User);
            prop_assert_eq!(pair[1].role, Role::Assistant);
        }
    }
}
