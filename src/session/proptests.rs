//! Property-based tests for session transitions
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::*;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::User), Just(Role::Assistant), Just(Role::System)]
}

fn arb_status() -> impl Strategy<Value = Option<MessageStatus>> {
    prop_oneof![
        Just(None),
        Just(Some(MessageStatus::Sending)),
        Just(Some(MessageStatus::Sent)),
        Just(Some(MessageStatus::Error)),
    ]
}

fn arb_theme() -> impl Strategy<Value = Theme> {
    prop_oneof![Just(Theme::Light), Just(Theme::Dark), Just(Theme::Auto)]
}

fn arb_message() -> impl Strategy<Value = Message> {
    (
        "[a-z0-9]{6}",
        arb_role(),
        "[a-zA-Z0-9 ]{0,40}",
        0i64..2_000_000_000,
        arb_status(),
    )
        .prop_map(|(id, role, content, secs, status)| Message {
            id,
            role,
            content,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            status,
            metadata: None,
        })
}

fn arb_settings_patch() -> impl Strategy<Value = SettingsPatch> {
    (
        proptest::option::of(arb_theme()),
        proptest::option::of(proptest::collection::btree_map(
            "[a-zA-Z]{3,10}",
            "[#a-z0-9]{1,8}",
            0..3,
        )),
        proptest::option::of(
            (
                proptest::option::of(any::<bool>()),
                proptest::option::of(any::<bool>()),
            )
                .prop_map(|(markdown, streaming)| FeaturesPatch {
                    markdown,
                    streaming,
                    ..FeaturesPatch::default()
                }),
        ),
    )
        .prop_map(|(theme, message_style, features)| SettingsPatch {
            theme,
            message_style,
            features,
        })
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z ]{0,20}".prop_map(|content| Event::UserMessage {
            message_id: crate::session::message::user_message_id(),
            content,
            timestamp: Utc::now(),
        }),
        "[a-z0-9]{6}".prop_map(|message_id| Event::Retry { message_id }),
        Just(Event::ClearMessages),
        arb_settings_patch().prop_map(Event::UpdateSettings),
        arb_message().prop_map(Event::AddMessage),
        ("[a-z0-9]{6}", arb_status())
            .prop_map(|(message_id, status)| Event::UpdateStatus { message_id, status }),
    ]
}

/// Apply an event, treating validation failures as no-ops like the store does
fn step(state: &SessionState, event: Event) -> SessionState {
    match transition(state, event) {
        Ok(result) => result.new_state,
        Err(_) => state.clone(),
    }
}

fn arb_state() -> impl Strategy<Value = SessionState> {
    proptest::collection::vec(arb_event(), 0..12).prop_map(|events| {
        events
            .into_iter()
            .fold(SessionState::default(), |state, event| step(&state, event))
    })
}

fn ids_are_unique(state: &SessionState) -> bool {
    let mut ids: Vec<_> = state.messages.iter().map(|m| &m.id).collect();
    let len = ids.len();
    ids.sort();
    ids.dedup();
    ids.len() == len
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_clear_always_empties(state in arb_state()) {
        let result = transition(&state, Event::ClearMessages).unwrap();
        prop_assert!(result.new_state.messages.is_empty());
        prop_assert_eq!(result.new_state.error, None);
        prop_assert_eq!(result.new_state.settings, state.settings);
        prop_assert_eq!(result.new_state.is_loading, state.is_loading);
    }

    #[test]
    fn prop_retry_unknown_id_is_noop(state in arb_state()) {
        let result = transition(&state, Event::Retry { message_id: "not-a-real-id".to_string() });
        prop_assert!(result.is_err());
    }

    #[test]
    fn prop_theme_update_changes_only_theme(state in arb_state(), theme in arb_theme()) {
        let next = transition(&state, Event::UpdateSettings(SettingsPatch::theme(theme)))
            .unwrap()
            .new_state;
        prop_assert_eq!(next.settings.theme, theme);
        prop_assert_eq!(&next.settings.message_style, &state.settings.message_style);
        prop_assert_eq!(next.settings.features, state.settings.features);
        prop_assert_eq!(next.messages, state.messages);
    }

    #[test]
    fn prop_settings_patch_never_drops_style_keys(state in arb_state(), patch in arb_settings_patch()) {
        let next = step(&state, Event::UpdateSettings(patch));
        for key in state.settings.message_style.keys() {
            prop_assert!(next.settings.message_style.contains_key(key));
        }
    }

    #[test]
    fn prop_send_appends_exactly_one_sending_user_message(state in arb_state(), content in "[a-zA-Z]{1,20}") {
        let result = transition(&state, Event::UserMessage {
            message_id: "fresh-id".to_string(),
            content: content.clone(),
            timestamp: Utc::now(),
        }).unwrap();
        let next = result.new_state;

        prop_assert_eq!(next.messages.len(), state.messages.len() + 1);
        let last = next.messages.last().unwrap();
        prop_assert_eq!(last.role, Role::User);
        prop_assert_eq!(last.status, Some(MessageStatus::Sending));
        prop_assert_eq!(&last.content, &content);
        prop_assert!(next.is_loading);
        prop_assert_eq!(&next.messages[..state.messages.len()], &state.messages[..]);
    }

    #[test]
    fn prop_successful_send_appends_one_reply(state in arb_state(), content in "[a-zA-Z]{1,20}") {
        let sent = step(&state, Event::UserMessage {
            message_id: "fresh-id".to_string(),
            content,
            timestamp: Utc::now(),
        });
        let next = step(&sent, Event::ReplyReceived {
            message_id: "fresh-id".to_string(),
            reply: Message::reply("fresh-reply", "ok", Utc::now()),
        });

        prop_assert_eq!(next.messages.len(), sent.messages.len() + 1);
        let origin = next.message("fresh-id").unwrap();
        prop_assert_eq!(origin.status, Some(MessageStatus::Sent));
        let reply = next.messages.last().unwrap();
        prop_assert_eq!(reply.role, Role::Assistant);
        prop_assert_eq!(reply.status, Some(MessageStatus::Sent));
        prop_assert_eq!(next.pending_replies(), state.pending_replies());
    }

    #[test]
    fn prop_failed_send_sets_error(state in arb_state(), message in "[a-z ]{0,20}") {
        let sent = step(&state, Event::UserMessage {
            message_id: "fresh-id".to_string(),
            content: "hello".to_string(),
            timestamp: Utc::now(),
        });
        let next = step(&sent, Event::ReplyFailed { message_id: "fresh-id".to_string(), message });

        prop_assert_eq!(next.messages.len(), sent.messages.len());
        prop_assert_eq!(next.message("fresh-id").unwrap().status, Some(MessageStatus::Error));
        prop_assert!(next.error.as_deref().is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn prop_ids_stay_unique(state in arb_state()) {
        prop_assert!(ids_are_unique(&state));
    }

    #[test]
    fn prop_loading_tracks_pending_count(events in proptest::collection::vec(arb_event(), 0..20)) {
        let mut state = SessionState::default();
        for event in events {
            state = step(&state, event);
            prop_assert_eq!(state.is_loading, state.pending_replies() > 0);
        }
    }

    #[test]
    fn prop_restore_never_loading(messages in proptest::collection::vec(arb_message(), 0..8)) {
        let restored = SessionState::restore(PersistedState {
            messages,
            settings: Settings::default(),
        });
        prop_assert!(!restored.is_loading);
        prop_assert!(restored
            .messages
            .iter()
            .all(|m| m.status != Some(MessageStatus::Sending)));
    }
}
