//! Pure state machine for the single-slot edit session.
//!
//! `(EditState, EditEvent) -> (EditState, Option<EditEffect>)`
//!
//! Events that make no sense in the current state return the state unchanged
//! with no effect. The controller applies the effect to the collection.

use super::types::{EditSession, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing { target_id: TaskId, draft_text: String },
}

impl EditState {
    pub fn is_editing(&self) -> bool {
        matches!(self, EditState::Editing { .. })
    }

    pub fn target_id(&self) -> Option<&TaskId> {
        match self {
            EditState::Editing { target_id, .. } => Some(target_id),
            EditState::Idle => None,
        }
    }

    pub fn session(&self) -> Option<EditSession> {
        match self {
            EditState::Editing {
                target_id,
                draft_text,
            } => Some(EditSession {
                target_id: target_id.clone(),
                draft_text: draft_text.clone(),
            }),
            EditState::Idle => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum EditEvent {
    /// Open a session on a task known to exist. Replaces any open session.
    Begin { target_id: TaskId, text: String },
    UpdateDraft(String),
    Commit,
    Cancel,
    /// A task left the collection; closes the session if it was the target.
    TargetRemoved(TaskId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEffect {
    /// Replace the target's text. `text` is trimmed and non-empty.
    ApplyText { target_id: TaskId, text: String },
}

pub fn transition(state: EditState, event: EditEvent) -> (EditState, Option<EditEffect>) {
    match (state, event) {
        (_, EditEvent::Begin { target_id, text }) => (
            EditState::Editing {
                target_id,
                draft_text: text,
            },
            None,
        ),

        (EditState::Editing { target_id, .. }, EditEvent::UpdateDraft(text)) => (
            EditState::Editing {
                target_id,
                draft_text: text,
            },
            None,
        ),

        (
            EditState::Editing {
                target_id,
                draft_text,
            },
            EditEvent::Commit,
        ) => {
            let trimmed = draft_text.trim();
            if trimmed.is_empty() {
                (EditState::Idle, None)
            } else {
                (
                    EditState::Idle,
                    Some(EditEffect::ApplyText {
                        target_id,
                        text: trimmed.to_string(),
                    }),
                )
            }
        }

        (EditState::Editing { .. }, EditEvent::Cancel) => (EditState::Idle, None),

        (EditState::Editing { target_id, draft_text }, EditEvent::TargetRemoved(removed)) => {
            if target_id == removed {
                (EditState::Idle, None)
            } else {
                (
                    EditState::Editing {
                        target_id,
                        draft_text,
                    },
                    None,
                )
            }
        }

        (state @ EditState::Idle, _) => (state, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editing(id: &str, draft: &str) -> EditState {
        EditState::Editing {
            target_id: TaskId::from(id),
            draft_text: draft.to_string(),
        }
    }

    #[test]
    fn test_idle_to_editing() {
        let (state, effect) = transition(
            EditState::Idle,
            EditEvent::Begin {
                target_id: TaskId::from("a"),
                text: "X".to_string(),
            },
        );

        assert_eq!(state, editing("a", "X"));
        assert!(effect.is_none());
    }

    #[test]
    fn test_begin_replaces_open_session() {
        let (state, effect) = transition(
            editing("a", "unsaved"),
            EditEvent::Begin {
                target_id: TaskId::from("b"),
                text: "Y".to_string(),
            },
        );

        assert_eq!(state, editing("b", "Y"));
        assert!(effect.is_none());
    }

    #[test]
    fn test_update_draft_keeps_target() {
        let (state, _) = transition(editing("a", "X"), EditEvent::UpdateDraft("Z".into()));
        assert_eq!(state, editing("a", "Z"));
    }

    #[test]
    fn test_commit_trims_and_applies() {
        let (state, effect) = transition(editing("a", "  new text  "), EditEvent::Commit);

        assert_eq!(state, EditState::Idle);
        assert_eq!(
            effect,
            Some(EditEffect::ApplyText {
                target_id: TaskId::from("a"),
                text: "new text".to_string(),
            })
        );
    }

    #[test]
    fn test_commit_blank_draft_is_discarded() {
        let (state, effect) = transition(editing("a", " \t "), EditEvent::Commit);

        assert_eq!(state, EditState::Idle);
        assert!(effect.is_none());
    }

    #[test]
    fn test_cancel_closes_without_effect() {
        let (state, effect) = transition(editing("a", "draft"), EditEvent::Cancel);

        assert_eq!(state, EditState::Idle);
        assert!(effect.is_none());
    }

    #[test]
    fn test_removed_target_closes_session() {
        let (state, _) = transition(editing("a", "draft"), EditEvent::TargetRemoved("a".into()));
        assert_eq!(state, EditState::Idle);

        let (state, _) = transition(editing("a", "draft"), EditEvent::TargetRemoved("b".into()));
        assert_eq!(state, editing("a", "draft"));
    }

    #[test]
    fn test_idle_events_are_noops() {
        for event in [
            EditEvent::UpdateDraft("x".into()),
            EditEvent::Commit,
            EditEvent::Cancel,
            EditEvent::TargetRemoved("a".into()),
        ] {
            let (state, effect) = transition(EditState::Idle, event);
            assert_eq!(state, EditState::Idle);
            assert!(effect.is_none());
        }
    }
}
