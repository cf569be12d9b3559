use anyhow::{anyhow, Result};

use crate::assist::{AssistService, FeedbackData, VoiceCommand};
use crate::editor::Editor;
use crate::mode::EditorMode;
use crate::selection::RangeSnapshot;
use crate::voice::VoiceClip;

pub const EMPTY_TEXT_NOTICE: &str = "Please write or select some text first.";
pub const EMPTY_CONTEXT_NOTICE: &str = "Please start writing something for me to complete.";
pub const BUSY_NOTICE: &str = "Another action is still in progress.";
pub const NOT_UNDERSTOOD_NOTICE: &str = "Sorry, I didn't understand that command.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Autocomplete,
    Rewrite,
    Improve,
    Summarize,
    Rate,
}

/// User-visible result of one action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The document was mutated.
    Applied,
    Summary(String),
    Feedback(FeedbackData),
    /// Precondition failed or the session was busy; no remote call was made.
    Rejected(String),
    ModeChanged(EditorMode),
    NotUnderstood,
}

/// Everything captured at action start, before the remote call suspends.
#[derive(Debug, Clone)]
pub struct PreparedAction {
    pub kind: ActionKind,
    /// Selected-or-whole-document text; for autocomplete, the preceding
    /// context of the collapsed capture point.
    pub payload: String,
    pub instruction: Option<String>,
    captured: Option<RangeSnapshot>,
    true_selection: bool,
}

#[derive(Debug, Clone)]
pub enum Begun {
    Started(PreparedAction),
    Rejected(String),
}

/// Plain-text or structured reply from the assist service.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistReply {
    Text(String),
    Feedback(FeedbackData),
}

/// One editing session: the surface, the persona mode, the displayed
/// feedback/summary, and the IDLE/PROCESSING state.
///
/// The state machine is two-phase so the remote call can suspend between
/// `begin` (capture + preconditions, enters PROCESSING) and `apply`/`fail`
/// (mutation or cleanup, returns to IDLE). `begin` while PROCESSING rejects;
/// nothing is queued. The user keeps full access to the editor in between,
/// which is why anchors are captured up front.
#[derive(Debug)]
pub struct Session {
    editor: Editor,
    mode: EditorMode,
    processing: bool,
    summary: Option<String>,
    feedback: Option<FeedbackData>,
}

impl Session {
    pub fn new(editor: Editor, mode: EditorMode) -> Self {
        Session {
            editor,
            mode,
            processing: false,
            summary: None,
            feedback: None,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn feedback(&self) -> Option<&FeedbackData> {
        self.feedback.as_ref()
    }

    pub fn dismiss_panels(&mut self) {
        self.summary = None;
        self.feedback = None;
    }

    /// Start an action: enter PROCESSING, clear displayed panels, capture the
    /// selection, validate preconditions.
    ///
    /// Behavior:
    /// - A busy session rejects without side effects.
    /// - Non-autocomplete actions on empty trimmed text reject before any
    ///   remote call, back to IDLE.
    /// - Autocomplete collapses the capture to its end and takes everything
    ///   before that point as context (whole document when nothing was
    ///   captured); empty context rejects.
    pub fn begin(&mut self, kind: ActionKind, instruction: Option<String>) -> Begun {
        if self.processing {
            return Begun::Rejected(BUSY_NOTICE.to_string());
        }
        self.processing = true;
        self.summary = None;
        self.feedback = None;

        let captured = self.editor.capture();
        let selected = self.editor.selected_text();
        let (payload, true_selection) = if selected.is_empty() {
            (self.editor.text(), false)
        } else {
            (selected, true)
        };

        if kind == ActionKind::Autocomplete {
            let captured = captured.map(|r| r.collapse_to_end());
            let context = captured
                .as_ref()
                .and_then(|r| r.preceding_context(self.editor.document()))
                .unwrap_or_else(|| self.editor.text());
            if context.trim().is_empty() {
                self.processing = false;
                return Begun::Rejected(EMPTY_CONTEXT_NOTICE.to_string());
            }
            return Begun::Started(PreparedAction {
                kind,
                payload: context,
                instruction,
                captured,
                true_selection,
            });
        }

        if payload.trim().is_empty() {
            self.processing = false;
            return Begun::Rejected(EMPTY_TEXT_NOTICE.to_string());
        }

        Begun::Started(PreparedAction {
            kind,
            payload,
            instruction,
            captured,
            true_selection,
        })
    }

    /// Finish an action with the service reply: restore the captured range
    /// and mutate (or store display state), then return to IDLE.
    ///
    /// Restoration failures degrade silently: autocomplete inserts at the end
    /// of the document, rewrite/improve replace the whole content. A reply is
    /// applied even if the document changed during the call; there is no
    /// staleness check.
    pub fn apply(&mut self, prepared: PreparedAction, reply: AssistReply) -> Result<ActionOutcome> {
        let outcome = self.apply_inner(prepared, reply);
        self.processing = false;
        outcome
    }

    /// Abandon a begun action after a remote failure; the document is left
    /// untouched.
    pub fn fail(&mut self) {
        self.processing = false;
    }

    fn apply_inner(
        &mut self,
        prepared: PreparedAction,
        reply: AssistReply,
    ) -> Result<ActionOutcome> {
        match (prepared.kind, reply) {
            (ActionKind::Autocomplete, AssistReply::Text(completion)) => {
                match prepared.captured {
                    Some(range) if self.editor.restore(&range) => {}
                    _ => self.editor.caret_to_end(),
                }
                self.editor.insert_at_cursor(&completion)?;
                Ok(ActionOutcome::Applied)
            }
            (ActionKind::Rewrite | ActionKind::Improve, AssistReply::Text(replacement)) => {
                let replaced = match prepared.captured {
                    Some(range) if prepared.true_selection => {
                        self.editor.replace_range(&range, &replacement).is_ok()
                    }
                    _ => false,
                };
                if !replaced {
                    self.editor.set_content(&replacement);
                }
                Ok(ActionOutcome::Applied)
            }
            (ActionKind::Summarize, AssistReply::Text(summary)) => {
                self.summary = Some(summary.clone());
                Ok(ActionOutcome::Summary(summary))
            }
            (ActionKind::Rate, AssistReply::Feedback(feedback)) => {
                self.feedback = Some(feedback.clone());
                Ok(ActionOutcome::Feedback(feedback))
            }
            (kind, reply) => Err(anyhow!("mismatched reply {reply:?} for {kind:?}")),
        }
    }
}

/// Drive one action end to end: capture, one remote call, restore, mutate.
/// Remote failures return the session to IDLE and propagate; the document is
/// never touched on a failed or partially parsed response.
pub async fn run_action<S: AssistService>(
    session: &mut Session,
    service: &S,
    kind: ActionKind,
    instruction: Option<String>,
) -> Result<ActionOutcome> {
    let prepared = match session.begin(kind, instruction) {
        Begun::Started(prepared) => prepared,
        Begun::Rejected(notice) => return Ok(ActionOutcome::Rejected(notice)),
    };

    let mode = session.mode();
    let reply = match request(service, &prepared, mode).await {
        Ok(reply) => reply,
        Err(err) => {
            session.fail();
            return Err(err);
        }
    };

    session.apply(prepared, reply)
}

/// Interpret a voice clip and dispatch the resulting command.
pub async fn run_voice<S: AssistService>(
    session: &mut Session,
    service: &S,
    clip: &VoiceClip,
) -> Result<ActionOutcome> {
    if session.is_processing() {
        return Ok(ActionOutcome::Rejected(BUSY_NOTICE.to_string()));
    }

    session.processing = true;
    let command = match service.interpret_voice(clip, session.mode()).await {
        Ok(command) => command,
        Err(err) => {
            session.processing = false;
            return Err(err);
        }
    };
    session.processing = false;

    match command {
        VoiceCommand::ChangeMode { mode: Some(mode) } => {
            session.set_mode(mode);
            Ok(ActionOutcome::ModeChanged(mode))
        }
        VoiceCommand::ChangeMode { mode: None } | VoiceCommand::Unknown => {
            Ok(ActionOutcome::NotUnderstood)
        }
        VoiceCommand::Rewrite { instruction } => {
            run_action(session, service, ActionKind::Rewrite, instruction).await
        }
        VoiceCommand::Improve => run_action(session, service, ActionKind::Improve, None).await,
        VoiceCommand::Summarize => run_action(session, service, ActionKind::Summarize, None).await,
        VoiceCommand::Rate => run_action(session, service, ActionKind::Rate, None).await,
        VoiceCommand::Autocomplete => {
            run_action(session, service, ActionKind::Autocomplete, None).await
        }
    }
}

async fn request<S: AssistService>(
    service: &S,
    prepared: &PreparedAction,
    mode: EditorMode,
) -> Result<AssistReply> {
    match prepared.kind {
        ActionKind::Autocomplete => service
            .autocomplete(&prepared.payload, mode)
            .await
            .map(AssistReply::Text),
        ActionKind::Rewrite => service
            .rewrite(&prepared.payload, mode, prepared.instruction.as_deref())
            .await
            .map(AssistReply::Text),
        ActionKind::Improve => service
            .improve(&prepared.payload, mode)
            .await
            .map(AssistReply::Text),
        ActionKind::Summarize => service
            .summarize(&prepared.payload, mode)
            .await
            .map(AssistReply::Text),
        ActionKind::Rate => service
            .rate(&prepared.payload, mode)
            .await
            .map(AssistReply::Feedback),
    }
}
