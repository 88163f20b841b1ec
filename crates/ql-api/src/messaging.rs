//! Inbound chat message handling.
//!
//! The messaging transport delivers `(messaging_key, text)` and expects a
//! decision: prompt the user to link their account, or answer within the
//! quiz flow. Any engine failure while handling a message is logged and
//! answered with a generic fallback reply — the message loop never drops.

use ql_config::MessagingConfig;
use ql_core::enums::AccessStatus;
use ql_db::error::DatabaseError;
use ql_db::service::QuizService;

/// Which kind of reply the transport should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// The student has not linked a credential identity yet.
    LinkAccountPrompt,
    /// A normal quiz-flow reply.
    QuizFlow,
}

/// The decision returned to the messaging transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReply {
    pub kind: ReplyKind,
    pub text: String,
}

impl MessageReply {
    fn quiz_flow(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::QuizFlow,
            text: text.into(),
        }
    }
}

/// Decide the reply for one inbound chat message.
///
/// This function never returns an error: engine faults are logged via
/// `tracing` and turned into a generic fallback reply.
pub async fn handle_message(
    svc: &QuizService,
    cfg: &MessagingConfig,
    messaging_key: &str,
    text: &str,
) -> MessageReply {
    match route(svc, cfg, messaging_key, text).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, messaging_key, "message handling failed");
            MessageReply::quiz_flow(
                "Sorry, something went wrong on our side. Please try again in a moment.",
            )
        }
    }
}

async fn route(
    svc: &QuizService,
    cfg: &MessagingConfig,
    messaging_key: &str,
    text: &str,
) -> Result<MessageReply, DatabaseError> {
    let (student_id, linked) = svc.resolve_messaging_identity(messaging_key).await?;

    if !linked {
        return Ok(MessageReply {
            kind: ReplyKind::LinkAccountPrompt,
            text: "Hi! Please link your account first to start using quizzes.".into(),
        });
    }

    let trimmed = text.trim();

    // Commands match case-insensitively, same policy for both verbs.
    if let Some((word, rest)) = trimmed.split_at_checked(cfg.join_command.len()) {
        if word.eq_ignore_ascii_case(&cfg.join_command)
            // A bare "join" or "join <code>"; "joinish" words fall through
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            return join_bank(svc, cfg, &student_id, rest.trim()).await;
        }
    }

    if trimmed.eq_ignore_ascii_case(&cfg.list_command) {
        return list_banks(svc, &student_id).await;
    }

    Ok(MessageReply::quiz_flow(format!(
        "Hi! Send \"{}\" to start a quiz, or \"{} [invite code]\" to join a new question bank.",
        cfg.list_command, cfg.join_command
    )))
}

async fn join_bank(
    svc: &QuizService,
    cfg: &MessagingConfig,
    student_id: &str,
    code: &str,
) -> Result<MessageReply, DatabaseError> {
    if code.is_empty() {
        return Ok(MessageReply::quiz_flow(format!(
            "Usage: {} [invite code]",
            cfg.join_command
        )));
    }

    match svc.redeem_invite_code(student_id, code).await {
        Ok(redemption) => {
            let text = match redemption.status {
                AccessStatus::Approved => format!(
                    "You're in! \"{}\" is ready — send \"{}\" to see your banks.",
                    redemption.bank_name, cfg.list_command
                ),
                AccessStatus::Pending => format!(
                    "Request sent for \"{}\". You'll have access once the creator approves it.",
                    redemption.bank_name
                ),
                AccessStatus::Rejected => format!(
                    "Your request for \"{}\" was declined by the creator.",
                    redemption.bank_name
                ),
            };
            Ok(MessageReply::quiz_flow(text))
        }
        // Client mistake, not a fault: answer politely instead of falling back
        Err(DatabaseError::UnknownInviteCode(code)) => Ok(MessageReply::quiz_flow(format!(
            "\"{code}\" doesn't match any question bank. Please check the invite code."
        ))),
        Err(e) => Err(e),
    }
}

async fn list_banks(
    svc: &QuizService,
    student_id: &str,
) -> Result<MessageReply, DatabaseError> {
    let listing = svc.list_requests_for_student(student_id).await?;

    if listing.is_empty() {
        return Ok(MessageReply::quiz_flow(
            "You haven't joined any question banks yet.",
        ));
    }

    let mut lines = vec!["Your question banks:".to_string()];
    for entry in listing {
        lines.push(format!("- {} ({})", entry.bank_name, entry.status));
    }
    Ok(MessageReply::quiz_flow(lines.join("\n")))
}
