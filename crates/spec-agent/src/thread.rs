//! Issue thread linearized into role-tagged exchanges.

use crate::ai::AIMessage;
use crate::tracker::{Issue, IssueComment};

/// The reply that moves a thread from drafting to publishing.
pub const APPROVAL_KEYWORD: &str = "approved";

/// Who wrote an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A human participant.
    Requester,
    /// An automated participant (this bot or another).
    Responder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub role: Role,
    pub text: String,
}

impl Exchange {
    fn to_message(&self) -> AIMessage {
        match self.role {
            Role::Requester => AIMessage::user(self.text.clone()),
            Role::Responder => AIMessage::assistant(self.text.clone()),
        }
    }
}

/// Workflow state, recomputed from the thread on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    AwaitingFeedback,
    Approved,
}

/// Issue body followed by every comment, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Thread {
    exchanges: Vec<Exchange>,
}

impl Thread {
    /// Build the thread for an issue.
    ///
    /// The opening exchange is `Title: ...\n\nBody: ...`. Comments are ordered
    /// by creation time (stable, so same-instant comments keep host order) and
    /// tagged as responder when their author is a bot account.
    pub fn from_issue(issue: &Issue, comments: &[IssueComment]) -> Self {
        let mut ordered: Vec<&IssueComment> = comments.iter().collect();
        ordered.sort_by_key(|c| c.created_at);

        let mut exchanges = Vec::with_capacity(ordered.len() + 1);
        exchanges.push(Exchange {
            role: Role::Requester,
            text: format!(
                "Title: {}\n\nBody: {}",
                issue.title,
                issue.body.as_deref().unwrap_or_default()
            ),
        });

        exchanges.extend(ordered.into_iter().map(|comment| Exchange {
            role: if comment.user.actor_type.is_bot() {
                Role::Responder
            } else {
                Role::Requester
            },
            text: comment.body.clone().unwrap_or_default(),
        }));

        Self { exchanges }
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// The most recent human exchange, if any.
    pub fn last_requester(&self) -> Option<&Exchange> {
        self.exchanges
            .iter()
            .rev()
            .find(|e| e.role == Role::Requester)
    }

    /// True iff the last requester exchange is exactly the approval keyword
    /// after trimming and lowercasing. Responder exchanges are ignored.
    pub fn is_approved(&self) -> bool {
        self.last_requester()
            .is_some_and(|e| is_approval(&e.text))
    }

    pub fn state(&self) -> ThreadState {
        if self.is_approved() {
            ThreadState::Approved
        } else {
            ThreadState::AwaitingFeedback
        }
    }

    /// Conversation for the model: thread exchanges in order.
    pub fn to_messages(&self) -> Vec<AIMessage> {
        self.exchanges.iter().map(Exchange::to_message).collect()
    }
}

/// Approval check for a single reply.
pub fn is_approval(text: &str) -> bool {
    text.trim().to_lowercase() == APPROVAL_KEYWORD
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::ai::AIRole;
    use crate::tracker::{ActorType, Author};

    fn issue() -> Issue {
        Issue {
            number: 7,
            title: "Fix bug".to_string(),
            body: Some("It crashes".to_string()),
        }
    }

    fn comment(id: u64, secs: i64, actor_type: ActorType, body: &str) -> IssueComment {
        IssueComment {
            id,
            body: Some(body.to_string()),
            user: Author {
                login: format!("user-{id}"),
                actor_type,
            },
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_opening_exchange_formats_title_and_body() {
        let thread = Thread::from_issue(&issue(), &[]);
        assert_eq!(thread.len(), 1);
        assert_eq!(thread.exchanges()[0].role, Role::Requester);
        assert_eq!(thread.exchanges()[0].text, "Title: Fix bug\n\nBody: It crashes");
    }

    #[test]
    fn test_missing_body_renders_empty() {
        let mut issue = issue();
        issue.body = None;
        let thread = Thread::from_issue(&issue, &[]);
        assert_eq!(thread.exchanges()[0].text, "Title: Fix bug\n\nBody: ");
    }

    #[test]
    fn test_comments_ordered_by_creation_and_tagged() {
        let comments = vec![
            comment(3, 30, ActorType::User, "third"),
            comment(1, 10, ActorType::User, "first"),
            comment(2, 20, ActorType::Bot, "second"),
        ];
        let thread = Thread::from_issue(&issue(), &comments);

        let texts: Vec<_> = thread.exchanges().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts[1..], ["first", "second", "third"]);
        assert_eq!(thread.exchanges()[2].role, Role::Responder);
        assert_eq!(thread.exchanges()[3].role, Role::Requester);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let comments = vec![
            comment(1, 10, ActorType::User, "same"),
            comment(2, 10, ActorType::User, "same"),
        ];
        assert_eq!(Thread::from_issue(&issue(), &comments).len(), 3);
    }

    #[test]
    fn test_is_approval() {
        assert!(is_approval("approved"));
        assert!(is_approval("APPROVED"));
        assert!(is_approval("  Approved \n"));
        assert!(is_approval(" approved"));
        assert!(!is_approval("Approved."));
        assert!(!is_approval("approved!"));
        assert!(!is_approval("approved, thanks"));
        assert!(!is_approval("not approved"));
        assert!(!is_approval(""));
    }

    #[test]
    fn test_only_last_requester_counts() {
        let comments = vec![
            comment(1, 10, ActorType::User, "approved"),
            comment(2, 20, ActorType::User, "one more change please"),
        ];
        assert_eq!(
            Thread::from_issue(&issue(), &comments).state(),
            ThreadState::AwaitingFeedback
        );
    }

    #[test]
    fn test_bot_reply_after_approval_does_not_hide_it() {
        let comments = vec![
            comment(1, 10, ActorType::Bot, "## Summary ..."),
            comment(2, 20, ActorType::User, "Approved"),
            comment(3, 30, ActorType::Bot, "approved? let me think"),
        ];
        assert_eq!(
            Thread::from_issue(&issue(), &comments).state(),
            ThreadState::Approved
        );
    }

    #[test]
    fn test_bot_cannot_approve() {
        let comments = vec![comment(1, 10, ActorType::Bot, "approved")];
        assert!(!Thread::from_issue(&issue(), &comments).is_approved());
    }

    #[test]
    fn test_to_messages_maps_roles() {
        let comments = vec![
            comment(1, 10, ActorType::Bot, "draft"),
            comment(2, 20, ActorType::User, "looks good"),
        ];
        let roles: Vec<_> = Thread::from_issue(&issue(), &comments)
            .to_messages()
            .into_iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, [AIRole::User, AIRole::Assistant, AIRole::User]);
    }
}
