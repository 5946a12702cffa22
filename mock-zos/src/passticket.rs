use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{EvaluationError, GenerationError};

pub const ZOWE_DUMMY_USERID: &str = "USER";
pub const ZOWE_DUMMY_PASS_TICKET_PREFIX: &str = "ZOWE_DUMMY_PASS_TICKET";

pub const UNKNOWN_USER: &str = "UNKNOWN_USER";
pub const UNKNOWN_APPLID: &str = "XBADAPPL";

/// Generation and evaluation of PassTickets for a (user, application) pair.
///
/// Real SAF products hand out opaque one-time passwords; callers must not
/// assume anything about the ticket text.
pub trait PassTicketService: Send + Sync {
    fn generate(&self, user_id: &str, appl_id: &str) -> Result<String, GenerationError>;

    fn evaluate(&self, user_id: &str, appl_id: &str, ticket: &str)
        -> Result<(), EvaluationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserApp {
    pub user_id: String,
    pub appl_id: String,
}

impl UserApp {
    pub fn new(user_id: &str, appl_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            appl_id: appl_id.to_string(),
        }
    }
}

/// Emulator of the `IRRPassTicket` interface.
///
/// Every generated ticket is remembered for its (user, application) pair and
/// stays acceptable for the lifetime of the instance. Tickets are never
/// consumed by `evaluate`.
#[derive(Debug, Default)]
pub struct IrrPassTicket {
    sequence: AtomicU64,
    user_app_to_passtickets: DashMap<UserApp, HashSet<String>>,
}

impl IrrPassTicket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tickets remembered for the pair.
    pub fn issued_count(&self, user_id: &str, appl_id: &str) -> usize {
        self.user_app_to_passtickets
            .get(&UserApp::new(user_id, appl_id))
            .map(|tickets| tickets.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.user_app_to_passtickets.is_empty()
    }
}

impl PassTicketService for IrrPassTicket {
    fn generate(&self, user_id: &str, appl_id: &str) -> Result<String, GenerationError> {
        if user_id.eq_ignore_ascii_case(UNKNOWN_USER) {
            return Err(GenerationError::UnknownUser);
        }

        if appl_id.eq_ignore_ascii_case(UNKNOWN_APPLID) {
            return Err(GenerationError::UnknownApplId);
        }

        if user_id.eq_ignore_ascii_case(ZOWE_DUMMY_USERID) {
            return Ok(ZOWE_DUMMY_PASS_TICKET_PREFIX.to_string());
        }

        let current_id = self.sequence.fetch_add(1, Ordering::SeqCst);
        let pass_ticket = format!(
            "{}_{}_{}_{}",
            ZOWE_DUMMY_PASS_TICKET_PREFIX, appl_id, user_id, current_id
        );

        self.user_app_to_passtickets
            .entry(UserApp::new(user_id, appl_id))
            .or_default()
            .insert(pass_ticket.clone());

        tracing::debug!(user_id = %user_id, appl_id = %appl_id, "PassTicket generated");

        Ok(pass_ticket)
    }

    fn evaluate(
        &self,
        user_id: &str,
        appl_id: &str,
        ticket: &str,
    ) -> Result<(), EvaluationError> {
        if appl_id.eq_ignore_ascii_case(UNKNOWN_APPLID) {
            return Err(EvaluationError::UnknownApplId);
        }

        if user_id.eq_ignore_ascii_case(ZOWE_DUMMY_USERID)
            && ticket.starts_with(ZOWE_DUMMY_PASS_TICKET_PREFIX)
        {
            return Ok(());
        }

        let known = self
            .user_app_to_passtickets
            .get(&UserApp::new(user_id, appl_id))
            .map(|tickets| tickets.contains(ticket))
            .unwrap_or(false);

        if !known {
            tracing::debug!(user_id = %user_id, appl_id = %appl_id, "PassTicket rejected");
            return Err(EvaluationError::InvalidTicket);
        }

        Ok(())
    }
}
