//! Session record parsing.
//!
//! A raw record carries a free-text range such as
//! `"01/01/2024, 09:00:00 AM - 01/01/2024, 09:07:00 AM"`, where the end token
//! may be followed by newline-separated metadata. Only the end timestamp is
//! required; the start is parsed on a best-effort basis.

use chrono::NaiveDateTime;

use crate::error::RejectReason;

/// Literal separator between the start and end tokens.
pub const SESSION_SEPARATOR: &str = " - ";

/// Default input timestamp format: `day/month/year, hour:minute:second AM/PM`.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %I:%M:%S %p";

/// One input row, exactly as it came from the source table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    /// The session description, expected as `"<start> - <end>"`.
    pub description: String,
    /// User identifier from the same row, if the table had one.
    pub user: Option<String>,
}

impl RawRecord {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            user: None,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// A parsed session interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Start of the session, when the start token parsed.
    pub start: Option<NaiveDateTime>,
    /// End of the session. Always present.
    pub end: NaiveDateTime,
    pub user: Option<String>,
}

impl Session {
    /// Whether the session was active at `instant` (both ends inclusive).
    ///
    /// Sessions without a known start never count as present.
    pub fn is_present_at(&self, instant: NaiveDateTime) -> bool {
        self.start
            .is_some_and(|start| start <= instant && instant <= self.end)
    }

    /// Earliest timestamp this session contributes to the observed span.
    pub fn earliest(&self) -> NaiveDateTime {
        self.start.map_or(self.end, |start| start.min(self.end))
    }
}

/// A record that could not be turned into a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// 1-based position of the record in the input.
    pub row: usize,
    /// The original description string.
    pub raw: String,
    pub user: Option<String>,
    pub reason: RejectReason,
}

/// Output of [`parse_sessions`]: valid sessions and rejected rows, both in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSessions {
    pub sessions: Vec<Session>,
    pub rejects: Vec<RejectedRecord>,
}

impl ParsedSessions {
    /// Number of records that went into the parse.
    pub fn total(&self) -> usize {
        self.sessions.len() + self.rejects.len()
    }
}

/// Parses a single timestamp token, ignoring surrounding whitespace.
pub fn parse_timestamp(token: &str, format: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(token.trim(), format)
}

/// Parses one raw record into a session.
///
/// The end token is the text between the first and second separator, cut at
/// its first newline. A start token that fails to parse leaves `start` empty
/// rather than rejecting the record.
pub fn parse_session(record: &RawRecord, format: &str) -> Result<Session, RejectReason> {
    let mut parts = record.description.split(SESSION_SEPARATOR);
    let start_token = parts.next().unwrap_or_default();
    let Some(end_part) = parts.next() else {
        return Err(RejectReason::MalformedSessionField);
    };

    let end_token = end_part.split('\n').next().unwrap_or_default().trim();
    let end = parse_timestamp(end_token, format).map_err(|cause| {
        RejectReason::UnparseableTimestamp {
            token: end_token.to_string(),
            cause,
        }
    })?;

    Ok(Session {
        start: parse_timestamp(start_token, format).ok(),
        end,
        user: record.user.clone(),
    })
}

/// Parses a batch of records, routing failures to the reject list.
pub fn parse_sessions<'a, I>(records: I, format: &str) -> ParsedSessions
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut parsed = ParsedSessions::default();

    for (idx, record) in records.into_iter().enumerate() {
        match parse_session(record, format) {
            Ok(session) => parsed.sessions.push(session),
            Err(reason) => {
                tracing::debug!(row = idx + 1, raw = %record.description, %reason, "rejected session record");
                parsed.rejects.push(RejectedRecord {
                    row: idx + 1,
                    raw: record.description.clone(),
                    user: record.user.clone(),
                    reason,
                });
            }
        }
    }

    parsed
}
