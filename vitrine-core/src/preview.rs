//! Live preview: the composed markup as-is, plus the sequencing that keeps
//! a slow render from overwriting a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::composer::Document;

/// Markup shown in the live preview. Identical to what an export writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    html: String,
}

impl Preview {
    pub fn new(document: Document) -> Self {
        Self {
            html: document.into_string(),
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// The markup encoded for an iframe `srcdoc="..."` attribute. Decoding the
    /// attribute yields the markup byte for byte.
    pub fn srcdoc(&self) -> String {
        html_escape::encode_double_quoted_attribute(&self.html).into_owned()
    }
}

impl From<Document> for Preview {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}

/// Sequence number handed out when a render is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RenderTicket(u64);

impl RenderTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied,
    /// A newer render was requested after this one; the result was dropped.
    Stale { ticket: RenderTicket, latest: RenderTicket },
}

#[derive(Debug, Default)]
struct Displayed {
    ticket: Option<RenderTicket>,
    preview: Option<Preview>,
}

/// Last-write-wins holder for the preview on screen.
///
/// Call [`begin`](Self::begin) when an edit triggers a render and
/// [`commit`](Self::commit) when that render finishes. Only the result of the
/// most recently issued ticket is ever displayed, however the renders finish.
#[derive(Debug, Default)]
pub struct PreviewSession {
    issued: AtomicU64,
    displayed: Mutex<Displayed>,
}

impl PreviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RenderTicket {
        RenderTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> Option<RenderTicket> {
        match self.issued.load(Ordering::SeqCst) {
            0 => None,
            n => Some(RenderTicket(n)),
        }
    }

    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.latest() == Some(ticket)
    }

    pub fn commit(&self, ticket: RenderTicket, preview: Preview) -> Commit {
        let mut displayed = self.displayed.lock().unwrap_or_else(PoisonError::into_inner);

        // Checked under the lock so a newer commit can't interleave.
        let latest = RenderTicket(self.issued.load(Ordering::SeqCst));
        if ticket != latest || displayed.ticket.is_some_and(|shown| shown > ticket) {
            debug!(
                ticket = ticket.sequence(),
                latest = latest.sequence(),
                "discarding stale preview"
            );
            return Commit::Stale { ticket, latest };
        }

        displayed.ticket = Some(ticket);
        displayed.preview = Some(preview);
        Commit::Applied
    }

    pub fn current(&self) -> Option<Preview> {
        self.displayed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .preview
            .clone()
    }

    pub fn displayed_ticket(&self) -> Option<RenderTicket> {
        self.displayed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::compose;
    use crate::model::Project;

    fn preview_named(name: &str) -> Preview {
        let project = Project {
            name: name.into(),
            ..Project::default()
        };
        Preview::new(compose(&project).unwrap())
    }

    #[test]
    fn preview_keeps_markup_unchanged() {
        let document = compose(&Project::starter()).unwrap();
        let preview = Preview::new(document.clone());
        assert_eq!(preview.html(), document.as_str());
    }

    #[test]
    fn srcdoc_decodes_back_to_markup() {
        let preview = preview_named("A & \"B\"");
        let decoded = html_escape::decode_html_entities(&preview.srcdoc()).into_owned();
        assert_eq!(decoded, preview.html());
        assert!(!preview.srcdoc().contains('"'));
    }

    #[test]
    fn tickets_increase() {
        let session = PreviewSession::new();
        assert_eq!(session.latest(), None);
        let a = session.begin();
        let b = session.begin();
        assert!(b > a);
        assert!(session.is_current(b));
        assert!(!session.is_current(a));
    }

    #[test]
    fn late_response_for_older_request_is_discarded() {
        let session = PreviewSession::new();
        let a = session.begin();
        let b = session.begin();

        assert_eq!(session.commit(b, preview_named("Second")), Commit::Applied);
        assert_eq!(
            session.commit(a, preview_named("First")),
            Commit::Stale { ticket: a, latest: b }
        );

        let shown = session.current().unwrap();
        assert!(shown.html().contains("<title>Second</title>"));
        assert_eq!(session.displayed_ticket(), Some(b));
    }

    #[test]
    fn early_response_for_superseded_request_is_discarded() {
        let session = PreviewSession::new();
        let a = session.begin();
        let _b = session.begin();

        assert!(matches!(
            session.commit(a, preview_named("First")),
            Commit::Stale { .. }
        ));
        assert_eq!(session.current(), None);
    }
}
