//! Visitor session handling for the tour-guide gateway.
//!
//! Wake-phrase detection on free-form transcripts, an injectable session
//! store with lazy idle expiry and turn ceilings, and the persistent
//! conversation archive that seeds agent context across restarts.

pub mod archive;
pub mod clock;
pub mod lifecycle;
pub mod session;
pub mod store;
pub mod wake;

pub use archive::{ConversationArchive, ConversationRecord, SessionNote};
pub use clock::{Clock, ManualClock, SystemClock};
pub use lifecycle::{is_valid_session_id, ResolvedSession, SessionManager, TurnRecorded};
pub use session::{Session, SessionMessage};
pub use store::{InMemorySessionStore, SessionStore};
pub use wake::{detect_and_strip, WakeMatch, WakeMatcher};
