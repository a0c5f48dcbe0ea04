//! System instruction and initial message assembly for an agent run.

use tg_domain::tool::Message;

use super::tools::{KNOWLEDGE_SEARCH, WEB_SEARCH};

/// Where the visitor is and how to talk to them.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub place_name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub lang: Option<String>,
    /// Scope line from the knowledge index metadata.
    pub venue_scope: Option<String>,
}

const PERSONA: &str = "You are a friendly, concise tour guide speaking to a visitor through \
a voice assistant. Answers are read aloud: keep them to a few short sentences, no markdown, \
no lists, no URLs.";

pub fn system_instruction(
    ctx: &PromptContext,
    notes: &[String],
    prefer_web_search: bool,
    web_search_available: bool,
) -> String {
    let mut out = String::from(PERSONA);

    if let Some(scope) = ctx.venue_scope.as_deref().filter(|s| !s.is_empty()) {
        out.push_str(&format!("\n\nYou guide visitors around {scope}."));
    }

    out.push_str("\n\n");
    if prefer_web_search && web_search_available {
        out.push_str(&format!(
            "The local knowledge base did not support a confident answer. Call `{WEB_SEARCH}` \
             first to find or verify the facts, then answer. You may still call \
             `{KNOWLEDGE_SEARCH}` for venue-specific details."
        ));
    } else if web_search_available {
        out.push_str(&format!(
            "Always call `{KNOWLEDGE_SEARCH}` before anything else. Only call `{WEB_SEARCH}` \
             when the knowledge base has nothing relevant."
        ));
    } else {
        out.push_str(&format!(
            "Always call `{KNOWLEDGE_SEARCH}` before answering. If it has nothing relevant, \
             say you are not sure rather than guessing."
        ));
    }

    if let Some(place) = ctx.place_name.as_deref().filter(|s| !s.is_empty()) {
        out.push_str(&format!("\n\nThe visitor is currently at: {place}."));
    }
    if let (Some(lat), Some(lng)) = (ctx.lat, ctx.lng) {
        out.push_str(&format!("\nVisitor coordinates: {lat:.5}, {lng:.5}."));
    }
    if let Some(lang) = ctx.lang.as_deref().filter(|s| !s.is_empty()) {
        out.push_str(&format!("\n\nReply in the language with locale tag `{lang}`."));
    }

    if !notes.is_empty() {
        out.push_str("\n\nEarlier context from this visit:");
        for note in notes {
            out.push_str("\n- ");
            out.push_str(note);
        }
    }
    out
}

/// System instruction, then prior exchanges oldest first, then the new
/// utterance.
pub fn initial_messages(system: String, history: &[Message], utterance: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system));
    messages.extend_from_slice(history);
    messages.push(Message::user(utterance));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_domain::tool::Role;

    #[test]
    fn knowledge_first_by_default() {
        let s = system_instruction(&PromptContext::default(), &[], false, true);
        assert!(s.contains("Always call `knowledge_search` before anything else"));
    }

    #[test]
    fn web_first_when_preferred() {
        let s = system_instruction(&PromptContext::default(), &[], true, true);
        assert!(s.contains("Call `web_search` first"));
    }

    #[test]
    fn web_preference_ignored_without_backend() {
        let s = system_instruction(&PromptContext::default(), &[], true, false);
        assert!(!s.contains("web_search"));
    }

    #[test]
    fn weaves_place_lang_and_notes() {
        let ctx = PromptContext {
            place_name: Some("Luxembourg Garden".into()),
            lat: Some(48.846),
            lng: Some(2.337),
            lang: Some("fr-FR".into()),
            venue_scope: Some("the Latin Quarter".into()),
        };
        let s = system_instruction(&ctx, &["Photo shows a stone fountain.".into()], false, false);
        assert!(s.contains("around the Latin Quarter"));
        assert!(s.contains("currently at: Luxembourg Garden"));
        assert!(s.contains("48.84600, 2.33700"));
        assert!(s.contains("`fr-FR`"));
        assert!(s.contains("- Photo shows a stone fountain."));
    }

    #[test]
    fn messages_in_order() {
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let msgs = initial_messages("sys".into(), &history, "what is this?");
        let roles: Vec<Role> = msgs.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
    }
}
