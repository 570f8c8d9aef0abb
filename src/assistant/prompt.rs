use crate::database::{Message, SearchHit};
use crate::embeddings::ChatMessage;

const SYSTEM_TEMPLATE: &str = "\
You are an exceptional customer support assistant.
Answer every question using only the knowledge source below, even if you think you know the answer.
If a question is outside the topics the knowledge source covers, do not answer it; politely redirect the user to something you can help with.
Greet the user only if this is a new conversation.

Knowledge source:
{knowledge}";

const NO_KNOWLEDGE: &str = "(no relevant documents were found)";

/// System prompt with the retrieved chunks inlined
#[inline]
pub fn system_prompt(hits: &[SearchHit]) -> String {
    let knowledge = if hits.is_empty() {
        NO_KNOWLEDGE.to_string()
    } else {
        hits.iter()
            .map(|hit| format!("[source: {}]\n{}", hit.origin, hit.text.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    SYSTEM_TEMPLATE.replace("{knowledge}", &knowledge)
}

/// Turns of a client-supplied history, alternating user and assistant
#[inline]
pub fn alternating_turns(history: &[String]) -> Vec<ChatMessage> {
    history
        .iter()
        .enumerate()
        .map(|(index, turn)| {
            let role = if index % 2 == 0 { "user" } else { "assistant" };
            ChatMessage::new(role, turn.as_str())
        })
        .collect()
}

/// Turns of a stored chat, each keeping the role it was saved with
#[inline]
pub fn stored_turns(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|message| ChatMessage::new(&message.sender.to_string(), message.content.as_str()))
        .collect()
}

/// Full conversation sent to the chat model, `history` oldest first
#[inline]
pub fn build_messages(
    query: &str,
    history: &[ChatMessage],
    hits: &[SearchHit],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::new("system", system_prompt(hits)));
    messages.extend_from_slice(history);
    messages.push(ChatMessage::new("user", query));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Sender;

    fn hit(text: &str, origin: &str) -> SearchHit {
        SearchHit {
            text: text.to_string(),
            origin: origin.to_string(),
            section: None,
            position: 0,
            distance: 0.1,
        }
    }

    #[test]
    fn knowledge_is_inlined_with_sources() {
        let prompt = system_prompt(&[
            hit("Office opens at 9.", "https://example.com/contact"),
            hit("  Prices start at $10. ", "pricing.md"),
        ]);

        assert!(prompt.contains("[source: https://example.com/contact]\nOffice opens at 9."));
        assert!(prompt.contains("[source: pricing.md]\nPrices start at $10."));
        assert!(!prompt.contains("{knowledge}"));
    }

    #[test]
    fn empty_retrieval_is_stated() {
        assert!(system_prompt(&[]).ends_with(NO_KNOWLEDGE));
    }

    #[test]
    fn history_alternates_roles() {
        let history = vec![
            "hi".to_string(),
            "hello!".to_string(),
            "what do you sell?".to_string(),
            "software".to_string(),
        ];
        let messages = build_messages("how much?", &alternating_turns(&history), &[]);

        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(
            roles,
            vec!["system", "user", "assistant", "user", "assistant", "user"]
        );
        assert_eq!(messages[5].content, "how much?");
        assert_eq!(messages[2].content, "hello!");
    }
    fn stored(sender: Sender, content: &str) -> Message {
        Message {
            id: content.to_string(),
            chat_id: "chat".to_string(),
            sender,
            content: content.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn stored_history_keeps_saved_roles() {
        // An unanswered question leaves two user turns in a row
        let history = stored_turns(&[
            stored(Sender::User, "first question"),
            stored(Sender::User, "asked again"),
            stored(Sender::Assistant, "the answer"),
        ]);
        let messages = build_messages("thanks", &history, &[]);

        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "user", "assistant", "user"]);
        assert_eq!(messages[3].content, "the answer");
    }
}
