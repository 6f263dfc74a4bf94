//! Prompt construction for the classifier and the renderer
//!
//! Two prompts exist. The classification prompt demands strict JSON and
//! nothing else. The rendering prompt receives only the facts inside a
//! `ResponseInstruction` and is forbidden from adding any of its own.

use std::fmt;

use serde::{Deserialize, Serialize};

use shop_agent_core::{CatalogEntity, ResponseInstruction};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Prompt builder for the shop assistant
pub struct PromptBuilder {
    messages: Vec<Message>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// System prompt for message classification: strict JSON out
    pub fn classification_prompt(mut self, grounded: Option<&CatalogEntity>) -> Self {
        let focus = match grounded {
            Some(entity) => format!(
                "The conversation is currently about this product: \"{}\"{}.",
                entity.display_name,
                entity
                    .code
                    .as_deref()
                    .map(|c| format!(" (code {c})"))
                    .unwrap_or_default()
            ),
            None => "No product is currently under discussion.".to_string(),
        };

        let system = format!(
            r#"You classify one customer message for an online shop. Customers write in Spanish or English.

{focus}

Reply with a single JSON object and nothing else:
{{"intent": "...", "extracted_term": "...", "code": "...", "attribute": "...", "attribute_value": "..."}}

Allowed intent values:
- "product": asking about a specific product by name, code, or description
- "variant": asking about a color, size, or other attribute of a product
- "general_info": store hours, shipping, payment, company questions
- "recommendation": asking what you suggest or what is popular
- "unserviceable": complaints, returns, or asking for a human
- "ambiguous": anything too vague to act on

Rules:
- Omit fields you cannot fill, never invent them.
- "extracted_term" is the product phrase from the message, verbatim.
- "code" only when the message contains an explicit product code.
- "attribute" / "attribute_value" only for variant questions.
- Never output anything except the JSON object."#
        );

        self.messages.push(Message::system(system));
        self
    }

    /// System prompt for rendering a structured decision into prose
    pub fn rendering_prompt(mut self, facts: &str) -> Self {
        let system = format!(
            r#"You are a helpful assistant for an online shop. Write one short, friendly reply to the customer in the language of the conversation (Spanish by default).

Use ONLY the facts below. Do not add products, prices, stock levels, or availability the facts do not state. If a fact is missing, do not guess it.

## Facts
{facts}

Reply in plain prose, no markdown, at most three sentences."#
        );

        self.messages.push(Message::system(system));
        self
    }

    /// Add prior (user, reply) exchanges, oldest-first
    pub fn with_history(mut self, history: &[(String, String)]) -> Self {
        for (user, reply) in history {
            self.messages.push(Message::user(user));
            self.messages.push(Message::assistant(reply));
        }
        self
    }

    /// Add current user message
    pub fn user_message(mut self, message: &str) -> Self {
        self.messages.push(Message::user(message));
        self
    }

    pub fn build(self) -> Vec<Message> {
        self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten a `ResponseInstruction` into the facts block of the
/// rendering prompt. This is the only channel of facts to the model.
pub fn instruction_facts(instruction: &ResponseInstruction) -> String {
    match instruction {
        ResponseInstruction::ShowEntity { entity } => {
            let mut lines = vec![format!("Product: {}", entity.display_name)];
            if let Some(code) = &entity.code {
                lines.push(format!("Code: {code}"));
            }
            lines.push(format!("Price: {}", entity.price_display()));
            match entity.stock_quantity {
                Some(q) => lines.push(format!("Units in stock: {q}")),
                None => lines.push(format!("Stock: {}", entity.stock_state)),
            }
            lines.join("\n")
        }
        ResponseInstruction::ListCandidates { term, candidates } => {
            let mut lines = vec![format!(
                "The customer searched for \"{term}\". Ask them to pick one of these products:"
            )];
            lines.extend(candidates.iter().map(entity_line));
            lines.join("\n")
        }
        ResponseInstruction::AskDisambiguation { candidates } => {
            let mut lines = vec![
                "Several products share that name. Ask which one the customer means:".to_string(),
            ];
            lines.extend(candidates.iter().map(entity_line));
            lines.join("\n")
        }
        ResponseInstruction::ListAttributeValues {
            entity,
            attribute,
            values,
        } => format!(
            "Product: {}\nAvailable {attribute}: {}",
            entity.display_name,
            values.join(", ")
        ),
        ResponseInstruction::AttributeUnknown { entity, attribute } => format!(
            "Product: {}\nThis product has no \"{attribute}\" options. Say so.",
            entity.display_name
        ),
        ResponseInstruction::AttributeValueRejected {
            entity,
            attribute,
            requested_value,
            available_values,
        } => format!(
            "Product: {}\nThe customer asked for {attribute} \"{requested_value}\", which does not exist.\nAvailable {attribute}: {}",
            entity.display_name,
            available_values.join(", ")
        ),
        ResponseInstruction::NotFound { term } => format!(
            "Nothing in the catalog matched \"{term}\". Apologize and invite another search."
        ),
        ResponseInstruction::Help => {
            "Briefly explain you can look up products by name or code and answer questions about them.".to_string()
        }
        ResponseInstruction::DidNotUnderstand => {
            "You could not understand the message. Ask the customer to rephrase.".to_string()
        }
        ResponseInstruction::AskForSpecifics => {
            "Ask the customer which specific product they are interested in.".to_string()
        }
        ResponseInstruction::Handoff { .. } => {
            "Tell the customer a member of the team will follow up with them shortly.".to_string()
        }
    }
}

fn entity_line(entity: &CatalogEntity) -> String {
    match &entity.code {
        Some(code) => format!("- {} (code {code})", entity.display_name),
        None => format!("- {}", entity.display_name),
    }
}
