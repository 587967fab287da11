//! Fixed wording for every stage
//!
//! Questions shown to the user and instructions sent to the completion
//! backend live here so they can be tuned without touching stage logic.

use crate::state::Mood;

/// Sent as the system message with every completion request
pub const SYSTEM_PROMPT: &str = r"You are a compassionate mental health support assistant. Listen carefully, respond warmly, and keep answers concise.

You are not a substitute for a licensed professional. Never diagnose. When the conversation suggests risk of self-harm, encourage contacting a crisis line or emergency services.";

// ============================================================================
// Reception and analysis
// ============================================================================

pub const RECEPTION_GREETING: &str = "Hello, welcome to our mental health chat!";
pub const RECEPTION_QUESTION: &str =
    "Can you tell me a bit about yourself and how your day is going?";

pub const FEELING_QUESTION: &str =
    "How are you feeling right now? (e.g., anxious, depressed, suicidal, happy, etc.)";
pub const ELABORATION_QUESTION: &str = "Can you share more about why you're feeling this way?";

// ============================================================================
// Assignment
// ============================================================================

pub const CLARIFICATION_QUESTION: &str =
    "I'm here to help. Could you clarify how you're feeling right now?";

/// The two tailored questions asked once the mood is known
pub fn tailored_questions(mood: Mood) -> [&'static str; 2] {
    match mood {
        Mood::Anxiety => [
            "What are the main things causing you stress or anxiety?",
            "Have you tried any methods to calm yourself? If so, what works for you?",
        ],
        Mood::Depression => [
            "Are there any particular events or thoughts that are making you feel this way?",
            "Is there anything that usually makes you feel a little better when you're feeling low?",
        ],
        Mood::Crisis => [
            "I'm really sorry you're feeling this way. Do you have someone you trust to talk to right now?",
            "Would you consider reaching out to a mental health professional for support?",
        ],
        Mood::Positive => [
            "That's great to hear! What has been making you feel happy today?",
            "What can you do to continue nurturing this positive feeling?",
        ],
        Mood::General => [
            "Could you describe your feelings in more detail?",
            "Have you noticed any patterns in your emotions recently?",
        ],
    }
}

/// Instruction for one round of dynamic follow-up questions
pub fn follow_up_instruction(context: &[String]) -> String {
    let mut prompt = String::new();
    if context.is_empty() {
        prompt.push_str("Based on this conversation,");
    } else {
        prompt.push_str("Based on this conversation and mental health knowledge:\n");
        push_snippets(&mut prompt, context);
        prompt.push('\n');
    }
    prompt.push_str(
        " generate 2 relevant follow-up questions to better understand the user's situation.\n\
         Format as:\n\
         1. [Question 1]\n\
         2. [Question 2]",
    );
    prompt
}

/// Instruction for the closing synthesis
pub fn synthesis_instruction(context: &[String]) -> String {
    let mut prompt = String::from("Based on our conversation so far");
    if context.is_empty() {
        prompt.push_str(", ");
    } else {
        prompt.push_str(" and this mental health knowledge:\n");
        push_snippets(&mut prompt, context);
        prompt.push('\n');
    }
    prompt.push_str(
        "please provide a thoughtful conclusion with:\n\
         1. Key insights\n\
         2. Personalized recommendations\n\
         3. Actionable self-care or professional steps",
    );
    prompt
}

// ============================================================================
// Support
// ============================================================================

pub const SUPPORT_QUESTION: &str =
    "Do you feel that you need any additional support or guidance at this moment? (yes/no)";
pub const SUPPORT_DETAILS_QUESTION: &str = "Could you please elaborate on what kind of support you need or what you're currently struggling with?";
pub const SUPPORT_DECLINED: &str = "Alright. Remember, if you ever feel like you need more help, please don't hesitate to reach out.";
pub const FAREWELL: &str = "Thank you for chatting today. Take care!";

/// Instruction for tailored recommendations after the user asks for more help
pub fn support_instruction(details: &str, resources: &[String]) -> String {
    let mut prompt = format!(
        "Based on our entire conversation, including the request for additional support with: {details}\n"
    );
    if !resources.is_empty() {
        prompt.push_str("Available resources:\n");
        push_snippets(&mut prompt, resources);
        prompt.push('\n');
    }
    prompt.push_str(
        "Please provide 3-5 specific recommendations, self-care tips, or resources to help address the issues mentioned.",
    );
    prompt
}

// ============================================================================
// Crisis escalation
// ============================================================================

/// Reproduced verbatim whenever the counselor stage runs. Never generated.
pub const CRISIS_RESOURCES: &str = "It might be helpful to talk to a professional. I strongly recommend contacting a counselor immediately.

Urgent Support Resources:
- National Suicide Prevention Lifeline: 1-800-273-TALK (8255)
- Suicide & Crisis Lifeline: call or text 988
- Crisis Text Line: Text HOME to 741741
- Immediate local emergency services: 911";

// ============================================================================
// Check-in responders
// ============================================================================

pub const CHECK_IN_QUESTION: &str = "How are you feeling today?";
pub const ANXIETY_RESPONSE: &str = "I understand anxiety can be overwhelming. Let's try some grounding techniques together. Breathe in for 4 counts, hold for 4, and exhale for 6.";
pub const DEPRESSION_RESPONSE: &str = "I'm sorry you're feeling this way. You're not alone in this. Would you like to share more about what you're experiencing?";
pub const POSITIVE_RESPONSE: &str =
    "I notice you're feeling good. What would you like to discuss or explore further?";
pub const GENERAL_RESPONSE: &str =
    "Thank you for sharing. I'm here to listen. Could you tell me more about what's been on your mind?";
pub const CHECK_IN_FAREWELL: &str = "Thank you for sharing your feelings. Have a wonderful day!";

fn push_snippets(prompt: &mut String, snippets: &[String]) {
    for snippet in snippets {
        prompt.push_str("- ");
        prompt.push_str(snippet);
        prompt.push('\n');
    }
}
