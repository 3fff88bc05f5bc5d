//! Default chat copy: the welcome message and suggested questions

/// First bot message of every session
pub const WELCOME_MESSAGE: &str = "Hello! Feel free to ask me about any health concern.";

/// Suggested questions offered in the carousel
pub const DEFAULT_SUGGESTIONS: &[&str] = &[
    "I was diagnosed with liver cancer and have surgery scheduled. Which foods should I avoid for now?",
    "I have diabetes. Which kinds of exercise help with blood sugar control?",
    "I take blood pressure medication. Are there foods I shouldn't combine with it?",
    "What should I watch out for while recovering from stomach cancer surgery?",
    "I was diagnosed with hypothyroidism. What should I be careful about day to day?",
];

/// Default suggestions as owned strings
pub fn default_suggestions() -> Vec<String> {
    DEFAULT_SUGGESTIONS.iter().map(|q| q.to_string()).collect()
}
