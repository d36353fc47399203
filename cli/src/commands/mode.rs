use kid_core::chat::{ConversationTurn, recent_turns};
use kid_core::mode::ModeRouter;
use kid_core::prompt::mode_directive;
use serde_json::json;

use super::chat::load_history;
use crate::util::{exit_error, pretty};

/// Route a message locally and print the decision. No network.
pub fn run(message: &str, history: Option<&str>, window: usize, history_identifiers: bool) -> i32 {
    let turns: Vec<ConversationTurn> = match history {
        Some(path) => load_history(path).unwrap_or_else(|e| exit_error(&e, None)),
        None => Vec::new(),
    };
    let window = recent_turns(&turns, window);
    let decision = ModeRouter::new(history_identifiers).route(message.trim(), &window);

    let output = json!({
        "mode": decision.mode,
        "identifier_source": decision.identifier_source,
        "signals": decision.signals,
        "history_identifiers": decision.history_identifiers,
        "constraints": decision.constraints,
        "directive": mode_directive(&decision),
    });
    println!("{}", pretty(&output));
    0
}
