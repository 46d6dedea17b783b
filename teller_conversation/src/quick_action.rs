/// Canned prompt offered next to the input box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    pub emoji: &'static str,
    pub text: &'static str,
}

pub const QUICK_ACTIONS: [QuickAction; 4] = [
    QuickAction {
        emoji: "🔒",
        text: "Block my card",
    },
    QuickAction {
        emoji: "💰",
        text: "Check loan limits",
    },
    QuickAction {
        emoji: "📊",
        text: "Recent transactions",
    },
    QuickAction {
        emoji: "📞",
        text: "Contact information",
    },
];

/// 1-based lookup, as numbered in the UI.
#[must_use]
pub fn quick_action(number: usize) -> Option<QuickAction> {
    number
        .checked_sub(1)
        .and_then(|index| QUICK_ACTIONS.get(index))
        .copied()
}
