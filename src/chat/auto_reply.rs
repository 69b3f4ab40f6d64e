//! Canned keyword replies for the support bot. Matching is substring
//! based on the lower-cased message; categories are checked in order
//! and the first hit wins.

/// Display name attached to every synthesized reply
pub const SUPPORT_BOT: &str = "Support Bot";

const RULES: &[(&[&str], &str)] = &[
    (
        &["hello", "hi", "hey", "greetings"],
        "Hello! Welcome to E-Shop support. How can I assist you today?",
    ),
    (
        &["order", "track", "tracking", "delivery"],
        "To track your order, please go to 'My Orders' in your account dashboard. You can view the status and tracking information there.",
    ),
    (
        &["return", "refund", "exchange"],
        "We accept returns within 30 days of delivery. Please visit our Returns page for more information, or contact support@eshop.com for assistance.",
    ),
    (
        &["payment", "pay", "checkout"],
        "We accept various payment methods including credit cards, debit cards, and digital wallets. All transactions are secure and encrypted.",
    ),
    (
        &["shipping", "delivery", "ship"],
        "We offer free shipping on orders over $50. Standard delivery takes 3-5 business days. Express shipping is also available.",
    ),
    (
        &["product", "item", "stock", "available"],
        "You can check product availability on each product page. If an item is out of stock, you can sign up for restock notifications.",
    ),
    (
        &["cancel", "cancellation"],
        "Orders can be cancelled within 1 hour of placement. After that, please contact our support team for assistance.",
    ),
    (
        &["discount", "coupon", "promo", "offer"],
        "Check our Deals section for current promotions! Sign up for our newsletter to receive exclusive discount codes.",
    ),
    (
        &["help", "support", "assistance"],
        "I'm here to help! You can ask me about orders, shipping, returns, payments, or any other questions about our store.",
    ),
    (
        &["thank", "thanks"],
        "You're welcome! Is there anything else I can help you with?",
    ),
];

const FALLBACK: &str = "Thank you for your message! A support representative will assist you shortly. Meanwhile, you can explore our Help Center for quick answers.";

/// Picks the canned reply for a message.
pub fn reply_for(text: &str) -> &'static str {
    let text = text.to_lowercase();
    for (keywords, reply) in RULES {
        if keywords.iter().any(|keyword| text.contains(keyword)) {
            return reply;
        }
    }
    FALLBACK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refund_matches_returns_category() {
        let reply = reply_for("how do I get a refund for this?");
        assert!(reply.contains("returns within 30 days"));
    }

    #[test]
    fn greeting_wins_over_order_by_precedence() {
        // "hi" and "order" both match; the greeting category is listed
        // first, so it wins.
        let reply = reply_for("hi, where is my order?");
        assert!(reply.contains("Welcome to E-Shop support"));
    }

    #[test]
    fn delivery_resolves_to_order_tracking_not_shipping() {
        // "delivery" appears in both the tracking and shipping keyword
        // sets; the tracking category is checked first.
        let reply = reply_for("question about delivery");
        assert!(reply.contains("My Orders"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(reply_for("HELLO there"), reply_for("hello there"));
    }

    #[test]
    fn matching_is_substring_based() {
        // "repayment" contains "payment".
        let reply = reply_for("about my repayment");
        assert!(reply.contains("payment methods"));
    }

    #[test]
    fn unmatched_text_falls_through() {
        assert_eq!(reply_for("asdf qwerty"), FALLBACK);
    }

    #[test]
    fn empty_text_falls_through() {
        assert_eq!(reply_for(""), FALLBACK);
    }
}
