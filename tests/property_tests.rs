use eshop_api::chat::auto_reply::reply_for;
use proptest::prelude::*;

const ALL_KEYWORDS: &[&str] = &[
    "hello", "hi", "hey", "greetings", "order", "track", "tracking", "delivery", "return",
    "refund", "exchange", "payment", "pay", "checkout", "shipping", "ship", "product", "item",
    "stock", "available", "cancel", "cancellation", "discount", "coupon", "promo", "offer",
    "help", "support", "assistance", "thank", "thanks",
];

proptest! {
    /// Any text free of every keyword resolves to the generic fallback.
    #[test]
    fn keyword_free_text_gets_the_fallback(text in "[a-z ]{0,64}") {
        prop_assume!(ALL_KEYWORDS.iter().all(|kw| !text.contains(kw)));
        prop_assert_eq!(reply_for(&text), reply_for(""));
    }

    /// Matching ignores case entirely.
    #[test]
    fn replies_are_case_insensitive(text in "[a-zA-Z !?]{0,64}") {
        prop_assert_eq!(reply_for(&text), reply_for(&text.to_uppercase()));
    }

    /// The matcher is total: every input yields some canned reply.
    #[test]
    fn every_input_yields_a_reply(text in "\\PC*") {
        prop_assert!(!reply_for(&text).is_empty());
    }
}
