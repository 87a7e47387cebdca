// support-service-rs/src/classifier.rs
// Keyword-based issue classification for tagging and analytics

use crate::types::IssueType;

/// Ordered category -> keyword table. The first category with a matching
/// keyword wins, so "broken package" lands in Tech even though it also
/// carries shipping vocabulary. The catch-all Other is not listed here.
const KEYWORDS: &[(IssueType, &[&str])] = &[
    (
        IssueType::Billing,
        &["charge", "payment", "refund", "invoice", "subscription", "bill", "price"],
    ),
    (
        IssueType::Tech,
        &["not working", "broken", "error", "bug", "crash", "frozen", "problem"],
    ),
    (
        IssueType::Shipping,
        &["order", "delivery", "track", "shipping", "arrived", "package"],
    ),
    (
        IssueType::Account,
        &["password", "login", "account", "email", "profile", "settings"],
    ),
];

/// Classify a question into a coarse issue category
///
/// Pure and total: case-insensitive substring matching, no error
/// conditions. Anything that matches no keyword falls through to Other.
pub fn classify_issue(question: &str) -> IssueType {
    let lower = question.to_lowercase();

    for (issue_type, keywords) in KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *issue_type;
        }
    }

    IssueType::Other
}
