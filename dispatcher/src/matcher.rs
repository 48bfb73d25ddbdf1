//! Subscription matching.
//!
//! Decides which subscriptions receive a given event.

use launchpad_sdk::{EventKind, WebhookSubscription};

/// Returns true if the subscription should receive the event.
///
/// A subscription is eligible when it is active, lists the event kind, and
/// is either unscoped or scoped to exactly the event's token. An event
/// without a token address only reaches unscoped subscriptions.
#[must_use]
pub fn is_eligible(
    subscription: &WebhookSubscription,
    event: EventKind,
    token_address: Option<&str>,
) -> bool {
    if !subscription.active || !subscription.subscribes_to(event) {
        return false;
    }

    match (subscription.token_address.as_deref(), token_address) {
        (None, _) => true,
        (Some(scope), Some(token)) => scope == token,
        (Some(_), None) => false,
    }
}

/// Returns every eligible subscription, preserving input order.
#[must_use]
pub fn find_matching<'a, I>(
    subscriptions: I,
    event: EventKind,
    token_address: Option<&str>,
) -> Vec<WebhookSubscription>
where
    I: IntoIterator<Item = &'a WebhookSubscription>,
{
    subscriptions
        .into_iter()
        .filter(|sub| is_eligible(sub, event, token_address))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_sdk::NewSubscription;

    fn subscription(events: Vec<EventKind>, token: Option<&str>) -> WebhookSubscription {
        let mut request =
            NewSubscription::new("https://hooks.example.com/a", events, "secret", "GOWNER");
        if let Some(token) = token {
            request = request.with_token(token);
        }
        WebhookSubscription::from_request(request).expect("subscription")
    }

    #[test]
    fn test_unscoped_subscription_matches_any_token() {
        let sub = subscription(vec![EventKind::BurnSelf], None);

        assert!(is_eligible(&sub, EventKind::BurnSelf, Some("CTOKEN1")));
        assert!(is_eligible(&sub, EventKind::BurnSelf, Some("CTOKEN2")));
        assert!(is_eligible(&sub, EventKind::BurnSelf, None));
    }

    #[test]
    fn test_scoped_subscription_matches_only_its_token() {
        let sub = subscription(vec![EventKind::BurnSelf], Some("CTOKEN1"));

        assert!(is_eligible(&sub, EventKind::BurnSelf, Some("CTOKEN1")));
        assert!(!is_eligible(&sub, EventKind::BurnSelf, Some("CTOKEN2")));
        assert!(!is_eligible(&sub, EventKind::BurnSelf, None));
    }

    #[test]
    fn test_event_kind_must_be_listed() {
        let sub = subscription(vec![EventKind::TokenCreated], None);

        assert!(is_eligible(&sub, EventKind::TokenCreated, None));
        assert!(!is_eligible(&sub, EventKind::BurnSelf, None));
        assert!(!is_eligible(&sub, EventKind::MetadataUpdated, None));
    }

    #[test]
    fn test_inactive_subscription_never_matches() {
        let mut sub = subscription(EventKind::ALL.to_vec(), None);
        sub.active = false;

        for kind in EventKind::ALL {
            assert!(!is_eligible(&sub, kind, Some("CTOKEN1")));
        }
    }

    #[test]
    fn test_find_matching_filters_and_keeps_order() {
        let first = subscription(vec![EventKind::BurnAdmin], None);
        let scoped_other = subscription(vec![EventKind::BurnAdmin], Some("CTOKEN2"));
        let wrong_kind = subscription(vec![EventKind::BurnSelf], None);
        let scoped_same = subscription(vec![EventKind::BurnAdmin], Some("CTOKEN1"));

        let all = vec![
            first.clone(),
            scoped_other,
            wrong_kind,
            scoped_same.clone(),
        ];
        let matched = find_matching(&all, EventKind::BurnAdmin, Some("CTOKEN1"));

        let ids: Vec<_> = matched.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first.id, scoped_same.id]);
    }

    #[test]
    fn test_find_matching_empty() {
        let matched = find_matching(&[], EventKind::TokenCreated, None);
        assert!(matched.is_empty());
    }
}
