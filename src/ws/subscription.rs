//! Per-connection subscription filter.
//!
//! A client follows campaigns by id (or all of them with `"*"`) and may
//! narrow the feed to a set of event types.

use std::collections::HashSet;

use crate::domain::{CampaignId, SpinEvent};

/// Which events one WebSocket connection wants.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    campaigns: HashSet<CampaignId>,
    all_campaigns: bool,
    /// Empty means every event type.
    event_types: HashSet<String>,
}

impl SubscriptionManager {
    /// Creates a filter that matches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Follows `ids`, or every campaign when `wildcard` is set.
    pub fn subscribe(&mut self, ids: &[CampaignId], wildcard: bool) {
        self.all_campaigns |= wildcard;
        self.campaigns.extend(ids.iter().copied());
    }

    /// Stops following `ids`. A wildcard is cleared by `wildcard`.
    pub fn unsubscribe(&mut self, ids: &[CampaignId], wildcard: bool) {
        if wildcard {
            self.all_campaigns = false;
        }
        for id in ids {
            self.campaigns.remove(id);
        }
    }

    /// Restricts the feed to the named event types. An empty list lifts
    /// the restriction.
    pub fn set_event_types<I: IntoIterator<Item = String>>(&mut self, types: I) {
        self.event_types = types.into_iter().collect();
    }

    /// Returns `true` if `event` should be forwarded.
    #[must_use]
    pub fn matches(&self, event: &SpinEvent) -> bool {
        let campaign_ok = self.all_campaigns || self.campaigns.contains(&event.campaign_id());
        campaign_ok
            && (self.event_types.is_empty() || self.event_types.contains(event.event_type_str()))
    }

    /// Number of campaigns followed by id.
    #[must_use]
    pub fn count(&self) -> usize {
        self.campaigns.len()
    }

    /// Returns `true` if every campaign is followed.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.all_campaigns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn updated(campaign_id: CampaignId) -> SpinEvent {
        SpinEvent::CampaignUpdated {
            campaign_id,
            active: true,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_filter_matches_nothing() {
        assert!(!SubscriptionManager::new().matches(&updated(CampaignId::new())));
    }

    #[test]
    fn follows_named_campaigns_only() {
        let mut subs = SubscriptionManager::new();
        let id = CampaignId::new();
        subs.subscribe(&[id], false);
        assert!(subs.matches(&updated(id)));
        assert!(!subs.matches(&updated(CampaignId::new())));

        subs.unsubscribe(&[id], false);
        assert!(!subs.matches(&updated(id)));
        assert_eq!(subs.count(), 0);
    }

    #[test]
    fn wildcard_can_be_cleared() {
        let mut subs = SubscriptionManager::new();
        subs.subscribe(&[], true);
        assert!(subs.matches(&updated(CampaignId::new())));
        subs.unsubscribe(&[], true);
        assert!(!subs.is_subscribed_all());
    }

    #[test]
    fn event_type_filter_narrows_feed() {
        let mut subs = SubscriptionManager::new();
        subs.subscribe(&[], true);
        subs.set_event_types(["prize_claimed".to_string()]);
        assert!(!subs.matches(&updated(CampaignId::new())));

        subs.set_event_types(Vec::new());
        assert!(subs.matches(&updated(CampaignId::new())));
    }
}
