//! Ingestion cycle orchestrator: two sequential lanes (victims, attacks) per
//! cycle. A `try_lock` guard rejects overlapping runs with a busy signal, so
//! a manual trigger can never interleave writes with the timer-driven run.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use threatwire_common::{
    NewAttack, NewVictim, RecordKind, Result, ThreatwireError,
};
use threatwire_store::RecordStore;

use crate::filter::filter_victims;
use crate::provider::ThreatFeedProvider;
use crate::summary::Summarizer;
use crate::window::recent_unseen;

/// Per-lane outcome counts for one cycle.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LaneReport {
    pub fetched: usize,
    pub filtered: usize,
    pub saved: usize,
}

/// Outcome of one full two-lane cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CycleReport {
    pub victims: LaneReport,
    pub attacks: LaneReport,
    pub elapsed_ms: u64,
}

pub struct Ingestor {
    store: RecordStore,
    provider: Arc<dyn ThreatFeedProvider>,
    summarizer: Summarizer,
    window_days: i64,
    target_countries: Vec<String>,
    target_activity: String,
    run_lock: Mutex<()>,
}

impl Ingestor {
    pub fn new(
        store: RecordStore,
        provider: Arc<dyn ThreatFeedProvider>,
        summarizer: Summarizer,
        window_days: i64,
        target_countries: Vec<String>,
        target_activity: String,
    ) -> Self {
        Self {
            store,
            provider,
            summarizer,
            window_days,
            target_countries,
            target_activity,
            run_lock: Mutex::new(()),
        }
    }

    /// Run one full ingest cycle. At most one cycle executes at a time; a
    /// trigger arriving mid-run gets `CycleInProgress` rather than blocking.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| ThreatwireError::CycleInProgress)?;

        let started = Instant::now();
        info!("Ingest cycle starting");

        let victims = self.run_victims_lane().await;
        let attacks = self.run_attacks_lane().await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            victims_saved = victims.saved,
            attacks_saved = attacks.saved,
            elapsed_ms,
            "Ingest cycle complete"
        );

        Ok(CycleReport {
            victims,
            attacks,
            elapsed_ms,
        })
    }

    /// Victims lane: known-URL load, fetch, window filter, category filter,
    /// summarize, persist. Every failure is contained to this lane.
    async fn run_victims_lane(&self) -> LaneReport {
        let known = match self.store.existing_urls(RecordKind::Victim).await {
            Ok(k) => k,
            Err(e) => {
                error!(error = %e, "Victims lane: failed to load known URLs, skipping lane");
                return LaneReport::default();
            }
        };

        let raw = match self.provider.recent_victims().await {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "Victims lane: provider fetch failed");
                Vec::new()
            }
        };
        let fetched = raw.len();

        let now = Utc::now();
        let fresh = recent_unseen(
            raw,
            &known,
            now,
            Duration::days(self.window_days),
            |v| &v.url,
            |v| &v.discovered,
        );
        let matched = filter_victims(fresh, &self.target_countries, &self.target_activity);
        let filtered = matched.len();

        let mut saved = 0usize;
        for v in matched {
            let summary = self.summarizer.victim_summary(&v).await;
            let generated_title = self.summarizer.victim_title(&v).await;

            let record = NewVictim {
                url: v.url.clone(),
                title: v.victim,
                country: v.country,
                activity: v.activity,
                group_name: v.group,
                discovered: v.discovered,
                published: v.attackdate,
                description: v.description,
                summary,
                generated_title,
            };

            match self.store.insert_victim_if_absent(&record).await {
                Ok(true) => saved += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(url = %v.url, error = %e, "Failed to save victim record");
                }
            }
        }

        info!(
            lane = RecordKind::Victim.as_str(),
            fetched, filtered, saved, "Lane complete"
        );
        LaneReport {
            fetched,
            filtered,
            saved,
        }
    }

    /// Attacks lane: same shape as the victims lane, minus the category
    /// filter and keyed on the `added` timestamp.
    async fn run_attacks_lane(&self) -> LaneReport {
        let known = match self.store.existing_urls(RecordKind::Cyberattack).await {
            Ok(k) => k,
            Err(e) => {
                error!(error = %e, "Attacks lane: failed to load known URLs, skipping lane");
                return LaneReport::default();
            }
        };

        let raw = match self.provider.recent_cyberattacks().await {
            Ok(a) => a,
            Err(e) => {
                error!(error = %e, "Attacks lane: provider fetch failed");
                Vec::new()
            }
        };
        let fetched = raw.len();

        let now = Utc::now();
        let fresh = recent_unseen(
            raw,
            &known,
            now,
            Duration::days(self.window_days),
            |a| &a.url,
            |a| &a.added,
        );
        let filtered = fresh.len();

        let mut saved = 0usize;
        for a in fresh {
            let summary = self.summarizer.attack_summary(&a).await;
            let generated_title = self.summarizer.attack_title(&a).await;

            let record = NewAttack {
                url: a.url.clone(),
                title: a.title,
                date: a.date,
                description: a.description,
                summary,
                generated_title,
            };

            match self.store.insert_attack_if_absent(&record).await {
                Ok(true) => saved += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(url = %a.url, error = %e, "Failed to save cyberattack record");
                }
            }
        }

        info!(
            lane = RecordKind::Cyberattack.as_str(),
            fetched, filtered, saved, "Lane complete"
        );
        LaneReport {
            fetched,
            filtered,
            saved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use threatwire_common::{RawAttack, RawVictim};

    struct MockProvider {
        victims: Vec<RawVictim>,
        attacks: Vec<RawAttack>,
    }

    #[async_trait]
    impl ThreatFeedProvider for MockProvider {
        async fn recent_victims(&self) -> Result<Vec<RawVictim>> {
            Ok(self.victims.clone())
        }

        async fn recent_cyberattacks(&self) -> Result<Vec<RawAttack>> {
            Ok(self.attacks.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ThreatFeedProvider for FailingProvider {
        async fn recent_victims(&self) -> Result<Vec<RawVictim>> {
            Err(ThreatwireError::Provider("connection refused".to_string()))
        }

        async fn recent_cyberattacks(&self) -> Result<Vec<RawAttack>> {
            Ok(vec![attack("https://example.com/a/1")])
        }
    }

    fn recent_stamp() -> String {
        Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    fn victim(url: &str, country: &str, activity: &str) -> RawVictim {
        RawVictim {
            url: url.to_string(),
            victim: "Test Corp".to_string(),
            country: country.to_string(),
            activity: activity.to_string(),
            group: "lockbit".to_string(),
            discovered: recent_stamp(),
            ..Default::default()
        }
    }

    fn attack(url: &str) -> RawAttack {
        RawAttack {
            url: url.to_string(),
            title: "Incident".to_string(),
            date: "2025-01-01".to_string(),
            added: recent_stamp(),
            ..Default::default()
        }
    }

    fn targets() -> Vec<String> {
        vec!["CN".to_string(), "HK".to_string(), "MO".to_string()]
    }

    async fn ingestor(provider: Arc<dyn ThreatFeedProvider>) -> Ingestor {
        let store = RecordStore::in_memory().await.unwrap();
        let summarizer = Summarizer::new(None, false, targets(), "Financial Services".to_string());
        Ingestor::new(
            store,
            provider,
            summarizer,
            7,
            targets(),
            "Financial Services".to_string(),
        )
    }

    #[tokio::test]
    async fn cycle_filters_dedupes_and_saves() {
        let provider = Arc::new(MockProvider {
            victims: vec![
                victim("https://example.com/v/1", "CN", "Retail"),
                victim("https://example.com/v/2", "US", "Retail"), // filtered out
                victim("https://example.com/v/3", "US", "Financial Services"),
            ],
            attacks: vec![attack("https://example.com/a/1")],
        });
        let ing = ingestor(provider).await;

        let report = ing.run_cycle().await.unwrap();
        assert_eq!(report.victims.fetched, 3);
        assert_eq!(report.victims.filtered, 2);
        assert_eq!(report.victims.saved, 2);
        assert_eq!(report.attacks.saved, 1);
    }

    #[tokio::test]
    async fn second_run_over_same_batch_saves_nothing() {
        let provider = Arc::new(MockProvider {
            victims: vec![victim("https://example.com/v/1", "CN", "Retail")],
            attacks: vec![attack("https://example.com/a/1")],
        });
        let ing = ingestor(provider).await;

        let first = ing.run_cycle().await.unwrap();
        assert_eq!(first.victims.saved, 1);
        assert_eq!(first.attacks.saved, 1);

        let second = ing.run_cycle().await.unwrap();
        assert_eq!(second.victims.saved, 0);
        assert_eq!(second.attacks.saved, 0);
    }

    #[tokio::test]
    async fn provider_failure_leaves_other_lane_running() {
        let ing = ingestor(Arc::new(FailingProvider)).await;

        let report = ing.run_cycle().await.unwrap();
        assert_eq!(report.victims.fetched, 0);
        assert_eq!(report.victims.saved, 0);
        assert_eq!(report.attacks.saved, 1);
    }

    #[tokio::test]
    async fn concurrent_trigger_is_rejected_and_no_duplicates_land() {
        let provider = Arc::new(MockProvider {
            victims: vec![
                victim("https://example.com/v/1", "CN", "Retail"),
                victim("https://example.com/v/2", "HK", "Retail"),
            ],
            attacks: vec![attack("https://example.com/a/1")],
        });
        let ing = Arc::new(ingestor(provider).await);

        let a = Arc::clone(&ing);
        let b = Arc::clone(&ing);
        let (ra, rb) = tokio::join!(a.run_cycle(), b.run_cycle());

        let busy = [&ra, &rb]
            .iter()
            .filter(|r| matches!(r, Err(ThreatwireError::CycleInProgress)))
            .count();
        let ok = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
        // Either one run was rejected, or they ran strictly one after the
        // other; in both cases writes never interleave.
        assert!(ok >= 1 && ok + busy == 2);

        // Run once more so both lanes have definitely seen the full batch.
        let _ = ing.run_cycle().await;

        let (victim_count, _) = ing.store.stats(RecordKind::Victim).await.unwrap();
        let (attack_count, _) = ing.store.stats(RecordKind::Cyberattack).await.unwrap();
        assert_eq!(victim_count, 2);
        assert_eq!(attack_count, 1);
    }
}
