use super::*;
use crate::activity::MemoryActivityLog;
use crate::config::{OfficeHoursConfig, RotationConfig};
use crate::notify::LogSender;
use crate::pool::PoolRegistry;
use crate::rotation::Selector;
use crate::scheduler::ManualClock;
use crate::settings::ConfigSettings;
use crate::store::{Agent, Lead, LeadStatus, MemoryStore};
use chrono::{Duration, TimeZone, Utc};

struct Fixture {
    store: Arc<MemoryStore>,
    activity: Arc<MemoryActivityLog>,
    settings: Arc<ConfigSettings>,
    clock: Arc<ManualClock>,
    ctx: JobContext,
}

fn base_time() -> chrono::DateTime<Utc> {
    // Mid-morning, inside any office-hours window used in tests.
    Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
}

async fn fixture(agents: &[&str]) -> Fixture {
    fixture_with(agents, RotationConfig::default(), OfficeHoursConfig::default()).await
}

async fn fixture_with(
    agents: &[&str],
    config: RotationConfig,
    office_hours: OfficeHoursConfig,
) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let pool = Arc::new(PoolRegistry::new());
    let clock = Arc::new(ManualClock::new(base_time()));
    for id in agents {
        store
            .upsert_agent(Agent::new(id.to_string(), id.to_string()))
            .await
            .unwrap();
        pool.add_member("portal", id).unwrap();
    }
    let selector = Arc::new(Selector::new(
        pool,
        store.clone() as Arc<dyn EntityStore>,
    ));
    let activity = Arc::new(MemoryActivityLog::new());
    let settings = Arc::new(ConfigSettings::new(
        [],
        office_hours,
        clock.clone() as Arc<dyn Clock>,
    ));
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone() as Arc<dyn EntityStore>,
        selector,
        activity.clone(),
        Arc::new(LogSender),
        clock.clone() as Arc<dyn Clock>,
    ));
    let ctx = JobContext {
        store: store.clone() as Arc<dyn EntityStore>,
        orchestrator,
        settings: settings.clone(),
        activity: activity.clone(),
        notifier: Arc::new(LogSender),
        clock: clock.clone() as Arc<dyn Clock>,
        config,
    };
    Fixture {
        store,
        activity,
        settings,
        clock,
        ctx,
    }
}

async fn seed_lead(fx: &Fixture, id: &str, status: LeadStatus) {
    let mut lead = Lead::new(
        id.to_string(),
        format!("Lead {}", id),
        "portal".to_string(),
        fx.clock.now(),
    );
    lead.status = status;
    fx.store.insert_lead(lead).await.unwrap();
}

// --- No-Activity Rotation ---

#[tokio::test]
async fn no_activity_rotates_stale_lead_and_sets_guard() {
    let fx = fixture(&["agent-a", "agent-b"]).await;
    seed_lead(&fx, "l1", LeadStatus::Contacted).await;
    // Round-robin assigns agent-a and advances the ring flag to agent-b,
    // which is where a later rotation will land.
    fx.ctx
        .orchestrator
        .assign_round_robin("l1", "portal", "intake")
        .await
        .unwrap();

    fx.clock.advance(Duration::hours(5));
    let summary = NoActivityRotationJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);

    let edge = fx
        .store
        .open_primary_assignment("l1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edge.agent_id, "agent-b");
    assert!(edge.loop_guard);
}

#[tokio::test]
async fn guarded_lead_is_not_rotated_again_next_pass() {
    let fx = fixture(&["agent-a", "agent-b"]).await;
    seed_lead(&fx, "l1", LeadStatus::Contacted).await;
    fx.ctx
        .orchestrator
        .assign_manual("l1", "agent-a", "admin")
        .await
        .unwrap();

    fx.clock.advance(Duration::hours(5));
    NoActivityRotationJob.run(&fx.ctx).await.unwrap();
    let count_after_first = fx.store.get_lead("l1").await.unwrap().unwrap().assignment_count;

    // Even far past the threshold the guard keeps the lead out of the batch.
    fx.clock.advance(Duration::hours(24));
    let summary = NoActivityRotationJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.processed, 0);
    let lead = fx.store.get_lead("l1").await.unwrap().unwrap();
    assert_eq!(lead.assignment_count, count_after_first);
}

#[tokio::test]
async fn activity_clears_guard_and_rearms_rotation() {
    let fx = fixture(&["agent-a", "agent-b"]).await;
    seed_lead(&fx, "l1", LeadStatus::Contacted).await;
    fx.ctx
        .orchestrator
        .assign_manual("l1", "agent-a", "admin")
        .await
        .unwrap();

    fx.clock.advance(Duration::hours(5));
    NoActivityRotationJob.run(&fx.ctx).await.unwrap();

    fx.ctx.orchestrator.record_activity("l1").await.unwrap();
    fx.clock.advance(Duration::hours(5));
    let summary = NoActivityRotationJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.succeeded, 1);
}

#[tokio::test]
async fn disabled_job_produces_skip_log_and_no_reassignments() {
    let fx = fixture(&["agent-a", "agent-b"]).await;
    seed_lead(&fx, "l1", LeadStatus::Contacted).await;
    fx.ctx
        .orchestrator
        .assign_manual("l1", "agent-a", "admin")
        .await
        .unwrap();
    fx.settings.set("jobs.no_activity_rotation.enabled", "false");

    fx.clock.advance(Duration::hours(5));
    let summary = NoActivityRotationJob.run(&fx.ctx).await.unwrap();
    assert!(summary.was_skipped());
    assert_eq!(summary.skipped.as_deref(), Some("disabled"));

    let skips = fx.activity.events_of_type("job.skipped");
    assert_eq!(skips.len(), 1);
    assert_eq!(skips[0].properties["reason"], "disabled");

    let lead = fx.store.get_lead("l1").await.unwrap().unwrap();
    assert_eq!(lead.assignment_count, 1);
}

#[tokio::test]
async fn rotation_waits_for_office_hours() {
    let office = OfficeHoursConfig {
        enforced: true,
        start_hour: 9,
        end_hour: 18,
    };
    let fx = fixture_with(&["agent-a", "agent-b"], RotationConfig::default(), office).await;
    seed_lead(&fx, "l1", LeadStatus::Contacted).await;
    fx.ctx
        .orchestrator
        .assign_manual("l1", "agent-a", "admin")
        .await
        .unwrap();

    // 10:00 + 13h = 23:00, outside the window.
    fx.clock.advance(Duration::hours(13));
    let summary = NoActivityRotationJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.skipped.as_deref(), Some("outside office hours"));

    // Next morning the same candidate rotates.
    fx.clock.advance(Duration::hours(11));
    let summary = NoActivityRotationJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.succeeded, 1);
}

#[tokio::test]
async fn one_bad_candidate_does_not_abort_the_batch() {
    let fx = fixture(&["agent-a", "agent-b"]).await;
    for id in ["l1", "l2", "l3"] {
        seed_lead(&fx, id, LeadStatus::Contacted).await;
        fx.ctx
            .orchestrator
            .assign_manual(id, "agent-a", "admin")
            .await
            .unwrap();
    }
    // l2's pool vanishes out from under the job: its rotation fails, the
    // others still succeed.
    let broken = Lead {
        source_id: "ghost-source".to_string(),
        ..fx.store.get_lead("l2").await.unwrap().unwrap()
    };
    fx.store.insert_lead(broken).await.unwrap();

    fx.clock.advance(Duration::hours(5));
    let summary = NoActivityRotationJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
}

// --- No-Answer Recycling ---

#[tokio::test]
async fn no_answer_recycles_young_lead_to_different_agent() {
    let fx = fixture(&["agent-a", "agent-b", "agent-c"]).await;
    seed_lead(&fx, "l1", LeadStatus::NoAnswer).await;
    fx.ctx
        .orchestrator
        .assign_manual("l1", "agent-a", "admin")
        .await
        .unwrap();

    let summary = NoAnswerRecycleJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.succeeded, 1);

    let lead = fx.store.get_lead("l1").await.unwrap().unwrap();
    assert_ne!(lead.agent_id.as_deref(), Some("agent-a"));
    assert_eq!(lead.no_answer_count, 1);
    assert_eq!(lead.assignment_count, 2);
    // Still fresh after the second assignment.
    assert!(lead.is_fresh);
}

#[tokio::test]
async fn no_answer_ignores_leads_older_than_two_days() {
    let fx = fixture(&["agent-a", "agent-b"]).await;
    let stale_birth = fx.clock.now() - Duration::days(3);
    let mut lead = Lead::new(
        "old".to_string(),
        "Old Lead".to_string(),
        "portal".to_string(),
        stale_birth,
    );
    lead.status = LeadStatus::NoAnswer;
    fx.store.insert_lead(lead).await.unwrap();

    let summary = NoAnswerRecycleJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.processed, 0);
}

// --- Not-Interested Recycling ---

#[tokio::test]
async fn not_interested_third_attempt_hits_fallback_agent() {
    let config = RotationConfig {
        fallback_agent_id: Some("admin-agent".to_string()),
        ..RotationConfig::default()
    };
    let fx = fixture_with(
        &["agent-a", "agent-b", "agent-c"],
        config,
        OfficeHoursConfig::default(),
    )
    .await;
    fx.store
        .upsert_agent(Agent::new("admin-agent".to_string(), "Admin".to_string()))
        .await
        .unwrap();
    seed_lead(&fx, "l1", LeadStatus::NotInterested).await;
    fx.ctx
        .orchestrator
        .assign_manual("l1", "agent-a", "admin")
        .await
        .unwrap();

    // Attempt 2: random pool agent, never the fallback.
    NotInterestedRecycleJob.run(&fx.ctx).await.unwrap();
    let lead = fx.store.get_lead("l1").await.unwrap().unwrap();
    assert_eq!(lead.assignment_count, 2);
    assert_ne!(lead.agent_id.as_deref(), Some("admin-agent"));
    fx.store
        .update_lead_status("l1", LeadStatus::NotInterested, fx.clock.now())
        .await
        .unwrap();

    // Attempt 3: always the fallback.
    NotInterestedRecycleJob.run(&fx.ctx).await.unwrap();
    let lead = fx.store.get_lead("l1").await.unwrap().unwrap();
    assert_eq!(lead.assignment_count, 3);
    assert_eq!(lead.agent_id.as_deref(), Some("admin-agent"));

    // The cycle terminated: count ceiling keeps the lead out of the batch.
    fx.store
        .update_lead_status("l1", LeadStatus::NotInterested, fx.clock.now())
        .await
        .unwrap();
    let summary = NotInterestedRecycleJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.processed, 0);
}

#[tokio::test]
async fn not_interested_without_fallback_is_a_job_failure() {
    let fx = fixture(&["agent-a", "agent-b"]).await;
    seed_lead(&fx, "l1", LeadStatus::NotInterested).await;

    let err = NotInterestedRecycleJob.run(&fx.ctx).await.unwrap_err();
    assert!(matches!(err, JobError::MissingFallbackAgent));
}

// --- Fresh-Lead Demotion ---

#[tokio::test]
async fn demotion_clears_fresh_flag_exactly_once() {
    let fx = fixture(&["agent-a", "agent-b", "agent-c"]).await;
    seed_lead(&fx, "l1", LeadStatus::Contacted).await;
    fx.ctx
        .orchestrator
        .assign_manual("l1", "agent-a", "admin")
        .await
        .unwrap();
    fx.ctx
        .orchestrator
        .assign_manual("l1", "agent-b", "admin")
        .await
        .unwrap();

    let summary = FreshLeadDemotionJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.succeeded, 1);
    let lead = fx.store.get_lead("l1").await.unwrap().unwrap();
    assert!(!lead.is_fresh);

    // Second pass finds nothing: the transition is one-way and one-time.
    let summary = FreshLeadDemotionJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.processed, 0);
}

#[tokio::test]
async fn demotion_leaves_singly_assigned_leads_fresh() {
    let fx = fixture(&["agent-a"]).await;
    seed_lead(&fx, "l1", LeadStatus::Contacted).await;
    fx.ctx
        .orchestrator
        .assign_manual("l1", "agent-a", "admin")
        .await
        .unwrap();

    let summary = FreshLeadDemotionJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert!(fx.store.get_lead("l1").await.unwrap().unwrap().is_fresh);
}

// --- Reminders ---

#[tokio::test]
async fn call_reminder_counts_overdue_pending_assignments() {
    let fx = fixture(&["agent-a"]).await;
    seed_lead(&fx, "l1", LeadStatus::New).await;
    fx.ctx
        .orchestrator
        .assign_manual("l1", "agent-a", "admin")
        .await
        .unwrap();

    // Not overdue yet.
    let summary = CallReminderJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.processed, 0);

    fx.clock.advance(Duration::hours(1));
    let summary = CallReminderJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.succeeded, 1);

    // Ownership untouched.
    let lead = fx.store.get_lead("l1").await.unwrap().unwrap();
    assert_eq!(lead.agent_id.as_deref(), Some("agent-a"));
    assert_eq!(lead.assignment_count, 1);
}

#[tokio::test]
async fn accepted_assignments_get_no_reminder() {
    let fx = fixture(&["agent-a"]).await;
    seed_lead(&fx, "l1", LeadStatus::New).await;
    fx.ctx
        .orchestrator
        .assign_manual("l1", "agent-a", "admin")
        .await
        .unwrap();
    fx.ctx.orchestrator.accept("l1", "agent-a").await.unwrap();

    fx.clock.advance(Duration::hours(1));
    let summary = CallReminderJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.processed, 0);
}

#[tokio::test]
async fn daily_digest_reports_per_agent_counts() {
    let fx = fixture(&["agent-a", "agent-b"]).await;
    for id in ["l1", "l2"] {
        seed_lead(&fx, id, LeadStatus::New).await;
        fx.ctx
            .orchestrator
            .assign_manual(id, "agent-a", "admin")
            .await
            .unwrap();
    }

    let summary = DailyDigestJob.run(&fx.ctx).await.unwrap();
    // One digest per agent holding open assignments.
    assert_eq!(summary.succeeded, 1);
}

// --- Batch bounds ---

#[tokio::test]
async fn batches_respect_the_configured_cap_fifo() {
    let config = RotationConfig {
        batch_size: 2,
        ..RotationConfig::default()
    };
    let fx = fixture_with(
        &["agent-a", "agent-b"],
        config,
        OfficeHoursConfig::default(),
    )
    .await;
    for i in 0..4 {
        let id = format!("l{}", i);
        seed_lead(&fx, &id, LeadStatus::Contacted).await;
        fx.ctx
            .orchestrator
            .assign_manual(&id, "agent-a", "admin")
            .await
            .unwrap();
        // Stagger assignment times so FIFO order is observable.
        fx.clock.advance(Duration::minutes(1));
    }

    fx.clock.advance(Duration::hours(5));
    let summary = NoActivityRotationJob.run(&fx.ctx).await.unwrap();
    assert_eq!(summary.processed, 2);

    // The oldest two were rotated (now guarded); the rest wait their turn.
    for (id, guarded) in [("l0", true), ("l1", true), ("l2", false), ("l3", false)] {
        let edge = fx
            .store
            .open_primary_assignment(id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edge.loop_guard, guarded, "lead {}", id);
    }
}
