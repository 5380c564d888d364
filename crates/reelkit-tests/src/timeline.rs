//! Integration tests for the timeline model.
//!
//! Exercises the copy-on-write edit API end to end: project assembly,
//! derived durations, no-op semantics and snapshot sharing.

use std::sync::Arc;

use proptest::prelude::*;
use reelkit_timeline::{Clip, Filter, FilterKind, History, Project, Track};
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────

fn clip(start: u64, end: u64) -> Clip {
    Clip::new("media/test.mp4", start, end).unwrap()
}

fn track_with(name: &str, spans: &[(u64, u64)]) -> Track {
    spans
        .iter()
        .fold(Track::new(name), |t, &(s, e)| t.add_clip(clip(s, e)).unwrap())
}

// ── Project assembly & timing ──────────────────────────────────

#[test]
fn demo_scenario_durations() {
    let project = Project::new("Demo");
    assert_eq!(project.tracks().len(), 1);
    assert!(project.tracks()[0].clips().is_empty());
    assert_eq!(project.duration(), 0);

    let track_id = project.tracks()[0].id();
    let project = project
        .update_track(track_id, |t| t.add_clip(clip(0, 5000)))
        .unwrap();
    assert_eq!(project.duration(), 5000);

    let project = project
        .update_track(track_id, |t| t.add_clip(clip(5000, 10_000)))
        .unwrap();
    assert_eq!(project.duration(), 10_000);
}

#[test]
fn project_duration_is_max_of_track_ends() {
    let project = Project::new("P");
    let default_id = project.tracks()[0].id();
    let project = project
        .remove_track(default_id)
        .add_track(track_with("V1", &[(5000, 10_000)]))
        .unwrap()
        .add_track(track_with("V2", &[(0, 7000)]))
        .unwrap();
    assert_eq!(project.duration(), 10_000);
}

#[test]
fn update_track_leaves_other_tracks_untouched() {
    let project = Project::new("P")
        .add_track(track_with("V2", &[(0, 1000), (2000, 3000)]))
        .unwrap()
        .add_track(track_with("V3", &[(500, 700)]))
        .unwrap();
    let target = project.tracks()[1].id();

    let edited = project
        .update_track(target, |t| t.add_clip(clip(3000, 4000)))
        .unwrap();

    assert_eq!(edited.tracks()[0], project.tracks()[0]);
    assert_eq!(edited.tracks()[2], project.tracks()[2]);
    assert_eq!(edited.tracks()[1].clips().len(), 3);
    assert_eq!(project.tracks()[1].clips().len(), 2);
}

#[test]
fn nested_filter_edit_through_project() {
    let target = clip(0, 2000).add_filter(Filter::contrast(0.2).unwrap()).unwrap();
    let (clip_id, filter_id) = (target.id(), target.filters()[0].id());
    let project = Project::new("P");
    let track_id = project.tracks()[0].id();
    let project = project
        .update_track(track_id, |t| t.add_clip(target))
        .unwrap();

    let edited = project
        .update_track(track_id, |t| {
            t.update_clip(clip_id, |c| c.update_filter(filter_id, |f| f.with_value(-0.6)))
        })
        .unwrap();
    let filter = &edited.all_clips().next().unwrap().filters()[0];
    assert_eq!(filter.kind(), FilterKind::Contrast(-0.6));

    // Deep failure leaves every level untouched.
    let failed = project.update_track(track_id, |t| {
        t.update_clip(clip_id, |c| c.update_filter(filter_id, |f| f.with_value(4.0)))
    });
    assert!(failed.is_err());
    assert_eq!(
        project.all_clips().next().unwrap().filters()[0].value(),
        0.2
    );
}

#[test]
fn all_clips_flattens_in_track_then_clip_order() {
    let project = Project::new("P")
        .add_track(track_with("V2", &[(0, 10), (10, 20)]))
        .unwrap();
    let ends: Vec<u64> = project.all_clips().map(Clip::end_time_ms).collect();
    assert_eq!(ends, vec![10, 20]);
}

// ── No-op and idempotence ──────────────────────────────────────

#[test]
fn missing_ids_are_noops_at_every_level() {
    let project = Project::new("P");
    let track = track_with("V1", &[(0, 1000)]);
    let c = clip(0, 1000).add_filter(Filter::saturation(0.5).unwrap()).unwrap();
    let missing = Uuid::new_v4();

    assert_eq!(project.remove_track(missing), project);
    assert_eq!(track.remove_clip(missing), track);
    assert_eq!(c.remove_filter(missing), c);
    assert_eq!(track.update_clip(missing, |c| c.with_volume(0.0)).unwrap(), track);
    assert_eq!(c.update_filter(missing, |f| f.with_value(0.0)).unwrap(), c);
}

#[test]
fn removing_twice_is_idempotent() {
    let c = clip(0, 1000);
    let id = c.id();
    let track = Track::new("V1").add_clip(c).unwrap();
    let once = track.remove_clip(id);
    assert_eq!(once.remove_clip(id), once);
}

// ── Snapshots ──────────────────────────────────────────────────

#[test]
fn snapshots_are_shareable_across_threads() {
    let mut history = History::new(Project::new("Shared"), 10);
    let track_id = history.current().tracks()[0].id();
    history
        .apply(|p| p.update_track(track_id, |t| t.add_clip(clip(0, 3000))))
        .unwrap();

    let snapshot: Arc<Project> = history.current();
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let snapshot = Arc::clone(&snapshot);
            std::thread::spawn(move || snapshot.duration())
        })
        .collect();

    history
        .apply(|p| p.update_track(track_id, |t| t.add_clip(clip(3000, 9000))))
        .unwrap();

    for reader in readers {
        assert_eq!(reader.join().unwrap(), 3000);
    }
    assert_eq!(history.current().duration(), 9000);
    assert_eq!(history.undo().unwrap().duration(), 3000);
}

// ── Laws ───────────────────────────────────────────────────────

fn spans() -> impl Strategy<Value = Vec<(u64, u64)>> {
    prop::collection::vec((0u64..100_000, 0u64..100_000), 0..8)
        .prop_map(|v| v.into_iter().map(|(s, len)| (s, s + len)).collect())
}

proptest! {
    #[test]
    fn add_then_remove_round_trips(existing in spans(), start in 0u64..100_000, len in 0u64..100_000) {
        let track = track_with("V1", &existing);
        let added = clip(start, start + len);
        let id = added.id();

        let round_trip = track.add_clip(added).unwrap().remove_clip(id);
        prop_assert_eq!(round_trip.clips(), track.clips());
    }

    #[test]
    fn remove_unknown_is_identity(existing in spans()) {
        let track = track_with("V1", &existing);
        prop_assert_eq!(track.remove_clip(Uuid::new_v4()), track.clone());
    }

    #[test]
    fn track_duration_is_max_end(existing in spans()) {
        let track = track_with("V1", &existing);
        let expected = existing.iter().map(|&(_, e)| e).max().unwrap_or(0);
        prop_assert_eq!(track.duration(), expected);
    }
}
