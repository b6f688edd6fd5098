//! End-to-end render job behaviour against the in-memory host.

use std::path::Path;
use std::time::Duration;

use crossbeam_channel::bounded;
use pretty_assertions::assert_eq;
use spriteframe_core::{
    Action, ActionSelection, CoreError, JobOutcome, JobState, MemoryHost, RenderConfig,
    RenderController, SceneObject, Vec3,
};

const TICK: Duration = Duration::from_millis(5);

fn two_action_host() -> MemoryHost {
    MemoryHost::new(Vec3::new(0.0, -10.0, 4.0))
        .with_action(Action::new("A", 1.0, 10.0))
        .with_action(Action::new("B", 1.0, 6.0))
        .with_selected(SceneObject::animated("Hero"))
}

fn config(root: &Path, angles: u32, selection: ActionSelection) -> RenderConfig {
    RenderConfig {
        actions: selection,
        ..RenderConfig::default()
            .with_output_path(root)
            .with_rotation_angles(angles)
    }
}

fn run(host: MemoryHost, config: &RenderConfig) -> (JobOutcome, MemoryHost) {
    let mut controller = RenderController::new(host).with_tick_interval(TICK);
    controller.start(config).unwrap();
    let outcome = controller.run(|| false, |_| {}).unwrap();
    let host = controller.into_host().unwrap();
    (outcome, host)
}

fn dir_names(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn empty_selection_fails_without_touching_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("out");
    let host = MemoryHost::new(Vec3::new(0.0, -10.0, 4.0)).with_action(Action::new("A", 1.0, 10.0));

    let mut controller = RenderController::new(host);
    let err = controller
        .start(&config(&root, 4, ActionSelection::default()))
        .unwrap_err();

    assert!(matches!(err, CoreError::NoSelection));
    assert_eq!(controller.state(), JobState::Failed);
    assert!(!root.exists());
}

#[test]
fn object_without_animation_data_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let host = two_action_host().with_selected(SceneObject::static_object("Floor"));

    let mut controller = RenderController::new(host);
    let err = controller
        .start(&config(tmp.path(), 4, ActionSelection::default()))
        .unwrap_err();

    match err {
        CoreError::MissingAnimationData { object } => assert_eq!(object, "Floor"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn no_included_action_never_renders() {
    let tmp = tempfile::tempdir().unwrap();
    let mut selection = ActionSelection::default();
    selection.set("A", false);
    selection.set("B", false);

    let mut controller = RenderController::new(two_action_host());
    let err = controller
        .start(&config(tmp.path(), 4, selection))
        .unwrap_err();

    assert!(matches!(err, CoreError::NoActionSelected));
    assert!(controller.host().unwrap().renders().is_empty());
}

#[test]
fn only_included_action_gets_output() {
    let tmp = tempfile::tempdir().unwrap();
    let mut selection = ActionSelection::default();
    selection.set("A", true);
    selection.set("B", false);

    let (outcome, host) = run(two_action_host(), &config(tmp.path(), 2, selection));

    assert!(outcome.is_completed());
    assert_eq!(dir_names(tmp.path()), vec!["A".to_string()]);
    assert!(host
        .renders()
        .iter()
        .all(|r| r.frame_range == Some((1, 10))));
}

#[test]
fn four_angles_make_four_directions_and_four_renders() {
    let tmp = tempfile::tempdir().unwrap();
    let (outcome, host) = run(
        two_action_host(),
        &config(tmp.path(), 4, ActionSelection::only(["A"])),
    );

    assert!(outcome.is_completed());
    assert_eq!(
        dir_names(&tmp.path().join("A")),
        vec!["direction_0", "direction_1", "direction_2", "direction_3"]
    );
    assert_eq!(host.renders().len(), 4);
    assert_eq!(outcome.summary().render_calls, 4);
    assert_eq!(outcome.summary().actions_completed, vec!["A".to_string()]);

    let templates: Vec<_> = host
        .renders()
        .iter()
        .map(|r| r.output_template.clone())
        .collect();
    for (j, template) in templates.iter().enumerate() {
        assert_eq!(
            template,
            &tmp.path()
                .join("A")
                .join(format!("direction_{}", j))
                .join("frame_####")
        );
    }
}

#[test]
fn camera_visits_distinct_angles_and_closes_the_circle() {
    let tmp = tempfile::tempdir().unwrap();
    let start = Vec3::new(0.0, -10.0, 4.0);
    let (_, host) = run(
        two_action_host(),
        &config(tmp.path(), 4, ActionSelection::only(["A"])),
    );

    let locations: Vec<Vec3> = host.renders().iter().map(|r| r.camera.location).collect();
    for pair in locations.windows(2) {
        assert!(pair[0].distance(&pair[1]) > 1.0);
    }
    assert!(locations[3].distance(&start) < 1e-9);
}

#[test]
fn every_render_faces_the_origin() {
    for angles in [3, 4, 8] {
        let tmp = tempfile::tempdir().unwrap();
        let (outcome, host) = run(
            two_action_host(),
            &config(tmp.path(), angles, ActionSelection::default()),
        );

        assert!(outcome.is_completed());
        assert_eq!(host.renders().len(), 2 * angles as usize);
        for (i, record) in host.renders().iter().enumerate() {
            let off = record.camera.angle_to_origin();
            assert!(off < 1e-9, "angles={} render={} off by {} rad", angles, i, off);
        }
    }
}

#[test]
fn default_output_root_leaves_project_folders_alone() {
    let project = tempfile::tempdir().unwrap();
    std::fs::create_dir(project.path().join("A")).unwrap();
    std::fs::write(project.path().join("A").join("notes.txt"), b"keep").unwrap();

    let mut config = RenderConfig::default().with_rotation_angles(1);
    config.output_path = config.resolved_output_path(project.path());
    let (outcome, _) = run(two_action_host(), &config);

    assert!(outcome.is_completed());
    assert!(project.path().join("A").join("notes.txt").exists());
    assert!(project.path().join("sprites").join("A").join("direction_0").is_dir());
}

#[test]
fn output_root_equal_to_base_folder_is_rejected() {
    let mut controller = RenderController::new(two_action_host());
    let err = controller
        .start(&RenderConfig::default().with_output_path(""))
        .unwrap_err();

    assert!(matches!(err, CoreError::InvalidConfig { field: "output_path", .. }));
    assert!(controller.host().unwrap().renders().is_empty());
}

#[test]
fn stop_between_angles_keeps_partial_output() {
    let tmp = tempfile::tempdir().unwrap();
    let (reached_tx, reached_rx) = bounded::<()>(0);
    let (resume_tx, resume_rx) = bounded::<()>(0);
    let host = two_action_host().writing_frames().with_render_hook(move |index| {
        if index == 1 {
            let _ = reached_tx.send(());
            let _ = resume_rx.recv();
        }
        Ok(())
    });

    let mut controller = RenderController::new(host).with_tick_interval(TICK);
    controller
        .start(&config(tmp.path(), 4, ActionSelection::only(["A"])))
        .unwrap();

    // Angle 1 is rendering; ask to stop before angle 2 begins.
    reached_rx.recv().unwrap();
    controller.stop_handle().unwrap().request_stop();
    resume_tx.send(()).unwrap();

    let outcome = controller.run(|| false, |_| {}).unwrap();
    assert_eq!(outcome.state(), JobState::Cancelled);
    assert_eq!(controller.state(), JobState::Cancelled);
    assert_eq!(outcome.summary().render_calls, 2);
    assert_eq!(
        dir_names(&tmp.path().join("A")),
        vec!["direction_0", "direction_1"]
    );
    assert_eq!(controller.host().unwrap().renders().len(), 2);
}

#[test]
fn cancel_joins_worker_and_reports_cancelled() {
    let tmp = tempfile::tempdir().unwrap();
    let (reached_tx, reached_rx) = bounded::<()>(0);
    let host = two_action_host().with_render_hook(move |index| {
        if index == 0 {
            let _ = reached_tx.send(());
        }
        Ok(())
    });

    let mut controller = RenderController::new(host);
    controller
        .start(&config(tmp.path(), 8, ActionSelection::default()))
        .unwrap();
    reached_rx.recv().unwrap();

    let outcome = controller.cancel().unwrap();
    assert!(matches!(outcome, JobOutcome::Cancelled(_)));
    assert!(outcome.summary().render_calls < 16);
    assert!(controller.host().is_some());
    assert!(matches!(controller.poll(), Err(CoreError::NoActiveJob)));
}

#[test]
fn rerun_replaces_stale_files() {
    let tmp = tempfile::tempdir().unwrap();
    let stale_dir = tmp.path().join("A").join("direction_7");
    std::fs::create_dir_all(&stale_dir).unwrap();
    std::fs::write(stale_dir.join("frame_0001.png"), b"old").unwrap();
    std::fs::write(tmp.path().join("A").join("notes.txt"), b"old").unwrap();

    let (outcome, _) = run(
        two_action_host().writing_frames(),
        &config(tmp.path(), 2, ActionSelection::only(["A"])),
    );

    assert!(outcome.is_completed());
    assert_eq!(
        dir_names(&tmp.path().join("A")),
        vec!["direction_0", "direction_1"]
    );
    assert_eq!(dir_names(&tmp.path().join("A").join("direction_0")).len(), 10);
}

#[test]
fn render_failure_is_reported_not_swallowed() {
    let tmp = tempfile::tempdir().unwrap();
    let host = two_action_host().with_render_hook(|index| {
        if index == 2 {
            Err("GPU lost".to_string())
        } else {
            Ok(())
        }
    });

    let (outcome, host) = run(host, &config(tmp.path(), 4, ActionSelection::only(["A"])));

    assert_eq!(outcome.state(), JobState::Failed);
    assert!(outcome.error().unwrap().to_string().contains("GPU lost"));
    assert_eq!(host.renders().len(), 2);
}

#[test]
fn worker_panic_is_reported_as_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let host = two_action_host().with_render_hook(|index| {
        if index == 2 {
            panic!("renderer crashed");
        }
        Ok(())
    });

    let mut controller = RenderController::new(host).with_tick_interval(TICK);
    controller
        .start(&config(tmp.path(), 4, ActionSelection::only(["A"])))
        .unwrap();
    let outcome = controller.run(|| false, |_| {}).unwrap();

    assert!(matches!(
        outcome.error(),
        Some(CoreError::WorkerPanicked)
    ));
    assert_eq!(outcome.summary().render_calls, 3);
    assert_eq!(outcome.summary().directions_created, 3);
    assert!(outcome.summary().actions_completed.is_empty());
    assert!(matches!(
        controller.start(&config(tmp.path(), 1, ActionSelection::only(["A"]))),
        Err(CoreError::HostUnavailable)
    ));
}

#[test]
fn controller_can_run_a_second_job_after_the_first() {
    let tmp = tempfile::tempdir().unwrap();
    let mut controller = RenderController::new(two_action_host()).with_tick_interval(TICK);

    controller
        .start(&config(tmp.path(), 2, ActionSelection::only(["A"])))
        .unwrap();
    assert!(controller.run(|| false, |_| {}).unwrap().is_completed());

    controller
        .start(&config(tmp.path(), 2, ActionSelection::only(["B"])))
        .unwrap();
    assert!(controller.run(|| false, |_| {}).unwrap().is_completed());

    assert_eq!(dir_names(tmp.path()), vec!["A".to_string(), "B".to_string()]);
    assert_eq!(controller.host().unwrap().renders().len(), 4);
}
