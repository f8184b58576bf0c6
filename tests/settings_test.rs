mod common;

use actor_picker::catalog::Scale;
use actor_picker::config::PickerSettings;
use actor_picker::request::{AnimatedFormat, OutputMode};
use actor_picker::PickerController;
use common::MockCollaborator;
use std::sync::Arc;

#[tokio::test]
async fn test_settings_file_drives_startup_and_limits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picker.toml");
    std::fs::write(
        &path,
        "[startup]\ndefault_actor = \"ratau\"\n\n[limits]\nenabled = true\nmax_scale = 2.0\n",
    )
    .unwrap();

    let settings = PickerSettings::load(Some(path.as_path())).unwrap();
    assert_eq!(settings.startup.default_actor, "ratau");
    assert!(settings.limits.enabled);
    assert_eq!(settings.limits.max_text_len, 100);

    let mock = Arc::new(MockCollaborator::new());
    let (controller, _events) = PickerController::new(mock.clone(), settings);
    controller.startup().await.unwrap();
    assert_eq!(mock.calls(), vec!["catalog", "detail:ratau", "colours:ratau"]);

    assert!(controller.set_scale(Scale::Factor(5.0)).await);
    let request = controller
        .render_request(OutputMode::Animated(AnimatedFormat::Apng))
        .await
        .unwrap();
    assert_eq!(request.path_and_query(), "/v1/ratau/Ratau?scale=2&animation=idle&format=apng");
}

#[tokio::test]
async fn test_missing_default_actor_falls_back_to_first() {
    let mut settings = PickerSettings::default();
    settings.startup.default_actor = "ghost".to_string();

    let mock = Arc::new(MockCollaborator::new());
    let (controller, _events) = PickerController::new(mock.clone(), settings);
    assert!(controller.startup().await.unwrap());

    // Catalog is sorted by name, so Follower comes first
    assert_eq!(controller.selection().await.unwrap().actor().slug, "follower");
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(PickerSettings::load(Some(dir.path().join("absent.toml").as_path())).is_err());
}
