use super::*;
use crate::fixtures::HandBuilder;
use shared::domain::RawLandmark;

#[test]
fn short_landmark_list_is_malformed() {
    let mut raw = HandBuilder::open(100.0, 100.0).build();
    raw.landmarks.truncate(20);

    assert_eq!(
        hand_pose(&raw, None),
        Err(MalformedObservation::LandmarkCount {
            expected: HAND_LANDMARK_COUNT,
            actual: 20
        })
    );
    let frame = PerceptionFrame::with_hands(vec![raw]);
    assert!(observe_frame(&frame, PerceptionMode::Landmarks, 0.5).is_empty());
}

#[test]
fn non_finite_coordinate_is_malformed() {
    let mut raw = HandBuilder::open(100.0, 100.0).build();
    raw.landmarks[7] = RawLandmark::new(f64::NAN, 3.0);

    assert_eq!(
        hand_pose(&raw, None),
        Err(MalformedObservation::NonFiniteLandmark { index: 7 })
    );
}

#[test]
fn normalized_landmarks_are_scaled_to_frame_pixels() {
    let raw = RawHand {
        landmarks: vec![RawLandmark::new(0.5, 0.25); HAND_LANDMARK_COUNT],
    };
    let pose = hand_pose(
        &raw,
        Some(FrameSize {
            width: 640,
            height: 480,
        }),
    )
    .expect("pose");

    assert_eq!(pose.point(THUMB_TIP), Point::new(320.0, 120.0));
}

#[test]
fn extra_landmarks_beyond_the_hand_model_are_ignored() {
    let mut raw = HandBuilder::open(0.0, 0.0).build();
    raw.landmarks.push(RawLandmark::new(999.0, 999.0));

    let pose = hand_pose(&raw, None).expect("pose");
    assert_eq!(pose.points().len(), HAND_LANDMARK_COUNT);
}

#[test]
fn centroid_is_mean_of_all_points() {
    let raw = RawHand {
        landmarks: (0..HAND_LANDMARK_COUNT)
            .map(|i| RawLandmark::new(i as f64, 2.0))
            .collect(),
    };
    let pose = hand_pose(&raw, None).expect("pose");
    assert_eq!(pose.centroid(), Point::new(10.0, 2.0));
}

#[test]
fn folded_hand_reports_folded_fingers() {
    assert!(HandBuilder::open(50.0, 50.0).folded().pose().fingers_folded());
    assert!(!HandBuilder::open(50.0, 50.0).pose().fingers_folded());
}

#[test]
fn detections_below_confidence_floor_are_skipped() {
    let low = Detection {
        class_label: "FIRE".into(),
        confidence: 0.2,
    };
    let high = Detection {
        class_label: " LEFT ".into(),
        confidence: 0.9,
    };

    assert_eq!(detection_label(&low, 0.5), Ok(None));
    assert_eq!(
        observe_frame(
            &PerceptionFrame::with_detections(vec![low, high]),
            PerceptionMode::DetectorLabels,
            0.5
        ),
        vec![PoseObservation::Label("LEFT".into())]
    );
}

#[test]
fn blank_detection_label_is_malformed() {
    let blank = Detection {
        class_label: "  ".into(),
        confidence: 0.9,
    };
    assert_eq!(
        detection_label(&blank, 0.5),
        Err(MalformedObservation::EmptyLabel)
    );
}

#[test]
fn one_malformed_hand_voids_the_frame() {
    let mut truncated = HandBuilder::open(300.0, 100.0).build();
    truncated.landmarks.truncate(20);
    let frame = PerceptionFrame::with_hands(vec![
        HandBuilder::open(100.0, 100.0).pinching().build(),
        truncated,
    ]);

    assert!(observe_frame(&frame, PerceptionMode::Landmarks, 0.5).is_empty());
}

#[test]
fn one_malformed_detection_voids_the_frame() {
    let frame = PerceptionFrame::with_detections(vec![
        Detection {
            class_label: "FIRE".into(),
            confidence: 0.9,
        },
        Detection {
            class_label: "".into(),
            confidence: 0.9,
        },
    ]);

    assert!(observe_frame(&frame, PerceptionMode::DetectorLabels, 0.5).is_empty());
}

#[test]
fn observe_frame_reads_only_the_selected_representation() {
    let frame = PerceptionFrame {
        size: None,
        hands: vec![HandBuilder::open(10.0, 10.0).build()],
        detections: vec![Detection {
            class_label: "FIRE".into(),
            confidence: 0.8,
        }],
    };

    let landmarks = observe_frame(&frame, PerceptionMode::Landmarks, 0.5);
    assert_eq!(landmarks.len(), 1);
    assert!(matches!(landmarks[0], PoseObservation::Landmarks(_)));

    let labels = observe_frame(&frame, PerceptionMode::DetectorLabels, 0.5);
    assert_eq!(labels, vec![PoseObservation::Label("FIRE".into())]);
}

#[test]
fn perception_frame_parses_from_collaborator_json() {
    let frame: PerceptionFrame = serde_json::from_str(
        r#"{"size":{"width":2,"height":2},"hands":[{"landmarks":[{"x":0.5,"y":0.5,"z":-0.1}]}]}"#,
    )
    .expect("json");

    assert_eq!(frame.hands[0].landmarks[0].z, Some(-0.1));
    // one landmark is not a hand
    assert!(observe_frame(&frame, PerceptionMode::Landmarks, 0.5).is_empty());
}
