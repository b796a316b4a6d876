use super::*;

#[tokio::test]
async fn scripted_frames_come_out_in_order_then_run_dry() {
    let mut source = ScriptedPerception::new([
        PerceptionFrame::empty(),
        PerceptionFrame::with_detections(Vec::new()),
    ]);
    assert_eq!(source.remaining(), 2);
    assert!(source.next_frame().await.expect("frame").is_some());
    assert!(source.next_frame().await.expect("frame").is_some());
    assert!(source.next_frame().await.expect("frame").is_none());
}

#[tokio::test]
async fn json_lines_skip_blanks_and_comments() {
    let recording = b"# recorded at 30fps\n\n{\"detections\":[{\"class_label\":\"FIRE\",\"confidence\":0.8}]}\n{}\n";
    let mut source = JsonLinesPerception::new(&recording[..]);

    let first = source.next_frame().await.expect("read").expect("frame");
    assert_eq!(first.detections[0].class_label, "FIRE");
    let second = source.next_frame().await.expect("read").expect("frame");
    assert_eq!(second, PerceptionFrame::empty());
    assert!(source.next_frame().await.expect("read").is_none());
}

#[tokio::test]
async fn invalid_json_line_reports_its_line_number() {
    let recording = b"{}\n{not json}\n";
    let mut source = JsonLinesPerception::new(&recording[..]);

    source.next_frame().await.expect("first frame");
    let err = source.next_frame().await.expect_err("bad line");
    assert!(err.to_string().contains("line 2"), "{err}");
}

#[tokio::test]
async fn paced_source_waits_between_frames() {
    let recording = b"{}\n{}\n{}\n";
    let mut source =
        JsonLinesPerception::new(&recording[..]).with_frame_interval(Duration::from_millis(50));

    let started = std::time::Instant::now();
    for _ in 0..3 {
        source.next_frame().await.expect("read").expect("frame");
    }
    // first tick is immediate
    assert!(started.elapsed() >= Duration::from_millis(90));
}

#[tokio::test]
async fn missing_recording_file_is_an_error() {
    let path = std::env::temp_dir().join("gesture_controller_missing_recording.jsonl");
    let err = JsonLinesPerception::open(&path)
        .await
        .err()
        .expect("must fail");
    assert!(err.to_string().contains("failed to open perception recording"));
}
