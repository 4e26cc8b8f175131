//! Orchestration tests for the split pipeline, run against fake tools.

use std::path::Path;
use std::time::Duration;

use vsplit_models::{JobId, SegmentRequest, SegmentStatus};

use crate::backend::FfmpegBackend;
use crate::download::HttpSourceFetcher;
use crate::error::MediaError;
use crate::probe::FALLBACK_DURATION_SECS;
use crate::split::orchestrator::{SplitOrchestrator, SplitRequest};
use crate::split::test_fixtures::{stalling_server, FakeBackend, FakeFetcher};

const SOURCE: &str = "https://cdn.example.com/videos/talk.mp4";

fn req(start: &str, end: &str) -> SegmentRequest {
    SegmentRequest::new(start, end)
}

fn request(job: &str, segments: Vec<SegmentRequest>) -> SplitRequest {
    SplitRequest::new(SOURCE, segments).with_job_id(JobId::from_string(job))
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn test_results_align_with_requests() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = SplitOrchestrator::new(
        FakeBackend::new(120.0).failing_on(3, "boom"),
        FakeFetcher::new(".mp4"),
        dir.path(),
    );

    let segments = vec![
        req("00:00:00", "00:00:10"),
        req("bogus", "10"),
        req("50", "40"),
        req("60", "70"),
        req("01:00", "01:30.5"),
    ];
    let output = orchestrator.split(request("job", segments.clone())).await.unwrap();
    let results = output.results.into_vec();

    assert_eq!(results.len(), segments.len());
    assert_eq!(results[0].status, SegmentStatus::Ok);
    assert_eq!(
        results[1].error.as_deref(),
        Some("Invalid time format: bogus. Expected HH:MM:SS[.mmm]")
    );
    assert_eq!(
        results[2].error.as_deref(),
        Some("Invalid split: start (50) must be before end (40) within duration")
    );
    assert_eq!(results[3].error.as_deref(), Some("FFmpeg error: boom"));
    assert_eq!(results[4].status, SegmentStatus::Ok);
    assert_eq!(
        results[4].output_path.as_deref(),
        Some(dir.path().join("job_split_5.mp4").as_path())
    );
    assert!(results.iter().all(|r| r.error.as_deref() != Some("Unprocessed")));
}

#[tokio::test]
async fn test_encode_failure_does_not_affect_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = SplitOrchestrator::new(
        FakeBackend::new(100.0).failing_on(1, "Error while decoding stream\n"),
        FakeFetcher::new(".mkv"),
        dir.path(),
    );

    let output = orchestrator
        .split(request("job", vec![req("0", "10"), req("10", "20"), req("20", "30")]))
        .await
        .unwrap();

    let r = output.results.into_vec();
    assert_eq!(r[0].status, SegmentStatus::Ok);
    assert_eq!(r[1].status, SegmentStatus::Error);
    assert_eq!(r[1].error.as_deref(), Some("FFmpeg error: Error while decoding stream"));
    assert!(r[1].output_path.is_none());
    assert_eq!(r[2].status, SegmentStatus::Ok);
    assert!(r[0].output_path.as_ref().unwrap().exists());
    assert!(r[2].output_path.as_ref().unwrap().exists());
    assert_eq!(orchestrator.backend().calls().len(), 3);
}

#[tokio::test]
async fn test_segments_encoded_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator =
        SplitOrchestrator::new(FakeBackend::new(100.0), FakeFetcher::new(".mp4"), dir.path());

    orchestrator
        .split(request("job", vec![req("30", "40"), req("x", "1"), req("0", "5")]))
        .await
        .unwrap();

    let outputs: Vec<_> = orchestrator
        .backend()
        .calls()
        .into_iter()
        .map(|c| c.output.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(outputs, vec!["job_split_1.mp4", "job_split_3.mp4"]);
}

#[tokio::test]
async fn test_bounds_are_clamped_before_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator =
        SplitOrchestrator::new(FakeBackend::new(45.0), FakeFetcher::new(".mp4"), dir.path());

    let output = orchestrator
        .split(request("job", vec![req("-5", "10"), req("30", "00:02:00")]))
        .await
        .unwrap();

    assert!(output.results.iter().all(|r| r.is_ok()));
    let calls = orchestrator.backend().calls();
    assert_eq!((calls[0].start_secs, calls[0].end_secs), (0.0, 10.0));
    assert_eq!((calls[1].start_secs, calls[1].end_secs), (30.0, 45.0));
}

#[tokio::test]
async fn test_rejected_segment_never_reaches_encoder() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator =
        SplitOrchestrator::new(FakeBackend::new(100.0), FakeFetcher::new(".mp4"), dir.path());

    let output = orchestrator
        .split(request("job", vec![req("10", "5")]))
        .await
        .unwrap();

    let results = output.results.clone().into_vec();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, SegmentStatus::Error);
    assert!(results[0].output_path.is_none());
    assert!(results[0].error.as_deref().unwrap().starts_with("Invalid split"));
    assert!(orchestrator.backend().calls().is_empty());

    // Not a hard failure: the source is handed back for the caller to delete.
    assert!(output.source_path.exists());
    output.remove_source();
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_probe_failure_uses_fallback_duration() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = SplitOrchestrator::new(
        FakeBackend::without_duration(),
        FakeFetcher::new(".mp4"),
        dir.path(),
    );

    let output = orchestrator
        .split(request("job", vec![req("0", "30"), req("0", "90000")]))
        .await
        .unwrap();

    assert!(output.results.iter().all(|r| r.is_ok()));
    let calls = orchestrator.backend().calls();
    assert_eq!(calls[0].end_secs, 30.0);
    assert_eq!(calls[1].end_secs, FALLBACK_DURATION_SECS);
}

#[tokio::test]
async fn test_acquisition_failure_is_fatal_and_leaves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator =
        SplitOrchestrator::new(FakeBackend::new(100.0), FakeFetcher::failing(), dir.path());

    let err = orchestrator
        .split(request("job", vec![req("0", "10")]))
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::DownloadFailed { .. }));
    assert!(err.is_acquisition());
    assert!(orchestrator.backend().calls().is_empty());
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_abandoned_split_cleans_up_source_and_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = SplitOrchestrator::new(
        FakeBackend::new(100.0).hanging_on(1),
        FakeFetcher::new(".mp4"),
        dir.path(),
    );

    let attempt = tokio::time::timeout(
        Duration::from_millis(200),
        orchestrator.split(request("job", vec![req("0", "10"), req("10", "20")])),
    )
    .await;

    assert!(attempt.is_err(), "second encode never finishes");
    assert_eq!(orchestrator.backend().calls().len(), 2);
    assert!(files_in(dir.path()).is_empty(), "left behind: {:?}", files_in(dir.path()));
}

#[tokio::test]
async fn test_jobs_sharing_work_dir_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator =
        SplitOrchestrator::new(FakeBackend::new(100.0), FakeFetcher::new(".mp4"), dir.path());

    let a = orchestrator.split(request("a", vec![req("0", "5")])).await.unwrap();
    let b = orchestrator.split(request("b", vec![req("0", "5")])).await.unwrap();

    assert_eq!(
        files_in(dir.path()),
        vec!["a_input.mp4", "a_split_1.mp4", "b_input.mp4", "b_split_1.mp4"]
    );

    a.remove_source();
    a.remove_outputs();
    assert_eq!(files_in(dir.path()), vec!["b_input.mp4", "b_split_1.mp4"]);
    assert!(b.results.get(0).unwrap().is_ok());
}

#[tokio::test]
async fn test_job_id_generated_when_absent() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator =
        SplitOrchestrator::new(FakeBackend::new(100.0), FakeFetcher::new(".mp4"), dir.path());

    let output = orchestrator
        .split(SplitRequest::new(SOURCE, vec![req("0", "5")]))
        .await
        .unwrap();

    assert!(!output.job_id.as_str().is_empty());
    let expected = dir.path().join(format!("{}_split_1.mp4", output.job_id));
    assert_eq!(output.results.get(0).unwrap().output_path.as_deref(), Some(expected.as_path()));
}

#[tokio::test]
async fn test_unstartable_encoder_fails_operation_and_removes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = SplitOrchestrator::new(
        FakeBackend::new(100.0).unavailable_on(1),
        FakeFetcher::new(".mp4"),
        dir.path(),
    );

    let err = orchestrator
        .split(request("job", vec![req("0", "10"), req("10", "20"), req("20", "30")]))
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::FfmpegNotFound));
    assert_eq!(orchestrator.backend().calls().len(), 2, "stops at the first unstartable encode");
    assert!(files_in(dir.path()).is_empty(), "left behind: {:?}", files_in(dir.path()));
}

#[tokio::test]
async fn test_missing_ffmpeg_binary_is_not_a_segment_error() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FfmpegBackend::new().with_programs("ffmpeg-missing-xyz", "ffprobe-missing-xyz");
    let orchestrator = SplitOrchestrator::new(backend, FakeFetcher::new(".mp4"), dir.path());

    let err = orchestrator
        .split(request("job", vec![req("0", "10"), req("10", "20")]))
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::FfmpegNotFound));
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_killed_encode_does_not_affect_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = SplitOrchestrator::new(
        FakeBackend::new(100.0).timing_out_on(0),
        FakeFetcher::new(".mp4"),
        dir.path(),
    );

    let output = orchestrator
        .split(request("job", vec![req("0", "10"), req("10", "20")]))
        .await
        .unwrap();

    let r = output.results.into_vec();
    assert_eq!(r[0].status, SegmentStatus::Error);
    assert!(r[0].error.as_deref().unwrap().starts_with("FFmpeg error: "));
    assert_eq!(r[1].status, SegmentStatus::Ok);
    assert_eq!(files_in(dir.path()), vec!["job_input.mp4", "job_split_2.mp4"]);
}

#[tokio::test]
async fn test_job_id_that_is_not_a_file_name_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let work_dir = dir.path().join("work");
    let orchestrator =
        SplitOrchestrator::new(FakeBackend::new(100.0), FakeFetcher::new(".mp4"), &work_dir);

    for id in ["../escaped", "nested/job", ".."] {
        let err = orchestrator
            .split(request(id, vec![req("0", "5")]))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidJobId(ref bad) if bad == id));
    }

    assert!(orchestrator.backend().calls().is_empty());
    assert!(files_in(dir.path()).is_empty(), "written: {:?}", files_in(dir.path()));
}

#[tokio::test]
async fn test_split_abandoned_during_download_leaves_nothing() {
    let server = stalling_server(4096).await;
    let dir = tempfile::tempdir().unwrap();
    let fetcher = HttpSourceFetcher::new(Duration::from_secs(30)).unwrap();
    let orchestrator = SplitOrchestrator::new(FakeBackend::new(100.0), fetcher, dir.path());

    let attempt = tokio::time::timeout(
        Duration::from_millis(500),
        orchestrator.split(
            SplitRequest::new(format!("{}/talk.mp4", server), vec![req("0", "5")])
                .with_job_id(JobId::from_string("job")),
        ),
    )
    .await;

    assert!(attempt.is_err(), "download never completes");
    assert!(orchestrator.backend().calls().is_empty());
    assert!(files_in(dir.path()).is_empty(), "left behind: {:?}", files_in(dir.path()));
}
