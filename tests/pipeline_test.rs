//! Render pipeline against the instrumented mock backend: admission limits,
//! batch isolation and timeout recovery.

mod common;

use common::mock_backend::{SURFACE_HEIGHT, SURFACE_WIDTH};
use common::{MockBackend, FAILING_TEXT, HANGING_TEXT, MALFORMED_TEXT, NEKO};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tategaki::error::PipelineError;
use tategaki::models::{PoolSettings, RenderRequest};
use tategaki::services::{FontCatalog, PoolStats, RenderContext, RenderPipeline, TextRenderer};

fn settings(pool_size: usize, max_concurrency: usize) -> PoolSettings {
    PoolSettings {
        pool_size,
        max_concurrency,
        render_timeout: Duration::from_secs(5),
        precreate: false,
    }
}

async fn pipeline(settings: PoolSettings, backend: MockBackend) -> Arc<RenderPipeline<MockBackend>> {
    let context = RenderContext::start(settings, backend).await;
    Arc::new(RenderPipeline::new(context, Arc::new(FontCatalog::empty("antique"))).unwrap())
}

#[tokio::test]
async fn test_single_render_trims_mock_surface() {
    let backend = MockBackend::new();
    let pipeline = pipeline(settings(1, 1), backend.clone()).await;

    let artifact = pipeline.render(&RenderRequest::new(NEKO)).await.unwrap();
    assert!(artifact.trimmed);
    assert_eq!((artifact.width, artifact.height), (10, 20));
    assert!(artifact.width < SURFACE_WIDTH && artifact.height < SURFACE_HEIGHT);
    assert_eq!(artifact.font, "antique");
    assert!(artifact.processing_time_ms >= 0.0);

    assert_eq!(backend.renders(), 1);
    assert_eq!(backend.resets(), 1);
    assert_eq!(pipeline.status().pool.in_use, 0);
}

#[tokio::test]
async fn test_admission_caps_concurrent_renders() {
    let backend = MockBackend::with_delay(Duration::from_millis(30));
    let pipeline = pipeline(settings(4, 2), backend.clone()).await;

    let tasks: Vec<_> = (0..6)
        .map(|i| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.render(&RenderRequest::new(format!("テキスト{i}"))).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(backend.renders(), 6);
    assert!(backend.max_active() <= 2, "max active was {}", backend.max_active());
    assert!(backend.created() <= 2, "only admitted work creates resources");
    assert_eq!(pipeline.status().in_flight, 0);
}

#[tokio::test]
async fn test_batch_isolates_failing_item() {
    let backend = MockBackend::new();
    let pipeline = pipeline(settings(2, 2), backend.clone()).await;

    let requests = vec![
        RenderRequest::new("一つ目"),
        RenderRequest::new(FAILING_TEXT),
        RenderRequest::new("三つ目"),
    ];
    let outcomes = pipeline.render_batch(&requests).await.unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_ok());
    let failure = outcomes[1].as_ref().unwrap_err();
    assert_eq!(failure.code, "RENDER_ERROR");
    assert!(outcomes[2].is_ok());

    // One resource served the whole batch and was released once
    assert_eq!(backend.created(), 1);
    assert_eq!(backend.renders(), 3);
    assert_eq!(backend.resets(), 1);
    assert_eq!(
        pipeline.status().pool,
        PoolStats {
            capacity: 2,
            created: 1,
            idle: 1,
            in_use: 0
        }
    );
}

#[tokio::test]
async fn test_batch_holds_one_admission_permit() {
    let backend = MockBackend::with_delay(Duration::from_millis(10));
    let pipeline = pipeline(settings(2, 1), backend.clone()).await;

    let batch = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            let requests: Vec<_> = (0..5).map(|i| RenderRequest::new(format!("項目{i}"))).collect();
            pipeline.render_batch(&requests).await
        })
    };
    let single = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.render(&RenderRequest::new("単発")).await })
    };

    assert_eq!(batch.await.unwrap().unwrap().len(), 5);
    single.await.unwrap().unwrap();
    assert_eq!(backend.max_active(), 1);
}

#[tokio::test]
async fn test_timeout_replaces_resource() {
    let backend = MockBackend::new();
    let settings = PoolSettings {
        render_timeout: Duration::from_millis(50),
        ..settings(1, 1)
    };
    let pipeline = pipeline(settings, backend.clone()).await;

    let err = pipeline.render(&RenderRequest::new(HANGING_TEXT)).await.unwrap_err();
    assert!(matches!(err, PipelineError::RenderTimeout(_)), "got {err:?}");
    assert_eq!(err.stage(), "render");

    // The stuck resource was closed without reset and replaced
    assert_eq!(backend.created(), 2);
    assert_eq!(backend.closed(), 1);
    assert_eq!(backend.resets(), 0);
    assert_eq!(pipeline.status().pool.created, 1);

    // Capacity is intact
    let artifact = pipeline.render(&RenderRequest::new(NEKO)).await.unwrap();
    assert_eq!((artifact.width, artifact.height), (10, 20));
}

#[tokio::test]
async fn test_batch_continues_after_timeout_with_one_release() {
    let backend = MockBackend::new();
    let settings = PoolSettings {
        render_timeout: Duration::from_millis(50),
        ..settings(2, 1)
    };
    let pipeline = pipeline(settings, backend.clone()).await;

    let requests = vec![
        RenderRequest::new("一つ目"),
        RenderRequest::new(HANGING_TEXT),
        RenderRequest::new("三つ目"),
    ];
    let outcomes = pipeline.render_batch(&requests).await.unwrap();

    let oks: Vec<bool> = outcomes.iter().map(Result::is_ok).collect();
    assert_eq!(oks, vec![true, false, true]);

    // Same resource for every item; released once, as a replacement
    assert_eq!(backend.closed() + backend.resets(), 1);
    assert_eq!(backend.closed(), 1);
    assert_eq!(backend.created(), 2);
    assert_eq!(backend.renders(), 3);
    assert_eq!(
        pipeline.status().pool,
        PoolStats {
            capacity: 2,
            created: 1,
            idle: 1,
            in_use: 0
        }
    );
}

#[tokio::test]
async fn test_batch_reports_malformed_surface_in_place() {
    let backend = MockBackend::new();
    let pipeline = pipeline(settings(2, 1), backend.clone()).await;

    let requests = vec![
        RenderRequest::new("一つ目"),
        RenderRequest::new(MALFORMED_TEXT),
        RenderRequest::new("三つ目"),
    ];
    let outcomes = pipeline.render_batch(&requests).await.unwrap();

    assert_eq!(outcomes.len(), 3);
    let first = outcomes[0].as_ref().unwrap();
    assert_eq!((first.width, first.height), (10, 20));
    assert_eq!(outcomes[1].as_ref().unwrap_err().code, "RENDER_ERROR");
    assert!(outcomes[2].is_ok());

    // A bad bitmap does not break the resource
    assert_eq!(backend.created(), 1);
    assert_eq!(backend.resets(), 1);
    assert_eq!(backend.closed(), 0);
    assert_eq!(pipeline.status().pool.in_use, 0);
}

#[tokio::test]
async fn test_single_render_malformed_surface_is_post_process_error() {
    let backend = MockBackend::new();
    let pipeline = pipeline(settings(1, 1), backend.clone()).await;

    let err = pipeline.render(&RenderRequest::new(MALFORMED_TEXT)).await.unwrap_err();

    assert_eq!(err.stage(), "post_process");
    assert_eq!(backend.resets(), 1);
    assert_eq!(pipeline.status().in_flight, 0);
}

#[tokio::test]
async fn test_batch_fails_whole_when_no_resource() {
    let backend = MockBackend::new();
    backend.fail_next_creations(1);
    let pipeline = pipeline(settings(1, 1), backend.clone()).await;

    let err = pipeline
        .render_batch(&[RenderRequest::new(NEKO)])
        .await
        .unwrap_err();
    assert_eq!(err.stage(), "pool");
    assert_eq!(pipeline.status().in_flight, 0);
}

#[tokio::test]
async fn test_warmup_uses_pool() {
    let backend = MockBackend::new();
    let pipeline = pipeline(settings(1, 1), backend.clone()).await;

    pipeline.warmup().await.unwrap();
    assert_eq!(backend.renders(), 1);
    assert_eq!(pipeline.status().pool.idle, 1);
}

#[tokio::test]
async fn test_shutdown_closes_pool_resources() {
    let backend = MockBackend::new();
    let settings = PoolSettings {
        precreate: true,
        ..settings(2, 2)
    };
    let pipeline = pipeline(settings, backend.clone()).await;
    assert_eq!(backend.created(), 2);

    pipeline.shutdown().await;
    assert_eq!(backend.closed(), 2);
    assert!(pipeline.render(&RenderRequest::new(NEKO)).await.is_err());
}
