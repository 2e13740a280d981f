//! Concurrent analysis of many images.
//!
//! Each analysis is independent and CPU-bound, so it runs on tokio's
//! blocking pool. At most `workers` analyses are in flight; results come
//! back in input order.

use std::sync::Arc;

use futures_util::stream::{self, Stream, StreamExt};
use uuid::Uuid;

use crate::types::SkinAnalysis;

use super::analyzer::SkinAnalyzer;
use super::source::ImageSource;

/// Stream `(source, analysis)` pairs in input order.
pub fn analyze_stream(
    analyzer: Arc<SkinAnalyzer>,
    sources: Vec<ImageSource>,
    workers: usize,
) -> impl Stream<Item = (ImageSource, SkinAnalysis)> {
    stream::iter(sources)
        .map(move |source| {
            let analyzer = Arc::clone(&analyzer);
            async move {
                let task_source = source.clone();
                let analysis =
                    match tokio::task::spawn_blocking(move || analyzer.analyze(&task_source)).await
                    {
                        Ok(analysis) => analysis,
                        Err(e) => {
                            tracing::error!(
                                "Analysis task for {:?} did not complete: {e}",
                                source.display_path()
                            );
                            SkinAnalysis::failed(
                                Uuid::new_v4(),
                                0.0,
                                format!("Analysis task failed: {e}"),
                            )
                        }
                    };
                (source, analysis)
            }
        })
        .buffered(workers.max(1))
}

/// Analyze every source and collect the results in input order.
pub async fn analyze_batch(
    analyzer: Arc<SkinAnalyzer>,
    sources: Vec<ImageSource>,
    workers: usize,
) -> Vec<SkinAnalysis> {
    analyze_stream(analyzer, sources, workers)
        .map(|(_, analysis)| analysis)
        .collect()
        .await
}
