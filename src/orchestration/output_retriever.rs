//! # Output Retriever
//!
//! Best-effort retrieval of captured invocation output. Listing happens up front; objects are
//! fetched lazily as the returned stream is polled, so callers decide whether to log, persist
//! or drop each blob. Failures here are never escalated to the dispatch result.

use crate::client::ObjectStore;
use crate::error::OutputError;
use crate::models::{CommandOutput, OutputDestination};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Consumer for retrieved output blobs
pub trait OutputSink: Send + Sync {
    fn accept(&self, output: &CommandOutput);
}

/// Writes each blob to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingOutputSink;

impl OutputSink for LoggingOutputSink {
    fn accept(&self, output: &CommandOutput) {
        info!("\n*** {} ***\n{}", output.key, output.content_lossy());
    }
}

/// Keys found under one dispatch's output prefix, bound to a region-pinned store
pub struct OutputListing {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: String,
    keys: Vec<String>,
}

impl OutputListing {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Fetch each listed object as the stream is polled
    pub fn into_stream(self) -> BoxStream<'static, Result<CommandOutput, OutputError>> {
        let OutputListing {
            store, bucket, keys, ..
        } = self;

        stream::iter(keys)
            .then(move |key| {
                let store = Arc::clone(&store);
                let bucket = bucket.clone();
                async move {
                    match store.get_object(&bucket, &key).await {
                        Ok(content) => Ok(CommandOutput { key, content }),
                        Err(source) => Err(OutputError::Fetch {
                            bucket,
                            key,
                            source,
                        }),
                    }
                }
            })
            .boxed()
    }
}

/// Counts from one drained listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputSummary {
    pub fetched: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct OutputRetriever {
    store: Arc<dyn ObjectStore>,
    max_keys: u32,
}

impl OutputRetriever {
    pub fn new(store: Arc<dyn ObjectStore>, max_keys: u32) -> Self {
        Self { store, max_keys }
    }

    /// List output for `dispatch_id`. `Ok(None)` without touching the store when no bucket is
    /// configured.
    pub async fn list_outputs(
        &self,
        destination: Option<&OutputDestination>,
        dispatch_id: &str,
    ) -> Result<Option<OutputListing>, OutputError> {
        let Some(destination) = destination.filter(|d| !d.bucket.is_empty()) else {
            return Ok(None);
        };
        let bucket = destination.bucket.clone();

        let region = self.store.bucket_region(&bucket).await.map_err(|source| {
            OutputError::RegionLookup {
                bucket: bucket.clone(),
                source,
            }
        })?;

        // The default client may live in another region than the bucket
        let store = self.store.with_region(&region).await.map_err(|source| {
            OutputError::RegionLookup {
                bucket: bucket.clone(),
                source,
            }
        })?;

        let prefix = destination.listing_prefix(dispatch_id);
        let keys = store
            .list_objects(&bucket, &prefix, self.max_keys)
            .await
            .map_err(|source| OutputError::Listing {
                bucket: bucket.clone(),
                prefix: prefix.clone(),
                source,
            })?;

        Ok(Some(OutputListing {
            store,
            bucket,
            prefix,
            keys,
        }))
    }

    /// List and drain every object into `sink`. Each failure is logged on its own and
    /// retrieval continues with the next object.
    #[instrument(skip(self, destination, sink))]
    pub async fn collect_output(
        &self,
        destination: Option<&OutputDestination>,
        dispatch_id: &str,
        sink: &dyn OutputSink,
    ) -> OutputSummary {
        let listing = match self.list_outputs(destination, dispatch_id).await {
            Ok(Some(listing)) => listing,
            Ok(None) => {
                info!("No output bucket configured for the command");
                return OutputSummary::default();
            }
            Err(e) => {
                error!(error = %e, "Output listing failed");
                return OutputSummary::default();
            }
        };

        let mut summary = OutputSummary::default();
        let mut outputs = listing.into_stream();
        while let Some(result) = outputs.next().await {
            match result {
                Ok(output) => {
                    sink.accept(&output);
                    summary.fetched += 1;
                }
                Err(e) => {
                    error!(error = %e, "Output fetch failed");
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
