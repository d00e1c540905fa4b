//! The shard driver: fetches, processes, and persists one shard end to end.
//!
//! Ordering contract per shard: read and decode the input, process every row
//! behind the in-flight gate, write each result as it completes, close the
//! writer, emit stats, and only then remove the shard input. A shard whose
//! input still exists has therefore not been fully persisted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Config;
use crate::error::{ShardError, ShardResult};
use crate::fetch::{BackoffPolicy, Fetcher, HttpFetcher, RetryingFetcher};
use crate::io::{
    FilesWriterFactory, FsStorage, JsonLinesDecoder, JsonStatsSink, SampleWriterFactory,
    ShardDecoder, ShardStorage, StatsSink,
};
use crate::pipeline::{
    BoundedScheduler, ColumnIndices, HashAlgorithm, MediaTransform, PassthroughTransform,
    SampleProcessor,
};
use crate::stats::{CappedCounter, ShardStats};
use crate::types::{CellValue, FetchOutcome, Row, Status};

/// One shard to process.
#[derive(Debug, Clone)]
pub struct ShardRequest {
    pub shard_id: u64,
    pub path: PathBuf,
}

/// Terminal outcome of a shard run.
#[derive(Debug)]
pub enum ShardOutcome {
    /// Results, stats, and input removal all succeeded.
    Completed(ShardStats),
    /// A structural failure aborted the shard; the input was left in place
    /// and the whole request may be retried.
    Failed(ShardRequest),
}

/// Drives shards through fetch, process, write, stats, and cleanup.
pub struct ShardDriver {
    config: Config,
    storage: Arc<dyn ShardStorage>,
    decoder: Arc<dyn ShardDecoder>,
    fetcher: Arc<dyn Fetcher>,
    transform: Arc<dyn MediaTransform>,
    writer_factory: Arc<dyn SampleWriterFactory>,
    stats_sink: Arc<dyn StatsSink>,
}

impl ShardDriver {
    pub fn new(
        config: Config,
        storage: Arc<dyn ShardStorage>,
        decoder: Arc<dyn ShardDecoder>,
        fetcher: Arc<dyn Fetcher>,
        transform: Arc<dyn MediaTransform>,
        writer_factory: Arc<dyn SampleWriterFactory>,
        stats_sink: Arc<dyn StatsSink>,
    ) -> Self {
        Self {
            config,
            storage,
            decoder,
            fetcher,
            transform,
            writer_factory,
            stats_sink,
        }
    }

    /// Driver over local JSON Lines shards with the HTTP fetcher and the
    /// one-file-per-sample writer.
    pub fn with_defaults(config: Config) -> Self {
        let stats_sink = JsonStatsSink::new(
            config.shard.output_dir.clone(),
            config.shard.shard_id_digits,
        );
        let writer_factory = FilesWriterFactory::new(config.shard.clone());
        let fetcher = HttpFetcher::new(&config.fetch);
        let transform = PassthroughTransform::new(&config.shard.encode_format);
        Self::new(
            config,
            Arc::new(FsStorage::new()),
            Arc::new(JsonLinesDecoder::new()),
            Arc::new(fetcher),
            Arc::new(transform),
            Arc::new(writer_factory),
            Arc::new(stats_sink),
        )
    }

    /// Process one shard to a terminal outcome. Structural failures are
    /// logged and reported as [`ShardOutcome::Failed`]; they never panic and
    /// never remove the input.
    pub async fn process_shard(&self, request: ShardRequest) -> ShardOutcome {
        tracing::info!(shard_id = request.shard_id, path = %request.path.display(), "processing shard");
        match self.run_shard(&request).await {
            Ok(stats) => {
                tracing::info!(
                    shard_id = request.shard_id,
                    count = stats.count,
                    successes = stats.successes,
                    "shard completed"
                );
                ShardOutcome::Completed(stats)
            }
            Err(e) => {
                tracing::error!(shard_id = request.shard_id, error = %e, "shard failed");
                ShardOutcome::Failed(request)
            }
        }
    }

    async fn run_shard(&self, request: &ShardRequest) -> ShardResult<ShardStats> {
        let start_time = unix_now();

        let bytes = self.storage.open(&request.path).await?;
        let table = self.decoder.decode(&bytes)?;
        let column_list = self.config.shard.column_list.clone();
        // An empty shard has no schema to select against; it still runs the
        // full lifecycle with zero rows.
        let rows = if table.row_count() == 0 {
            Vec::new()
        } else {
            table.select(&column_list)?
        };
        let count = rows.len() as u64;

        let verify_hash = self.parse_hash(self.config.processing.verify_hash.as_deref());
        let compute_hash = self.parse_hash(self.config.processing.compute_hash.as_deref());
        let indices = ColumnIndices::resolve(
            &column_list,
            self.config.shard.bbox_column.as_deref(),
            verify_hash,
        )?;
        let url_index = indices.url;

        let processor = Arc::new(SampleProcessor::new(
            column_list.clone(),
            indices,
            verify_hash,
            compute_hash,
            self.config.processing.extract_exif,
            request.shard_id,
            self.config.shard.sample_digits(),
            self.config.shard.shard_id_digits,
            self.transform.clone(),
        ));
        let fetcher = Arc::new(RetryingFetcher::new(
            self.fetcher.clone(),
            BackoffPolicy::new(self.config.fetch.timeout(), self.config.fetch.retries),
        ));

        let schema = output_schema(
            &column_list,
            verify_hash,
            compute_hash,
            self.config.processing.extract_exif,
        );
        let mut writer = self.writer_factory.create(request.shard_id, &schema)?;

        let scheduler = BoundedScheduler::new(self.config.processing.worker_count);
        let items: Vec<(usize, Row)> = rows.into_iter().enumerate().collect();
        let work_processor = processor.clone();
        let mut completed = scheduler.run(
            items,
            move |(row_index, row)| {
                let fetcher = fetcher.clone();
                let processor = work_processor.clone();
                async move {
                    let outcome = match row.get(url_index).and_then(CellValue::as_text) {
                        Some(url) => fetcher.fetch_with_retry(url).await,
                        None => FetchOutcome::Failure("missing url".to_string()),
                    };
                    processor.process(row_index, &row, outcome)
                }
            },
            move |(row_index, row), message| processor.reject_unexpected(row_index, &row, message),
        );

        let mut stats = ShardStats {
            shard_id: request.shard_id,
            count,
            successes: 0,
            failed_to_download: 0,
            failed_to_resize: 0,
            start_time,
            end_time: start_time,
            status_dict: CappedCounter::default(),
        };

        // Results arrive in completion order; counter updates and writes stay
        // on this task. A writer failure stops writing but keeps draining the
        // channel so in-flight tasks finish, and the writer is still closed.
        let mut write_error: Option<ShardError> = None;
        while let Some(sample) = completed.recv().await {
            match sample.status {
                Status::Success => stats.successes += 1,
                Status::FailedToDownload => stats.failed_to_download += 1,
                Status::FailedToResize => stats.failed_to_resize += 1,
            }
            match &sample.error_message {
                Some(error) => stats.status_dict.increment(error),
                None => stats.status_dict.increment(sample.status.as_str()),
            }
            if write_error.is_none() {
                if let Err(e) = writer.write(&sample.result) {
                    tracing::error!(shard_id = request.shard_id, error = %e, "writer failed");
                    write_error = Some(e);
                }
            }
        }

        writer.close()?;
        if let Some(e) = write_error {
            return Err(e);
        }
        stats.end_time = unix_now();
        self.stats_sink.write_stats(&stats)?;
        self.storage.remove(&request.path).await?;
        Ok(stats)
    }

    fn parse_hash(&self, name: Option<&str>) -> Option<HashAlgorithm> {
        // Names were validated at config load; unknown here means disabled.
        name.and_then(HashAlgorithm::parse)
    }
}

/// Output schema handed to the writer factory: input columns with the
/// verification-digest column omitted, then the synthetic result fields, then
/// any enabled optional fields.
fn output_schema(
    column_list: &[String],
    verify_hash: Option<HashAlgorithm>,
    compute_hash: Option<HashAlgorithm>,
    extract_exif: bool,
) -> Vec<String> {
    let mut schema: Vec<String> = column_list
        .iter()
        .filter(|c| verify_hash.map_or(true, |algo| c.as_str() != algo.as_str()))
        .cloned()
        .collect();
    schema.extend(
        [
            "key",
            "status",
            "error_message",
            "width",
            "height",
            "original_width",
            "original_height",
        ]
        .into_iter()
        .map(String::from),
    );
    if extract_exif {
        schema.push("exif".to_string());
    }
    if let Some(algo) = compute_hash {
        schema.push(algo.as_str().to_string());
    }
    schema
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
