use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::checkpoint::CheckpointStore;
use crate::config::Config;
use crate::discourse::{FeedClient, Post};
use crate::keywords::KeywordFilter;
use crate::telegram::Notifier;

/// Counters reported when a run completes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Posts walked during paging, counted per fully-processed page.
    pub processed: usize,
    /// Posts that matched the keyword list.
    pub matched: usize,
    /// Matches delivered successfully.
    pub delivered: usize,
    /// Matches whose delivery failed.
    pub failed: usize,
}

/// Execute one full poll-filter-deliver cycle.
///
/// Walks the feed backward from the newest post until the previous run's
/// checkpoint, the post limit, or feed exhaustion stops it, then delivers
/// the collected matches oldest-first.
///
/// # Errors
///
/// Returns an error if the checkpoint cannot be loaded or saved, or if a
/// feed page cannot be fetched. Delivery failures are counted, not fatal.
pub async fn run(
    config: &Config,
    feed: &FeedClient,
    filter: &KeywordFilter,
    notifier: &Notifier,
    store: &dyn CheckpointStore,
) -> Result<RunSummary> {
    let last_id = store.load().context("Failed to load checkpoint")?;
    match last_id {
        Some(id) => info!(last_id = id, "Resuming after previous run's checkpoint"),
        None => info!("No checkpoint from a previous run, walking up to the post limit"),
    }

    let (mut matches, processed) = collect_matches(config, feed, filter, store, last_id).await?;

    info!(
        matched = matches.len(),
        processed, "Paging finished, delivering matches"
    );

    // Deliver oldest match first.
    matches.reverse();

    let mut delivered = 0;
    let mut failed = 0;
    for post in &matches {
        match notifier.deliver(post).await {
            Ok(true) => {
                debug!(post_id = post.id, "Delivered post");
                delivered += 1;
            }
            Ok(false) => {
                warn!(post_id = post.id, "Chat API rejected delivery");
                failed += 1;
            }
            Err(e) => {
                warn!(post_id = post.id, "Delivery failed: {e:#}");
                failed += 1;
            }
        }

        tokio::time::sleep(config.send_delay).await;
    }

    Ok(RunSummary {
        processed,
        matched: matches.len(),
        delivered,
        failed,
    })
}

/// Walk the feed newest-first, collecting keyword matches.
///
/// The first post id of the run's first non-empty page is persisted as the
/// new checkpoint before any filtering, so the next run stops where this one
/// started even if this run dies partway through.
async fn collect_matches(
    config: &Config,
    feed: &FeedClient,
    filter: &KeywordFilter,
    store: &dyn CheckpointStore,
    last_id: Option<u64>,
) -> Result<(Vec<Post>, usize)> {
    let mut matches = Vec::new();
    let mut processed = 0usize;
    let mut before_id = None;
    let mut checkpointed = false;

    'paging: loop {
        let page = feed
            .fetch_page(before_id)
            .await
            .context("Failed to fetch feed page")?;

        // The feed has no end sentinel; an empty page means exhaustion.
        if page.is_empty() {
            info!("Feed exhausted");
            break;
        }

        if !checkpointed {
            let newest_id = page[0].id;
            store
                .save(newest_id)
                .context("Failed to save checkpoint")?;
            debug!(checkpoint = newest_id, "Checkpoint written");
            checkpointed = true;
        }

        let page_size = page.len();
        for post in page {
            if Some(post.id) == last_id {
                info!(post_id = post.id, "Reached previous checkpoint, stopping");
                break 'paging;
            }

            before_id = Some(post.id);
            if filter.matches(&post) {
                debug!(post_id = post.id, topic = %post.topic_title, "Keyword match");
                matches.push(post);
            }
        }

        processed += page_size;
        debug!(processed, "Processed page");

        if processed > config.post_limit {
            info!(limit = config.post_limit, "Post limit exceeded, stopping");
            break;
        }

        tokio::time::sleep(config.page_delay).await;
    }

    Ok((matches, processed))
}
