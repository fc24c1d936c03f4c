//! One logical client call.

use chrono::{DateTime, Utc};
use url::Url;

use crate::error::{SdkError, SdkResult};
use crate::network::DEADLINE_PARAM;

/// Target, deadline and retry counter of a single call.
///
/// Owned by exactly one task lifecycle; the retry counter is never shared.
#[derive(Debug, Clone)]
pub struct Operation {
    target: Url,
    deadline: DateTime<Utc>,
    retries: u32,
}

impl Operation {
    /// Build the initial request target: `root` + `path` segments + `query`,
    /// with the advisory deadline appended as epoch milliseconds.
    pub fn new(
        root: &Url,
        path: &str,
        query: &[(&str, &str)],
        deadline: DateTime<Utc>,
    ) -> SdkResult<Self> {
        let mut target = root.clone();
        target.set_query(None);
        target.set_fragment(None);
        target
            .path_segments_mut()
            .map_err(|_| SdkError::Config(format!("root URL cannot be a base: {}", root)))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));

        {
            let mut pairs = target.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
            pairs.append_pair(DEADLINE_PARAM, &deadline.timestamp_millis().to_string());
        }

        Ok(Self {
            target,
            deadline,
            retries: 0,
        })
    }

    /// The original request, re-sent on every transient-error retry.
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Advisory only: nothing in the lifecycle enforces it.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Count one more retry and return the new count.
    pub(crate) fn record_retry(&mut self) -> u32 {
        self.retries += 1;
        self.retries
    }

    pub(crate) fn reset_retries(&mut self) {
        self.retries = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn deadline() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    #[test]
    fn test_target_appends_path_query_and_deadline() {
        let root = Url::parse("https://api.realengine.ai").unwrap();
        let op = Operation::new(
            &root,
            "caption",
            &[("url", "http://example.com/img?a=1&b=2")],
            deadline(),
        )
        .unwrap();

        assert_eq!(op.target().path(), "/caption");
        let pairs: Vec<(String, String)> = op
            .target()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("url".to_string(), "http://example.com/img?a=1&b=2".to_string()),
                ("deadline".to_string(), "1700000000000".to_string()),
            ]
        );
        assert_eq!(op.deadline(), deadline());
        assert_eq!(op.retries(), 0);
    }

    #[test]
    fn test_target_keeps_root_path_prefix() {
        let root = Url::parse("http://localhost:9000/api/").unwrap();
        let op = Operation::new(&root, "/v2/caption/", &[], deadline()).unwrap();
        assert_eq!(op.target().path(), "/api/v2/caption");
    }

    #[test]
    fn test_retry_counter() {
        let root = Url::parse("http://localhost").unwrap();
        let mut op = Operation::new(&root, "caption", &[], deadline()).unwrap();
        assert_eq!(op.record_retry(), 1);
        assert_eq!(op.record_retry(), 2);
        op.reset_retries();
        assert_eq!(op.retries(), 0);
    }

    #[test]
    fn test_rejects_non_base_root() {
        let root = Url::parse("mailto:ops@realengine.ai").unwrap();
        assert!(Operation::new(&root, "caption", &[], deadline()).is_err());
    }
}
