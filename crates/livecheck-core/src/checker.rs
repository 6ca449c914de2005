//! Live-channel lookup against the `streams` endpoint.
//!
//! One call is one GET: the channel names are comma-joined into the
//! `channel` query parameter, the body is decoded as JSON and the `streams`
//! array is handed back untouched. Channels that are offline do not appear in
//! the result at all.

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::client::{redact_token, HttpClient};
use crate::config::CheckerConfig;
use crate::error::CheckError;
use crate::model::{StreamList, StreamRecord};

/// Builds `<base_url>/streams?channel=a,b,c[&oauth_token=…]`.
///
/// Names are passed through verbatim and in order; duplicates are kept and an
/// empty slice yields an empty `channel` value.
pub fn streams_url<S: AsRef<str>>(
    config: &CheckerConfig,
    channels: &[S],
) -> Result<Url, CheckError> {
    let mut url = config.base_url.clone();
    url.path_segments_mut()
        .map_err(|_| CheckError::InvalidUrl {
            url: config.base_url.to_string(),
            reason: "URL cannot carry a path".into(),
        })?
        .pop_if_empty()
        .push("streams");

    let joined = channels
        .iter()
        .map(|c| c.as_ref())
        .collect::<Vec<&str>>()
        .join(",");

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("channel", &joined);
        if let Some(token) = &config.oauth_token {
            query.append_pair("oauth_token", token);
        }
    }

    Ok(url)
}

/// Returns the records of every channel in `channels` that is live right now.
///
/// Nothing is retried and nothing is cached; calling twice against the same
/// response yields the same list.
pub async fn fetch_streams<S: AsRef<str>>(
    client: &dyn HttpClient,
    config: &CheckerConfig,
    channels: &[S],
) -> Result<StreamList, CheckError> {
    let url = streams_url(config, channels)?;
    let safe_url = redact_token(url.as_str());
    debug!(url = %safe_url, channels = channels.len(), "Fetching streams");

    let response = client.get(url.as_str()).await?;

    if !response.is_success() {
        warn!(url = %safe_url, status = response.status, "Streams request returned error status");
        return Err(CheckError::Status {
            url: safe_url,
            status: response.status,
            body: response.body,
        });
    }

    let document = match serde_json::from_str::<Value>(&response.body) {
        Ok(document) => document,
        Err(e) => {
            warn!(error = %e, "Streams response is not JSON");
            return Err(CheckError::Protocol {
                body: response.body,
            });
        }
    };

    let streams = extract_streams(document)?;
    debug!(live = streams.len(), "Streams fetched");
    Ok(streams)
}

/// Pulls the `streams` array out of a decoded response.
///
/// A missing key counts as `null`. A document that is not an object is
/// reported as-is.
pub fn extract_streams(document: Value) -> Result<StreamList, CheckError> {
    let streams = match document {
        Value::Object(mut fields) => fields.remove("streams").unwrap_or(Value::Null),
        other => other,
    };

    let items = match streams {
        Value::Array(items) => items,
        value => {
            warn!(%value, "Streams value is not a list");
            return Err(CheckError::Schema { value });
        }
    };

    items
        .into_iter()
        .map(StreamRecord::try_from)
        .collect::<Result<StreamList, Value>>()
        .map_err(|value| {
            warn!(%value, "Streams entry is not an object");
            CheckError::Schema { value }
        })
}
