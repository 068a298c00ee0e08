use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::contributions::RawRecord;

use super::ContributionSource;

pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const CONTRIBUTIONS_QUERY: &str = "query {
  viewer {
    contributionsCollection {
      contributionCalendar {
        weeks {
          contributionDays {
            date
            contributionCount
          }
        }
      }
    }
  }
}";

/// Fetches the authenticated user's contribution calendar. The token is used as is, nothing
/// here refreshes or validates it.
pub struct GithubSource {
    client: reqwest::Client,
    token: String,
    endpoint: String,
}

impl GithubSource {
    pub fn new(token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build http client")?;
        Ok(Self {
            client,
            token,
            endpoint: GITHUB_GRAPHQL_URL.to_string(),
        })
    }

    pub fn with_endpoint(self, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..self
        }
    }
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<ViewerData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Viewer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Viewer {
    contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    contribution_calendar: ContributionCalendar,
}

#[derive(Debug, Deserialize)]
struct ContributionCalendar {
    weeks: Vec<CalendarWeek>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarWeek {
    contribution_days: Vec<ContributionDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionDay {
    date: String,
    contribution_count: u64,
}

/// Flattens the week-grouped calendar into one record per day.
fn records_from_response(response: GraphqlResponse) -> Result<Vec<RawRecord>> {
    let Some(data) = response.data else {
        let messages = response
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(anyhow!("GitHub returned no calendar: {messages}"));
    };

    Ok(data
        .viewer
        .contributions_collection
        .contribution_calendar
        .weeks
        .into_iter()
        .flat_map(|week| week.contribution_days)
        .map(|day| RawRecord::new(day.date, day.contribution_count))
        .collect())
}

#[async_trait]
impl ContributionSource for GithubSource {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        debug!("Requesting contribution calendar");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header(USER_AGENT, concat!("heatboard/", env!("CARGO_PKG_VERSION")))
            .json(&GraphqlRequest {
                query: CONTRIBUTIONS_QUERY,
            })
            .send()
            .await
            .context("Failed to fetch GitHub contributions")?
            .error_for_status()
            .context("GitHub rejected the contributions request")?
            .json::<GraphqlResponse>()
            .await
            .context("Failed to decode GitHub contributions")?;

        let records = records_from_response(response)?;
        info!("Fetched {} contribution days", records.len());
        Ok(records)
    }
}
