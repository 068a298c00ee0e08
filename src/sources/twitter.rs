use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info, instrument, warn};

use crate::contributions::RawRecord;

use super::ContributionSource;

pub const TWITTER_API_URL: &str = "https://api.twitter.com/2";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Largest page the timeline endpoint hands out.
const PAGE_SIZE: u32 = 100;

/// The API stops paginating a timeline after 3200 tweets anyway.
const MAX_PAGES: usize = 32;

/// Fetches a user's recent tweets through the v2 API. Every tweet becomes a record with a count
/// of one, dated by its `created_at` instant.
pub struct TwitterSource {
    client: reqwest::Client,
    token: String,
    username: String,
    base_url: String,
}

impl TwitterSource {
    pub fn new(token: String, username: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build http client")?;
        Ok(Self {
            client,
            token,
            username,
            base_url: TWITTER_API_URL.to_string(),
        })
    }

    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..self
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        self.client
            .get(url)
            .query(query)
            .bearer_auth(&self.token)
            .header(USER_AGENT, concat!("heatboard/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .with_context(|| format!("Failed to request {url}"))?
            .error_for_status()
            .with_context(|| format!("Twitter rejected {url}"))?
            .json::<T>()
            .await
            .with_context(|| format!("Failed to decode {url}"))
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: Option<String>,
}

impl ApiError {
    fn message(&self) -> &str {
        self.detail.as_deref().unwrap_or(&self.title)
    }
}

fn join_errors(errors: &[ApiError]) -> String {
    errors
        .iter()
        .map(ApiError::message)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: Option<User>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    meta: TimelineMeta,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TimelineMeta {
    next_token: Option<String>,
}

fn user_id(username: &str, response: UserResponse) -> Result<String> {
    match response.data {
        Some(user) => Ok(user.id),
        None => Err(anyhow!(
            "Twitter user {username:?} not found: {}",
            join_errors(&response.errors)
        )),
    }
}

/// Records of one timeline page and the token of the next one.
fn records_from_page(page: TimelineResponse) -> Result<(Vec<RawRecord>, Option<String>)> {
    if page.data.is_empty() && !page.errors.is_empty() {
        return Err(anyhow!(
            "Twitter returned no tweets: {}",
            join_errors(&page.errors)
        ));
    }

    let records = page
        .data
        .into_iter()
        .filter_map(|tweet| match tweet.created_at {
            Some(created_at) => Some(RawRecord::new(created_at, 1)),
            None => {
                warn!("Tweet {} has no creation date", tweet.id);
                None
            }
        })
        .collect();
    Ok((records, page.meta.next_token))
}

#[async_trait]
impl ContributionSource for TwitterSource {
    #[instrument(skip(self), fields(username = %self.username))]
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let user: UserResponse = self
            .get(
                &format!("{}/users/by/username/{}", self.base_url, self.username),
                &[],
            )
            .await?;
        let id = user_id(&self.username, user)?;
        debug!("Resolved user id {id}");

        let url = format!("{}/users/{id}/tweets", self.base_url);
        let mut records = vec![];
        let mut next_token: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let mut query = vec![
                ("tweet.fields", "created_at".to_string()),
                ("max_results", PAGE_SIZE.to_string()),
            ];
            if let Some(token) = next_token.take() {
                query.push(("pagination_token", token));
            }

            let (page, next) = records_from_page(self.get(&url, &query).await?)?;
            records.extend(page);
            match next {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        info!("Fetched {} tweets", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use crate::{
        contributions::{DayBoundary, RawRecord},
        sources::ContributionSource,
    };

    use super::{records_from_page, user_id, TimelineResponse, TwitterSource, UserResponse};

    #[test]
    fn maps_tweets_to_records() {
        let body = r#"{
          "data": [
            { "id": "2", "text": "late", "created_at": "2024-01-05T07:30:00.000Z" },
            { "id": "1", "text": "undated" }
          ],
          "meta": { "result_count": 2, "next_token": "abc" }
        }"#;
        let page: TimelineResponse = serde_json::from_str(body).unwrap();
        let (records, next) = records_from_page(page).unwrap();
        assert_eq!(records, vec![RawRecord::new("2024-01-05T07:30:00.000Z", 1)]);
        assert_eq!(next.as_deref(), Some("abc"));

        // The evening of the 4th in Los Angeles.
        let record = records[0]
            .normalize(DayBoundary::InZone(chrono_tz::America::Los_Angeles))
            .unwrap();
        assert_eq!(
            record.day(),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()
        );
    }

    #[test]
    fn empty_timeline_is_not_an_error() {
        let page: TimelineResponse =
            serde_json::from_str(r#"{ "meta": { "result_count": 0 } }"#).unwrap();
        let (records, next) = records_from_page(page).unwrap();
        assert!(records.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn surfaces_unknown_users() {
        let body = r#"{ "errors": [ { "title": "Not Found Error", "detail": "Could not find user with username: [nobody]." } ] }"#;
        let response: UserResponse = serde_json::from_str(body).unwrap();
        let error = user_id("nobody", response).unwrap_err();
        assert!(error.to_string().contains("Could not find user"));
    }

    #[tokio::test]
    async fn test_fetch_resolves_user_and_follows_pages() -> Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/by/username/reader"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{ "data": { "id": "42", "username": "reader" } }"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/users/42/tweets"))
            .and(query_param("pagination_token", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{ "data": [ { "id": "1", "text": "b", "created_at": "2024-01-03T10:00:00.000Z" } ] }"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/users/42/tweets"))
            .and(query_param("tweet.fields", "created_at"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{ "data": [ { "id": "2", "text": "a", "created_at": "2024-01-05T10:00:00.000Z" } ], "meta": { "next_token": "page-2" } }"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let source =
            TwitterSource::new("secret".into(), "reader".into())?.with_base_url(server.uri());
        let records = source.fetch().await?;
        assert_eq!(
            records,
            vec![
                RawRecord::new("2024-01-05T10:00:00.000Z", 1),
                RawRecord::new("2024-01-03T10:00:00.000Z", 1),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_token_is_an_error() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let source =
            TwitterSource::new("bad".into(), "reader".into())?.with_base_url(server.uri());
        let error = source.fetch().await.unwrap_err();
        assert!(error.to_string().contains("Twitter rejected"));
        Ok(())
    }
}
