//! The directory contract consumed by the UI, and its HTTP implementation.

use std::collections::HashMap;

use murmur_types::{ActionError, ActionResult, Channel, DmRestriction, Team, UserProfile, UserStatus};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::ChatClient;

/// Lookup and conversation operations backing the recipient picker.
///
/// Every operation resolves to an `ActionResult`; implementations never
/// panic on server or transport failures.
#[async_trait::async_trait]
pub trait DirectoryService: Send + Sync {
    /// The acting (signed-in) user.
    async fn current_user(&self) -> ActionResult<UserProfile>;

    /// Resolve a team by its URL name.
    async fn team_by_name(&self, name: &str) -> ActionResult<Team>;

    /// Server-wide direct message restriction.
    async fn restrict_direct_message(&self) -> ActionResult<DmRestriction>;

    /// A page of all active users.
    async fn get_profiles(&self, page: usize, per_page: usize) -> ActionResult<Vec<UserProfile>>;

    /// A page of the members of `team_id`.
    async fn get_profiles_in_team(&self, team_id: &str, page: usize, per_page: usize) -> ActionResult<Vec<UserProfile>>;

    /// Users matching `term`, optionally restricted to a team.
    async fn search_profiles(&self, term: &str, team_id: Option<&str>) -> ActionResult<Vec<UserProfile>>;

    /// Group conversations of the acting user matching `term`.
    async fn search_group_channels(&self, term: &str) -> ActionResult<Vec<Channel>>;

    async fn get_total_users_count(&self) -> ActionResult<u64>;

    async fn get_statuses_by_ids(&self, user_ids: &[String]) -> ActionResult<Vec<UserStatus>>;

    /// Members of a channel (used to expand group conversation matches).
    async fn get_profiles_in_channel(&self, channel_id: &str) -> ActionResult<Vec<UserProfile>>;

    /// Open or create the direct conversation between the two users.
    async fn create_direct_channel(&self, current_user_id: &str, other_user_id: &str) -> ActionResult<Channel>;

    /// Open or create the group conversation for `user_ids` (the acting user is implied).
    async fn create_group_channel(&self, user_ids: &[String]) -> ActionResult<Channel>;
}

/// Error payload returned by the server on non-success responses.
#[derive(Debug, Deserialize)]
struct ServerErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct UsersStats {
    total_users_count: u64,
}

/// Send a request and decode a JSON body, mapping every failure to `ActionError`.
async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> ActionResult<T> {
    let response = builder.send().await.map_err(|error| {
        warn!(%error, "request failed");
        ActionError::Transport(error.to_string())
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|error| ActionError::Transport(error.to_string()))?;
    if !status.is_success() {
        return Err(server_error(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|error| ActionError::Decode(error.to_string()))
}

fn server_error(status: u16, body: &str) -> ActionError {
    let message = serde_json::from_str::<ServerErrorBody>(body)
        .map(|parsed| parsed.message)
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    debug!(status, %message, "server rejected request");
    ActionError::Server { status, message }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, NON_ALPHANUMERIC).to_string()
}

#[async_trait::async_trait]
impl DirectoryService for ChatClient {
    async fn current_user(&self) -> ActionResult<UserProfile> {
        send_json(self.request(Method::GET, "/users/me")).await
    }

    async fn team_by_name(&self, name: &str) -> ActionResult<Team> {
        let path = format!("/teams/name/{}", encode_segment(name));
        send_json(self.request(Method::GET, &path)).await
    }

    async fn restrict_direct_message(&self) -> ActionResult<DmRestriction> {
        let config: HashMap<String, String> =
            send_json(self.request(Method::GET, "/config/client").query(&[("format", "old")])).await?;
        Ok(config
            .get("RestrictDirectMessage")
            .and_then(|value| value.parse().ok())
            .unwrap_or_default())
    }

    async fn get_profiles(&self, page: usize, per_page: usize) -> ActionResult<Vec<UserProfile>> {
        let query = [("page", page.to_string()), ("per_page", per_page.to_string()), ("active", "true".into())];
        send_json(self.request(Method::GET, "/users").query(&query)).await
    }

    async fn get_profiles_in_team(&self, team_id: &str, page: usize, per_page: usize) -> ActionResult<Vec<UserProfile>> {
        let query = [
            ("in_team", team_id.to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
            ("active", "true".into()),
        ];
        send_json(self.request(Method::GET, "/users").query(&query)).await
    }

    async fn search_profiles(&self, term: &str, team_id: Option<&str>) -> ActionResult<Vec<UserProfile>> {
        let mut body = json!({ "term": term, "allow_inactive": false });
        if let Some(team_id) = team_id.filter(|id| !id.is_empty()) {
            body["team_id"] = json!(team_id);
        }
        send_json(self.request(Method::POST, "/users/search").json(&body)).await
    }

    async fn search_group_channels(&self, term: &str) -> ActionResult<Vec<Channel>> {
        send_json(self.request(Method::POST, "/channels/group/search").json(&json!({ "term": term }))).await
    }

    async fn get_total_users_count(&self) -> ActionResult<u64> {
        let stats: UsersStats = send_json(self.request(Method::GET, "/users/stats")).await?;
        Ok(stats.total_users_count)
    }

    async fn get_statuses_by_ids(&self, user_ids: &[String]) -> ActionResult<Vec<UserStatus>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        send_json(self.request(Method::POST, "/users/status/ids").json(user_ids)).await
    }

    async fn get_profiles_in_channel(&self, channel_id: &str) -> ActionResult<Vec<UserProfile>> {
        let query = [("in_channel", channel_id.to_string()), ("page", "0".into()), ("per_page", "100".into())];
        send_json(self.request(Method::GET, "/users").query(&query)).await
    }

    async fn create_direct_channel(&self, current_user_id: &str, other_user_id: &str) -> ActionResult<Channel> {
        let body = [current_user_id, other_user_id];
        send_json(self.request(Method::POST, "/channels/direct").json(&body)).await
    }

    async fn create_group_channel(&self, user_ids: &[String]) -> ActionResult<Channel> {
        if user_ids.len() < 2 {
            return Err(ActionError::Invalid("a group conversation needs at least two other users".into()));
        }
        send_json(self.request(Method::POST, "/channels/group").json(user_ids)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_prefers_message_field() {
        let err = server_error(403, r#"{"id":"api.context.permissions.app_error","message":"You do not have permission","status_code":403}"#);
        assert_eq!(
            err,
            ActionError::Server {
                status: 403,
                message: "You do not have permission".into()
            }
        );
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn server_error_falls_back_to_raw_body() {
        let err = server_error(502, " Bad Gateway \n");
        assert_eq!(
            err,
            ActionError::Server {
                status: 502,
                message: "Bad Gateway".into()
            }
        );
    }

    #[test]
    fn team_names_are_path_encoded() {
        assert_eq!(encode_segment("team one"), "team%20one");
        assert_eq!(encode_segment("team1"), "team1");
    }

    #[tokio::test]
    async fn group_channel_requires_two_other_users() {
        let client = ChatClient::new("http://localhost:8065", None).unwrap();
        let result = client.create_group_channel(&["u1".to_string()]).await;
        assert!(matches!(result, Err(ActionError::Invalid(_))));
    }
}
