use async_trait::async_trait;
use tracing::info;

use crate::error::ReleaseError;
use crate::github::locator::RepoRef;
use crate::github::models::{ApiCreatedPullRequest, ApiUser, CreatedPullRequest, NewPullRequest};

use super::RepositoryGateway;
use super::client::OctocrabGateway;
use super::error_mapping::{is_pull_request_exists, map_octocrab_error};

#[async_trait]
impl RepositoryGateway for OctocrabGateway {
    async fn authenticated_login(&self) -> Result<String, ReleaseError> {
        let user: ApiUser = self
            .call("get authenticated user", self.client.get("/user", None::<&()>))
            .await?;
        user.login.ok_or_else(|| ReleaseError::Api {
            message: "get authenticated user returned no login".to_owned(),
        })
    }

    async fn repository_exists(&self, repo: &RepoRef) -> Result<bool, ReleaseError> {
        let result: Result<serde_json::Value, ReleaseError> = self
            .call(
                "get repository",
                self.client.get(repo.api_path(""), None::<&()>),
            )
            .await;
        match result {
            Ok(_) => Ok(true),
            Err(error) if error.is_not_found() => Ok(false),
            Err(error) => Err(error),
        }
    }

    async fn fork(&self, repo: &RepoRef) -> Result<(), ReleaseError> {
        let _fork: serde_json::Value = self
            .call(
                "create fork",
                self.client
                    .post(repo.api_path("/forks"), Some(&serde_json::json!({}))),
            )
            .await?;
        info!(%repo, "requested fork");
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<Option<CreatedPullRequest>, ReleaseError> {
        let operation = "create pull request";
        let result: Result<ApiCreatedPullRequest, octocrab::Error> = self
            .timed(
                operation,
                self.client.post(repo.api_path("/pulls"), Some(request)),
            )
            .await?;
        match result {
            Ok(created) => Ok(Some(created.into())),
            Err(error) if is_pull_request_exists(&error) => Ok(None),
            Err(error) => Err(map_octocrab_error(operation, &error)),
        }
    }
}
