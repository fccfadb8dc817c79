use async_trait::async_trait;

use crate::error::ReleaseError;
use crate::github::locator::RepoRef;
use crate::github::models::{ApiContents, ApiGitRef, Contents};

use super::ContentGateway;
use super::client::OctocrabGateway;

#[async_trait]
impl ContentGateway for OctocrabGateway {
    async fn contents(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Option<Contents>, ReleaseError> {
        let route = repo.api_path(&format!("/contents/{}", path.trim_start_matches('/')));
        let query_params: Vec<(&str, &str)> =
            reference.map(|value| ("ref", value)).into_iter().collect();

        let result: Result<ApiContents, ReleaseError> = self
            .call("get contents", self.client.get(route, Some(&query_params)))
            .await;
        match result {
            Ok(contents) => Contents::try_from(contents).map(Some),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn matching_tags(
        &self,
        repo: &RepoRef,
        prefix: &str,
    ) -> Result<Vec<String>, ReleaseError> {
        let route = repo.api_path(&format!("/git/matching-refs/tags/{prefix}"));
        let refs: Vec<ApiGitRef> = self
            .call("list matching tags", self.client.get(route, None::<&()>))
            .await?;
        Ok(refs
            .iter()
            .map(|git_ref| git_ref.tag_name().to_owned())
            .collect())
    }
}
