use async_trait::async_trait;

use crate::error::ReleaseError;
use crate::github::locator::RepoRef;
use crate::github::models::{ApiIssue, ApiMilestone, Issue, Milestone, MilestoneState};
use crate::github::pagination::PageRequest;

use super::IssueGateway;
use super::client::OctocrabGateway;

#[async_trait]
impl IssueGateway for OctocrabGateway {
    async fn list_milestones(
        &self,
        repo: &RepoRef,
        state: MilestoneState,
        page: PageRequest,
    ) -> Result<Vec<Milestone>, ReleaseError> {
        page.validate()?;
        let (page_str, per_page_str) = page.query_values();
        let query_params = [
            ("state", state.as_str()),
            ("page", page_str.as_str()),
            ("per_page", per_page_str.as_str()),
        ];

        let route = repo.api_path("/milestones");
        let milestones: Vec<ApiMilestone> = self
            .call(
                "list milestones",
                self.client.get(route, Some(&query_params)),
            )
            .await?;
        Ok(milestones.into_iter().map(Milestone::from).collect())
    }

    async fn list_milestone_issues(
        &self,
        repo: &RepoRef,
        milestone: u64,
        page: PageRequest,
    ) -> Result<Vec<Issue>, ReleaseError> {
        page.validate()?;
        let (page_str, per_page_str) = page.query_values();
        let milestone_str = milestone.to_string();
        let query_params = [
            ("milestone", milestone_str.as_str()),
            ("state", "all"),
            ("page", page_str.as_str()),
            ("per_page", per_page_str.as_str()),
        ];

        let route = repo.api_path("/issues");
        let issues: Vec<ApiIssue> = self
            .call("list issues", self.client.get(route, Some(&query_params)))
            .await?;
        Ok(issues.into_iter().map(Issue::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::error::ReleaseError;
    use crate::github::gateway::test_helpers::gateway_for;
    use crate::github::gateway::{IssueGateway, OctocrabGateway};
    use crate::github::locator::{PersonalAccessToken, RepoRef};
    use crate::github::models::MilestoneState;
    use crate::github::pagination::PageRequest;

    fn tidb() -> RepoRef {
        RepoRef::parse("pingcap/tidb").expect("repo should parse")
    }

    #[tokio::test]
    async fn list_milestones_sends_state_and_paging() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/pingcap/tidb/milestones"))
            .and(query_param("state", "all"))
            .and(query_param("page", "2"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 11, "number": 3, "title": "v5.0.0", "state": "open" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let milestones = gateway_for(&server)
            .list_milestones(&tidb(), MilestoneState::All, PageRequest::new(2, 100))
            .await
            .expect("milestones should load");

        assert_eq!(milestones.len(), 1);
        let first = milestones.first().expect("one milestone");
        assert_eq!(first.id, 11);
        assert_eq!(first.number, 3);
        assert_eq!(first.title, "v5.0.0");
    }

    #[tokio::test]
    async fn list_milestone_issues_filters_by_number() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/pingcap/tidb/issues"))
            .and(query_param("milestone", "3"))
            .and(query_param("state", "all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "number": 1, "title": "plain issue" },
                {
                    "number": 2,
                    "title": "a pull",
                    "pull_request": { "merged_at": "2021-01-01T00:00:00Z" }
                }
            ])))
            .mount(&server)
            .await;

        let issues = gateway_for(&server)
            .list_milestone_issues(&tidb(), 3, PageRequest::default())
            .await
            .expect("issues should load");

        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|issue| issue.pull_request.is_some()));
    }

    #[tokio::test]
    async fn missing_repository_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/pingcap/tidb/milestones"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
            )
            .mount(&server)
            .await;

        let result = gateway_for(&server)
            .list_milestones(&tidb(), MilestoneState::Open, PageRequest::default())
            .await;

        assert!(result.expect_err("404 should fail").is_not_found());
    }

    #[tokio::test]
    async fn rejected_token_maps_to_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/pingcap/tidb/issues"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
            )
            .mount(&server)
            .await;

        let result = gateway_for(&server)
            .list_milestone_issues(&tidb(), 1, PageRequest::default())
            .await;

        assert!(matches!(result, Err(ReleaseError::Authentication { .. })));
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/pingcap/tidb/milestones"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let token = PersonalAccessToken::new("valid-token").expect("token should be valid");
        let gateway = OctocrabGateway::for_token(&token, &server.uri(), Duration::from_millis(200))
            .expect("should create gateway");
        let result = gateway
            .list_milestones(&tidb(), MilestoneState::Open, PageRequest::default())
            .await;

        assert!(matches!(
            result,
            Err(ReleaseError::Timeout { ref operation, .. }) if operation == "list milestones"
        ));
    }

    #[tokio::test]
    async fn invalid_page_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        let result = gateway_for(&server)
            .list_milestones(&tidb(), MilestoneState::Open, PageRequest::new(0, 100))
            .await;
        assert!(matches!(
            result,
            Err(ReleaseError::InvalidPagination { .. })
        ));
    }
}
