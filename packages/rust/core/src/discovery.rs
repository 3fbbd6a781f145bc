//! Branch discovery: which branches contribute decisions to the index.

use adrtools_forge::RepositoryHost;
use adrtools_shared::Result;
use tracing::{debug, info, instrument};

/// Base branch first, then the source branch of every open review request
/// labeled `label`, in the order the host returns them.
///
/// Any host failure aborts discovery; no partial list is returned.
#[instrument(skip(host))]
pub async fn discover_branches(
    host: &dyn RepositoryHost,
    base_branch: &str,
    label: &str,
) -> Result<Vec<String>> {
    let mut branches = vec![base_branch.to_string()];

    let requests = host.search_open_labeled_requests(label).await?;
    debug!(count = requests.len(), "labeled review requests found");

    for number in requests {
        let branch = host.get_request_source_branch(number).await?;
        debug!(number, %branch, "including review request branch");
        if !branches.contains(&branch) {
            branches.push(branch);
        }
    }

    info!(branches = branches.len(), "branches discovered");
    Ok(branches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;

    #[tokio::test]
    async fn base_branch_comes_first() {
        let host = FakeHost::new()
            .with_branch("main", "m1")
            .with_labeled_request(5, "feature/x")
            .with_labeled_request(8, "feature/y");

        let branches = discover_branches(&host, "main", "toc").await.unwrap();
        assert_eq!(branches, vec!["main", "feature/x", "feature/y"]);
        assert_eq!(host.calls()[0], "search_open_labeled_requests toc");
    }

    #[tokio::test]
    async fn no_labeled_requests_scans_only_base() {
        let host = FakeHost::new().with_branch("main", "m1");
        let branches = discover_branches(&host, "main", "toc").await.unwrap();
        assert_eq!(branches, vec!["main"]);
    }

    #[tokio::test]
    async fn duplicate_source_branches_are_scanned_once() {
        let host = FakeHost::new()
            .with_labeled_request(5, "feature/x")
            .with_labeled_request(6, "feature/x")
            .with_labeled_request(7, "main");
        let branches = discover_branches(&host, "main", "toc").await.unwrap();
        assert_eq!(branches, vec!["main", "feature/x"]);
    }

    #[tokio::test]
    async fn search_failure_aborts() {
        let host = FakeHost::new()
            .with_labeled_request(5, "feature/x")
            .fail_on("search_open_labeled_requests");
        let err = discover_branches(&host, "main", "toc").await.unwrap_err();
        assert!(err.to_string().contains("injected failure"));
    }

    #[tokio::test]
    async fn source_branch_failure_aborts() {
        let host = FakeHost::new()
            .with_labeled_request(5, "feature/x")
            .fail_on("get_request_source_branch");
        assert!(discover_branches(&host, "main", "toc").await.is_err());
    }
}
