//! In-memory [`RepositoryHost`] for pipeline tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use adrtools_forge::{
    ContentEntry, EntryKind, GitReference, PullRequest, RepositoryHost, TreeEntry, branch_ref,
};
use adrtools_shared::{AdrToolsError, Result};
use async_trait::async_trait;

/// Operations that change remote state.
pub(crate) const MUTATIONS: &[&str] = &[
    "create_blob",
    "create_tree",
    "create_commit",
    "create_ref",
    "update_ref",
    "create_pull_request",
];

#[derive(Default)]
struct State {
    /// branch → head commit sha
    refs: HashMap<String, String>,
    /// commit sha → tree sha
    trees: HashMap<String, String>,
    /// created commit sha → parent sha
    parents: HashMap<String, String>,
    /// branch → (path → content)
    files: HashMap<String, BTreeMap<String, String>>,
    /// branch → sub-directory paths
    dirs: HashMap<String, Vec<String>>,
    /// labeled open review requests: (number, source branch)
    requests: Vec<(u64, String)>,
    /// files listed but unreadable: (branch, path)
    unreadable: HashSet<(String, String)>,
    failing: HashSet<&'static str>,
    calls: Vec<String>,
    next_object: u32,
    last_blob: Option<String>,
}

/// Fake forge recording every call. Operations named in `fail_on` return a host error.
#[derive(Default)]
pub(crate) struct FakeHost {
    state: Mutex<State>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_branch(self, branch: &str, head_sha: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.refs.insert(branch.into(), head_sha.into());
            state
                .trees
                .insert(head_sha.into(), format!("tree-of-{head_sha}"));
            state.files.entry(branch.into()).or_default();
        }
        self
    }

    pub fn with_file(self, branch: &str, path: &str, content: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .files
            .entry(branch.into())
            .or_default()
            .insert(path.into(), content.into());
        self
    }

    pub fn with_subdir(self, branch: &str, path: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .dirs
            .entry(branch.into())
            .or_default()
            .push(path.into());
        self
    }

    pub fn with_unreadable(self, branch: &str, path: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .unreadable
            .insert((branch.into(), path.into()));
        self
    }

    pub fn with_labeled_request(self, number: u64, branch: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .requests
            .push((number, branch.into()));
        self
    }

    pub fn fail_on(self, operation: &'static str) -> Self {
        self.state.lock().unwrap().failing.insert(operation);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutation_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| MUTATIONS.iter().any(|m| c.starts_with(m)))
            .collect()
    }

    pub fn head_of(&self, branch: &str) -> Option<String> {
        self.state.lock().unwrap().refs.get(branch).cloned()
    }

    /// Content of the most recently created blob.
    pub fn last_blob(&self) -> Option<String> {
        self.state.lock().unwrap().last_blob.clone()
    }

    /// Record the call and fail it if requested.
    fn enter(&self, operation: &'static str, detail: String) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("{operation} {detail}").trim_end().to_string());
        if state.failing.contains(operation) {
            return Err(AdrToolsError::host(operation, 500, "injected failure"));
        }
        Ok(())
    }

    fn next_sha(&self, kind: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_object += 1;
        format!("{kind}-{}", state.next_object)
    }

    /// Whether `ancestor` is `sha` or reachable through its recorded parents.
    fn descends_from(state: &State, sha: &str, ancestor: &str) -> bool {
        let mut current = Some(sha);
        while let Some(commit) = current {
            if commit == ancestor {
                return true;
            }
            current = state.parents.get(commit).map(String::as_str);
        }
        false
    }

    /// Map a branch name or commit sha back to a branch name.
    fn resolve(state: &State, git_ref: &str) -> Option<String> {
        if state.refs.contains_key(git_ref) {
            return Some(git_ref.to_string());
        }
        state
            .refs
            .iter()
            .find(|(_, sha)| sha.as_str() == git_ref)
            .map(|(branch, _)| branch.clone())
    }
}

fn not_found(operation: &str, what: &str) -> AdrToolsError {
    AdrToolsError::host(operation, 404, format!("{what} Not Found"))
}

#[async_trait]
impl RepositoryHost for FakeHost {
    async fn get_reference(&self, branch: &str) -> Result<GitReference> {
        self.enter("get_reference", branch.into())?;
        let state = self.state.lock().unwrap();
        let sha = state
            .refs
            .get(branch)
            .ok_or_else(|| not_found("get_reference", branch))?;
        Ok(GitReference {
            name: branch_ref(branch),
            sha: sha.clone(),
        })
    }

    async fn get_commit_tree(&self, commit_sha: &str) -> Result<String> {
        self.enter("get_commit_tree", commit_sha.into())?;
        let state = self.state.lock().unwrap();
        state
            .trees
            .get(commit_sha)
            .cloned()
            .ok_or_else(|| not_found("get_commit_tree", commit_sha))
    }

    async fn list_directory(&self, path: &str, git_ref: &str) -> Result<Vec<ContentEntry>> {
        self.enter("list_directory", format!("{path}@{git_ref}"))?;
        let state = self.state.lock().unwrap();
        let branch =
            Self::resolve(&state, git_ref).ok_or_else(|| not_found("list_directory", git_ref))?;
        let prefix = format!("{}/", path.trim_matches('/'));

        let mut entries: Vec<ContentEntry> = state
            .files
            .get(&branch)
            .into_iter()
            .flat_map(|files| files.keys())
            .filter_map(|p| {
                let name = p.strip_prefix(&prefix)?;
                (!name.contains('/')).then(|| ContentEntry {
                    name: name.to_string(),
                    path: p.clone(),
                    html_url: format!("https://github.com/acme/arch/blob/{branch}/{p}"),
                    kind: EntryKind::File,
                })
            })
            .collect();

        for dir in state.dirs.get(&branch).into_iter().flatten() {
            if let Some(name) = dir.strip_prefix(&prefix) {
                entries.push(ContentEntry {
                    name: name.to_string(),
                    path: dir.clone(),
                    html_url: String::new(),
                    kind: EntryKind::Dir,
                });
            }
        }

        if entries.is_empty() {
            return Err(not_found("list_directory", path));
        }
        Ok(entries)
    }

    async fn get_file_content(&self, path: &str, git_ref: &str) -> Result<Option<String>> {
        self.enter("get_file_content", format!("{path}@{git_ref}"))?;
        let state = self.state.lock().unwrap();
        let Some(branch) = Self::resolve(&state, git_ref) else {
            return Ok(None);
        };
        if state.unreadable.contains(&(branch.clone(), path.to_string())) {
            return Ok(None);
        }
        Ok(state
            .files
            .get(&branch)
            .and_then(|files| files.get(path))
            .cloned())
    }

    async fn search_open_labeled_requests(&self, label: &str) -> Result<Vec<u64>> {
        self.enter("search_open_labeled_requests", label.into())?;
        let state = self.state.lock().unwrap();
        Ok(state.requests.iter().map(|(n, _)| *n).collect())
    }

    async fn get_request_source_branch(&self, number: u64) -> Result<String> {
        self.enter("get_request_source_branch", number.to_string())?;
        let state = self.state.lock().unwrap();
        state
            .requests
            .iter()
            .find(|(n, _)| *n == number)
            .map(|(_, branch)| branch.clone())
            .ok_or_else(|| not_found("get_request_source_branch", &number.to_string()))
    }

    async fn create_blob(&self, content: &str) -> Result<String> {
        self.enter("create_blob", String::new())?;
        let sha = self.next_sha("blob");
        self.state.lock().unwrap().last_blob = Some(content.to_string());
        Ok(sha)
    }

    async fn create_tree(&self, base_tree: &str, entries: &[TreeEntry]) -> Result<String> {
        let paths: Vec<String> = entries
            .iter()
            .map(|e| format!("{}:{}:{}", e.path, e.mode, e.sha))
            .collect();
        self.enter("create_tree", format!("{base_tree} {}", paths.join(",")))?;
        Ok(self.next_sha("tree"))
    }

    async fn create_commit(&self, parent: &str, tree: &str, message: &str) -> Result<String> {
        self.enter("create_commit", format!("{parent} {tree} {message}"))?;
        let sha = self.next_sha("commit");
        self.state
            .lock()
            .unwrap()
            .parents
            .insert(sha.clone(), parent.to_string());
        Ok(sha)
    }

    async fn create_ref(&self, branch: &str, sha: &str) -> Result<()> {
        self.enter("create_ref", format!("{branch} {sha}"))?;
        let mut state = self.state.lock().unwrap();
        if state.refs.contains_key(branch) {
            return Err(AdrToolsError::host(
                "create_ref",
                422,
                "Reference already exists",
            ));
        }
        state.refs.insert(branch.into(), sha.into());
        Ok(())
    }

    async fn update_ref(&self, branch: &str, sha: &str) -> Result<()> {
        self.enter("update_ref", format!("{branch} {sha}"))?;
        let mut state = self.state.lock().unwrap();
        let head = state
            .refs
            .get(branch)
            .cloned()
            .ok_or_else(|| not_found("update_ref", branch))?;
        if !Self::descends_from(&state, sha, &head) {
            return Err(AdrToolsError::host(
                "update_ref",
                422,
                "Update is not a fast forward",
            ));
        }
        state.refs.insert(branch.into(), sha.into());
        Ok(())
    }

    async fn create_pull_request(
        &self,
        title: &str,
        base: &str,
        head: &str,
    ) -> Result<PullRequest> {
        self.enter("create_pull_request", format!("{base}<-{head} {title}"))?;
        Ok(PullRequest {
            number: 100,
            html_url: "https://github.com/acme/arch/pull/100".into(),
        })
    }
}
