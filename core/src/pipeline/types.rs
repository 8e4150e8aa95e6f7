use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One file edit inside a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEdit {
    pub path: String,
    pub content: String,
}

/// An ordered commit of file edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub message: String,
    #[serde(default)]
    pub files: Vec<FileEdit>,
}

/// Title and body for the pull request a patch opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestSpec {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// The concrete changes the coding capability proposes for one task.
///
/// Produced once per task; owned by the run coordinator for the task's
/// lifetime and dropped once the task result is emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub branch: String,
    pub commits: Vec<Commit>,
    pub pr: PullRequestSpec,
}

impl Patch {
    /// Distinct file paths touched by the patch's commits.
    pub fn touched_paths(&self) -> BTreeSet<&str> {
        self.commits
            .iter()
            .flat_map(|c| c.files.iter())
            .map(|f| f.path.as_str())
            .collect()
    }
}

/// A generated test artifact attached to a verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestFile {
    pub path: String,
    pub content: String,
}

/// Verification outcome. Unknown status strings deserialize as `Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Pass,
    #[serde(other)]
    Fail,
}

/// The verification capability's judgment on a patch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_files: Vec<TestFile>,
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        self.status == VerdictStatus::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_verdict_status_coerces_to_fail() {
        let v: Verdict = serde_json::from_str(r#"{"status":"maybe"}"#).unwrap();
        assert_eq!(v.status, VerdictStatus::Fail);
        assert!(v.test_files.is_empty());
    }

    #[test]
    fn pass_verdict_roundtrips() {
        let v: Verdict =
            serde_json::from_str(r#"{"status":"pass","test_files":[{"path":"t.rs","content":""}]}"#)
                .unwrap();
        assert!(v.is_pass());
        assert_eq!(v.test_files.len(), 1);
    }

    #[test]
    fn touched_paths_deduplicates_across_commits() {
        let patch = Patch {
            branch: "feature/x".into(),
            commits: vec![
                Commit {
                    message: "one".into(),
                    files: vec![
                        FileEdit {
                            path: "src/a.rs".into(),
                            content: String::new(),
                        },
                        FileEdit {
                            path: "src/b.rs".into(),
                            content: String::new(),
                        },
                    ],
                },
                Commit {
                    message: "two".into(),
                    files: vec![FileEdit {
                        path: "src/a.rs".into(),
                        content: "again".into(),
                    }],
                },
            ],
            pr: PullRequestSpec {
                title: "x".into(),
                body: String::new(),
            },
        };
        assert_eq!(patch.touched_paths().len(), 2);
    }
}
