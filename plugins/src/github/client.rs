use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Method;
use serde_json::{json, Value};

use autoforge_core::api::{CheckRun, GithubConfig, HostApi, PullRequest};

use super::error::GithubHttpError;

/// GitHub REST implementation of [`HostApi`].
///
/// Every call funnels through [`GithubClient::request`]: any non-2xx
/// response (204 excepted; 404 mapped to `None` by the optional getters)
/// becomes a [`GithubHttpError`] with method, path, status and body
/// preview.
#[derive(Clone)]
pub struct GithubClient {
    owner: String,
    token: String,
    http: reqwest::Client,
    api_base: String,
}

impl GithubClient {
    pub fn new(cfg: &GithubConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self {
            owner: cfg.owner.clone(),
            token: cfg.token.clone(),
            http,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn repo_path(&self, repo: &str, rest: &str) -> String {
        format!("/repos/{}/{}{}", self.owner, repo, rest)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> anyhow::Result<reqwest::Response> {
        let url = format!("{}{}", self.api_base, path);
        let mut req = self
            .http
            .request(method.clone(), &url)
            .header("accept", "application/vnd.github+json");
        if !self.token.trim().is_empty() {
            req = req.bearer_auth(&self.token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        req.send()
            .await
            .map_err(|e| GithubHttpError::from_reqwest(e, method.as_str(), path).into())
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> anyhow::Result<Value> {
        let m = method.as_str().to_string();
        tracing::debug!(target: "autoforge.github", method = m.as_str(), path, "host call");
        let resp = self.send(method, path, body).await?;
        let status = resp.status();
        if status.as_u16() == 204 {
            return Ok(Value::Null);
        }
        let text = resp
            .text()
            .await
            .map_err(|e| GithubHttpError::from_reqwest(e, &m, path))?;
        if !status.is_success() {
            return Err(GithubHttpError::status_error(status.as_u16(), &m, path, &text).into());
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| GithubHttpError::decode_error(status.as_u16(), &m, path, e, &text).into())
    }

    /// GET where 404 means "not there", not a failure.
    async fn request_optional(&self, path: &str) -> anyhow::Result<Option<Value>> {
        let resp = self.send(Method::GET, path, None).await?;
        let status = resp.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        let text = resp
            .text()
            .await
            .map_err(|e| GithubHttpError::from_reqwest(e, "GET", path))?;
        if !status.is_success() {
            return Err(GithubHttpError::status_error(status.as_u16(), "GET", path, &text).into());
        }
        if text.trim().is_empty() {
            return Ok(Some(Value::Null));
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| GithubHttpError::decode_error(status.as_u16(), "GET", path, e, &text).into())
    }
}

fn parse_pull(v: &Value) -> anyhow::Result<PullRequest> {
    Ok(PullRequest {
        number: v["number"]
            .as_u64()
            .ok_or_else(|| anyhow::anyhow!("pull response missing number"))?,
        state: v["state"].as_str().unwrap_or("open").to_string(),
        merged: v["merged"].as_bool().unwrap_or(false),
        mergeable_state: v["mergeable_state"].as_str().map(String::from),
        head_sha: v["head"]["sha"].as_str().unwrap_or_default().to_string(),
        head_ref: v["head"]["ref"].as_str().unwrap_or_default().to_string(),
        html_url: v["html_url"].as_str().unwrap_or_default().to_string(),
    })
}

#[async_trait]
impl HostApi for GithubClient {
    async fn get_repo(&self, repo: &str) -> anyhow::Result<Option<Value>> {
        self.request_optional(&format!("/repos/{}/{}", self.owner, repo))
            .await
    }

    async fn create_repo(&self, repo: &str, description: &str) -> anyhow::Result<Value> {
        self.request(
            Method::POST,
            "/user/repos",
            Some(&json!({
                "name": repo,
                "description": description,
                "auto_init": true,
                "private": false,
            })),
        )
        .await
    }

    async fn enable_pages(&self, repo: &str, branch: &str) -> anyhow::Result<()> {
        let path = self.repo_path(repo, "/pages");
        let body = json!({"source": {"branch": branch, "path": "/"}});
        let resp = self.send(Method::POST, &path, Some(&body)).await?;
        let status = resp.status();
        // 409: pages already configured for this repo
        if status.as_u16() == 409 || status.is_success() {
            return Ok(());
        }
        let text = resp
            .text()
            .await
            .map_err(|e| GithubHttpError::from_reqwest(e, "POST", &path))?;
        Err(GithubHttpError::status_error(status.as_u16(), "POST", &path, &text).into())
    }

    async fn get_ref_sha(&self, repo: &str, branch: &str) -> anyhow::Result<Option<String>> {
        let path = self.repo_path(repo, &format!("/git/ref/heads/{branch}"));
        Ok(self
            .request_optional(&path)
            .await?
            .and_then(|v| v["object"]["sha"].as_str().map(String::from)))
    }

    async fn create_ref(&self, repo: &str, branch: &str, sha: &str) -> anyhow::Result<()> {
        let path = self.repo_path(repo, "/git/refs");
        self.request(
            Method::POST,
            &path,
            Some(&json!({
                "ref": format!("refs/heads/{branch}"),
                "sha": sha,
            })),
        )
        .await?;
        Ok(())
    }

    async fn get_file_sha(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> anyhow::Result<Option<String>> {
        let api_path = self.repo_path(repo, &format!("/contents/{path}?ref={branch}"));
        Ok(self
            .request_optional(&api_path)
            .await?
            .and_then(|v| v["sha"].as_str().map(String::from)))
    }

    async fn put_file(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> anyhow::Result<()> {
        let api_path = self.repo_path(repo, &format!("/contents/{path}"));
        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": branch,
        });
        if let Some(sha) = sha {
            body["sha"] = Value::String(sha.to_string());
        }
        self.request(Method::PUT, &api_path, Some(&body)).await?;
        Ok(())
    }

    async fn list_open_pulls(
        &self,
        repo: &str,
        head: &str,
        base: &str,
    ) -> anyhow::Result<Vec<PullRequest>> {
        let path = self.repo_path(
            repo,
            &format!("/pulls?state=open&head={}:{}&base={}", self.owner, head, base),
        );
        let v = self.request(Method::GET, &path, None).await?;
        let pulls = v
            .as_array()
            .map(|arr| arr.iter().map(parse_pull).collect::<Result<Vec<_>, _>>())
            .transpose()?
            .unwrap_or_default();
        Ok(pulls)
    }

    async fn create_pull(
        &self,
        repo: &str,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> anyhow::Result<PullRequest> {
        let path = self.repo_path(repo, "/pulls");
        let v = self
            .request(
                Method::POST,
                &path,
                Some(&json!({
                    "title": title,
                    "body": body,
                    "head": head,
                    "base": base,
                })),
            )
            .await?;
        parse_pull(&v)
    }

    async fn get_pull(&self, repo: &str, number: u64) -> anyhow::Result<PullRequest> {
        let path = self.repo_path(repo, &format!("/pulls/{number}"));
        let v = self.request(Method::GET, &path, None).await?;
        parse_pull(&v)
    }

    async fn merge_pull_squash(&self, repo: &str, number: u64) -> anyhow::Result<bool> {
        let path = self.repo_path(repo, &format!("/pulls/{number}/merge"));
        let v = self
            .request(
                Method::PUT,
                &path,
                Some(&json!({"merge_method": "squash"})),
            )
            .await?;
        Ok(v["merged"].as_bool().unwrap_or(false))
    }

    async fn list_check_runs(&self, repo: &str, sha: &str) -> anyhow::Result<Vec<CheckRun>> {
        let path = self.repo_path(repo, &format!("/commits/{sha}/check-runs"));
        let v = self.request(Method::GET, &path, None).await?;
        let runs = v["check_runs"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .map(|run| CheckRun {
                        name: run["name"].as_str().unwrap_or_default().to_string(),
                        status: run["status"].as_str().unwrap_or_default().to_string(),
                        conclusion: run["conclusion"].as_str().map(String::from),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(runs)
    }

    async fn protect_branch(&self, repo: &str, branch: &str) -> anyhow::Result<()> {
        let path = self.repo_path(repo, &format!("/branches/{branch}/protection"));
        self.request(
            Method::PUT,
            &path,
            Some(&json!({
                "required_status_checks": {"strict": true, "contexts": []},
                "enforce_admins": false,
                "required_pull_request_reviews": null,
                "restrictions": null,
            })),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn client(server: &mockito::ServerGuard) -> GithubClient {
        GithubClient::new(&GithubConfig {
            owner: "acme".into(),
            token: "test-token".into(),
            api_base: server.url(),
            ..GithubConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn get_ref_sha_parses_object_sha() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/acme/demo/git/ref/heads/main")
            .with_status(200)
            .with_body(r#"{"ref":"refs/heads/main","object":{"sha":"abc123","type":"commit"}}"#)
            .create_async()
            .await;

        let sha = client(&server).get_ref_sha("demo", "main").await.unwrap();
        assert_eq!(sha.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn get_ref_sha_maps_404_to_none() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/acme/demo/git/ref/heads/ghost")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let sha = client(&server).get_ref_sha("demo", "ghost").await.unwrap();
        assert!(sha.is_none());
    }

    #[tokio::test]
    async fn create_ref_posts_fully_qualified_ref() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/repos/acme/demo/git/refs")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "ref": "refs/heads/task/a",
                "sha": "abc123",
            })))
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        client(&server)
            .create_ref("demo", "task/a", "abc123")
            .await
            .unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn put_file_sends_base64_content_and_sha_precondition() {
        let mut server = mockito::Server::new_async().await;
        let encoded = BASE64.encode("hello");
        let m = server
            .mock("PUT", "/repos/acme/demo/contents/src/lib.rs")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "branch": "task/a",
                "content": encoded,
                "sha": "oldsha",
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        client(&server)
            .put_file(
                "demo",
                "task/a",
                "src/lib.rs",
                "hello",
                "update lib",
                Some("oldsha"),
            )
            .await
            .unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn non_2xx_error_carries_method_path_and_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/acme/demo/pulls/9")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let err = client(&server).get_pull("demo", 9).await.unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("500"), "{rendered}");
        assert!(rendered.contains("/repos/acme/demo/pulls/9"), "{rendered}");
        assert!(rendered.contains("upstream exploded"), "{rendered}");
    }

    #[tokio::test]
    async fn list_open_pulls_matches_owner_qualified_head() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/acme/demo/pulls")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("state".into(), "open".into()),
                Matcher::UrlEncoded("head".into(), "acme:task/a".into()),
                Matcher::UrlEncoded("base".into(), "main".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"[{"number":12,"state":"open","head":{"sha":"s","ref":"task/a"},"html_url":"https://github.com/acme/demo/pull/12"}]"#,
            )
            .create_async()
            .await;

        let pulls = client(&server)
            .list_open_pulls("demo", "task/a", "main")
            .await
            .unwrap();
        assert_eq!(pulls.len(), 1);
        assert_eq!(pulls[0].number, 12);
        assert_eq!(pulls[0].head_ref, "task/a");
    }

    #[tokio::test]
    async fn list_check_runs_parses_conclusions() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/acme/demo/commits/abc/check-runs")
            .with_status(200)
            .with_body(
                r#"{"total_count":2,"check_runs":[
                    {"name":"build","status":"completed","conclusion":"success"},
                    {"name":"test","status":"in_progress","conclusion":null}
                ]}"#,
            )
            .create_async()
            .await;

        let runs = client(&server).list_check_runs("demo", "abc").await.unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs[0].is_success());
        assert!(runs[1].conclusion.is_none());
    }

    #[tokio::test]
    async fn merge_pull_returns_host_merged_flag() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("PUT", "/repos/acme/demo/pulls/3/merge")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "merge_method": "squash",
            })))
            .with_status(200)
            .with_body(r#"{"merged":true,"sha":"deadbeef"}"#)
            .create_async()
            .await;

        assert!(client(&server).merge_pull_squash("demo", 3).await.unwrap());
    }

    #[tokio::test]
    async fn enable_pages_treats_conflict_as_enabled() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/repos/acme/demo/pages")
            .with_status(409)
            .with_body(r#"{"message":"GitHub Pages is already enabled"}"#)
            .create_async()
            .await;

        client(&server).enable_pages("demo", "main").await.unwrap();
    }
}
