//! Liveness probes for upstream dependencies.
//!
//! Every upstream client can describe itself as a [`DependencyCheck`]. The
//! HTTP surface runs the probes for its health endpoint; the aggregation
//! pipeline itself never calls them.

use serde::Serialize;

use crate::http::USER_AGENT;

/// Path of the "good to go" endpoint exposed by every dependency.
pub const GTG_PATH: &str = "/__gtg";

/// Runbook base used for dependencies without a dedicated page.
pub const PANIC_GUIDE_URL: &str = "https://runbooks.in.ft.com/";

/// Description and probe for one upstream dependency.
#[derive(Debug, Clone)]
pub struct DependencyCheck {
    /// Stable system code of the dependency.
    pub id: String,
    /// Human-readable check name.
    pub name: String,
    /// What breaks for users when the dependency is down.
    pub business_impact: String,
    /// Short technical description of the failure.
    pub technical_summary: String,
    /// Where on-call should look first.
    pub panic_guide: String,
    /// 1 (highest) to 3.
    pub severity: u8,
    base_url: String,
    client: reqwest::Client,
}

/// Result of running one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    /// Stable system code of the dependency.
    pub id: String,
    /// Human-readable check name.
    pub name: String,
    /// Whether the dependency answered HTTP 200.
    pub ok: bool,
    /// Severity copied from the check.
    pub severity: u8,
    /// What breaks for users when the dependency is down.
    #[serde(rename = "businessImpact")]
    pub business_impact: String,
    /// Success message or failure reason.
    #[serde(rename = "checkOutput")]
    pub output: String,
}

impl DependencyCheck {
    /// Describe a dependency reachable at `base_url`.
    pub fn new(
        system_code: &str,
        display_name: &str,
        business_impact: &str,
        base_url: &str,
        client: reqwest::Client,
    ) -> Self {
        Self {
            id: system_code.to_owned(),
            name: format!("{display_name} Healthcheck"),
            business_impact: business_impact.to_owned(),
            technical_summary: format!("{display_name} is not available"),
            panic_guide: format!("{PANIC_GUIDE_URL}{system_code}"),
            severity: 2,
            base_url: base_url.to_owned(),
            client,
        }
    }

    /// Issue `GET {base}/__gtg` and report the outcome.
    pub async fn probe(&self) -> CheckOutcome {
        let url = format!("{}{GTG_PATH}", self.base_url);
        let result = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await;

        let (ok, output) = match result {
            Ok(resp) if resp.status() == reqwest::StatusCode::OK => {
                (true, format!("{} is healthy", self.id))
            }
            Ok(resp) => (
                false,
                format!(
                    "health check returned a non-200 HTTP status: {}",
                    resp.status().as_u16()
                ),
            ),
            Err(e) => (false, format!("health check request failed: {e}")),
        };

        if !ok {
            tracing::warn!(dependency = %self.id, output = %output, "dependency unhealthy");
        }

        CheckOutcome {
            id: self.id.clone(),
            name: self.name.clone(),
            ok,
            severity: self.severity,
            business_impact: self.business_impact.clone(),
            output,
        }
    }
}
