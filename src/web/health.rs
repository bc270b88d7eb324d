//! Operational endpoints: health report, good-to-go and build info.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use suggest_aggregator::{CheckOutcome, DependencyCheck};

use super::AppState;

/// One entry of the health report.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Probe outcome.
    #[serde(flatten)]
    pub outcome: CheckOutcome,
    /// Short technical description of the failure.
    #[serde(rename = "technicalSummary")]
    pub technical_summary: String,
    /// Where on-call should look first.
    #[serde(rename = "panicGuide")]
    pub panic_guide: String,
}

/// Body of `GET /__health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Report format version.
    #[serde(rename = "schemaVersion")]
    pub schema_version: u8,
    /// Service system code.
    #[serde(rename = "systemCode")]
    pub system_code: String,
    /// Service name.
    pub name: String,
    /// Service description.
    pub description: String,
    /// Whether every dependency is healthy.
    pub ok: bool,
    /// Per-dependency results, providers first.
    pub checks: Vec<CheckReport>,
}

/// Pair each check with its outcome.
pub fn reports(checks: &[DependencyCheck], outcomes: Vec<CheckOutcome>) -> Vec<CheckReport> {
    checks
        .iter()
        .zip(outcomes)
        .map(|(check, outcome)| CheckReport {
            outcome,
            technical_summary: check.technical_summary.clone(),
            panic_guide: check.panic_guide.clone(),
        })
        .collect()
}

/// `GET /__health`: probe every dependency concurrently. Always HTTP 200.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let checks = state.aggregator.health_checks();
    let outcomes = suggest_aggregator::probe_all(&checks).await;
    let checks = reports(&checks, outcomes);

    Json(HealthReport {
        schema_version: 1,
        system_code: state.app.system_code.clone(),
        name: state.app.name.clone(),
        description: state.app.description.clone(),
        ok: checks.iter().all(|c| c.outcome.ok),
        checks,
    })
}

/// `GET /__gtg`: always good to go, so a failing dependency never takes the
/// service out of rotation.
pub async fn gtg() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// `GET /__build-info`.
pub async fn build_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, ok: bool) -> CheckOutcome {
        CheckOutcome {
            id: id.into(),
            name: format!("{id} Healthcheck"),
            ok,
            severity: 2,
            business_impact: "impact".into(),
            output: "output".into(),
        }
    }

    #[test]
    fn report_serialises_flat_with_wire_names() {
        let check = DependencyCheck::new(
            "public-things-api",
            "public-things-api",
            "Excluding broader concepts will not work",
            "http://localhost:1",
            reqwest::Client::new(),
        );
        let reports = reports(
            std::slice::from_ref(&check),
            vec![outcome("public-things-api", false)],
        );
        let json = serde_json::to_value(&reports[0]).expect("serialize");
        assert_eq!(json["id"], "public-things-api");
        assert_eq!(json["ok"], false);
        assert_eq!(json["checkOutput"], "output");
        assert_eq!(json["technicalSummary"], "public-things-api is not available");
        assert_eq!(
            json["panicGuide"],
            "https://runbooks.in.ft.com/public-things-api"
        );
    }
}
