use resub_core::config::{AppConfig, LoadOptions};
use resub_core::{check_server_version, HostApi};
use resub_mattermost::MattermostClient;
use serde::Serialize;

use super::{escape_json, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match probe_server_version(&config) {
                Ok(version) => {
                    checks.push(DoctorCheck {
                        name: "host_connectivity",
                        status: CheckStatus::Pass,
                        details: format!("reached `{}` (server v{version})", config.host.url),
                    });
                    checks.push(check_version(&version, &config.plugin.min_server_version));
                }
                Err(details) => {
                    checks.push(DoctorCheck {
                        name: "host_connectivity",
                        status: CheckStatus::Fail,
                        details,
                    });
                    checks.push(skipped("server_version", "host was not reachable"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("host_connectivity", "configuration did not load"));
            checks.push(skipped("server_version", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: format!("skipped because {reason}"),
    }
}

fn probe_server_version(config: &AppConfig) -> Result<String, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| format!("failed to initialize async runtime: {error}"))?;

    let client = MattermostClient::from_config(&config.host)
        .map_err(|error| format!("failed to build host client: {error}"))?;

    runtime
        .block_on(client.server_version())
        .map_err(|error| format!("failed to reach `{}`: {error}", config.host.url))
}

fn check_version(server_version: &str, min_version: &str) -> DoctorCheck {
    match check_server_version(server_version, min_version) {
        Ok(()) => DoctorCheck {
            name: "server_version",
            status: CheckStatus::Pass,
            details: format!("v{server_version} satisfies >= {min_version}"),
        },
        Err(error) => {
            DoctorCheck { name: "server_version", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{check_version, render_human, CheckStatus, DoctorCheck, DoctorReport};

    #[test]
    fn version_check_passes_at_the_minimum() {
        assert_eq!(check_version("5.10.0", "5.10.0").status, CheckStatus::Pass);
        assert_eq!(check_version("v9.5.1", "5.10.0").status, CheckStatus::Pass);
    }

    #[test]
    fn version_check_fails_below_the_minimum() {
        let check = check_version("5.9.9", "5.10.0");
        assert_eq!(check.status, CheckStatus::Fail);
        assert!(check.details.contains("5.10.0"), "{}", check.details);
    }

    #[test]
    fn human_output_marks_each_check() {
        let report = DoctorReport {
            overall_status: CheckStatus::Fail,
            summary: "doctor: one or more readiness checks failed".to_string(),
            checks: vec![
                DoctorCheck {
                    name: "config_validation",
                    status: CheckStatus::Pass,
                    details: "ok".to_string(),
                },
                DoctorCheck {
                    name: "host_connectivity",
                    status: CheckStatus::Skipped,
                    details: "later".to_string(),
                },
            ],
        };

        let rendered = render_human(&report);
        assert!(rendered.contains("- [ok] config_validation: ok"));
        assert!(rendered.contains("- [skip] host_connectivity: later"));
    }
}
