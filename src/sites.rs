//! Host web-site control adapter.
//!
//! Shells out to the host's site manager (IIS via PowerShell) to list sites
//! and start/stop/restart them. Called only from the HTTP layer; the
//! monitoring core never touches it.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};

const LIST_SITES_SCRIPT: &str = r#"
    Get-IISSite | Select-Object Name, State, Id | ConvertTo-Json -Depth 3
"#;

/// One site as reported by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Id", default)]
    pub id: Option<u32>,
}

/// Outcome of a control action.
#[derive(Debug, Clone, Serialize)]
pub struct ControlResult {
    pub site: String,
    pub action: String,
    pub output: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: chrono::DateTime<Utc>,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteAction {
    Start,
    Stop,
    Restart,
}

impl FromStr for SiteAction {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "start" => Ok(SiteAction::Start),
            "stop" => Ok(SiteAction::Stop),
            "restart" => Ok(SiteAction::Restart),
            other => bail!("invalid action: {other}. use: start, stop, restart"),
        }
    }
}

impl fmt::Display for SiteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteAction::Start => write!(f, "start"),
            SiteAction::Stop => write!(f, "stop"),
            SiteAction::Restart => write!(f, "restart"),
        }
    }
}

/// Adapter around the host's site management shell.
pub struct SiteManager {
    shell: String,
}

impl SiteManager {
    pub fn new(shell: String) -> Self {
        Self { shell }
    }

    /// List all sites the host knows about.
    pub async fn list_sites(&self) -> Result<Vec<SiteInfo>> {
        debug!("listing host sites");

        let output = Command::new(&self.shell)
            .arg("-Command")
            .arg(LIST_SITES_SCRIPT)
            .output()
            .await
            .context("failed to run site listing command")?;

        if !output.status.success() {
            bail!(
                "site listing failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_site_list(&String::from_utf8_lossy(&output.stdout))
    }

    /// Start, stop or restart one site and its application pool.
    pub async fn control_site(&self, site: &str, action: SiteAction) -> Result<ControlResult> {
        let script = control_script(site, action);
        info!(%site, %action, "controlling site");

        let started_at = Utc::now();
        let timer = std::time::Instant::now();

        let output = Command::new(&self.shell)
            .arg("-Command")
            .arg(&script)
            .output()
            .await
            .context("failed to run site control command")?;

        let success = output.status.success();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        Ok(ControlResult {
            site: site.to_string(),
            action: action.to_string(),
            output: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            success,
            error: (!success).then(|| {
                if stderr.is_empty() {
                    format!("command exited with {}", output.status)
                } else {
                    stderr
                }
            }),
            timestamp: started_at,
            duration_ms: timer.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

/// The listing script emits a JSON object for a single site and a JSON array
/// for several.
fn parse_site_list(stdout: &str) -> Result<Vec<SiteInfo>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).context("failed to parse site list")
    } else {
        let site: SiteInfo = serde_json::from_str(trimmed).context("failed to parse site list")?;
        Ok(vec![site])
    }
}

fn control_script(site: &str, action: SiteAction) -> String {
    match action {
        SiteAction::Start => format!(
            "Start-WebAppPool -Name \"{site}\"; Start-Website -Name \"{site}\""
        ),
        SiteAction::Stop => format!(
            "Stop-Website -Name \"{site}\"; Stop-WebAppPool -Name \"{site}\""
        ),
        SiteAction::Restart => format!(
            "Stop-Website -Name \"{site}\"; Stop-WebAppPool -Name \"{site}\"; \
             Start-Sleep -Seconds 2; \
             Start-WebAppPool -Name \"{site}\"; Start-Sleep -Seconds 1; \
             Start-Website -Name \"{site}\""
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_site_array() {
        let sites = parse_site_list(
            r#"[
                {"Name": "Default Web Site", "State": "Started", "Id": 1},
                {"Name": "intranet", "State": "Stopped", "Id": 2}
            ]"#,
        )
        .unwrap();

        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].name, "Default Web Site");
        assert_eq!(sites[1].state, "Stopped");
    }

    #[test]
    fn parses_a_single_site_object() {
        let sites =
            parse_site_list(r#"{"Name": "Default Web Site", "State": "Started", "Id": 1}"#).unwrap();

        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].id, Some(1));
    }

    #[test]
    fn empty_output_means_no_sites() {
        assert!(parse_site_list("  \n").unwrap().is_empty());
    }

    #[test]
    fn actions_parse_case_insensitively() {
        assert_eq!("Start".parse::<SiteAction>().unwrap(), SiteAction::Start);
        assert_eq!("RESTART".parse::<SiteAction>().unwrap(), SiteAction::Restart);
        assert!("reboot".parse::<SiteAction>().is_err());
    }

    #[test]
    fn restart_script_stops_before_starting() {
        let script = control_script("intranet", SiteAction::Restart);
        let stop = script.find("Stop-Website").unwrap();
        let start = script.find("Start-Website").unwrap();
        assert!(stop < start);
    }
}
