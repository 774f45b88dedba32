// Client credential discovery.
//
// The client exposes its private API behind a per-launch port and auth token,
// both present on the `LeagueClientUx.exe` command line. Discovery inspects
// the process table through PowerShell; every failure mode (no process, no
// PowerShell, unparsable command line) is reported as "not found" so the
// driver keeps polling.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Connection credentials for the session API. Opaque to the game core.
#[derive(Debug, Clone, PartialEq)]
pub struct LcuCreds {
    pub port: u16,
    pub token: String,
}

/// Source of client credentials, polled by the driver until available or
/// shutdown is requested.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn discover(&self) -> anyhow::Result<Option<LcuCreds>>;
}

// ---------------------------------------------------------------------------
// Process scanner
// ---------------------------------------------------------------------------

/// Discovers credentials by reading the client process command line.
pub struct ProcessScanner;

const UX_QUERY: &str = "(Get-CimInstance Win32_Process \
     -Filter \"Name='LeagueClientUx.exe'\").CommandLine";

#[async_trait]
impl CredentialProvider for ProcessScanner {
    async fn discover(&self) -> anyhow::Result<Option<LcuCreds>> {
        let output = match Command::new("powershell.exe")
            .args(["-NoProfile", "-Command", UX_QUERY])
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                debug!("process scan failed: {e}");
                return Ok(None);
            }
        };
        if !output.status.success() {
            return Ok(None);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(extract_creds(&stdout))
    }
}

/// Pull `--app-port` and `--remoting-auth-token` out of a command line.
pub fn extract_creds(cmdline: &str) -> Option<LcuCreds> {
    let port = extract_arg(cmdline, "--app-port=")?.parse().ok()?;
    let token = extract_arg(cmdline, "--remoting-auth-token=")?.to_string();
    Some(LcuCreds { port, token })
}

/// The value following `marker`, up to the next whitespace or quote.
fn extract_arg<'a>(cmdline: &'a str, marker: &str) -> Option<&'a str> {
    let start = cmdline.find(marker)? + marker.len();
    let rest = &cmdline[start..];
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '"')
        .unwrap_or(rest.len());
    let value = &rest[..end];
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_port_and_token() {
        let cmdline = r#""C:\Riot Games\LeagueClientUx.exe" --riotclient-app-port=55555 --app-port=51234 --remoting-auth-token=AbC-dEf_123 --locale=ko_KR"#;
        let creds = extract_creds(cmdline).unwrap();
        assert_eq!(creds.port, 51234);
        assert_eq!(creds.token, "AbC-dEf_123");
    }

    #[test]
    fn handles_quoted_arguments() {
        let cmdline = r#"--app-port=443 --remoting-auth-token=tok"next"#;
        let creds = extract_creds(cmdline).unwrap();
        assert_eq!(creds.port, 443);
        assert_eq!(creds.token, "tok");
    }

    #[test]
    fn missing_token_yields_none() {
        assert!(extract_creds("--app-port=1234").is_none());
    }

    #[test]
    fn missing_port_yields_none() {
        assert!(extract_creds("--remoting-auth-token=abc").is_none());
    }

    #[test]
    fn non_numeric_port_yields_none() {
        assert!(extract_creds("--app-port=nope --remoting-auth-token=abc").is_none());
    }

    #[test]
    fn empty_command_line_yields_none() {
        assert!(extract_creds("").is_none());
    }
}
