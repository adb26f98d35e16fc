use std::process::{Command, Stdio};

use tracing::info;

use crate::error::{DeckError, Result};

/// Opens an external URL. Injected wherever a link can be followed.
pub trait UrlLauncher {
    fn open(&self, url: &str) -> Result<()>;
}

/// Hands the URL to the platform's default opener.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl UrlLauncher for SystemLauncher {
    fn open(&self, url: &str) -> Result<()> {
        validate_url(url)?;
        info!(%url, "opening link");
        opener_command(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

pub fn validate_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => Ok(()),
        _ => Err(DeckError::InvalidUrl(url.to_string())),
    }
}

fn opener_command(url: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", "", url]);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_http_and_https() {
        assert!(validate_url("https://xunit.net/").is_ok());
        assert!(validate_url("http://localhost:8080/docs").is_ok());
    }

    #[test]
    fn test_validate_rejects_other_urls() {
        for url in ["", "xunit.net", "ftp://host", "https://", "https://a b", "javascript:alert(1)"] {
            assert!(
                matches!(validate_url(url), Err(DeckError::InvalidUrl(u)) if u == url),
                "{} should be rejected",
                url
            );
        }
    }

    #[test]
    fn test_system_launcher_rejects_before_spawning() {
        let result = SystemLauncher.open("not a url");
        assert!(matches!(result, Err(DeckError::InvalidUrl(_))));
    }

    #[test]
    fn test_opener_command_passes_url() {
        let cmd = opener_command("https://xunit.net/");
        assert!(cmd.get_args().any(|a| a == "https://xunit.net/"));
    }
}
