//! Running generated command lines.

use anyhow::{Context as _, Result, bail};
use std::io::{self, BufRead, Write};
use std::process::Command;
use tracing::debug;

pub const FFMPEG: &str = "ffmpeg";

pub fn ffmpeg_available() -> bool {
    which::which(FFMPEG).is_ok()
}

/// Ask a yes/no question; anything but `y`/`yes` is a no.
pub fn confirm(question: &str, input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    write!(output, "{question} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Run `command` through `sh -c` with inherited stdio.
pub fn run_shell(command: &str) -> Result<()> {
    debug!("exec: {command}");
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .context("failed to spawn sh")?;
    if !status.success() {
        match status.code() {
            Some(code) => bail!("command exited with status {code}"),
            None => bail!("command was terminated by a signal"),
        }
    }
    Ok(())
}

/// Check for ffmpeg, confirm unless `assume_yes`, then run.
/// Returns false when the user declined.
pub fn execute(command: &str, assume_yes: bool) -> Result<bool> {
    if !ffmpeg_available() {
        bail!("{FFMPEG} was not found in PATH; install it or run the command yourself");
    }
    if !assume_yes {
        let stdin = io::stdin();
        let mut stderr = io::stderr();
        if !confirm("Run this command?", &mut stdin.lock(), &mut stderr)? {
            return Ok(false);
        }
    }
    run_shell(command)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(reply: &str) -> (bool, String) {
        let mut out = Vec::new();
        let yes = confirm("Run?", &mut Cursor::new(reply.as_bytes()), &mut out).unwrap();
        (yes, String::from_utf8(out).unwrap())
    }

    #[test]
    fn confirm_accepts_yes() {
        assert!(answer("y\n").0);
        assert!(answer("YES\n").0);
        assert_eq!(answer("y\n").1, "Run? [y/N] ");
    }

    #[test]
    fn confirm_defaults_to_no() {
        assert!(!answer("\n").0);
        assert!(!answer("nope\n").0);
        assert!(!answer("").0);
    }

    #[test]
    fn shell_status_is_checked() {
        assert!(run_shell("true").is_ok());
        let err = run_shell("exit 3").unwrap_err();
        assert!(err.to_string().contains('3'));
    }
}
