use console::style;

/// Print an error chain as `ffai: <message>` without a backtrace.
pub fn display_user_error(err: &anyhow::Error) {
    eprintln!("{}: {err:#}", style("ffai").for_stderr().red().bold());
}

/// Non-fatal notice on stderr.
pub fn display_warning(message: &str) {
    eprintln!("{} {message}", style("warning:").for_stderr().yellow().bold());
}
