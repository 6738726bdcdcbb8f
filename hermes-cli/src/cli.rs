use std::path::{Path, PathBuf};

use clap::Parser;
use hermes::Notifier;

/// Run a command, retry it on failure, and report how it went.
#[derive(Parser, Debug)]
#[command(name = "hermes", version, about, long_about = None)]
pub struct Args {
    /// Sender address for mail notifications
    #[arg(long, env = "HERMES_ORIGIN")]
    pub origin: String,

    /// Recipient address for mail notifications
    #[arg(long, env = "HERMES_DESTINATION")]
    pub destination: String,

    /// Markdown template for the notification body
    #[arg(long, value_name = "PATH")]
    pub markdown: Option<PathBuf>,

    /// Retries after the first failed attempt
    #[arg(long, default_value_t = 1)]
    pub retries: u32,

    /// Seconds to wait between attempts
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub delay: u64,

    /// Only notify when the command fails
    #[arg(long)]
    pub no_success: bool,

    /// Subject label (defaults to the program name)
    #[arg(long)]
    pub label: Option<String>,

    /// SMTP relay host, used when no Outlook token is set
    #[arg(long, env = "HERMES_SMTP_HOST", default_value = "localhost")]
    pub smtp_host: String,

    /// SMTP relay port
    #[arg(long, env = "HERMES_SMTP_PORT", default_value_t = 25)]
    pub smtp_port: u16,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Program to run, followed by its arguments
    #[arg(last = true, required = true, value_name = "PROGRAM")]
    pub command: Vec<String>,
}

impl Args {
    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    pub fn program_args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }

    /// Label used in notification subjects.
    pub fn subject_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            Path::new(self.program())
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.program().to_string())
        })
    }

    pub fn notifier(&self) -> Notifier {
        let mut builder = Notifier::builder(&self.origin, &self.destination)
            .label(self.subject_label())
            .retries(self.retries)
            .delay_secs(self.delay)
            .notify_on_success(!self.no_success)
            .smtp(&self.smtp_host, self.smtp_port);

        if let Some(path) = &self.markdown {
            builder = builder.markdown(path);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut full = vec!["hermes", "--origin", "a@example.com", "--destination", "b@example.com"];
        full.extend_from_slice(args);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--", "backup.sh"]);
        assert_eq!(args.retries, 1);
        assert_eq!(args.delay, 60);
        assert!(!args.no_success);
        assert_eq!(args.program(), "backup.sh");
        assert!(args.program_args().is_empty());
    }

    #[test]
    fn test_program_arguments_are_passed_through() {
        let args = parse(&["--retries", "3", "--", "/usr/bin/rsync", "-a", "--delete", "src/", "dst/"]);
        assert_eq!(args.retries, 3);
        assert_eq!(args.program(), "/usr/bin/rsync");
        assert_eq!(args.program_args(), ["-a", "--delete", "src/", "dst/"]);
    }

    #[test]
    fn test_subject_label() {
        assert_eq!(parse(&["--", "/usr/bin/rsync"]).subject_label(), "rsync");
        assert_eq!(
            parse(&["--label", "nightly", "--", "/usr/bin/rsync"]).subject_label(),
            "nightly"
        );
    }

    #[test]
    fn test_command_is_required() {
        let result = Args::try_parse_from([
            "hermes",
            "--origin",
            "a@example.com",
            "--destination",
            "b@example.com",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_notifier_configuration() {
        let notifier = parse(&["--retries", "4", "--delay", "5", "--", "true"]).notifier();
        assert_eq!(notifier.policy().max_retries, 4);
        assert_eq!(notifier.policy().delay, std::time::Duration::from_secs(5));
        assert_eq!(notifier.label(), Some("true"));
    }
}
