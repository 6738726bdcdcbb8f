//! Run a task under a retry policy and report its terminal outcome.
//!
//! The engine owns nothing across invocations: every call gets its own
//! [`ExecutionTracker`], and the channel set is resolved again from the
//! settings source each time a notification goes out.
//!
//! ```ignore
//! use hermes::Notifier;
//!
//! let notifier = Notifier::builder("jobs@example.com", "ops@example.com")
//!     .retries(2)
//!     .delay_secs(30)
//!     .build();
//!
//! let rows = notifier.run("import_orders", || import_orders(&pool)).await?;
//! ```

use std::fmt::{Debug, Display};
use std::future::Future;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::context::ContextCollector;
use crate::notification::{
    ChannelFactory, ChannelRegistry, DispatchReport, HttpChannelFactory, MailSettings, Message,
    NotificationDispatcher,
};
use crate::retry::RetryPolicy;
use crate::settings::{EnvSettings, SettingsSource};
use crate::template::Template;
use crate::tracker::{ExecutionRecord, ExecutionTracker};

/// Everything known about one finished invocation.
#[derive(Debug)]
pub struct Execution<T, E> {
    /// The task's own result, untouched.
    pub result: Result<T, E>,
    pub record: ExecutionRecord,
    /// `None` when no notification was sent (success with success
    /// notifications disabled).
    pub report: Option<DispatchReport>,
}

impl<T, E> Execution<T, E> {
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Wraps tasks so that their outcome is reported on every active channel.
///
/// Configuration is fixed once built; a `Notifier` is cheap to clone and can
/// be shared between concurrent invocations.
#[derive(Clone)]
pub struct Notifier {
    mail: MailSettings,
    label: Option<String>,
    template: Template,
    policy: RetryPolicy,
    notify_on_success: bool,
    settings: Arc<dyn SettingsSource>,
    context: ContextCollector,
    factory: Arc<dyn ChannelFactory>,
    dispatcher: NotificationDispatcher,
}

impl Notifier {
    /// Start configuring a notifier mailing from `origin` to `destination`.
    ///
    /// The name of the directory holding the calling source file becomes
    /// the subject label unless [`NotifierBuilder::label`] overrides it.
    #[track_caller]
    pub fn builder(origin: impl Into<String>, destination: impl Into<String>) -> NotifierBuilder {
        let label = caller_label(Location::caller().file());
        NotifierBuilder::new(origin.into(), destination.into(), label)
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Bind `task` to this notifier under `name`.
    pub fn wrap<F>(&self, name: impl Into<String>, task: F) -> Notified<F> {
        Notified {
            notifier: self.clone(),
            name: name.into(),
            task,
        }
    }

    /// Run `task` and return its own result once the outcome is reported.
    pub async fn run<F, Fut, T, E>(&self, name: &str, task: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display + Debug,
    {
        self.execute(name, task).await.into_result()
    }

    /// Run `task` with retries, notify, and return the full [`Execution`].
    pub async fn execute<F, Fut, T, E>(&self, name: &str, mut task: F) -> Execution<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display + Debug,
    {
        let mut tracker = ExecutionTracker::start(name);

        let result = loop {
            match task().await {
                Ok(value) => break Ok(value),
                Err(error) => {
                    let attempt = tracker.attempt();
                    let Some(delay) = self.policy.delay_for_attempt(attempt) else {
                        break Err(error);
                    };

                    warn!(
                        function = name,
                        attempt,
                        max_attempts = self.policy.max_attempts(),
                        error = %error,
                        delay_ms = delay.as_millis() as u64,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    tracker.begin_retry();
                }
            }
        };

        let record = match &result {
            Ok(_) => tracker.succeed(),
            Err(error) => tracker.fail(error.to_string(), format!("{error:?}")),
        };

        let report = if record.is_success() && !self.notify_on_success {
            debug!(function = name, "Success notifications disabled");
            None
        } else {
            Some(self.notify(&record).await)
        };

        Execution {
            result,
            record,
            report,
        }
    }

    /// Render the notification for `record` and send it to every active
    /// channel.
    pub async fn notify(&self, record: &ExecutionRecord) -> DispatchReport {
        let context = self.context.collect(record);
        let label = self.label.as_deref().unwrap_or(&record.function_name);
        let message = Message::new(
            Message::subject_for(label, record.outcome),
            self.template.render(&context),
        );

        let registry = ChannelRegistry::resolve(self.settings.as_ref(), &self.mail);
        let channels = registry.build(self.factory.as_ref());
        let report = self.dispatcher.dispatch(&message, &channels).await;

        info!(
            function = %record.function_name,
            outcome = %record.outcome,
            attempts = record.attempt_count,
            channels = ?registry.channel_types(),
            delivered = report.delivered(),
            failed = report.failed(),
            "Notification dispatched"
        );
        report
    }
}

/// A task bound to a [`Notifier`].
pub struct Notified<F> {
    notifier: Notifier,
    name: String,
    task: F,
}

impl<F> Notified<F> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the task with retries and notification.
    pub async fn call<Fut, T, E>(&self) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display + Debug,
    {
        self.notifier.run(&self.name, &self.task).await
    }

    /// Like [`Notified::call`], keeping the record and dispatch report.
    pub async fn call_reported<Fut, T, E>(&self) -> Execution<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display + Debug,
    {
        self.notifier.execute(&self.name, &self.task).await
    }
}

/// Builder for [`Notifier`].
pub struct NotifierBuilder {
    mail: MailSettings,
    label: Option<String>,
    markdown: Option<PathBuf>,
    template: Option<Template>,
    policy: RetryPolicy,
    notify_on_success: bool,
    settings: Option<Arc<dyn SettingsSource>>,
    context: ContextCollector,
    factory: Option<Arc<dyn ChannelFactory>>,
}

impl NotifierBuilder {
    fn new(origin: String, destination: String, label: Option<String>) -> Self {
        Self {
            mail: MailSettings::new(origin, destination),
            label,
            markdown: None,
            template: None,
            policy: RetryPolicy::default(),
            notify_on_success: true,
            settings: None,
            context: ContextCollector::default(),
            factory: None,
        }
    }

    /// Subject label, shown as `[<label>] has failed.`.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Markdown template file, read when the notifier is built.
    pub fn markdown(mut self, path: impl AsRef<Path>) -> Self {
        self.markdown = Some(path.as_ref().to_path_buf());
        self
    }

    /// Template given directly; takes precedence over [`Self::markdown`].
    pub fn template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    pub fn retries(mut self, max_retries: u32) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.policy.delay = delay;
        self
    }

    pub fn delay_secs(self, secs: u64) -> Self {
        self.delay(Duration::from_secs(secs))
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether a successful run is reported too (default: `true`).
    pub fn notify_on_success(mut self, enabled: bool) -> Self {
        self.notify_on_success = enabled;
        self
    }

    /// SMTP relay used when no Outlook token is configured.
    pub fn smtp(mut self, host: impl Into<String>, port: u16) -> Self {
        self.mail = self.mail.with_relay(host, port);
        self
    }

    /// Where channel settings are looked up (default: process environment).
    pub fn settings(mut self, settings: impl SettingsSource + 'static) -> Self {
        self.settings = Some(Arc::new(settings));
        self
    }

    pub fn context(mut self, context: ContextCollector) -> Self {
        self.context = context;
        self
    }

    pub fn channel_factory(mut self, factory: impl ChannelFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn build(self) -> Notifier {
        let template = match (self.template, self.markdown) {
            (Some(template), _) => template,
            (None, Some(path)) => Template::load_or_default(path),
            (None, None) => Template::Default,
        };

        Notifier {
            mail: self.mail,
            label: self.label,
            template,
            policy: self.policy,
            notify_on_success: self.notify_on_success,
            settings: self.settings.unwrap_or_else(|| Arc::new(EnvSettings)),
            context: self.context,
            factory: self
                .factory
                .unwrap_or_else(|| Arc::new(HttpChannelFactory::new())),
            dispatcher: NotificationDispatcher::new(),
        }
    }
}

/// Name of the directory containing `file`, if it has one.
fn caller_label(file: &str) -> Option<String> {
    Path::new(file)
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
}
