//! Terminal implementations of the notification and navigation seams.

use tagport_core::{Notification, Severity};
use tagport_reader::Result;
use tagport_reader::traits::{ConfigForm, NotificationSink, RecordNavigator};

/// Prints notifications. Warnings and errors go to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn render(notification: &Notification) -> String {
        if notification.sticky {
            format!("{notification} (action required)")
        } else {
            notification.to_string()
        }
    }
}

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let line = Self::render(&notification);
        match notification.severity {
            Severity::Info | Severity::Success => println!("{line}"),
            Severity::Warning | Severity::Danger => eprintln!("{line}"),
        }
    }
}

/// "Opens" a configuration form by printing its fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNavigator;

impl ConsoleNavigator {
    pub fn render(form: &ConfigForm) -> String {
        format!(
            "{}\n  record:     {}\n  reader id:  {}\n  ip address: {}\n  port:       {}\n  com port:   {}",
            form.title, form.record_id, form.reader_id, form.ip_address, form.port, form.com_port
        )
    }
}

impl RecordNavigator for ConsoleNavigator {
    fn open_config_form(&self, form: ConfigForm) -> Result<()> {
        println!("{}", Self::render(&form));
        Ok(())
    }
}
