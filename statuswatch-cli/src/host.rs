//! Console implementations of the host collaborators.
//!
//! Stand-ins for a real host toolbar and notification service: the
//! toolbar redraws one composed line per completed re-render, the
//! notifier turns toasts into log lines.

use std::collections::BTreeMap;

use statuswatch_engine::{Notifier, SlotContent, ToastId, ToastUpdate, Toolbar};
use tracing::{debug, info};

/// Renders the slot sequence as a single console line.
#[derive(Debug, Default)]
pub struct ConsoleToolbar {
    items: Vec<SlotContent>,
}

impl Toolbar for ConsoleToolbar {
    fn append(&mut self, _name: &str, content: &SlotContent) {
        self.items.push(content.clone());
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    fn rendered(&mut self) {
        let line = self
            .items
            .iter()
            .map(|content| {
                if content.muted {
                    format!("({})", content.text)
                } else {
                    content.text.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" | ");
        println!("[toolbar] {line}");
    }
}

/// Compose the system-info map as a single console line.
pub fn format_system_info(info: &BTreeMap<String, String>) -> String {
    info.iter()
        .map(|(module, value)| format!("{module}: {value}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Emits notifications through the log.
#[derive(Debug, Default)]
pub struct LogNotifier {
    next_id: u64,
}

impl Notifier for LogNotifier {
    fn info(&mut self, message: &str) -> ToastId {
        self.next_id += 1;
        info!(toast = self.next_id, %message, "notification");
        ToastId(self.next_id)
    }

    fn update(&mut self, update: ToastUpdate) {
        debug!(
            toast = update.toast_id.0,
            auto_close_ms = %update.auto_close.as_millis(),
            "notification updated"
        );
    }
}
