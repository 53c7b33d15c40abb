use bui_component::{EntityId, InterfaceKey};
use bui_net::InterfaceMessage;

use super::{ConsoleCommand, Shell};
use crate::demo::{self, DemoUiKey, Increment};

/// `counter open|close|inc [n]|show`
#[derive(Debug, Clone, Copy)]
pub struct CounterCommand {
    entity: EntityId,
}

impl CounterCommand {
    #[must_use]
    pub fn new(entity: EntityId) -> Self {
        Self { entity }
    }

    fn increment(&self, shell: &mut Shell<'_>, by: i64) -> bool {
        let message = match InterfaceMessage::pack(&Increment { by }) {
            Ok(m) => m,
            Err(e) => {
                shell.error(format!("Failed to encode increment: {e}"));
                return false;
            }
        };
        if !shell
            .ui_mut()
            .send_predicted(self.entity, DemoUiKey::Counter.into(), message)
        {
            shell.error("The counter is not open.");
            return false;
        }
        self.show(shell)
    }

    fn show(&self, shell: &mut Shell<'_>) -> bool {
        match demo::value(shell.ui(), self.entity) {
            Some(value) => shell.print(format!("counter = {value}")),
            None => shell.print("The counter is not open."),
        }
        true
    }
}

impl ConsoleCommand for CounterCommand {
    fn name(&self) -> &'static str {
        "counter"
    }

    fn description(&self) -> &'static str {
        "Drive the demo counter interface"
    }

    fn help(&self) -> &'static str {
        "Usage: counter open | counter close | counter inc [amount] | counter show. Only a client can open, close or increment."
    }

    fn execute(&self, shell: &mut Shell<'_>, args: &[&str]) -> bool {
        let key: InterfaceKey = DemoUiKey::Counter.into();
        let client_only = matches!(args.first(), Some(&("open" | "close" | "inc")));
        if client_only && shell.ui().role().is_server() {
            shell.error("Only a client can do that.");
            return false;
        }
        match args {
            ["open"] => match shell.ui_mut().open(self.entity, key) {
                Ok(id) => {
                    shell.print(format!("opened {id}"));
                    true
                }
                Err(e) => {
                    shell.error(e.to_string());
                    false
                }
            },
            ["close"] => {
                if shell.ui_mut().close(self.entity, key) {
                    shell.print("closed");
                } else {
                    shell.print("The counter is not open.");
                }
                true
            }
            ["inc"] => self.increment(shell, 1),
            ["inc", amount] => match amount.parse::<i64>() {
                Ok(by) => self.increment(shell, by),
                Err(_) => {
                    shell.error(format!("Not a number: {amount}"));
                    false
                }
            },
            ["show"] | [] => self.show(shell),
            _ => {
                shell.error("Invalid amount of arguments.");
                false
            }
        }
    }
}
