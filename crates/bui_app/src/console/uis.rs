use super::{ConsoleCommand, Shell};

/// `uis`
#[derive(Debug, Clone, Copy, Default)]
pub struct UisCommand;

impl ConsoleCommand for UisCommand {
    fn name(&self) -> &'static str {
        "uis"
    }

    fn description(&self) -> &'static str {
        "List open interface instances"
    }

    fn help(&self) -> &'static str {
        "Prints one line per live interface instance: id, owner entity, key, lifecycle and viewer count."
    }

    fn execute(&self, shell: &mut Shell<'_>, _args: &[&str]) -> bool {
        let mut lines: Vec<(u64, String)> = shell
            .ui()
            .registry()
            .iter()
            .map(|i| {
                (
                    i.id().0,
                    format!(
                        "{} {} {} {:?} viewers={} pending={}",
                        i.id(),
                        i.owner(),
                        i.key(),
                        i.lifecycle(),
                        i.actors().len(),
                        shell.ui().predictions().pending(i.owner(), i.key()).len(),
                    ),
                )
            })
            .collect();
        if lines.is_empty() {
            shell.print("No open interfaces.");
            return true;
        }
        lines.sort_by_key(|(id, _)| *id);
        for (_, line) in lines {
            shell.print(line);
        }
        true
    }
}
