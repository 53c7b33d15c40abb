use super::{ConsoleCommand, Shell};

/// `list`
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCommand;

impl ConsoleCommand for ListCommand {
    fn name(&self) -> &'static str {
        "list"
    }

    fn description(&self) -> &'static str {
        "List all commands"
    }

    fn help(&self) -> &'static str {
        "Lists all available commands, and their short descriptions."
    }

    fn execute(&self, shell: &mut Shell<'_>, _args: &[&str]) -> bool {
        let lines: Vec<String> = shell
            .commands()
            .map(|c| format!("{}: {}", c.name(), c.description()))
            .collect();
        for line in lines {
            shell.print(line);
        }
        true
    }
}
