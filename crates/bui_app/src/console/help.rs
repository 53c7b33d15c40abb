use super::{ConsoleCommand, Shell};

/// `help [command]`
#[derive(Debug, Clone, Copy, Default)]
pub struct HelpCommand;

impl ConsoleCommand for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        "Display help text."
    }

    fn help(&self) -> &'static str {
        "When no arguments are provided, displays a generic help text. When an argument is passed, display the help text for the command with that name."
    }

    fn execute(&self, shell: &mut Shell<'_>, args: &[&str]) -> bool {
        match args {
            [] => {
                shell.print("To display help for a specific command, write 'help <command>'. To list all available commands, write 'list'.");
                true
            }
            [name] => match shell.command(name) {
                Some(command) => {
                    shell.print(format!("{} - {}", command.name(), command.description()));
                    shell.print(command.help());
                    true
                }
                None => {
                    // With a server attached it may know the command.
                    if !shell.remote_connected() {
                        shell.error(format!("Unknown command: {name}"));
                    }
                    false
                }
            },
            _ => {
                shell.error("Invalid amount of arguments.");
                false
            }
        }
    }
}
