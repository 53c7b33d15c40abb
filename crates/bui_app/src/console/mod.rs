//! Text console.
//!
//! Lines typed on stdin are split on whitespace; the first word names a
//! command and the rest are its arguments. Output is collected per line and
//! printed by the tick loop.

mod counter;
mod help;
mod list;
mod uis;

use std::collections::BTreeMap;
use std::sync::Arc;

use bui_component::InMemoryDirectory;
use bui_interface::UiSystem;
use bui_net::QueuedTransport;

pub use counter::CounterCommand;
pub use help::HelpCommand;
pub use list::ListCommand;
pub use uis::UisCommand;

/// The interface system the console drives.
pub type AppUi = UiSystem<InMemoryDirectory, QueuedTransport>;

/// A console command.
pub trait ConsoleCommand: Send + Sync {
    /// The word that invokes the command.
    fn name(&self) -> &'static str;
    /// One-line summary shown by `list` and `help <name>`.
    fn description(&self) -> &'static str;
    /// Longer usage text shown by `help <name>`.
    fn help(&self) -> &'static str;
    /// Run the command. Returns `true` if it was handled locally.
    fn execute(&self, shell: &mut Shell<'_>, args: &[&str]) -> bool;
}

/// One line of console output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Info(String),
    Error(String),
}

impl std::fmt::Display for ConsoleLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info(text) => f.write_str(text),
            Self::Error(text) => write!(f, "error: {text}"),
        }
    }
}

/// Result of running one line.
#[derive(Debug, Default)]
pub struct Executed {
    /// `false` if nothing local handled the line.
    pub handled: bool,
    pub output: Vec<ConsoleLine>,
}

/// What a running command can see and touch.
pub struct Shell<'a> {
    console: &'a Console,
    ui: &'a mut AppUi,
    output: Vec<ConsoleLine>,
}

impl<'a> Shell<'a> {
    pub fn print(&mut self, line: impl Into<String>) {
        self.output.push(ConsoleLine::Info(line.into()));
    }

    pub fn error(&mut self, line: impl Into<String>) {
        self.output.push(ConsoleLine::Error(line.into()));
    }

    /// Look up a command by name.
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&'a dyn ConsoleCommand> {
        let console: &'a Console = self.console;
        console.get(name)
    }

    /// Every command, sorted by name.
    pub fn commands(&self) -> impl Iterator<Item = &'a dyn ConsoleCommand> + use<'a> {
        let console: &'a Console = self.console;
        console.commands()
    }

    /// Whether a server is reachable that might know commands we don't.
    #[must_use]
    pub fn remote_connected(&self) -> bool {
        self.console.remote_connected
    }

    #[must_use]
    pub fn ui(&self) -> &AppUi {
        &*self.ui
    }

    pub fn ui_mut(&mut self) -> &mut AppUi {
        &mut *self.ui
    }
}

/// The command table.
pub struct Console {
    commands: BTreeMap<&'static str, Arc<dyn ConsoleCommand>>,
    remote_connected: bool,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("remote_connected", &self.remote_connected)
            .finish()
    }
}

impl Console {
    /// An empty console.
    #[must_use]
    pub fn new(remote_connected: bool) -> Self {
        Self {
            commands: BTreeMap::new(),
            remote_connected,
        }
    }

    /// A console with `help`, `list` and `uis` registered.
    #[must_use]
    pub fn with_builtins(remote_connected: bool) -> Self {
        let mut console = Self::new(remote_connected);
        console.register(HelpCommand);
        console.register(ListCommand);
        console.register(UisCommand);
        console
    }

    /// Register a command, replacing any with the same name.
    pub fn register(&mut self, command: impl ConsoleCommand + 'static) {
        self.commands.insert(command.name(), Arc::new(command));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn ConsoleCommand> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Every command, sorted by name.
    pub fn commands(&self) -> impl Iterator<Item = &dyn ConsoleCommand> {
        self.commands.values().map(|c| c.as_ref())
    }

    /// Parse and run one line.
    ///
    /// An unknown command is reported only when no server is connected;
    /// otherwise the line is left unhandled for the server to answer.
    pub fn run_line(&self, ui: &mut AppUi, line: &str) -> Executed {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Executed::default();
        };
        let args: Vec<&str> = words.collect();

        let mut shell = Shell {
            console: self,
            ui,
            output: Vec::new(),
        };
        let handled = match self.commands.get(name) {
            Some(command) => command.execute(&mut shell, &args),
            None => {
                if !self.remote_connected {
                    shell.error(format!("Unknown command: {name}"));
                }
                false
            }
        };
        Executed {
            handled,
            output: shell.output,
        }
    }
}
