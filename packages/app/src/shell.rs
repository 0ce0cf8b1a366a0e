//! Line commands for driving the demo from a terminal.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `refresh` | refresh the visible screen |
//! | `select <n>` | select row `n` of a list |
//! | `select <section> <row>` | select a row of a sectioned list |
//! | `action <name>` | press a named action (e.g. `edit`) |
//! | `back` | dismiss a notice, or go back one screen |
//! | `tab <name>` | switch tab |
//! | `tree` | print the navigation ownership tree |
//! | `show` | re-render the visible screen |
//! | `help` | list commands |
//! | `quit` | exit |

use std::str::FromStr;
use std::sync::Arc;

use armature::{Coordinator, Gesture, NavigationStack};
use thiserror::Error;

use crate::app::AppCoordinator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Gesture(Gesture),
    Tree,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("'{0}' is not a row index")]
    InvalidIndex(String),
}

fn index(raw: &str) -> Result<usize, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidIndex(raw.to_string()))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(Command::Show);
        };
        let args: Vec<&str> = words.collect();

        let command = match verb.to_ascii_lowercase().as_str() {
            "refresh" => Command::Gesture(Gesture::Refresh),
            "select" => match args.as_slice() {
                [] => return Err(CommandError::MissingArgument("select")),
                [n] => Command::Gesture(Gesture::Select(index(n)?)),
                [section, row, ..] => Command::Gesture(Gesture::SelectRow {
                    section: index(section)?,
                    row: index(row)?,
                }),
            },
            "action" => match args.first() {
                Some(name) => Command::Gesture(Gesture::Action(name.to_string())),
                None => return Err(CommandError::MissingArgument("action")),
            },
            "back" => Command::Gesture(Gesture::Back),
            "tab" => match args.first() {
                Some(name) => Command::Gesture(Gesture::Tab(name.to_string())),
                None => return Err(CommandError::MissingArgument("tab")),
            },
            "tree" => Command::Tree,
            "show" => Command::Show,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

const HELP: [&str; 9] = [
    "refresh                 reload the visible screen",
    "select <n>              select row n",
    "select <section> <row>  select a row of a sectioned list",
    "action <name>           press a named action (e.g. edit)",
    "back                    dismiss a notice or go back",
    "tab <name>              switch tab",
    "tree                    print the coordinator tree",
    "show                    re-render",
    "quit                    exit",
];

/// Routes commands to the surfaces under a root stack.
pub struct Shell {
    root: Arc<NavigationStack>,
    app: Arc<AppCoordinator>,
}

impl Shell {
    pub fn new(root: Arc<NavigationStack>, app: Arc<AppCoordinator>) -> Self {
        Self { root, app }
    }

    /// Apply `command`. Returns lines to print before the screen.
    pub fn apply(&self, command: &Command) -> Vec<String> {
        match command {
            Command::Gesture(gesture @ Gesture::Tab(_)) => {
                let handled = self
                    .root
                    .top()
                    .map(|top| top.gesture(gesture))
                    .unwrap_or(false);
                if handled {
                    Vec::new()
                } else {
                    vec!["no such tab".into()]
                }
            }
            Command::Gesture(gesture) => self.dispatch(gesture),
            Command::Tree => self
                .app
                .node()
                .describe_tree()
                .lines()
                .map(str::to_string)
                .collect(),
            Command::Show | Command::Quit => Vec::new(),
            Command::Help => HELP.iter().map(|line| line.to_string()).collect(),
        }
    }

    fn dispatch(&self, gesture: &Gesture) -> Vec<String> {
        let stack = self.root.visible();
        let Some(top) = stack.top() else {
            return vec!["nothing on screen".into()];
        };
        if top.gesture(gesture) {
            return Vec::new();
        }
        if *gesture == Gesture::Back && stack.len() > 1 {
            stack.pop();
            return Vec::new();
        }
        vec![format!("{} ignored {:?}", top.title(), gesture)]
    }

    /// Render every surface from the root down to the visible one.
    pub fn screen(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut stack = Arc::clone(&self.root);
        while let Some(top) = stack.top() {
            lines.extend(top.render());
            match top.nested() {
                Some(nested) => stack = nested,
                None => break,
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use armature::Registry;

    use crate::config::AppConfig;
    use crate::services::Services;

    fn offline_shell() -> Shell {
        let config = AppConfig {
            simulated_delay: Duration::ZERO,
            ..AppConfig::default()
        };
        let registry = Arc::new(Registry::new());
        Services::offline(config).register(&registry);

        let root = Arc::new(NavigationStack::new());
        let app = AppCoordinator::new(Arc::clone(&root), registry);
        Arc::clone(&app).start();
        Shell::new(root, app)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    fn run(shell: &Shell, line: &str) -> Vec<String> {
        shell.apply(&line.parse::<Command>().unwrap())
    }

    #[tokio::test]
    async fn drives_tabs_and_detail_navigation() {
        let shell = offline_shell();
        settle().await;

        let screen = shell.screen();
        assert_eq!(screen[0], "tabs: [Home] | Profile | Settings");
        assert!(screen.iter().any(|line| line.starts_with("[0] Getting Started")));

        assert!(run(&shell, "select 0").is_empty());
        settle().await;
        assert!(shell.screen().contains(&"== Getting Started ==".to_string()));

        assert!(run(&shell, "back").is_empty());
        assert_eq!(shell.screen()[1], "== Home ==");

        assert!(run(&shell, "tab profile").is_empty());
        assert_eq!(shell.screen()[0], "tabs: Home | [Profile] | Settings");
        assert_eq!(run(&shell, "back"), vec!["Profile ignored Back"]);
        assert_eq!(run(&shell, "tab nowhere"), vec!["no such tab"]);
    }

    #[tokio::test]
    async fn logout_rebuilds_the_tree() {
        let shell = offline_shell();
        settle().await;
        let before = run(&shell, "tree");
        assert_eq!(before.len(), 5);

        run(&shell, "tab settings");
        settle().await;
        assert!(run(&shell, "select 0 2").is_empty());
        settle().await;

        let after = run(&shell, "tree");
        assert_eq!(after.len(), 5);
        assert!(after[0].starts_with("app"));
        assert_ne!(before[1], after[1], "a fresh tab bar replaces the old one");
        assert_eq!(shell.screen()[0], "tabs: [Home] | Profile | Settings");
    }

    #[test]
    fn parses_commands() {
        assert_eq!("refresh".parse::<Command>(), Ok(Command::Gesture(Gesture::Refresh)));
        assert_eq!("select 2".parse::<Command>(), Ok(Command::Gesture(Gesture::Select(2))));
        assert_eq!(
            "select 0 2".parse::<Command>(),
            Ok(Command::Gesture(Gesture::SelectRow { section: 0, row: 2 }))
        );
        assert_eq!(
            "TAB settings".parse::<Command>(),
            Ok(Command::Gesture(Gesture::Tab("settings".into())))
        );
        assert_eq!("".parse::<Command>(), Ok(Command::Show));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            "select".parse::<Command>(),
            Err(CommandError::MissingArgument("select"))
        );
        assert_eq!(
            "select x".parse::<Command>(),
            Err(CommandError::InvalidIndex("x".into()))
        );
        assert_eq!(
            "dance".parse::<Command>(),
            Err(CommandError::Unknown("dance".into()))
        );
    }
}
