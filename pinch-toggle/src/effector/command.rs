//! Key injection through an external command (`xdotool key space` by default).

use std::process::{Command, Stdio};

use tracing::{debug, warn};

use super::{ActionEffector, KeySpec};

pub struct CommandEffector {
    program: String,
    args: Vec<String>,
    failures: u64,
}

impl CommandEffector {
    /// `argv[0]` is the program, the rest its arguments.
    pub fn new(argv: Vec<String>) -> anyhow::Result<Self> {
        let mut argv = argv.into_iter();
        let program = argv
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("key command must name a program"))?;
        Ok(Self {
            program,
            args: argv.collect(),
            failures: 0,
        })
    }

    /// `xdotool key <keysym>`.
    pub fn default_argv(key: KeySpec) -> Vec<String> {
        vec!["xdotool".to_string(), "key".to_string(), key.keysym_name()]
    }

    /// Split a command line on whitespace. No quoting.
    pub fn split_command_line(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }
}

impl ActionEffector for CommandEffector {
    fn name(&self) -> &'static str {
        "command"
    }

    fn fire(&mut self) {
        debug!("Running key command: {} {}", self.program, self.args.join(" "));
        let result = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .status();

        match result {
            Ok(status) if status.success() => {}
            Ok(status) => {
                self.failures += 1;
                warn!("Key command {} exited with {}", self.program, status);
            }
            Err(e) => {
                self.failures += 1;
                warn!("Key command {} could not run: {}", self.program, e);
            }
        }
    }

    fn failures(&self) -> u64 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_argv() {
        assert_eq!(
            CommandEffector::default_argv(KeySpec::Space),
            vec!["xdotool", "key", "space"]
        );
    }

    #[test]
    fn test_split_command_line() {
        assert_eq!(
            CommandEffector::split_command_line("  ydotool  key 57:1 57:0 "),
            vec!["ydotool", "key", "57:1", "57:0"]
        );
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandEffector::new(Vec::new()).is_err());
        assert!(CommandEffector::new(vec!["  ".to_string()]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_command() {
        let mut effector = CommandEffector::new(vec!["true".to_string()]).unwrap();
        effector.fire();
        assert_eq!(effector.failures(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_counted() {
        let mut effector = CommandEffector::new(vec!["false".to_string()]).unwrap();
        effector.fire();
        effector.fire();
        assert_eq!(effector.failures(), 2);
    }

    #[test]
    fn test_missing_program_counted() {
        let mut effector =
            CommandEffector::new(vec!["/nonexistent/key-injector".to_string()]).unwrap();
        effector.fire();
        assert_eq!(effector.failures(), 1);
    }
}
