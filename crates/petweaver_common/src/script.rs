//! Tactical script parsing.
//!
//! A script is a named, ordered list of step strings, one line per step.
//! Blank lines and comment lines (`//` or `#`) are not steps.

use serde::{Deserialize, Serialize};

/// A parsed tactical script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    pub steps: Vec<String>,
}

impl Script {
    pub fn parse(raw: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: parse_script(raw),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Split raw script text into steps. A line is a step iff, after trimming
/// whitespace, it is non-empty and does not start with `//` or `#`.
pub fn parse_script(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//") && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_blanks_and_comments() {
        let raw = "// title\nstep one\n\n# note\nstep two";
        assert_eq!(parse_script(raw), vec!["step one", "step two"]);
    }

    #[test]
    fn test_parse_preserves_order_and_trims() {
        let raw = "  use(Breath) \n\t standby \n//done\nchange(#2)";
        assert_eq!(
            parse_script(raw),
            vec!["use(Breath)", "standby", "change(#2)"]
        );
    }

    #[test]
    fn test_parse_all_comments_yields_empty() {
        assert!(parse_script("# a\n// b\n\n").is_empty());
    }

    #[test]
    fn test_script_parse_keeps_name() {
        let script = Script::parse("step one", "squirt-opener");
        assert_eq!(script.name, "squirt-opener");
        assert_eq!(script.len(), 1);
    }
}
