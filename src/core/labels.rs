//! core::labels
//!
//! Commit message trailer model.
//!
//! A message mailed for review is a free-form body followed by up to three
//! trailers the review server understands:
//!
//! ```text
//! Fix the parser
//!
//! Handles empty input.
//!
//! AutoSubmit
//! PresubmitTest: none
//! Change-Id: I0123456789abcdef0123456789abcdef01234567
//! ```
//!
//! `AutoSubmit` and `PresubmitTest` are rewritten from the requested
//! [`Labels`] on every submission. `Change-Id` is preserved and always
//! rendered last, where Gerrit expects it.
//!
//! # Invariants
//!
//! - `render(parse(render(m))) == render(m)`
//! - The rendered text is unchanged by git's whitespace cleanup, so a
//!   commit made from it reads back byte-identical.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::types::ChangeId;

const AUTOSUBMIT: &str = "AutoSubmit";
const PRESUBMIT_KEY: &str = "PresubmitTest";

/// Kind of presubmit testing requested for a change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PresubmitTest {
    /// Run everything (the server default; never written as a trailer).
    #[default]
    All,
    /// Skip presubmit testing.
    None,
    /// A named presubmit profile.
    Named(String),
}

impl FromStr for PresubmitTest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err("presubmit type cannot be empty".to_string()),
            "all" => Ok(PresubmitTest::All),
            "none" => Ok(PresubmitTest::None),
            other if other.chars().any(char::is_whitespace) => {
                Err(format!("presubmit type '{}' cannot contain whitespace", other))
            }
            other => Ok(PresubmitTest::Named(other.to_string())),
        }
    }
}

impl TryFrom<String> for PresubmitTest {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PresubmitTest> for String {
    fn from(p: PresubmitTest) -> Self {
        p.to_string()
    }
}

impl fmt::Display for PresubmitTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresubmitTest::All => f.write_str("all"),
            PresubmitTest::None => f.write_str("none"),
            PresubmitTest::Named(name) => f.write_str(name),
        }
    }
}

/// Labels requested for a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    pub autosubmit: bool,
    pub presubmit: PresubmitTest,
}

/// A commit message split into body and trailers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitMessage {
    /// Normalized body text without trailing newline.
    pub body: String,
    pub autosubmit: bool,
    pub presubmit: PresubmitTest,
    pub change_id: Option<ChangeId>,
}

fn autosubmit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^AutoSubmit\s*$").unwrap())
}

fn presubmit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^PresubmitTest:\s*(\S+)\s*$").unwrap())
}

fn change_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Change-Id:\s*(I[0-9a-fA-F]{40})\s*$").unwrap())
}

impl CommitMessage {
    /// Split `text` into body and trailers.
    ///
    /// Trailer lines are recognized anywhere in the message and removed
    /// from the body. If several Change-Id lines are present the last one
    /// wins. The body is normalized the way git cleans up messages:
    /// trailing whitespace stripped, runs of blank lines collapsed, leading
    /// and trailing blank lines dropped.
    pub fn parse(text: &str) -> Self {
        let mut message = CommitMessage::default();
        let mut body: Vec<&str> = Vec::new();

        for line in text.lines() {
            if autosubmit_re().is_match(line) {
                message.autosubmit = true;
                continue;
            }
            if let Some(caps) = presubmit_re().captures(line) {
                if let Ok(presubmit) = caps[1].parse() {
                    message.presubmit = presubmit;
                    continue;
                }
            }
            if let Some(caps) = change_id_re().captures(line) {
                if let Ok(id) = ChangeId::new(&caps[1]) {
                    message.change_id = Some(id);
                    continue;
                }
            }
            body.push(line.trim_end());
        }

        message.body = normalize(&body);
        message
    }

    /// Replace the label trailers, keeping body and Change-Id.
    pub fn with_labels(mut self, labels: &Labels) -> Self {
        self.autosubmit = labels.autosubmit;
        self.presubmit = labels.presubmit.clone();
        self
    }

    pub fn labels(&self) -> Labels {
        Labels {
            autosubmit: self.autosubmit,
            presubmit: self.presubmit.clone(),
        }
    }

    fn trailers(&self) -> Vec<String> {
        let mut trailers = Vec::new();
        if self.autosubmit {
            trailers.push(AUTOSUBMIT.to_string());
        }
        if self.presubmit != PresubmitTest::All {
            trailers.push(format!("{}: {}", PRESUBMIT_KEY, self.presubmit));
        }
        if let Some(id) = &self.change_id {
            trailers.push(id.trailer());
        }
        trailers
    }

    /// Render the message text, newline-terminated.
    pub fn render(&self) -> String {
        let trailers = self.trailers();
        let mut out = String::new();
        if !self.body.is_empty() {
            out.push_str(&self.body);
            out.push('\n');
            if !trailers.is_empty() {
                out.push('\n');
            }
        }
        for trailer in trailers {
            out.push_str(&trailer);
            out.push('\n');
        }
        out
    }
}

fn normalize(lines: &[&str]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.is_empty() && out.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Rewrite the label trailers of `message` to match `labels`.
///
/// Idempotent. Any Change-Id ends up on the final line.
///
/// # Example
///
/// ```
/// use clchain::core::labels::{process_labels, Labels, PresubmitTest};
///
/// let labels = Labels { autosubmit: true, presubmit: PresubmitTest::None };
/// let out = process_labels("Fix it\n\nAutoSubmit\n", &labels);
/// assert_eq!(out, "Fix it\n\nAutoSubmit\nPresubmitTest: none\n");
/// assert_eq!(process_labels(&out, &labels), out);
/// ```
pub fn process_labels(message: &str, labels: &Labels) -> String {
    CommitMessage::parse(message).with_labels(labels).render()
}

/// Compose a first-time review message from a branch's commit messages.
///
/// Bodies are joined oldest first, separated by blank lines. Trailers
/// (including Change-Ids of the individual commits) are dropped.
pub fn compose_default_message(messages: &[String]) -> String {
    let bodies: Vec<String> = messages
        .iter()
        .map(|m| CommitMessage::parse(m).body)
        .filter(|b| !b.is_empty())
        .collect();
    CommitMessage {
        body: bodies.join("\n\n"),
        ..Default::default()
    }
    .render()
}

/// A label whose requested value differs from the last submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelChange {
    pub label: &'static str,
    pub old: String,
    pub new: String,
}

impl fmt::Display for LabelChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- {label}={} to {label}={}",
            self.old,
            self.new,
            label = self.label
        )
    }
}

/// Differences between the labels of `previous` and `requested`.
///
/// Presubmit is reported before autosubmit.
pub fn label_changes(previous: &CommitMessage, requested: &Labels) -> Vec<LabelChange> {
    let mut changes = Vec::new();
    if previous.presubmit != requested.presubmit {
        changes.push(LabelChange {
            label: "presubmit",
            old: previous.presubmit.to_string(),
            new: requested.presubmit.to_string(),
        });
    }
    if previous.autosubmit != requested.autosubmit {
        changes.push(LabelChange {
            label: "autosubmit",
            old: previous.autosubmit.to_string(),
            new: requested.autosubmit.to_string(),
        });
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ID: &str = "I0123456789abcdef0123456789abcdef01234567";

    fn labels(autosubmit: bool, presubmit: PresubmitTest) -> Labels {
        Labels {
            autosubmit,
            presubmit,
        }
    }

    mod presubmit {
        use super::*;

        #[test]
        fn parses_known_values() {
            assert_eq!("all".parse(), Ok(PresubmitTest::All));
            assert_eq!("none".parse(), Ok(PresubmitTest::None));
            assert_eq!(
                "quick".parse(),
                Ok(PresubmitTest::Named("quick".to_string()))
            );
        }

        #[test]
        fn rejects_empty_and_whitespace() {
            assert!("".parse::<PresubmitTest>().is_err());
            assert!("a b".parse::<PresubmitTest>().is_err());
        }
    }

    mod parse {
        use super::*;

        #[test]
        fn splits_body_and_trailers() {
            let text = format!("Subject\n\nBody.\n\nAutoSubmit\nPresubmitTest: none\nChange-Id: {ID}\n");
            let msg = CommitMessage::parse(&text);
            assert_eq!(msg.body, "Subject\n\nBody.");
            assert!(msg.autosubmit);
            assert_eq!(msg.presubmit, PresubmitTest::None);
            assert_eq!(msg.change_id.unwrap().as_str(), ID);
        }

        #[test]
        fn missing_presubmit_means_all() {
            let msg = CommitMessage::parse("Subject\n");
            assert_eq!(msg.presubmit, PresubmitTest::All);
            assert!(!msg.autosubmit);
            assert!(msg.change_id.is_none());
        }

        #[test]
        fn normalizes_blank_lines_and_trailing_space() {
            let msg = CommitMessage::parse("\n\nSubject  \n\n\n\nBody\n\n\n");
            assert_eq!(msg.body, "Subject\n\nBody");
        }

        #[test]
        fn malformed_change_id_stays_in_body() {
            let msg = CommitMessage::parse("Subject\n\nChange-Id: Ixyz\n");
            assert!(msg.change_id.is_none());
            assert!(msg.body.contains("Change-Id: Ixyz"));
        }
    }

    mod process {
        use super::*;

        #[test]
        fn moves_change_id_last() {
            let text = format!("Subject\n\nChange-Id: {ID}\nAutoSubmit\n");
            let out = process_labels(&text, &labels(true, PresubmitTest::All));
            assert_eq!(out, format!("Subject\n\nAutoSubmit\nChange-Id: {ID}\n"));
        }

        #[test]
        fn removes_labels_no_longer_requested() {
            let text = format!("Subject\n\nAutoSubmit\nPresubmitTest: none\nChange-Id: {ID}\n");
            let out = process_labels(&text, &Labels::default());
            assert_eq!(out, format!("Subject\n\nChange-Id: {ID}\n"));
        }

        #[test]
        fn named_presubmit_is_written() {
            let out = process_labels("Subject\n", &labels(false, PresubmitTest::Named("quick".into())));
            assert_eq!(out, "Subject\n\nPresubmitTest: quick\n");
        }

        #[test]
        fn plain_message_without_labels_is_unchanged() {
            assert_eq!(process_labels("Subject\n", &Labels::default()), "Subject\n");
        }
    }

    mod compose {
        use super::*;

        #[test]
        fn joins_bodies_oldest_first_without_change_ids() {
            let messages = vec![
                format!("First\n\nChange-Id: {ID}\n"),
                "Second\n".to_string(),
            ];
            assert_eq!(compose_default_message(&messages), "First\n\nSecond\n");
        }

        #[test]
        fn empty_history_gives_empty_message() {
            assert_eq!(compose_default_message(&[]), "");
        }
    }

    mod changes {
        use super::*;

        #[test]
        fn reports_presubmit_then_autosubmit() {
            let previous = CommitMessage::parse("S\n\nPresubmitTest: none\n");
            let changes = label_changes(&previous, &labels(true, PresubmitTest::All));
            let lines: Vec<String> = changes.iter().map(|c| c.to_string()).collect();
            assert_eq!(
                lines,
                vec![
                    "- presubmit=none to presubmit=all",
                    "- autosubmit=false to autosubmit=true",
                ]
            );
        }

        #[test]
        fn same_labels_report_nothing() {
            let previous = CommitMessage::parse("S\n\nAutoSubmit\n");
            assert!(label_changes(&previous, &labels(true, PresubmitTest::All)).is_empty());
        }
    }

    fn arb_presubmit() -> impl Strategy<Value = PresubmitTest> {
        prop_oneof![
            Just(PresubmitTest::All),
            Just(PresubmitTest::None),
            "[a-z]{1,8}".prop_map(|s| s.parse().unwrap()),
        ]
    }

    proptest! {
        #[test]
        fn process_labels_is_idempotent(
            body in "[A-Za-z0-9 .\n]{0,80}",
            autosubmit in any::<bool>(),
            presubmit in arb_presubmit(),
            with_id in any::<bool>(),
        ) {
            let text = if with_id { format!("{body}\nChange-Id: {ID}\n") } else { body };
            let labels = Labels { autosubmit, presubmit };
            let once = process_labels(&text, &labels);
            let twice = process_labels(&once, &labels);
            prop_assert_eq!(&once, &twice);
            if with_id {
                let expected = format!("Change-Id: {ID}");
                prop_assert_eq!(once.lines().last(), Some(expected.as_str()));
            }
        }

        #[test]
        fn parse_recovers_rendered_labels(
            body in "[A-Za-z0-9 .\n]{0,80}",
            autosubmit in any::<bool>(),
            presubmit in arb_presubmit(),
        ) {
            let labels = Labels { autosubmit, presubmit };
            let rendered = process_labels(&body, &labels);
            prop_assert_eq!(CommitMessage::parse(&rendered).labels(), labels);
        }
    }
}
