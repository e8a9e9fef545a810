//! Dual-audience messaging.
//!
//! Every diagnostic produced while grading is routed to the student, to the course staff
//! (private), or to both. Messages are kept in order so the caller can hand the student
//! transcript to whatever renders the final report, and each one is also forwarded to the
//! `log` facade so staff logs see everything.

use log::Level;
use serde::Serialize;

const STUDENT_TARGET: &str = "jh61b::student";
const PRIVATE_TARGET: &str = "jh61b::private";

#[derive(Serialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Student,
    Private,
    Both,
}

impl Audience {
    fn reaches_student(self) -> bool {
        matches!(self, Audience::Student | Audience::Both)
    }
}

#[derive(Serialize, Debug, PartialEq, Eq, Clone)]
pub struct Message {
    pub audience: Audience,
    #[serde(serialize_with = "serialize_level")]
    pub level: Level,
    pub text: String,
}

fn serialize_level<S: serde::Serializer>(level: &Level, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(level.as_str())
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Messages {
    entries: Vec<Message>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn student(&mut self) -> Channel<'_> {
        Channel {
            sink: self,
            audience: Audience::Student,
        }
    }

    pub fn private(&mut self) -> Channel<'_> {
        Channel {
            sink: self,
            audience: Audience::Private,
        }
    }

    pub fn both(&mut self) -> Channel<'_> {
        Channel {
            sink: self,
            audience: Audience::Both,
        }
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    /// Text of every message the student is allowed to see, in emission order.
    pub fn student_lines(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|m| m.audience.reaches_student())
            .map(|m| m.text.as_str())
    }

    fn push(&mut self, audience: Audience, level: Level, text: String) {
        match audience {
            Audience::Student => log::log!(target: STUDENT_TARGET, level, "{text}"),
            Audience::Private => log::log!(target: PRIVATE_TARGET, level, "{text}"),
            Audience::Both => {
                log::log!(target: STUDENT_TARGET, level, "{text}");
                log::log!(target: PRIVATE_TARGET, level, "{text}");
            }
        }
        self.entries.push(Message {
            audience,
            level,
            text,
        });
    }
}

/// A borrowed handle that writes to one audience.
pub struct Channel<'a> {
    sink: &'a mut Messages,
    audience: Audience,
}

impl Channel<'_> {
    pub fn error(self, text: impl Into<String>) {
        self.sink.push(self.audience, Level::Error, text.into());
    }

    pub fn warn(self, text: impl Into<String>) {
        self.sink.push(self.audience, Level::Warn, text.into());
    }

    pub fn info(self, text: impl Into<String>) {
        self.sink.push(self.audience, Level::Info, text.into());
    }

    pub fn debug(self, text: impl Into<String>) {
        self.sink.push(self.audience, Level::Debug, text.into());
    }
}
