//! # Channels
//!
//! Broadcast topics are slash separated paths rooted at `/root`:
//!
//! ```text
//! /root                          LAO creation
//! /root/<lao>                    LAO, roll call, election setup, witnessing
//! /root/<lao>/consensus          Elect / Elect-Accept / Learn / Failure
//! /root/<lao>/<election>         Election lifecycle and votes
//! /root/<lao>/coin               Digital cash
//! /root/<lao>/social/<token>     Social media of one attendee
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

const ROOT: &str = "/root";

/// Sub channel name used by the consensus protocol.
pub const CONSENSUS: &str = "consensus";
/// Sub channel name used by digital cash.
pub const COIN: &str = "coin";
/// Sub channel name used by social media.
pub const SOCIAL: &str = "social";

/// A named broadcast topic.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn root() -> Self {
        Self(ROOT.to_string())
    }

    /// Channel of the LAO with the given id.
    #[must_use]
    pub fn lao(lao_id: &str) -> Self {
        Self::root().sub_channel(lao_id)
    }

    #[must_use]
    pub fn sub_channel(&self, segment: &str) -> Self {
        Self(format!("{}/{}", self.0, segment))
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Id of the LAO this channel belongs to, if any.
    #[must_use]
    pub fn lao_id(&self) -> Option<&str> {
        let mut segments = self.segments();
        match (segments.next(), segments.next()) {
            (Some("root"), Some(lao)) => Some(lao),
            _ => None,
        }
    }

    /// True for `/root/<lao>` exactly.
    #[must_use]
    pub fn is_lao_channel(&self) -> bool {
        self.lao_id().is_some() && self.segments().count() == 2
    }

    /// True for `/root/<lao>/consensus`.
    #[must_use]
    pub fn is_consensus_channel(&self) -> bool {
        self.segments().count() == 3 && self.segments().last() == Some(CONSENSUS)
    }

    /// Third segment of `/root/<lao>/<x>`, e.g. an election id.
    #[must_use]
    pub fn lao_sub_segment(&self) -> Option<&str> {
        self.lao_id()?;
        let mut segments = self.segments().skip(2);
        match (segments.next(), segments.next()) {
            (Some(sub), None) => Some(sub),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
