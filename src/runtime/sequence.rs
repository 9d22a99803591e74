//! Stale-response detection.
//!
//! Every dispatched request gets a fresh [`SequenceToken`]; only the most
//! recently issued token is current. A response may be committed only while
//! its token is still current, so the visible result always belongs to the
//! latest *issued* request rather than the latest *completed* one.

use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceToken(u64);

impl Display for SequenceToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a token greater than every earlier one and makes it current.
    pub fn begin(&mut self) -> SequenceToken {
        self.latest += 1;
        SequenceToken(self.latest)
    }

    pub fn is_current(&self, token: SequenceToken) -> bool {
        self.latest != 0 && token.0 == self.latest
    }

    pub fn current(&self) -> Option<SequenceToken> {
        (self.latest != 0).then_some(SequenceToken(self.latest))
    }
}
