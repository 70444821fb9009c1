// Time utility functions

use std::fmt::{Display, Formatter};
use std::ops::{Add, AddAssign, Deref, Sub};

pub fn now_epoch_seconds() -> Seconds {
    let now_epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    Seconds(now_epoch)
}

pub fn now_epoch_milliseconds() -> Milliseconds {
    let now_epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64;
    Milliseconds(now_epoch)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Seconds(u64);

impl Seconds {
    pub fn new(seconds: u64) -> Self {
        Seconds(seconds)
    }
}

impl Sub<Seconds> for Seconds {
    type Output = Seconds;

    fn sub(self, rhs: Seconds) -> Self::Output {
        Seconds(self.0 - rhs.0)
    }
}

impl Add<Seconds> for Seconds {
    type Output = Seconds;

    fn add(self, rhs: Seconds) -> Self::Output {
        Seconds(self.0 + rhs.0)
    }
}

impl From<u64> for Seconds {
    fn from(seconds: u64) -> Self {
        Seconds(seconds)
    }
}

impl Deref for Seconds {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Seconds {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Milliseconds(u64);

impl Milliseconds {
    pub fn new(milliseconds: u64) -> Self {
        Milliseconds(milliseconds)
    }
}

impl From<u64> for Milliseconds {
    fn from(milliseconds: u64) -> Self {
        Milliseconds(milliseconds)
    }
}

impl From<Seconds> for Milliseconds {
    fn from(seconds: Seconds) -> Self {
        Milliseconds(*seconds * 1000)
    }
}

impl Sub<Milliseconds> for Milliseconds {
    type Output = Milliseconds;

    fn sub(self, rhs: Milliseconds) -> Self::Output {
        Milliseconds(self.0 - rhs.0)
    }
}

impl Add<Milliseconds> for Milliseconds {
    type Output = Milliseconds;

    fn add(self, rhs: Milliseconds) -> Self::Output {
        Milliseconds(self.0 + rhs.0)
    }
}

impl AddAssign for Milliseconds {
    fn add_assign(&mut self, rhs: Milliseconds) {
        self.0 += rhs.0;
    }
}

impl Deref for Milliseconds {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Milliseconds {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
