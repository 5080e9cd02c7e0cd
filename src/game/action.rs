use crate::error::Error;
use crate::error::Result;
use std::fmt::Display;
use std::fmt::Formatter;

/// the three limit betting actions, indexed the way every
/// per-node statistics array in the crate is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Fold,
    Call,
    Raise,
}

impl Action {
    pub const ALL: [Action; crate::NUM_ACTIONS] = [Action::Fold, Action::Call, Action::Raise];

    pub fn index(&self) -> usize {
        match self {
            Action::Fold => 0,
            Action::Call => 1,
            Action::Raise => 2,
        }
    }
    pub fn code(&self) -> char {
        match self {
            Action::Fold => 'f',
            Action::Call => 'c',
            Action::Raise => 'r',
        }
    }
    pub fn from_code(code: char) -> Result<Self> {
        match code {
            'f' => Ok(Action::Fold),
            'c' => Ok(Action::Call),
            'r' => Ok(Action::Raise),
            _ => Err(Error::InvalidStrategy(format!("unknown action {}", code))),
        }
    }
}

impl From<usize> for Action {
    fn from(n: usize) -> Self {
        match n {
            0 => Action::Fold,
            1 => Action::Call,
            2 => Action::Raise,
            _ => panic!("invalid action index"),
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
