//! Actor path and id - unique identifiers for running actors.

use std::cmp::Ordering;
use std::fmt::{Error, Formatter};

use uuid::Uuid;

/// Hierarchical name of an actor, rendered as `/waiter/pieCase`.
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct ActorPath(Vec<String>);

impl ActorPath {
    /// The empty path, parent of every top level actor.
    pub fn root() -> Self {
        ActorPath(Vec::new())
    }

    pub fn level(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for ActorPath {
    fn from(str: &str) -> Self {
        let tokens: Vec<String> = str
            .split('/')
            .filter(|x| !x.trim().is_empty())
            .map(|s| s.to_string())
            .collect();
        ActorPath(tokens)
    }
}

impl From<String> for ActorPath {
    fn from(string: String) -> Self {
        ActorPath::from(string.as_str())
    }
}

impl From<&String> for ActorPath {
    fn from(string: &String) -> Self {
        ActorPath::from(string.as_str())
    }
}

impl std::ops::Div<&str> for ActorPath {
    type Output = ActorPath;

    fn div(self, rhs: &str) -> Self::Output {
        let mut keys = self.0;
        keys.push(rhs.to_string());
        ActorPath(keys)
    }
}

impl std::fmt::Display for ActorPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self.level().cmp(&1) {
            Ordering::Less => write!(f, "/"),
            Ordering::Equal => write!(f, "/{}", self.0[0]),
            Ordering::Greater => write!(f, "/{}", self.0.join("/")),
        }
    }
}

impl std::fmt::Debug for ActorPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        std::fmt::Display::fmt(self, f)
    }
}

/// Identity of one incarnation of an actor.
///
/// Two actors spawned at the same path one after the other share the path but
/// never the uid, so a reference to the first can not reach the second.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct ActorId {
    path: ActorPath,
    uid: Uuid,
}

impl ActorId {
    pub(crate) fn new(path: ActorPath) -> Self {
        ActorId {
            path,
            uid: Uuid::new_v4(),
        }
    }

    pub fn path(&self) -> &ActorPath {
        &self.path
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.path)
    }
}

impl std::fmt::Debug for ActorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}#{}", self.path, self.uid.simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_rendering() {
        assert_eq!(ActorPath::root().to_string(), "/");
        assert_eq!(ActorPath::from("waiter").to_string(), "/waiter");
        let path = ActorPath::from("/waiter") / "pieCase";
        assert_eq!(path.to_string(), "/waiter/pieCase");
        assert_eq!(path, ActorPath::from("/waiter/pieCase/"));
    }

    #[test]
    fn test_path_levels() {
        let waiter = ActorPath::from("/waiter");
        let pie_case = waiter.clone() / "pieCase";
        assert_eq!(ActorPath::root().level(), 0);
        assert_eq!(waiter.level(), 1);
        assert_eq!(pie_case.level(), 2);
        assert_ne!(pie_case, ActorPath::from("/pieCase"));
    }

    #[test]
    fn test_ids_are_generations() {
        let first = ActorId::new(ActorPath::from("/customer"));
        let second = ActorId::new(ActorPath::from("/customer"));
        assert_eq!(first.path(), second.path());
        assert_ne!(first, second);
        assert_eq!(first.to_string(), "/customer");
    }
}
