//! Per-session favorites and playlist
//!
//! Plain ordered sets of labels. A [`Session`] is owned by one caller and
//! passed explicitly to every list call; nothing here is shared.

use ahash::AHashSet;
use serde::ser::Serializer;
use serde::Serialize;

/// Insertion-ordered set of labels
#[derive(Debug, Clone, Default)]
pub struct LabelList {
    items: Vec<String>,
    members: AHashSet<String>,
}

impl LabelList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `label`; false when it is already present
    pub fn add(&mut self, label: &str) -> bool {
        if self.members.contains(label) {
            return false;
        }
        self.members.insert(label.to_string());
        self.items.push(label.to_string());
        true
    }

    /// Remove `label`; false when it was not present
    pub fn remove(&mut self, label: &str) -> bool {
        if !self.members.remove(label) {
            return false;
        }
        self.items.retain(|item| item != label);
        true
    }

    pub fn contains(&self, label: &str) -> bool {
        self.members.contains(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.members.clear();
    }
}

impl Serialize for LabelList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.items)
    }
}

impl<'a> FromIterator<&'a str> for LabelList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut list = LabelList::new();
        for label in iter {
            list.add(label);
        }
        list
    }
}

/// Which list of a session a call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Favorites,
    Playlist,
}

impl std::str::FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favorites" => Ok(ListKind::Favorites),
            "playlist" => Ok(ListKind::Playlist),
            other => Err(format!("unknown list '{}'", other)),
        }
    }
}

/// Explicit session context holding the caller's lists
#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    favorites: LabelList,
    playlist: LabelList,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn favorites(&self) -> &LabelList {
        &self.favorites
    }

    pub fn playlist(&self) -> &LabelList {
        &self.playlist
    }

    pub fn list_mut(&mut self, kind: ListKind) -> &mut LabelList {
        match kind {
            ListKind::Favorites => &mut self.favorites,
            ListKind::Playlist => &mut self.playlist,
        }
    }

    pub fn add_favorite(&mut self, label: &str) -> bool {
        self.favorites.add(label)
    }

    pub fn remove_favorite(&mut self, label: &str) -> bool {
        self.favorites.remove(label)
    }

    pub fn add_to_playlist(&mut self, label: &str) -> bool {
        self.playlist.add(label)
    }

    pub fn remove_from_playlist(&mut self, label: &str) -> bool {
        self.playlist.remove(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_reports_change() {
        let mut list = LabelList::new();
        assert!(list.add("Imagine"));
        assert!(!list.add("Imagine"));
        assert!(list.add("Yesterday"));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["Imagine", "Yesterday"]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut list: LabelList = ["a", "b", "c"].into_iter().collect();
        assert!(list.remove("b"));
        assert!(!list.remove("b"));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(list.add("b"));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_session_lists_are_independent() {
        let mut session = Session::new();
        assert!(session.add_favorite("Song"));
        assert!(session.add_to_playlist("Song"));
        assert!(session.remove_favorite("Song"));
        assert!(session.favorites().is_empty());
        assert!(session.playlist().contains("Song"));
        assert!(!session.remove_from_playlist("Other"));
    }

    #[test]
    fn test_session_serializes_lists() {
        let mut session = Session::new();
        session.list_mut(ListKind::Playlist).add("x");
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["favorites"], serde_json::json!([]));
        assert_eq!(json["playlist"], serde_json::json!(["x"]));
    }

    #[test]
    fn test_list_kind_parse() {
        assert_eq!("playlist".parse::<ListKind>().unwrap(), ListKind::Playlist);
        assert!("queue".parse::<ListKind>().is_err());
    }
}
