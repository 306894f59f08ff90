use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::name_table::{NameEntryRef, NameTable};

/// An interned string. Equal strings interned into the same table share one entry, so two names
/// compare in O(1) by entry identity. Cloning adds a reference to the entry and dropping releases
/// it; the entry leaves the table with its last name.
///
/// The empty string is never interned, an empty name holds no entry at all.
pub struct Name {
    table: &'static NameTable,
    entry: Option<NameEntryRef>,
}

impl Name {
    /// Interns `s` into the process-wide table
    pub fn new(s: &str) -> Self {
        Self::new_in(NameTable::global(), s)
    }

    pub fn new_in(
        table: &'static NameTable,
        s: &str,
    ) -> Self {
        let entry = if s.is_empty() {
            None
        } else {
            Some(table.find_or_add(s))
        };

        Name { table, entry }
    }

    pub fn none() -> Self {
        Name {
            table: NameTable::global(),
            entry: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn as_str(&self) -> &str {
        self.entry.as_ref().map(|x| x.as_str()).unwrap_or("")
    }

    /// Precomputed FNV-1a hash of the string, 0 for the empty name
    pub fn hash(&self) -> u64 {
        self.entry.as_ref().map(|x| x.hash()).unwrap_or(0)
    }

    pub fn table(&self) -> &'static NameTable {
        self.table
    }

    pub fn clear(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.table.release(&entry);
        }
    }
}

impl Default for Name {
    fn default() -> Self {
        Name::none()
    }
}

impl Clone for Name {
    fn clone(&self) -> Self {
        if let Some(entry) = &self.entry {
            self.table.retain(entry);
        }

        Name {
            table: self.table,
            entry: self.entry.clone(),
        }
    }
}

impl Drop for Name {
    fn drop(&mut self) {
        self.clear();
    }
}

impl PartialEq for Name {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        match (&self.entry, &other.entry) {
            (Some(lhs), Some(rhs)) => {
                std::ptr::eq(self.table, other.table) && lhs.slot() == rhs.slot()
            }
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for Name {}

impl PartialEq<str> for Name {
    fn eq(
        &self,
        other: &str,
    ) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(
        &self,
        other: &&str,
    ) -> bool {
        self.as_str() == *other
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        state.write_u64(Name::hash(self));
    }
}

impl Debug for Name {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        Debug::fmt(self.as_str(), f)
    }
}

impl Display for Name {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name::new(&s)
    }
}

impl From<&String> for Name {
    fn from(s: &String) -> Self {
        Name::new(s)
    }
}

impl Serialize for Name {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Name::new(&s))
    }
}
