//! A JSON map of known contacts, keyed by their 16-byte hash.

use std::collections::HashMap;
use std::path::Path;

use secirc_types::Hash16;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::Result;

/// A remembered contact: enough to address and recognize them again.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contact {
    pub hash16: Hash16,
    #[serde_as(as = "serde_with::Bytes")]
    pub public_key: [u8; 32],
    pub nickname: Option<String>,
    pub last_seen: u64,
}

/// Persisted contact book.
#[serde_as]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContactBook {
    #[serde_as(as = "HashMap<serde_with::hex::Hex, _>")]
    contacts: HashMap<Hash16, Contact>,
}

impl ContactBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, contact: Contact) {
        self.contacts.insert(contact.hash16, contact);
    }

    pub fn remove(&mut self, hash16: &Hash16) -> Option<Contact> {
        self.contacts.remove(hash16)
    }

    pub fn get(&self, hash16: &Hash16) -> Option<&Contact> {
        self.contacts.get(hash16)
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(hash16: Hash16, nickname: &str) -> Contact {
        Contact { hash16, public_key: [0u8; 32], nickname: Some(nickname.to_string()), last_seen: 100 }
    }

    #[test]
    fn test_upsert_then_get() {
        let mut book = ContactBook::new();
        book.upsert(contact([1u8; 16], "alice"));
        assert_eq!(book.get(&[1u8; 16]).unwrap().nickname.as_deref(), Some("alice"));
    }

    #[test]
    fn test_remove_unknown_contact_is_noop() {
        let mut book = ContactBook::new();
        assert!(book.remove(&[9u8; 16]).is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let mut book = ContactBook::new();
        book.upsert(contact([2u8; 16], "bob"));
        let path = std::env::temp_dir().join(format!("secirc-contacts-test-{}.json", std::process::id()));
        book.save(&path).unwrap();
        let loaded = ContactBook::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(&[2u8; 16]).unwrap().nickname.as_deref(), Some("bob"));
    }

    #[test]
    fn test_load_missing_file_returns_empty() {
        let path = std::env::temp_dir().join("secirc-contacts-does-not-exist.json");
        let loaded = ContactBook::load(&path).unwrap();
        assert!(loaded.is_empty());
    }
}
