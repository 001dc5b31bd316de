//! In-memory profile directory backing the demo endpoints.

use std::collections::BTreeMap;

use crate::models::{Profile, ProfileRequest};

/// Profiles keyed by id, with ids handed out sequentially from 1.
#[derive(Debug, Default)]
pub struct ProfileDirectory {
    profiles: BTreeMap<u64, Profile>,
    next_id: u64,
}

impl ProfileDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists profiles in id order, optionally filtered by a case-insensitive name match.
    pub fn list(&self, filter: Option<&str>) -> Vec<Profile> {
        let needle = filter.map(str::to_lowercase);
        self.profiles
            .values()
            .filter(|p| match &needle {
                Some(n) => p.name.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Returns a copy of the profile with `id`.
    pub fn get(&self, id: u64) -> Option<Profile> {
        self.profiles.get(&id).cloned()
    }

    /// Adds a profile under the next id, recording `owner` as its creator.
    pub fn create(&mut self, req: ProfileRequest, owner: Option<String>) -> Profile {
        self.next_id += 1;
        let profile = Profile {
            id: self.next_id,
            name: req.name,
            title: req.title,
            owner,
        };
        self.profiles.insert(profile.id, profile.clone());
        profile
    }

    /// Replaces name and title, keeping the original owner.
    pub fn update(&mut self, id: u64, req: ProfileRequest) -> Option<Profile> {
        let profile = self.profiles.get_mut(&id)?;
        profile.name = req.name;
        profile.title = req.title;
        Some(profile.clone())
    }

    /// Removes a profile, returning whether it existed.
    pub fn delete(&mut self, id: u64) -> bool {
        self.profiles.remove(&id).is_some()
    }
}
