//! On-disk state between CLI invocations: the signed-in session and any
//! unsaved wizard edits, both as JSON.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use dealerdash_core::locale::Locale;
use dealerdash_core::reconcile::LocalDraftState;
use dealerdash_core::session::Session;
use dealerdash_core::types::DbId;

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored session, or an anonymous one in `locale` when none is stored.
    pub fn load(&self, locale: Locale) -> anyhow::Result<Session> {
        if !self.path.exists() {
            return Ok(Session::anonymous(locale));
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a valid session file", self.path.display()))
    }

    pub fn save(&self, session: &Session) -> anyhow::Result<()> {
        write_json(&self.path, session)
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        remove_if_exists(&self.path)?;
        remove_if_exists(&self.wizard_path())
    }

    // ---- wizard edits ----

    fn wizard_path(&self) -> PathBuf {
        self.path.with_extension("wizard.json")
    }

    fn load_wizard_map(&self) -> anyhow::Result<BTreeMap<DbId, LocalDraftState>> {
        let path = self.wizard_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a valid wizard state file", path.display()))
    }

    /// Unsaved wizard edits for `draft_id`, if any.
    pub fn load_wizard(&self, draft_id: DbId) -> anyhow::Result<LocalDraftState> {
        Ok(self
            .load_wizard_map()?
            .remove(&draft_id)
            .unwrap_or_else(|| LocalDraftState {
                draft_id: Some(draft_id),
                ..LocalDraftState::default()
            }))
    }

    pub fn save_wizard(&self, draft_id: DbId, state: &LocalDraftState) -> anyhow::Result<()> {
        let mut map = self.load_wizard_map()?;
        map.insert(draft_id, state.clone());
        write_json(&self.wizard_path(), &map)
    }

    pub fn forget_wizard(&self, draft_id: DbId) -> anyhow::Result<()> {
        let mut map = self.load_wizard_map()?;
        if map.remove(&draft_id).is_some() {
            write_json(&self.wizard_path(), &map)?;
        }
        Ok(())
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn remove_if_exists(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealerdash_core::car::MainInfoForm;
    use dealerdash_core::permissions::CapabilityMap;
    use dealerdash_core::reconcile::FormSlot;
    use dealerdash_core::session::{AdminProfile, AuthToken};

    fn admin() -> AdminProfile {
        AdminProfile {
            id: 1,
            name: "Sara".into(),
            email: "sara@example.com".into(),
            role: "superAdmin".into(),
            permissions: CapabilityMap::default(),
        }
    }

    #[test]
    fn missing_file_gives_anonymous_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let session = store.load(Locale::Ar).unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.locale(), Locale::Ar);
    }

    #[test]
    fn session_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested/session.json"));
        let mut session = Session::anonymous(Locale::Ar);
        session.login(AuthToken::new("abc"), admin());
        store.save(&session).unwrap();

        let loaded = store.load(Locale::En).unwrap();
        assert_eq!(loaded, session);

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(!store.load(Locale::En).unwrap().is_authenticated());
    }

    #[test]
    fn corrupt_session_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(SessionStore::new(path).load(Locale::En).is_err());
    }

    #[test]
    fn wizard_edits_are_kept_per_draft() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let state = LocalDraftState {
            draft_id: Some(7),
            main_info: Some(FormSlot::edited(MainInfoForm {
                price: Some(1000.0),
                ..MainInfoForm::default()
            })),
            ..LocalDraftState::default()
        };
        store.save_wizard(7, &state).unwrap();

        assert_eq!(store.load_wizard(7).unwrap(), state);
        assert_eq!(store.load_wizard(8).unwrap().draft_id, Some(8));

        store.forget_wizard(7).unwrap();
        assert!(store.load_wizard(7).unwrap().main_info.is_none());
    }
}
