use super::*;
use crate::storage::MemoryStorage;
use pretty_assertions::assert_eq;

fn controller() -> StateController<MemoryStorage> {
    let storage = MemoryStorage::with_entries(["A||99", "B||1", "C||50"]);
    StateController::new(storage).expect("controller")
}

fn names<S: Storage>(controller: &StateController<S>) -> Vec<&str> {
    controller
        .children()
        .iter()
        .map(|child| child.name.as_str())
        .collect()
}

/// Storage whose writes always fail, to check that errors reach the caller.
struct BrokenStorage;

impl Storage for BrokenStorage {
    fn save(&mut self, _children: &[Child]) -> Result<(), StorageError> {
        Err(StorageError::Query(rusqlite::Error::InvalidQuery))
    }

    fn load(&self) -> Result<Vec<Child>, StorageError> {
        Ok(vec![Child::new("A")])
    }
}

/// Storage that rejects the first `failures` saves and then behaves like
/// `MemoryStorage`.
struct FlakyStorage {
    inner: MemoryStorage,
    failures: usize,
}

impl FlakyStorage {
    fn new(failures: usize) -> Self {
        Self {
            inner: MemoryStorage::with_entries(["A||99", "B||1", "C||50"]),
            failures,
        }
    }
}

impl Storage for FlakyStorage {
    fn save(&mut self, children: &[Child]) -> Result<(), StorageError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(StorageError::Query(rusqlite::Error::InvalidQuery));
        }
        self.inner.save(children)
    }

    fn load(&self) -> Result<Vec<Child>, StorageError> {
        self.inner.load()
    }
}

#[test]
fn initial_load_is_sorted_and_clean() {
    let storage = MemoryStorage::with_entries(["C||50", "A||99", "B||1"]);
    let controller = StateController::new(storage).expect("controller");

    assert_eq!(
        controller.children(),
        &[
            Child::with_rating("A", 99),
            Child::with_rating("B", 1),
            Child::with_rating("C", 50),
        ]
    );
    assert!(!controller.is_dirty());
    assert_eq!(controller.mode(), UiMode::Normal);
}

#[test]
fn initial_load_trims_names_and_keeps_first_of_repeats() {
    let storage = MemoryStorage::with_entries(["A||1", "A||2", " B||3", "B||4"]);
    let mut controller = StateController::new(storage).expect("controller");

    assert_eq!(
        controller.children(),
        &[Child::with_rating("A", 1), Child::with_rating("B", 3)]
    );

    controller.remove("A").expect("remove");
    assert_eq!(names(&controller), vec!["B"]);

    controller.send().expect("send");
    let entries: Vec<&str> = controller
        .storage()
        .entries()
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(entries, vec!["B||3"]);
}

#[test]
fn send_shows_sent_snackbar_and_clears_dirty() {
    let mut controller = controller();
    controller.update_rating("A", 10.0);
    assert!(controller.is_dirty());

    controller.send().expect("send");

    assert_eq!(
        controller.mode(),
        UiMode::ShowingSnackbar(SnackbarMessage::Sent)
    );
    assert!(!controller.is_dirty());
    assert!(controller.storage().entries().contains("A||10"));
}

#[test]
fn update_rating_marks_dirty_without_saving() {
    let mut controller = controller();
    controller.update_rating("A", 42.0);

    assert!(controller.is_dirty());
    assert_eq!(controller.children()[0], Child::with_rating("A", 42));
    assert!(controller.storage().entries().contains("A||99"));
}

#[test]
fn update_rating_rounds_and_clamps() {
    let mut controller = controller();
    controller.update_rating("B", 12.6);
    controller.update_rating("C", 400.0);
    controller.update_rating("A", -3.0);

    let ratings: Vec<i64> = controller.children().iter().map(|c| c.rating).collect();
    assert_eq!(ratings, vec![1, 13, 100]);
}

#[test]
fn update_rating_for_unknown_child_is_ignored() {
    let mut controller = controller();
    controller.update_rating("Zed", 12.0);

    assert!(!controller.is_dirty());
    assert_eq!(controller.children().len(), 3);
}

#[test]
fn add_dialog_opens_and_dismisses() {
    let mut controller = controller();
    controller.open_add_dialog();
    assert_eq!(controller.mode(), UiMode::AddDialogOpen);

    controller.dismiss_add_dialog();
    assert_eq!(controller.mode(), UiMode::Normal);
}

#[test]
fn request_add_appends_with_default_rating_and_saves() {
    let mut controller = controller();
    controller.open_add_dialog();
    controller.request_add("  NewChild ").expect("add");

    assert_eq!(controller.children().len(), 4);
    assert!(controller
        .children()
        .contains(&Child::with_rating("NewChild", 50)));
    assert_eq!(controller.mode(), UiMode::Normal);
    assert_eq!(controller.storage().entries().len(), 4);
    assert!(controller.storage().entries().contains("NewChild||50"));
}

#[test]
fn request_add_keeps_list_sorted() {
    let mut controller = controller();
    controller.request_add("Aaron").expect("add");

    assert_eq!(names(&controller), vec!["A", "Aaron", "B", "C"]);
}

#[test]
fn request_add_duplicate_shows_snackbar() {
    let mut controller = controller();
    controller.open_add_dialog();
    controller.request_add("A").expect("add");

    assert_eq!(
        controller.mode(),
        UiMode::ShowingSnackbar(SnackbarMessage::Duplicate)
    );
    assert_eq!(controller.children().len(), 3);
}

#[test]
fn duplicate_check_is_case_sensitive() {
    let mut controller = controller();
    controller.request_add("a").expect("add");

    assert_eq!(controller.children().len(), 4);
    assert_eq!(controller.mode(), UiMode::Normal);
}

#[test]
fn request_add_blank_name_is_rejected() {
    let mut controller = controller();
    controller.request_add("   ").expect("add");

    assert_eq!(
        controller.mode(),
        UiMode::ShowingSnackbar(SnackbarMessage::BlankName)
    );
    assert_eq!(controller.children().len(), 3);
}

#[test]
fn edit_mode_requires_children() {
    let mut empty = StateController::new(MemoryStorage::new()).expect("controller");
    empty.enter_edit();
    assert_eq!(empty.mode(), UiMode::Normal);

    let mut controller = controller();
    controller.enter_edit();
    assert_eq!(controller.mode(), UiMode::EditMode);
    controller.exit_edit();
    assert_eq!(controller.mode(), UiMode::Normal);
}

#[test]
fn rename_preserves_rating_and_saves() {
    let mut controller = controller();
    controller.enter_edit();
    controller.rename("A", "Luke").expect("rename");

    assert_eq!(controller.mode(), UiMode::Normal);
    assert_eq!(names(&controller), vec!["B", "C", "Luke"]);
    assert!(controller
        .children()
        .contains(&Child::with_rating("Luke", 99)));
    assert_eq!(controller.storage().entries().len(), 3);
    assert!(controller.storage().entries().contains("Luke||99"));
}

#[test]
fn rename_to_same_name_is_noop() {
    let mut controller = controller();
    controller.enter_edit();
    controller.rename("A", " A ").expect("rename");

    assert_eq!(controller.mode(), UiMode::EditMode);
    assert_eq!(names(&controller), vec!["A", "B", "C"]);
}

#[test]
fn rename_onto_existing_name_is_rejected() {
    let mut controller = controller();
    controller.rename("A", "B").expect("rename");

    assert_eq!(
        controller.mode(),
        UiMode::ShowingSnackbar(SnackbarMessage::Duplicate)
    );
    assert_eq!(names(&controller), vec!["A", "B", "C"]);
}

#[test]
fn remove_deletes_child_and_saves() {
    let mut controller = controller();
    controller.enter_edit();
    controller.remove("A").expect("remove");

    assert_eq!(controller.children().len(), 2);
    assert!(controller.children().iter().all(|child| child.name != "A"));
    assert_eq!(controller.storage().entries().len(), 2);
    assert!(controller
        .storage()
        .entries()
        .iter()
        .all(|entry| !entry.starts_with("A||")));
    assert_eq!(controller.mode(), UiMode::Normal);
}

#[test]
fn dismiss_snackbar_returns_to_normal() {
    let mut controller = controller();
    controller.send().expect("send");
    controller.dismiss_snackbar();

    assert_eq!(controller.mode(), UiMode::Normal);
}

#[test]
fn teardown_saves_pending_ratings() {
    let mut controller = controller();
    controller.update_rating("C", 77.0);
    controller.teardown().expect("teardown");

    assert!(controller.storage().entries().contains("C||77"));
}

#[test]
fn subscribers_receive_transitions_in_order() {
    let mut controller = controller();
    let rx = controller.subscribe();

    controller.open_add_dialog();
    controller.request_add("A").expect("add");
    controller.dismiss_snackbar();

    let seen: Vec<UiMode> = rx.try_iter().collect();
    assert_eq!(
        seen,
        vec![
            UiMode::AddDialogOpen,
            UiMode::ShowingSnackbar(SnackbarMessage::Duplicate),
            UiMode::Normal,
        ]
    );
}

#[test]
fn late_subscribers_miss_earlier_transitions() {
    let mut controller = controller();
    controller.open_add_dialog();

    let rx = controller.subscribe();
    controller.dismiss_add_dialog();

    let seen: Vec<UiMode> = rx.try_iter().collect();
    assert_eq!(seen, vec![UiMode::Normal]);
}

#[test]
fn dropped_subscribers_are_pruned() {
    let mut controller = controller();
    drop(controller.subscribe());
    let rx = controller.subscribe();

    controller.open_add_dialog();

    assert_eq!(controller.subscribers.len(), 1);
    assert_eq!(rx.try_recv(), Ok(UiMode::AddDialogOpen));
}

#[test]
fn storage_failure_is_reported_and_list_reverted() {
    let mut controller = StateController::new(BrokenStorage).expect("controller");
    controller.open_add_dialog();

    assert!(controller.request_add("B").is_err());
    assert_eq!(names(&controller), vec!["A"]);
    assert_eq!(controller.mode(), UiMode::AddDialogOpen);

    controller.update_rating("A", 5.0);
    assert!(controller.send().is_err());
    assert!(controller.is_dirty());
}

#[test]
fn add_can_be_retried_after_a_failed_save() {
    let mut controller = StateController::new(FlakyStorage::new(1)).expect("controller");
    controller.open_add_dialog();

    assert!(controller.request_add("Dora").is_err());
    assert_eq!(names(&controller), vec!["A", "B", "C"]);
    assert_eq!(controller.mode(), UiMode::AddDialogOpen);

    controller.request_add("Dora").expect("retry");
    assert_eq!(controller.mode(), UiMode::Normal);
    assert_eq!(names(&controller), vec!["A", "B", "C", "Dora"]);
    assert!(controller.storage().inner.entries().contains("Dora||50"));
}

#[test]
fn remove_can_be_retried_after_a_failed_save() {
    let mut controller = StateController::new(FlakyStorage::new(1)).expect("controller");
    controller.enter_edit();

    assert!(controller.remove("B").is_err());
    assert_eq!(names(&controller), vec!["A", "B", "C"]);
    assert_eq!(controller.mode(), UiMode::EditMode);

    controller.remove("B").expect("retry");
    assert_eq!(names(&controller), vec!["A", "C"]);
    assert!(!controller.storage().inner.entries().contains("B||1"));
    assert_eq!(controller.storage().inner.entries().len(), 2);
}

#[test]
fn rename_can_be_retried_after_a_failed_save() {
    let mut controller = StateController::new(FlakyStorage::new(1)).expect("controller");
    controller.update_rating("A", 12.0);

    assert!(controller.rename("A", "Ann").is_err());
    assert_eq!(controller.children()[0], Child::with_rating("A", 12));

    controller.rename("A", "Ann").expect("retry");
    assert_eq!(names(&controller), vec!["Ann", "B", "C"]);
    assert!(controller.storage().inner.entries().contains("Ann||12"));
}
