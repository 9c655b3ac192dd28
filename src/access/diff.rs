//! Sensitive-field diff engine.
//!
//! Updates only need fresh authorization for the reference fields that
//! actually changed. Resubmitting a form that echoes back unchanged foreign
//! keys must not force re-authorization of references the user never touched,
//! so comparison is by identifier against the object's current state
//! (tolerating transient, not-yet-persisted instances).

use crate::domain::{ChangeRequest, ManagedObject};
use std::collections::BTreeSet;

/// Names of the declared reference fields whose proposed value differs from
/// the object's current value.
///
/// A field counts as changed only when present in `data` and different;
/// an unparseable value also counts as changed, and the follow-up `can_add`
/// turns it into a denial.
pub fn changed_fields(obj: &ManagedObject, data: &ChangeRequest) -> BTreeSet<&'static str> {
    let mut changed = BTreeSet::new();
    for (field, current) in obj.sensitive_references() {
        if !data.contains(field) {
            continue;
        }
        match data.reference(field) {
            Ok(proposed) if proposed == current => {}
            _ => {
                changed.insert(field);
            }
        }
    }
    changed
}

/// True iff no declared reference field actually changes.
pub fn changes_are_non_sensitive(obj: &ManagedObject, data: &ChangeRequest) -> bool {
    changed_fields(obj, data).is_empty()
}

/// The payload handed to `can_add` when re-authorizing an update: the
/// proposed value for each changed field, the object's current value for
/// every other declared field.
pub fn authorization_payload(obj: &ManagedObject, data: &ChangeRequest) -> ChangeRequest {
    let changed = changed_fields(obj, data);
    let mut payload = ChangeRequest::new();
    for (field, current) in obj.sensitive_references() {
        if changed.contains(field) {
            if let Some(value) = data.get(field) {
                payload.insert(field, value.clone());
            }
        } else {
            payload.insert_reference(field, current);
        }
    }
    payload
}
