// FieldRegistry: checked one-table-per-(owner type, field name).
use field_augment::{augment, Error, FieldRegistry};
use std::sync::Arc;

struct Widget;
struct Gadget;

// Test: a second claim of the same (type, name) is rejected, whichever
// variant asks; other names and other owner types are unaffected.
#[test]
fn duplicate_field_rejected() {
    let r = FieldRegistry::new();
    let t = r.augment::<Widget, u32>("size").expect("first claim");
    assert!(r.is_claimed::<Widget>("size"));

    match r.augment::<Widget, u32>("size") {
        Err(Error::DuplicateField { owner, name }) => {
            assert!(owner.ends_with("Widget"));
            assert_eq!(name, "size");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(
        r.augment_weak_field::<Widget, str>("size"),
        Err(Error::DuplicateField { .. })
    ));

    assert!(r.augment::<Widget, u32>("color").is_ok());
    assert!(r.augment::<Gadget, u32>("size").is_ok());
    assert!(!r.is_claimed::<Gadget>("color"));

    // The first table still works.
    let w = Arc::new(Widget);
    t.set(&w, 3).unwrap();
    assert_eq!(t.get(&w).unwrap(), Some(3));
}

// Test: separate registries track claims independently.
#[test]
fn registries_are_independent() {
    let r1 = FieldRegistry::new();
    let r2 = FieldRegistry::new();
    assert!(r1.augment_weak_field::<Widget, String>("peer").is_ok());
    assert!(r2.augment_weak_field::<Widget, String>("peer").is_ok());
}

// Test: the global registry is one instance for the process.
#[test]
fn global_registry_is_shared() {
    struct OnlyHere;
    let g = FieldRegistry::global();
    assert!(std::ptr::eq(g, FieldRegistry::global()));
    assert!(g.augment::<OnlyHere, u8>("flag").is_ok());
    assert!(FieldRegistry::global().is_claimed::<OnlyHere>("flag"));
    assert!(g.augment::<OnlyHere, u8>("flag").is_err());
}

// Test: the unchecked factory leaves the discipline to the caller; two
// tables for one name are independent fields.
#[test]
fn unchecked_factory_creates_independent_tables() {
    let a = augment::<Widget, u8>("dup").unwrap();
    let b = augment::<Widget, u8>("dup").unwrap();
    let w = Arc::new(Widget);
    a.set(&w, 1).unwrap();
    assert_eq!(b.get(&w).unwrap(), None);
}
