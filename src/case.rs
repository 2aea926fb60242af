//! Sample case contract and discovery.
//!
//! A case script exports an ordered list of top-level bindings. Discovery keeps
//! the bindings that are case types; everything else a script defines (shared
//! metadata, helper functions) is ignored.
use crate::data::DataObject;
use crate::error::HealthError;
use anyhow::Result;
use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;

/// One artifact produced by a multi-artifact case.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub namespace: String,
    pub filename: String,
    pub object: DataObject,
}

/// Output of [`SampleCase::create`].
pub enum Created {
    Single(DataObject),
    Artifacts(Box<dyn Iterator<Item = Result<Artifact>>>),
}

/// A fixture that builds one data object and validates it after a round trip.
pub trait SampleCase {
    /// Extension namespaces the case relies on.
    fn extensions(&self) -> &[&'static str] {
        &[]
    }

    /// File name of the case's artifact, relative to the producer directory.
    fn filename(&self) -> &str;

    fn create(&self) -> Result<Created>;

    /// Check an object read back from disk; return an assertion failure on mismatch.
    fn test(&self, object: &DataObject) -> Result<()>;
}

/// Handle to a concrete case type, able to construct fresh instances.
///
/// Only types implementing [`SampleCase`] can produce a handle, so holding one
/// is proof of conformance.
#[derive(Clone, Copy)]
pub struct CaseType {
    name: &'static str,
    type_id: TypeId,
    construct: fn() -> Result<Box<dyn SampleCase>>,
}

impl CaseType {
    /// Case type built with `Default`.
    pub fn of<T: SampleCase + Default + 'static>(name: &'static str) -> Self {
        CaseType {
            name,
            type_id: TypeId::of::<T>(),
            construct: construct_default::<T>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn instantiate(&self) -> Result<Box<dyn SampleCase>> {
        (self.construct)()
    }
}

impl fmt::Debug for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseType").field("name", &self.name).finish()
    }
}

impl PartialEq for CaseType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

fn construct_default<T: SampleCase + Default + 'static>() -> Result<Box<dyn SampleCase>> {
    Ok(Box::new(T::default()))
}

/// Value bound to a top-level name in a case script.
#[derive(Debug, Clone, Copy)]
pub enum Binding {
    Case(CaseType),
    Item,
}

/// Ordered top-level bindings of one case script.
pub type Bindings = Vec<(&'static str, Binding)>;

/// Yield the case types among `bindings`, in binding order, once per type.
pub fn discover_cases<'a>(
    bindings: &'a [(&'static str, Binding)],
) -> impl Iterator<Item = CaseType> + 'a {
    let mut seen = HashSet::new();
    bindings.iter().filter_map(move |(_, binding)| match binding {
        Binding::Case(case_type) if seen.insert(case_type.type_id) => Some(*case_type),
        _ => None,
    })
}

/// Fail with an assertion error unless `actual == expected`.
pub fn ensure_eq<T: PartialEq + fmt::Debug + ?Sized>(
    case: &str,
    what: &str,
    actual: &T,
    expected: &T,
) -> Result<()> {
    if actual != expected {
        return Err(HealthError::assertion(
            case,
            format!("{what}: {actual:?} vs. {expected:?}"),
        )
        .into());
    }
    Ok(())
}

/// Unwrap a lookup, failing with an assertion error naming the missing item.
pub fn require<'a, T: ?Sized>(case: &str, what: &str, value: Option<&'a T>) -> Result<&'a T> {
    value.ok_or_else(|| HealthError::assertion(case, format!("{what} is missing")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    #[derive(Default)]
    struct Declared;

    impl SampleCase for Declared {
        fn extensions(&self) -> &[&'static str] {
            &["ndx-example"]
        }

        fn filename(&self) -> &str {
            "declared.nwb"
        }

        fn create(&self) -> Result<Created> {
            Ok(Created::Single(DataObject::new()))
        }

        fn test(&self, _object: &DataObject) -> Result<()> {
            Ok(())
        }
    }

    // Relies on the trait default for `extensions`.
    #[derive(Default)]
    struct Inherited;

    impl SampleCase for Inherited {
        fn filename(&self) -> &str {
            "inherited.nwb"
        }

        fn create(&self) -> Result<Created> {
            Ok(Created::Single(DataObject::new().with_attribute("a", 1i64)))
        }

        fn test(&self, object: &DataObject) -> Result<()> {
            ensure_eq("Inherited", "a", &object.attribute("a"), &Some(&Value::Int(1)))
        }
    }

    #[test]
    fn discovery_keeps_only_case_bindings_in_order() {
        let bindings: Bindings = vec![
            ("metadata", Binding::Item),
            ("Inherited", Binding::Case(CaseType::of::<Inherited>("Inherited"))),
            ("create", Binding::Item),
            ("Declared", Binding::Case(CaseType::of::<Declared>("Declared"))),
        ];
        let names: Vec<_> = discover_cases(&bindings).map(|case| case.name()).collect();
        assert_eq!(names, vec!["Inherited", "Declared"]);
    }

    #[test]
    fn aliased_case_type_is_yielded_once() {
        let bindings: Bindings = vec![
            ("Declared", Binding::Case(CaseType::of::<Declared>("Declared"))),
            ("Alias", Binding::Case(CaseType::of::<Declared>("Alias"))),
        ];
        assert_eq!(discover_cases(&bindings).count(), 1);
    }

    #[test]
    fn script_without_cases_yields_nothing() {
        let bindings: Bindings = vec![("create", Binding::Item), ("test_basic", Binding::Item)];
        assert_eq!(discover_cases(&bindings).count(), 0);
    }

    #[test]
    fn default_members_satisfy_the_contract() {
        let case = CaseType::of::<Inherited>("Inherited")
            .instantiate()
            .expect("construct");
        assert!(case.extensions().is_empty());
        let Created::Single(object) = case.create().expect("create") else {
            panic!("expected a single object");
        };
        case.test(&object).expect("round trip in memory");
        let err = case.test(&DataObject::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HealthError>(),
            Some(HealthError::AssertionFailure { .. })
        ));
    }
}
