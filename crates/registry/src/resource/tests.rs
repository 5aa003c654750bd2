use std::sync::Arc;

use pretty_assertions::assert_eq;
use resdex_version::RequiredVersions;
use rstest::rstest;

use super::*;
use crate::class::{ClassInfo, TypeHierarchy};
use crate::error::{ErrorKind, RegistryError};
use crate::provider::StaticHandlers;
use crate::state::RegistryState;

const PLATFORM: &str = "2.4.0";
const CURRENT: &[&str] = &["2.*"];
const LEGACY: &[&str] = &["1.9.*"];

const OBJECT: ClassId = ClassId::new("Object");
const PERSON: ClassId = ClassId::new("Person");
const PATIENT: ClassId = ClassId::new("Patient");
const PATIENT_PROXY: ClassId = ClassId::new("Patient$Proxy");
const ENCOUNTER: ClassId = ClassId::new("Encounter");
const NAMED: ClassId = ClassId::new("Named");
const OBS: ClassId = ClassId::new("Obs");
const COMPLEX_OBS: ClassId = ClassId::new("ComplexObs");

struct Labeled(&'static str);
impl Resource for Labeled {}

struct Delegating(ClassId);

impl Resource for Delegating {
	fn as_delegating(self: Arc<Self>) -> Option<Arc<dyn DelegatingResourceHandler>> {
		Some(self)
	}
}

impl DelegatingResourceHandler for Delegating {
	fn handled_class(&self) -> ClassId {
		self.0
	}
}

struct Subclass;

impl DelegatingResourceHandler for Subclass {
	fn handled_class(&self) -> ClassId {
		COMPLEX_OBS
	}
}

impl DelegatingSubclassHandler for Subclass {
	fn superclass(&self) -> ClassId {
		OBS
	}
}

struct FailingScanner;

impl ResourceScanner for FailingScanner {
	fn discover(&self) -> Result<Vec<ResourceCandidate>, DiscoveryError> {
		Err(DiscoveryError::Io(std::io::Error::other("classpath unreadable")))
	}
}

macro_rules! labeled {
	($label:literal) => {
		|| Ok(Arc::new(Labeled($label)) as Arc<dyn Resource>)
	};
}

fn hierarchy() -> TypeHierarchy {
	TypeHierarchy::new()
		.with(ClassInfo::root(OBJECT))
		.with(ClassInfo::extends(PERSON, OBJECT))
		.with(ClassInfo::extends(PATIENT, PERSON).implements(&[NAMED]))
		.with(ClassInfo::proxy_of(PATIENT_PROXY, PATIENT))
		.with(ClassInfo::extends(ENCOUNTER, OBJECT))
		.with(ClassInfo::extends(COMPLEX_OBS, OBS))
}

fn registry(candidates: Vec<ResourceCandidate>) -> ResourceRegistry {
	ResourceRegistry::new(
		Arc::new(StaticScanner::new(candidates)),
		Arc::new(RequiredVersions),
		Arc::new(hierarchy()),
		PLATFORM,
	)
}

fn label(resource: &Arc<dyn Resource>) -> &'static str {
	resource.downcast_ref::<Labeled>().map(|l| l.0).unwrap_or("<unlabeled>")
}

fn top(implementation: &'static str, name: &'static str, class: ClassId, order: i32, factory: ResourceFactory) -> ResourceCandidate {
	ResourceCandidate::new(
		ClassId::new(implementation),
		ResourceDeclaration::new(name, class).order(order).versions(CURRENT).into(),
		factory,
	)
}

#[test]
fn test_lookup_by_name_ignores_undeclared_candidates() {
	let reg = registry(vec![
		ResourceCandidate::undeclared(ClassId::new("Helper"), labeled!("helper")),
		top("PatientResource", "patient", PATIENT, 0, labeled!("patient")),
	]);

	assert_eq!(label(&reg.lookup_by_name("patient").unwrap()), "patient");
	assert_eq!(reg.build().unwrap().len(), 1);
}

#[test]
fn test_unknown_name_is_not_found() {
	let reg = registry(vec![top("PatientResource", "patient", PATIENT, 0, labeled!("patient"))]);

	let err = reg.lookup_by_name("visit").err().unwrap();
	assert!(matches!(&err, RegistryError::UnknownResource(name) if name == "visit"));
	assert_eq!(err.kind(), ErrorKind::NotFound);
	assert_eq!(err.to_string(), "unknown resource: visit");
}

#[test]
fn test_resource_for_other_platform_version_is_skipped() {
	let reg = registry(vec![ResourceCandidate::new(
		ClassId::new("LegacyPatientResource"),
		ResourceDeclaration::new("patient", PATIENT).versions(LEGACY).into(),
		labeled!("legacy"),
	)]);

	assert!(reg.lookup_by_name("patient").err().unwrap().is_not_found());
}

#[test]
fn test_resource_without_versions_is_skipped() {
	let reg = registry(vec![ResourceCandidate::new(
		ClassId::new("PatientResource"),
		ResourceDeclaration::new("patient", PATIENT).into(),
		labeled!("patient"),
	)]);

	assert!(reg.build().unwrap().is_empty());
}

#[test]
fn test_subresource_is_named_after_parent() {
	let reg = registry(vec![
		top("PatientResource", "patient", PATIENT, 0, labeled!("patient")),
		ResourceCandidate::new(
			ClassId::new("PatientEncounterResource"),
			SubResourceDeclaration::new(ClassId::new("PatientResource"), "encounter", ENCOUNTER)
				.versions(CURRENT)
				.into(),
			labeled!("patient/encounter"),
		),
	]);

	assert_eq!(label(&reg.lookup_by_name("patient/encounter").unwrap()), "patient/encounter");
	assert_eq!(label(&reg.lookup_by_supported_class(ENCOUNTER).unwrap()), "patient/encounter");
}

#[test]
fn test_subresource_parent_declared_for_other_version_still_names_it() {
	let reg = registry(vec![
		ResourceCandidate::new(
			ClassId::new("PatientResource"),
			ResourceDeclaration::new("patient", PATIENT).versions(LEGACY).into(),
			labeled!("patient"),
		),
		ResourceCandidate::new(
			ClassId::new("PatientEncounterResource"),
			SubResourceDeclaration::new(ClassId::new("PatientResource"), "encounter", ENCOUNTER)
				.versions(CURRENT)
				.into(),
			labeled!("patient/encounter"),
		),
	]);

	let snap = reg.build().unwrap();
	assert_eq!(snap.names().collect::<Vec<_>>(), vec!["patient/encounter"]);
}

#[rstest]
#[case::undeclared_parent(ClassId::new("Unknown"), CURRENT)]
#[case::subresource_parent(ClassId::new("PatientEncounterResource"), CURRENT)]
#[case::other_version(ClassId::new("PatientResource"), LEGACY)]
fn test_subresource_is_skipped(#[case] parent: ClassId, #[case] versions: &'static [&'static str]) {
	let reg = registry(vec![
		top("PatientResource", "patient", PATIENT, 0, labeled!("patient")),
		ResourceCandidate::new(
			ClassId::new("PatientEncounterResource"),
			SubResourceDeclaration::new(ClassId::new("PatientResource"), "encounter", ENCOUNTER)
				.versions(CURRENT)
				.into(),
			labeled!("patient/encounter"),
		),
		ResourceCandidate::new(
			ClassId::new("NestedResource"),
			SubResourceDeclaration::new(parent, "nested", OBS).versions(versions).into(),
			labeled!("nested"),
		),
	]);

	let snap = reg.build().unwrap();
	let mut names: Vec<&str> = snap.names().collect();
	names.sort_unstable();
	assert_eq!(names, vec!["patient", "patient/encounter"]);
}

#[rstest]
#[case::better_first(true)]
#[case::better_last(false)]
fn test_lower_order_wins_regardless_of_discovery_order(#[case] better_first: bool) {
	let better = top("PatientResource2_0", "patient", PATIENT, 1, labeled!("better"));
	let worse = top("PatientResource1_9", "patient", PATIENT, 5, labeled!("worse"));
	let reg = registry(if better_first { vec![better, worse] } else { vec![worse, better] });

	assert_eq!(label(&reg.lookup_by_name("patient").unwrap()), "better");
	assert_eq!(label(&reg.lookup_by_supported_class(PATIENT).unwrap()), "better");
	assert_eq!(reg.build().unwrap().order_of("patient"), Some(1));
}

#[test]
fn test_default_order_loses_to_explicit_order() {
	let reg = registry(vec![
		ResourceCandidate::new(
			ClassId::new("PatientResource"),
			ResourceDeclaration::new("patient", PATIENT).versions(CURRENT).into(),
			labeled!("default"),
		),
		top("PatientOverride", "patient", PATIENT, 100, labeled!("override")),
	]);

	assert_eq!(label(&reg.lookup_by_name("patient").unwrap()), "override");
}

#[test]
fn test_equal_order_for_same_name_fails_build() {
	let reg = registry(vec![
		top("PatientResourceA", "patient", PATIENT, 3, labeled!("a")),
		top("PatientResourceB", "patient", PATIENT, 3, labeled!("b")),
	]);

	let err = reg.lookup_by_name("patient").err().unwrap();
	assert!(matches!(&err, RegistryError::DuplicateResourceOrder { name, order: 3 } if name == "patient"));
	assert!(err.is_fatal());
	assert_eq!(reg.state(), RegistryState::Uninitialized);

	// Lookups by class fail the same way instead of serving a partial registry.
	assert!(matches!(
		reg.lookup_by_supported_class(PATIENT).err().unwrap(),
		RegistryError::DuplicateResourceOrder { .. }
	));
}

#[test]
fn test_lookup_by_exact_class() {
	let reg = registry(vec![
		top("PersonResource", "person", PERSON, 0, labeled!("person")),
		top("PatientResource", "patient", PATIENT, 0, labeled!("patient")),
	]);

	assert_eq!(label(&reg.lookup_by_supported_class(PATIENT).unwrap()), "patient");
	assert_eq!(label(&reg.lookup_by_supported_class(PERSON).unwrap()), "person");
}

#[test]
fn test_lookup_by_proxy_class_uses_direct_superclass() {
	let reg = registry(vec![
		top("PersonResource", "person", PERSON, 0, labeled!("person")),
		top("PatientResource", "patient", PATIENT, 0, labeled!("patient")),
	]);

	assert_eq!(label(&reg.lookup_by_supported_class(PATIENT_PROXY).unwrap()), "patient");
}

#[rstest]
#[case::root_first(true)]
#[case::root_last(false)]
fn test_lookup_falls_back_to_closest_ancestor(#[case] root_first: bool) {
	let object = top("ObjectResource", "object", OBJECT, 0, labeled!("object"));
	let person = top("PersonResource", "person", PERSON, 0, labeled!("person"));
	let reg = registry(if root_first { vec![object, person] } else { vec![person, object] });

	assert_eq!(label(&reg.lookup_by_supported_class(PATIENT).unwrap()), "person");
	assert_eq!(label(&reg.lookup_by_supported_class(ENCOUNTER).unwrap()), "object");
}

/// Superclass and interface ancestors are unrelated to each other, so the
/// running-best scan keeps whichever was registered first.
#[rstest]
#[case::interface_first(true, "named")]
#[case::superclass_first(false, "person")]
fn test_unrelated_ancestors_resolve_by_registration_order(#[case] interface_first: bool, #[case] expected: &str) {
	let named = top("NamedResource", "named", NAMED, 0, labeled!("named"));
	let person = top("PersonResource", "person", PERSON, 0, labeled!("person"));
	let reg = registry(if interface_first { vec![named, person] } else { vec![person, named] });

	assert_eq!(label(&reg.lookup_by_supported_class(PATIENT).unwrap()), expected);
}

#[test]
fn test_lookup_by_unrelated_class_is_not_found() {
	let reg = registry(vec![top("PersonResource", "person", PERSON, 0, labeled!("person"))]);

	let err = reg.lookup_by_supported_class(ENCOUNTER).err().unwrap();
	assert!(matches!(err, RegistryError::UnknownClass(class) if class == ENCOUNTER));

	let err = reg.lookup_by_supported_class(PATIENT_PROXY).err().unwrap();
	assert!(matches!(err, RegistryError::UnknownClass(class) if class == PATIENT));
}

#[test]
fn test_instantiation_failure_is_fatal() {
	let reg = registry(vec![top("BrokenResource", "broken", OBJECT, 0, || Err("no default constructor".into()))]);

	let err = reg.build().err().unwrap();
	assert!(matches!(&err, RegistryError::Instantiation { class, .. } if class.as_str() == "BrokenResource"));
	assert_eq!(err.kind(), ErrorKind::Instantiation);
	assert_eq!(reg.state(), RegistryState::Uninitialized);
}

#[test]
fn test_losing_candidate_is_never_instantiated() {
	let reg = registry(vec![
		top("PatientResource", "patient", PATIENT, 0, labeled!("patient")),
		top("BrokenOverride", "patient", PATIENT, 10, || Err("unreachable".into())),
	]);

	assert_eq!(label(&reg.lookup_by_name("patient").unwrap()), "patient");
}

#[test]
fn test_discovery_failure_is_wrapped() {
	let reg = ResourceRegistry::new(
		Arc::new(FailingScanner),
		Arc::new(RequiredVersions),
		Arc::new(hierarchy()),
		PLATFORM,
	);

	let err = reg.lookup_by_name("patient").err().unwrap();
	assert!(matches!(err, RegistryError::Discovery(DiscoveryError::Io(_))));
	assert_eq!(err.to_string(), "cannot access resources");
	assert_eq!(reg.state(), RegistryState::Uninitialized);
}

#[test]
fn test_build_is_idempotent_until_rebuild() {
	let reg = registry(vec![top("PatientResource", "patient", PATIENT, 0, labeled!("patient"))]);

	let first = reg.build().unwrap();
	let second = reg.build().unwrap();
	assert!(Arc::ptr_eq(&first, &second));
	assert!(Arc::ptr_eq(first.get("patient").unwrap(), &reg.lookup_by_name("patient").unwrap()));

	let rebuilt = reg.rebuild().unwrap();
	assert!(!Arc::ptr_eq(&first, &rebuilt));
	assert_eq!(label(rebuilt.get("patient").unwrap()), label(first.get("patient").unwrap()));
}

#[test]
fn test_resource_handlers_include_delegating_resources_and_subclass_handlers() {
	let reg = registry(vec![
		top("PatientResource", "patient", PATIENT, 0, || Ok(Arc::new(Delegating(PATIENT)) as Arc<dyn Resource>)),
		top("PlainResource", "plain", ENCOUNTER, 0, labeled!("plain")),
		top("ObsResource", "obs", OBS, 0, || Ok(Arc::new(Delegating(OBS)) as Arc<dyn Resource>)),
	]);
	let provider = StaticHandlers::new().with_subclass(Arc::new(Subclass));

	let handlers = reg.list_all_resource_handlers(&provider).unwrap();
	let classes: Vec<ClassId> = handlers.iter().map(|h| h.handled_class()).collect();
	assert_eq!(classes, vec![PATIENT, OBS, COMPLEX_OBS]);
	assert!(handlers[0].downcast_ref::<Delegating>().is_some());
}
