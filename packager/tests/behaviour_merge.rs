//! Behaviour-driven tests for `Export-Package` merging.
//!
//! Scenarios build real jars with `JarFixture` and run the merger over them.
//! Single quotes in step text stand for double quotes in headers.

use packwright_common::export::EXPORT_PACKAGE;
use packwright_packager::identity::{ComponentIdentity, ModuleCoordinate, ProjectPath};
use packwright_packager::merge::{Instructions, MergeError, SourceArtifact, merge_instructions};
use packwright_packager::relocation::{RelocationRule, Relocations};
use packwright_packager::test_utils::JarFixture;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Default)]
struct MergeWorld {
    jars: Vec<JarFixture>,
    identities: Vec<(String, ComponentIdentity)>,
    instructions: Instructions,
    relocations: Relocations,
    result: Option<Result<Instructions, MergeError>>,
}

#[fixture]
fn world() -> MergeWorld {
    MergeWorld::default()
}

impl MergeWorld {
    fn artifacts(&self) -> Vec<SourceArtifact> {
        self.identities
            .iter()
            .map(|(name, identity)| {
                let jar = self
                    .jars
                    .iter()
                    .find(|jar| jar.path().file_name().is_some_and(|file| file == name.as_str()))
                    .unwrap_or_else(|| panic!("no jar named {name}"));
                SourceArtifact::new(jar.path(), identity.clone())
            })
            .collect()
    }

    fn merged(&self) -> &Instructions {
        match &self.result {
            Some(Ok(merged)) => merged,
            Some(Err(error)) => panic!("expected the merge to succeed: {error}"),
            None => panic!("instructions should be merged"),
        }
    }
}

#[given("a plain jar \"{name}\" with classes \"{classes}\"")]
fn given_plain_jar(world: &mut MergeWorld, name: String, classes: String) {
    let fixture = classes
        .split(',')
        .fold(JarFixture::new().named(&name), JarFixture::class);
    world.jars.push(fixture.build());
}

#[given("a bundle \"{name}\" exporting \"{header}\"")]
fn given_bundle(world: &mut MergeWorld, name: String, header: String) {
    let header = header.replace('\'', "\"");
    let fixture = JarFixture::new()
        .named(&name)
        .manifest(&[(EXPORT_PACKAGE, header.as_str())])
        .class("com/foo/api/Api.class")
        .build();
    world.jars.push(fixture);
}

#[given("the jar \"{name}\" belongs to module \"{coordinate}\"")]
fn given_module(world: &mut MergeWorld, name: String, coordinate: String) {
    let coordinate = ModuleCoordinate::try_from(coordinate.as_str()).expect("valid coordinate");
    world
        .identities
        .push((name, ComponentIdentity::Module(coordinate)));
}

#[given("the jar \"{name}\" belongs to project \"{path}\"")]
fn given_project(world: &mut MergeWorld, name: String, path: String) {
    let path = ProjectPath::try_from(path.as_str()).expect("valid project path");
    world.identities.push((name, ComponentIdentity::Project(path)));
}

#[given("the jar \"{name}\" has no declared identity")]
fn given_opaque(world: &mut MergeWorld, name: String) {
    let identity = ComponentIdentity::Opaque(name.clone());
    world.identities.push((name, identity));
}

#[given("packages starting with \"{pattern}\" are relocated to \"{shaded}\"")]
fn given_relocation(world: &mut MergeWorld, pattern: String, shaded: String) {
    world.relocations.push(RelocationRule::new(pattern, shaded));
}

#[given("the user Export-Package is \"{value}\"")]
fn given_user_exports(world: &mut MergeWorld, value: String) {
    world.instructions.insert(EXPORT_PACKAGE.to_owned(), value);
}

#[when("the instructions are merged")]
fn when_merged(world: &mut MergeWorld) {
    let artifacts = world.artifacts();
    world.result = Some(merge_instructions(
        &world.instructions,
        &artifacts,
        &world.relocations,
    ));
}

#[then("Export-Package is \"{expected}\"")]
fn then_export_package(world: &mut MergeWorld, expected: String) {
    let expected = expected.replace('\'', "\"");
    assert_eq!(
        world.merged().get(EXPORT_PACKAGE).map(String::as_str),
        Some(expected.as_str())
    );
}

#[then("the merge fails naming \"{name}\"")]
fn then_merge_fails(world: &mut MergeWorld, name: String) {
    match &world.result {
        Some(Err(error @ MergeError::UnsupportedIdentity { .. })) => {
            assert!(error.to_string().contains(name.as_str()), "{error}");
        }
        Some(other) => panic!("expected an unsupported identity error, got {other:?}"),
        None => panic!("instructions should be merged"),
    }
}

#[scenario(
    path = "tests/features/export_merge.feature",
    name = "Plain jars export their relocated packages with the module version"
)]
fn scenario_plain_jars(world: MergeWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/export_merge.feature",
    name = "Bundles contribute their own exports without uses directives"
)]
fn scenario_bundles(world: MergeWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/export_merge.feature",
    name = "User negations come before derived exports"
)]
fn scenario_user_negations(world: MergeWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/export_merge.feature",
    name = "Plain jars with an opaque identity are rejected"
)]
fn scenario_opaque_identity(world: MergeWorld) {
    let _ = world;
}
