//! Projects, artifacts and artifact versions

use computegraph_core::opstore::names;
use computegraph_core::{maybe, OpDef, OpStore, RenderInfo, Result, SimpleType, Type};

fn project() -> Type {
    Type::simple(SimpleType::Project)
}

fn artifact() -> Type {
    Type::simple(SimpleType::Artifact)
}

fn artifact_version() -> Type {
    Type::simple(SimpleType::ArtifactVersion)
}

fn getter(name: &str, input: (&str, Type), output: Type, description: &str, returns: &str) -> OpDef {
    OpDef::new(name)
        .arg(input.0, input.1, "The object to read from")
        .returns(output)
        .description(description)
        .return_description(returns)
}

pub(crate) fn register(store: &mut OpStore) -> Result<()> {
    store.register_op(
        OpDef::new("root-project")
            .arg("entityName", Type::string(), "The entity owning the project")
            .arg("projectName", Type::string(), "The project name")
            .returns(project())
            .render(RenderInfo::Function)
            .description("Looks up a project by entity and name")
            .return_description("The project"),
    )?;

    store.register_op(getter(
        "project-name",
        ("project", project()),
        Type::string(),
        "Name of a project",
        "The project name",
    ))?;
    store.register_op(getter(
        "project-artifacts",
        ("project", project()),
        Type::list(artifact()),
        "Artifacts logged to a project",
        "The project's artifacts",
    ))?;
    store.register_op(getter(
        "artifact-versions",
        ("artifact", artifact()),
        Type::list(artifact_version()),
        "Versions of an artifact",
        "The artifact's versions, oldest first",
    ))?;
    store.register_op(getter(
        names::ARTIFACT_NAME,
        ("artifact", artifact()),
        Type::string(),
        "Name of an artifact",
        "The artifact name",
    ))?;
    store.register_op(getter(
        names::ARTIFACT_VERSION_NAME,
        ("artifactVersion", artifact_version()),
        Type::string(),
        "Name of an artifact version",
        "The version name, as `<artifact>:<alias>`",
    ))?;

    store.register_op(
        OpDef::new(names::PROJECT_ARTIFACT)
            .arg("project", project(), "The project to look in")
            .arg("artifactName", Type::string(), "The artifact name")
            .returns(maybe(artifact()))
            .description("Looks up an artifact of a project by name")
            .return_description("The artifact, or none when it does not exist"),
    )?;

    store.register_op(
        OpDef::new(names::PROJECT_ARTIFACT_VERSION)
            .arg("project", project(), "The project to look in")
            .arg("artifactName", Type::string(), "The artifact name")
            .arg("artifactVersionAlias", Type::string(), "A version alias such as `latest` or `v3`")
            .returns(maybe(artifact_version()))
            .description("Looks up an artifact version of a project by name and alias")
            .return_description("The version, or none when it does not exist"),
    )?;
    Ok(())
}
